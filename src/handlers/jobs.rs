use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::{ReminderRunSummary, RolloverSummary};
use crate::services::{ReminderService, RolloverService};

#[utoipa::path(
    post,
    path = "/jobs/send-reminders",
    tag = "jobs",
    responses(
        (status = 200, description = "Reminder run summary", body = ReminderRunSummary),
        (status = 500, description = "Run aborted before dispatch")
    )
)]
pub async fn send_reminders(
    reminder_service: web::Data<ReminderService>,
) -> Result<HttpResponse> {
    match reminder_service.run().await {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/jobs/subscription-rollover",
    tag = "jobs",
    responses(
        (status = 200, description = "Rollover result message", body = RolloverSummary),
        (status = 500, description = "Run aborted")
    )
)]
pub async fn subscription_rollover(
    rollover_service: web::Data<RolloverService>,
) -> Result<HttpResponse> {
    match rollover_service.run().await {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(e) => Ok(e.error_response()),
    }
}

pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

pub fn jobs_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/jobs")
            .route("/send-reminders", web::post().to(send_reminders))
            .route("/subscription-rollover", web::post().to(subscription_rollover)),
    )
    .route("/health", web::get().to(health));
}
