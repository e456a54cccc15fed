use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Upstream auth error: {0}")]
    UpstreamAuthError(String),

    #[error("Query error: {0}")]
    QueryError(#[from] sea_orm::DbErr),

    #[error("Dispatch error: {0}")]
    DispatchError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // Every fatal job failure surfaces as a 500; partial per-message
        // failures never reach here (they are summary counts instead).
        let (error_code, message) = match self {
            AppError::ConfigError(msg) => {
                log::error!("Config error: {msg}");
                ("CONFIG_ERROR", msg.clone())
            }
            AppError::UpstreamAuthError(msg) => {
                log::error!("Upstream auth error: {msg}");
                ("UPSTREAM_AUTH_ERROR", msg.clone())
            }
            AppError::QueryError(err) => {
                log::error!("Query error: {err}");
                ("QUERY_ERROR", err.to_string())
            }
            AppError::DispatchError(msg) => {
                log::error!("Dispatch error: {msg}");
                ("DISPATCH_ERROR", msg.clone())
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", self.to_string())
            }
        };

        HttpResponse::InternalServerError().json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
