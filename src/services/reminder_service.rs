use crate::config::{GoogleConfig, ReminderConfig};
use crate::entities::{
    device_entity as devices, notification_event_entity as events, profile_entity as profiles,
    subscription_entity as subscriptions,
};
use crate::error::AppResult;
use crate::external::{
    FIREBASE_MESSAGING_SCOPE, FcmClient, GoogleAuthClient, PushData, PushMessage,
    PushNotification, ServiceAccount,
};
use crate::models::{
    DedupDecision, NotificationStatus, PushOutcome, REMINDER_TITLE, ReminderRunSummary,
    SubscriptionStatus, reminder_body,
};
use crate::utils::schedule;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use futures_util::{StreamExt, stream};
use sea_orm::sea_query::{OnConflict, PostgresQueryBuilder, Query};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One push to one device, fixed at evaluation time so dispatch can run on
/// the worker pool without touching shared state.
#[derive(Debug, Clone)]
struct DispatchJob {
    user_id: Uuid,
    subscription_id: Uuid,
    device_id: Uuid,
    device_token: String,
    body: String,
    scheduled_for: DateTime<Utc>,
    local_day: NaiveDate,
    offset_days: i64,
}

#[derive(Clone)]
pub struct ReminderService {
    pool: DatabaseConnection,
    auth: GoogleAuthClient,
    google: GoogleConfig,
    options: ReminderConfig,
}

impl ReminderService {
    pub fn new(
        pool: DatabaseConnection,
        auth: GoogleAuthClient,
        google: GoogleConfig,
        options: ReminderConfig,
    ) -> Self {
        Self {
            pool,
            auth,
            google,
            options,
        }
    }

    pub async fn run(&self) -> AppResult<ReminderRunSummary> {
        self.run_at(Utc::now()).await
    }

    /// One reminder batch. Credentials are minted up front; a missing or
    /// rejected service account aborts the run before any storage query.
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<ReminderRunSummary> {
        let sa = ServiceAccount::from_config(&self.google)?;
        let access_token = self
            .auth
            .mint_access_token(&sa, FIREBASE_MESSAGING_SCOPE)
            .await?;
        let fcm = FcmClient::new(&sa.project_id);

        let subs = subscriptions::Entity::find()
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .all(&self.pool)
            .await?;
        log::debug!("Found {} active subscriptions", subs.len());

        let owner_ids: Vec<Uuid> = subs
            .iter()
            .map(|s| s.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let timezone_by_owner: HashMap<Uuid, Option<String>> = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(owner_ids.clone()))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p.timezone))
            .collect();

        let mut tokens_by_owner: HashMap<Uuid, Vec<(Uuid, String)>> = HashMap::new();
        let logged_in = devices::Entity::find()
            .filter(devices::Column::UserId.is_in(owner_ids))
            .filter(devices::Column::LoggedIn.eq(true))
            .all(&self.pool)
            .await?;
        log::debug!("Found {} logged-in devices", logged_in.len());
        for device in logged_in {
            tokens_by_owner
                .entry(device.user_id)
                .or_default()
                .push((device.id, device.device_token));
        }

        // Evaluation is sequential per subscription: the dedup check has to
        // land before any send for that (subscription, offset) pair.
        let mut jobs: Vec<DispatchJob> = Vec::new();
        for sub in &subs {
            let tz = schedule::resolve_timezone(
                timezone_by_owner
                    .get(&sub.user_id)
                    .and_then(|t| t.as_deref()),
            );

            if self.options.send_window && !schedule::within_send_window(now, tz) {
                continue;
            }

            let days_until = schedule::days_until(sub.next_payment_date, now, tz);
            let offsets = schedule::parse_offsets(sub.reminder_period.as_deref());
            log::debug!(
                "Subscription {} ({}): due in {} day(s), offsets {:?}",
                sub.id,
                sub.name,
                days_until,
                offsets
            );
            if !offsets.contains(&days_until) {
                continue;
            }

            let Some(tokens) = tokens_by_owner.get(&sub.user_id) else {
                log::debug!("Subscription {}: owner has no logged-in devices", sub.id);
                continue;
            };

            let day = schedule::local_day(now, tz);
            match self.dedup_check(sub.id, days_until, day, tz).await? {
                DedupDecision::NotRecorded => {}
                DedupDecision::AlreadyRecorded | DedupDecision::RaceLost => {
                    log::debug!(
                        "Subscription {}: offset {} already decided for {}",
                        sub.id,
                        days_until,
                        day
                    );
                    continue;
                }
            }

            let scheduled_for = schedule::scheduled_send_time(day, tz);
            let body = reminder_body(&sub.name, days_until);
            for (device_id, device_token) in tokens {
                jobs.push(DispatchJob {
                    user_id: sub.user_id,
                    subscription_id: sub.id,
                    device_id: *device_id,
                    device_token: device_token.clone(),
                    body: body.clone(),
                    scheduled_for,
                    local_day: day,
                    offset_days: days_until,
                });
            }
        }

        let candidates = jobs.len() as u64;
        log::info!("Reminder candidates: {candidates}");

        // Sends to different devices or subscriptions are independent;
        // bounded pool, counts aggregated at the collection point.
        let concurrency = self.options.dispatch_concurrency.max(1);
        let outcomes = stream::iter(jobs.into_iter().map(|job| {
            let fcm = fcm.clone();
            let access_token = access_token.clone();
            async move { self.dispatch_one(&fcm, &access_token, job).await }
        }))
        .buffer_unordered(concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut sent = 0u64;
        let mut failed = 0u64;
        for outcome in outcomes {
            match outcome? {
                PushOutcome::Delivered => sent += 1,
                PushOutcome::Rejected { .. } => failed += 1,
            }
        }

        log::info!("Reminder run complete: {candidates} candidates, {sent} sent, {failed} failed");
        Ok(ReminderRunSummary {
            candidates,
            sent,
            failed,
        })
    }

    /// Fast-path dedup: any audit row for this (subscription, offset) whose
    /// `scheduled_for` lands inside the owner-local day decides the day,
    /// whether that attempt succeeded or failed. The uniqueness constraint
    /// on the audit table remains the source of truth under races.
    async fn dedup_check(
        &self,
        subscription_id: Uuid,
        offset_days: i64,
        day: NaiveDate,
        tz: Tz,
    ) -> AppResult<DedupDecision> {
        let (day_start, day_end) = schedule::local_day_utc_bounds(day, tz);
        let existing = events::Entity::find()
            .filter(events::Column::SubscriptionId.eq(subscription_id))
            .filter(events::Column::OffsetDays.eq(offset_days as i32))
            .filter(events::Column::ScheduledFor.gte(day_start))
            .filter(events::Column::ScheduledFor.lt(day_end))
            .one(&self.pool)
            .await?;

        Ok(if existing.is_some() {
            DedupDecision::AlreadyRecorded
        } else {
            DedupDecision::NotRecorded
        })
    }

    async fn dispatch_one(
        &self,
        fcm: &FcmClient,
        access_token: &str,
        job: DispatchJob,
    ) -> AppResult<PushOutcome> {
        let message = PushMessage {
            token: job.device_token.clone(),
            notification: PushNotification {
                title: REMINDER_TITLE.to_string(),
                body: job.body.clone(),
            },
            data: PushData {
                subscription_id: job.subscription_id,
            },
        };

        let outcome = fcm.send(access_token, &message).await?;

        let (status, error, sent_at) = match &outcome {
            PushOutcome::Delivered => (NotificationStatus::Sent, None, Some(Utc::now())),
            PushOutcome::Rejected { error } => {
                (NotificationStatus::Failed, Some(error.clone()), None)
            }
        };

        // The audit row also decides the day for later runs; an insert
        // failure is logged rather than failing the whole batch.
        match self.record_event(&job, status, error, sent_at).await {
            Ok(true) => {}
            Ok(false) => log::warn!(
                "Subscription {}: offset {} for {} was recorded by a concurrent run",
                job.subscription_id,
                job.offset_days,
                job.local_day
            ),
            Err(e) => log::error!("Audit insert error: {e:?}"),
        }

        Ok(outcome)
    }

    /// Append the audit row. Returns false when the dedup constraint
    /// rejected it, i.e. a racing run won the (subscription, device,
    /// offset, local day) key.
    async fn record_event(
        &self,
        job: &DispatchJob,
        status: NotificationStatus,
        error: Option<String>,
        sent_at: Option<DateTime<Utc>>,
    ) -> AppResult<bool> {
        let insert = Query::insert()
            .into_table(events::Entity)
            .columns([
                events::Column::UserId,
                events::Column::SubscriptionId,
                events::Column::DeviceId,
                events::Column::ScheduledFor,
                events::Column::LocalDay,
                events::Column::OffsetDays,
                events::Column::Status,
                events::Column::Error,
                events::Column::SentAt,
            ])
            .values_panic([
                job.user_id.into(),
                job.subscription_id.into(),
                job.device_id.into(),
                job.scheduled_for.into(),
                job.local_day.into(),
                (job.offset_days as i32).into(),
                status.as_str().into(),
                error.into(),
                sent_at.into(),
            ])
            .on_conflict(
                OnConflict::columns([
                    events::Column::SubscriptionId,
                    events::Column::DeviceId,
                    events::Column::OffsetDays,
                    events::Column::LocalDay,
                ])
                .do_nothing()
                .to_owned(),
            )
            .to_owned();

        let (sql, values) = insert.build(PostgresQueryBuilder);
        let stmt =
            sea_orm::Statement::from_sql_and_values(sea_orm::DatabaseBackend::Postgres, sql, values);
        let res = self.pool.execute(stmt).await?;
        Ok(res.rows_affected() > 0)
    }
}
