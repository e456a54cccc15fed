use crate::entities::subscription_entity as subscriptions;
use crate::error::AppResult;
use crate::models::{BillingCycle, RolloverSummary, SubscriptionStatus};
use crate::utils::schedule;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

#[derive(Clone)]
pub struct RolloverService {
    pool: DatabaseConnection,
}

impl RolloverService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn run(&self) -> AppResult<RolloverSummary> {
        self.run_at(Utc::now().date_naive()).await
    }

    /// Advance every overdue active subscription past `today` by whole
    /// cycle increments. Deterministic and idempotent: re-running against
    /// the same stored state recomputes the same target dates.
    pub async fn run_at(&self, today: NaiveDate) -> AppResult<RolloverSummary> {
        let overdue = subscriptions::Entity::find()
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
            .filter(subscriptions::Column::NextPaymentDate.lt(today))
            .all(&self.pool)
            .await?;

        if overdue.is_empty() {
            return Ok(RolloverSummary {
                message: "No subscriptions to update.".to_string(),
            });
        }

        let mut updated = 0u64;
        for sub in overdue {
            let cycle = BillingCycle::parse(&sub.billing_cycle);
            let new_date = schedule::advance_past(sub.next_payment_date, cycle, today);

            // Guarded write: only lands if the stored date is still the one
            // we read, so overlapping invocations advance each row once.
            let res = subscriptions::Entity::update_many()
                .col_expr(
                    subscriptions::Column::NextPaymentDate,
                    Expr::value(new_date),
                )
                .col_expr(subscriptions::Column::UpdatedAt, Expr::cust("NOW()"))
                .filter(subscriptions::Column::Id.eq(sub.id))
                .filter(subscriptions::Column::NextPaymentDate.eq(sub.next_payment_date))
                .exec(&self.pool)
                .await?;

            if res.rows_affected > 0 {
                updated += 1;
                log::debug!(
                    "Subscription {} ({}): rolled {} -> {}",
                    sub.id,
                    cycle,
                    sub.next_payment_date,
                    new_date
                );
            } else {
                log::debug!(
                    "Subscription {}: already advanced by a concurrent run",
                    sub.id
                );
            }
        }

        log::info!("Rollover complete, updated {updated} subscriptions");
        Ok(RolloverSummary {
            message: format!("Successfully updated {updated} subscriptions."),
        })
    }
}
