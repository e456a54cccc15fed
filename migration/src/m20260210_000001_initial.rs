use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Timezone,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    UserId,
    Name,
    NextPaymentDate,
    BillingCycle,
    ReminderPeriod,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    UserId,
    DeviceToken,
    LoggedIn,
    LastActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum NotificationEvents {
    Table,
    Id,
    UserId,
    SubscriptionId,
    DeviceId,
    ScheduledFor,
    LocalDay,
    OffsetDays,
    Status,
    Error,
    SentAt,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::Timezone).text().null())
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Subscriptions::Name).text().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::NextPaymentDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::BillingCycle)
                            .text()
                            .not_null()
                            .default("monthly"),
                    )
                    .col(ColumnDef::new(Subscriptions::ReminderPeriod).text().null())
                    .col(
                        ColumnDef::new(Subscriptions::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // rollover scan: status = 'active' AND next_payment_date < today
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subscriptions_status_next_payment")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::Status)
                    .col(Subscriptions::NextPaymentDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Devices::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Devices::DeviceToken)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Devices::LoggedIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Devices::LastActive)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_devices_user_logged_in")
                    .table(Devices::Table)
                    .col(Devices::UserId)
                    .col(Devices::LoggedIn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationEvents::Id)
                            .uuid()
                            .not_null()
                            .default(Expr::cust("gen_random_uuid()"))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationEvents::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(NotificationEvents::SubscriptionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationEvents::DeviceId).uuid().not_null())
                    .col(
                        ColumnDef::new(NotificationEvents::ScheduledFor)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationEvents::LocalDay).date().not_null())
                    .col(
                        ColumnDef::new(NotificationEvents::OffsetDays)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(NotificationEvents::Status).text().not_null())
                    .col(ColumnDef::new(NotificationEvents::Error).text().null())
                    .col(
                        ColumnDef::new(NotificationEvents::SentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(NotificationEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("NOW()"))
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // dedup key: one send decision per (subscription, device, offset, local day)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_notification_events_dedup")
                    .table(NotificationEvents::Table)
                    .col(NotificationEvents::SubscriptionId)
                    .col(NotificationEvents::DeviceId)
                    .col(NotificationEvents::OffsetDays)
                    .col(NotificationEvents::LocalDay)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // dedup fast-path lookup by (subscription, offset, scheduled_for window)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notification_events_sub_offset_scheduled")
                    .table(NotificationEvents::Table)
                    .col(NotificationEvents::SubscriptionId)
                    .col(NotificationEvents::OffsetDays)
                    .col(NotificationEvents::ScheduledFor)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}
