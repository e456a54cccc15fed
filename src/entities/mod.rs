pub mod devices;
pub mod notification_events;
pub mod profiles;
pub mod subscriptions;

pub use devices as device_entity;
pub use notification_events as notification_event_entity;
pub use profiles as profile_entity;
pub use subscriptions as subscription_entity;
