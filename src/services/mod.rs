pub mod reminder_service;
pub mod rollover_service;

pub use reminder_service::*;
pub use rollover_service::*;
