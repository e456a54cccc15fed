pub mod fcm;
pub mod google_auth;

pub use fcm::*;
pub use google_auth::*;
