pub mod job;
pub mod notification;
pub mod subscription;

pub use job::*;
pub use notification::*;
pub use subscription::*;
