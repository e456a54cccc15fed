pub mod jobs;

pub use jobs::jobs_config;
