pub mod config;
pub mod error;
pub mod event_bus;
pub mod stores;
pub mod types;

pub use config::NotifyConfig;
pub use error::{NotifyError, NotifyResult};
