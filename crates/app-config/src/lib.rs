//! Configuration, filesystem paths, and logging for the keepin client core.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_BACKEND_BASE_URL, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
