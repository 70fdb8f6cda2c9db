// pipelens client - backend access, configuration and project sessions

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod source;

pub use backend::BackendClient;
pub use config::{load_config, ClientConfig};
pub use dashboard::{load_dashboard, Dashboard};
pub use error::{ConfigError, FetchError, Result};
pub use session::ProjectSession;
pub use source::{LogQuery, LogSource};
