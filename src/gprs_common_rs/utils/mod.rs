pub mod config_loader;
pub mod log_config;

pub use config_loader::{ConfigLoader, DispatchConfig, GprsConfig, LogConfig, SchemaConfig};
pub use log_config::{init_logging, LogLevel, UnifiedLogFormatter};
