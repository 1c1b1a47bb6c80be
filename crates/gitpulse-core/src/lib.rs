mod app_config;
mod config;
pub mod retry;
mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use retry::RetryPolicy;
pub use types::{week_start_of, LanguageShare};
