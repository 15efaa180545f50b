pub mod config;
pub mod errors;

pub use config::{ApiConfig, AppConfig, LoggingConfig, OutputLayout, TranslationDefaults};
pub use errors::{Result, WordlistError};
