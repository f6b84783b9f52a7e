pub mod config;
pub mod types;

pub use config::{ConfigError, GoatsConfig, InitPolicy};
pub use types::*;
