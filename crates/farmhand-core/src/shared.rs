//! Shared types used across the farmhand crates.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outbound chat reply produced by the advisor for every inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Human-readable answer.
    pub response: String,
    /// Echoed or detected crop, set when the reply is crop-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    /// Follow-up prompts the UI can offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Global application configuration (gateway + identity). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity shown in logs.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Path to the crop knowledge JSON resource.
    pub knowledge_path: String,
    /// If true, the gateway serves the static chat UI from `static/`. (Config alias: `ui_enabled`)
    #[serde(default, alias = "ui_enabled")]
    pub frontend_enabled: bool,
}

impl CoreConfig {
    /// Load config from file and environment. Precedence: env `FARMHAND_CONFIG` path > `config/gateway.toml` > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("FARMHAND_CONFIG").unwrap_or_else(|_| "config/gateway.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Farmhand Gateway")?
            .set_default("port", 8000_i64)?
            .set_default("knowledge_path", "data/crop_data.json")?
            .set_default("frontend_enabled", true)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("FARMHAND").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}
