//! Client configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! config file, then `CLINIC__*` environment variables
//! (e.g. `CLINIC__API_URL`, `CLINIC__LOGGING__LEVEL`).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Deployment the client talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "clinic_wizard_core=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    pub api_url: String,
    /// Public URL of the dashboard itself
    pub app_url: String,
    #[serde(default)]
    pub environment: AppEnvironment,
    /// Serve canned data instead of calling the backend
    #[serde(default)]
    pub enable_mock_data: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".to_string(),
            app_url: "http://localhost:3000".to_string(),
            environment: AppEnvironment::Development,
            enable_mock_data: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load defaults, then `config_path` if given, then `CLINIC__*` variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_from(config_path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_from(
        config_path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let defaults_json = serde_json::to_string(&ApiConfig::default())
            .context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CLINIC")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Absolute URL of an API path, e.g. `endpoint("/patients")`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn is_production(&self) -> bool {
        self.environment == AppEnvironment::Production
    }
}
