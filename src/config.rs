use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub flow: FlowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub publishable_key: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_file_size_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// How long the "uploading" phase stays visible before flipping to
    /// "moderating", even when the moderation call is still in flight.
    pub min_upload_display_ms: u64,
    /// Delay before navigating to the contest page after a completed entry.
    pub redirect_delay_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_upload_display_ms: 2000,
            redirect_delay_ms: 3000,
        }
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| AppError::ConfigError(format!("failed to parse {config_path}: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No config file: build from environment variables alone.
                let base_url = env::var("API_BASE_URL").map_err(|_| {
                    AppError::ConfigError(
                        "API_BASE_URL not set and config.toml not found".to_string(),
                    )
                })?;

                Config {
                    api: ApiConfig { base_url },
                    stripe: StripeConfig {
                        publishable_key: env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
                        api_base_url: env::var("STRIPE_API_BASE_URL").ok(),
                    },
                    upload: UploadConfig::default(),
                    flow: FlowConfig::default(),
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "failed to read {config_path}: {e}"
                )));
            }
        };

        // Environment variables override the file when both are present.
        if let Ok(v) = env::var("API_BASE_URL") {
            config.api.base_url = v;
        }
        if let Ok(v) = env::var("STRIPE_PUBLISHABLE_KEY") {
            config.stripe.publishable_key = v;
        }
        if let Ok(v) = env::var("STRIPE_API_BASE_URL") {
            config.stripe.api_base_url = Some(v);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_SIZE_BYTES")
            && let Ok(n) = v.parse()
        {
            config.upload.max_file_size_bytes = n;
        }
        if let Ok(v) = env::var("FLOW_MIN_UPLOAD_DISPLAY_MS")
            && let Ok(n) = v.parse()
        {
            config.flow.min_upload_display_ms = n;
        }
        if let Ok(v) = env::var("FLOW_REDIRECT_DELAY_MS")
            && let Ok(n) = v.parse()
        {
            config.flow.redirect_delay_ms = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_limits() {
        let upload = UploadConfig::default();
        assert_eq!(upload.max_file_size_bytes, 10 * 1024 * 1024);

        let flow = FlowConfig::default();
        assert_eq!(flow.min_upload_display_ms, 2000);
    }

    #[test]
    fn parses_minimal_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://api.photocontest.example"

            [stripe]
            publishable_key = "pk_test_123"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://api.photocontest.example");
        assert_eq!(cfg.flow.redirect_delay_ms, 3000);
    }
}
