//! Configuration management and validation.

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::auction::types::AccountId;
use crate::creative::DEFAULT_CREATIVE_URL;
use crate::error::ApsAdapterError;

/// Production bid endpoint used when no debug override is configured.
pub const DEFAULT_ENDPOINT: &str = "https://aax.amazon-adsystem.com/e/dtb/bid";

/// Query key appended to the endpoint when debug mode is on.
const DEBUG_QUERY_KEY: &str = "amzn_debug_mode";

/// Render method that switches the debug flag to the fif variant.
const RENDER_METHOD_FIF: &str = "fif";

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "APS_ADAPTER";

/// Exchange-specific configuration, the `[aps]` table.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ApsConfig {
    /// Whether the APS adapter participates in auctions.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether telemetry events are recorded.
    #[serde(default = "default_telemetry")]
    pub telemetry: bool,

    /// Exchange account identifier (accepts both string and number).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,

    /// Bid endpoint.
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// Debug endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub debug_url: Option<String>,

    /// Append debug query parameters to the endpoint.
    #[serde(default)]
    pub debug: bool,

    /// Creative render method; "fif" selects the friendly-iframe debug flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_method: Option<String>,

    /// Renderer script URL override for display creatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub creative_url: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_telemetry() -> bool {
    true
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for ApsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            telemetry: default_telemetry(),
            account_id: None,
            endpoint: default_endpoint(),
            debug_url: None,
            debug: false,
            render_method: None,
            creative_url: None,
        }
    }
}

impl ApsConfig {
    /// Resolve the bid URL for this round: the debug override when present,
    /// else the production endpoint, with debug query parameters appended
    /// when debug mode is on.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the configured URL cannot be
    /// parsed.
    pub fn endpoint_url(&self) -> Result<String, Report<ApsAdapterError>> {
        let base = self.debug_url.as_deref().unwrap_or(&self.endpoint);
        if !self.debug {
            return Ok(base.to_string());
        }

        let mut url = Url::parse(base).change_context(ApsAdapterError::Configuration {
            message: format!("invalid bid endpoint: {base}"),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            if self.render_method.as_deref() == Some(RENDER_METHOD_FIF) {
                pairs.append_pair(DEBUG_QUERY_KEY, RENDER_METHOD_FIF);
            }
            pairs.append_pair(DEBUG_QUERY_KEY, "1");
        }
        Ok(url.into())
    }

    /// Renderer script URL, falling back to the default renderer.
    pub fn renderer_url(&self) -> &str {
        self.creative_url.as_deref().unwrap_or(DEFAULT_CREATIVE_URL)
    }
}

/// Top-level settings for hosts embedding the adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub aps: ApsConfig,
}

impl Settings {
    /// Load settings from a TOML string with `APS_ADAPTER`-prefixed
    /// environment overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the TOML cannot be parsed or the
    /// resulting settings fail validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<ApsAdapterError>> {
        let environment = Environment::default()
            .prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(ApsAdapterError::Configuration {
                message: "failed to assemble configuration sources".to_string(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(ApsAdapterError::Configuration {
                    message: "failed to deserialize settings".to_string(),
                })?;

        settings
            .validate()
            .change_context(ApsAdapterError::Configuration {
                message: "settings validation failed".to_string(),
            })?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let settings = Settings::from_toml("").expect("empty TOML should load defaults");
        assert!(settings.aps.enabled);
        assert!(settings.aps.telemetry);
        assert_eq!(settings.aps.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.aps.account_id, None);
        assert!(!settings.aps.debug);
        assert_eq!(settings.aps.renderer_url(), DEFAULT_CREATIVE_URL);
    }

    #[test]
    fn test_account_id_accepts_string_and_integer() {
        let from_string = Settings::from_toml("[aps]\naccount_id = \"5128\"\n")
            .expect("string account id should load");
        assert_eq!(
            from_string.aps.account_id,
            Some(AccountId::Text("5128".to_string()))
        );

        let from_integer =
            Settings::from_toml("[aps]\naccount_id = 5128\n").expect("integer account id");
        assert_eq!(from_integer.aps.account_id, Some(AccountId::Number(5128.0)));
    }

    #[test]
    fn test_full_table_round_trip() {
        let toml = r#"
[aps]
enabled = true
telemetry = false
account_id = "5128"
debug = true
debug_url = "https://debug.example.com/e/dtb/bid"
render_method = "fif"
creative_url = "https://cdn.example.com/render.js"
"#;
        let settings = Settings::from_toml(toml).expect("full table should load");
        assert!(!settings.aps.telemetry);
        assert!(settings.aps.debug);
        assert_eq!(settings.aps.render_method.as_deref(), Some("fif"));
        assert_eq!(settings.aps.renderer_url(), "https://cdn.example.com/render.js");
    }

    #[test]
    fn test_invalid_debug_url_fails_validation() {
        let result = Settings::from_toml("[aps]\ndebug_url = \"not a url\"\n");
        assert!(result.is_err(), "malformed debug_url should fail validation");
    }

    #[test]
    fn test_environment_overrides_toml() {
        temp_env::with_var("APS_ADAPTER__APS__TELEMETRY", Some("false"), || {
            let settings =
                Settings::from_toml("[aps]\ntelemetry = true\n").expect("should load settings");
            assert!(!settings.aps.telemetry, "env var should override TOML");
        });
    }

    #[test]
    fn test_endpoint_url_without_debug() {
        let config = ApsConfig::default();
        assert_eq!(config.endpoint_url().expect("should resolve"), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_endpoint_url_prefers_debug_override() {
        let config = ApsConfig {
            debug_url: Some("https://debug.example.com/bid".to_string()),
            ..ApsConfig::default()
        };
        assert_eq!(
            config.endpoint_url().expect("should resolve"),
            "https://debug.example.com/bid"
        );
    }

    #[test]
    fn test_endpoint_url_appends_debug_flag() {
        let config = ApsConfig {
            debug: true,
            ..ApsConfig::default()
        };
        let url = config.endpoint_url().expect("should resolve");
        assert_eq!(url, format!("{DEFAULT_ENDPOINT}?amzn_debug_mode=1"));
    }

    #[test]
    fn test_endpoint_url_fif_render_method_doubles_flag() {
        let config = ApsConfig {
            debug: true,
            render_method: Some("fif".to_string()),
            ..ApsConfig::default()
        };
        let url = config.endpoint_url().expect("should resolve");
        assert_eq!(
            url,
            format!("{DEFAULT_ENDPOINT}?amzn_debug_mode=fif&amzn_debug_mode=1")
        );
    }

    #[test]
    fn test_endpoint_url_non_fif_render_method_single_flag() {
        let config = ApsConfig {
            debug: true,
            render_method: Some("script".to_string()),
            ..ApsConfig::default()
        };
        let url = config.endpoint_url().expect("should resolve");
        assert_eq!(url, format!("{DEFAULT_ENDPOINT}?amzn_debug_mode=1"));
    }
}
