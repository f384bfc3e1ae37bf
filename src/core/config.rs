//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup (environment variables, optionally
//! seeded from a `.env` file) and then shared read-only as `Arc<Config>`.
//! Missing credentials are not an error here: each tool reports them when it
//! is called.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_GOOGLE_CSE_API_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_NOUN_PROJECT_BASE_URL: &str = "https://api.thenounproject.com";
pub const DEFAULT_NASA_IMAGES_API_URL: &str = "https://images-api.nasa.gov";

/// Chart location used when neither the caller nor the environment gives one.
pub const DEFAULT_CHART_LOCATION: (f64, f64) = (42.48, -71.02);

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// External API credentials configuration.
    pub credentials: CredentialsConfig,

    /// Upstream endpoints and tool behaviour.
    pub tools: ToolsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for external API credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Search engine API key (`GOOGLE_API_KEY`).
    pub google_api_key: Option<String>,

    /// Programmable search engine identifier (`GOOGLE_CSE_ID`).
    pub google_cse_id: Option<String>,

    /// Icon marketplace OAuth consumer key (`NOUN_PROJECT_CLIENT_KEY`).
    pub noun_project_client_key: Option<String>,

    /// Icon marketplace OAuth consumer secret (`NOUN_PROJECT_CLIENT_SECRET`).
    pub noun_project_client_secret: Option<String>,

    /// Optional NASA API token (`NASA_API_KEY`).
    pub nasa_api_key: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> Option<&'static str> {
            value.as_ref().map(|_| "[REDACTED]")
        }

        f.debug_struct("CredentialsConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_cse_id", &redact(&self.google_cse_id))
            .field("noun_project_client_key", &redact(&self.noun_project_client_key))
            .field(
                "noun_project_client_secret",
                &redact(&self.noun_project_client_secret),
            )
            .field("nasa_api_key", &redact(&self.nasa_api_key))
            .finish()
    }
}

/// A group of actions that would be deployed together as one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolGroup {
    ImageSearch,
    Icons,
    Speech,
    Nasa,
    Astrology,
}

impl ToolGroup {
    pub const ALL: [ToolGroup; 5] = [
        Self::ImageSearch,
        Self::Icons,
        Self::Speech,
        Self::Nasa,
        Self::Astrology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageSearch => "image_search",
            Self::Icons => "icons",
            Self::Speech => "speech",
            Self::Nasa => "nasa",
            Self::Astrology => "astrology",
        }
    }
}

impl FromStr for ToolGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown tool group '{s}'"))
    }
}

/// Upstream endpoints and per-tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Tool groups registered at startup.
    pub enabled: Vec<ToolGroup>,

    /// Timeout applied to every upstream request.
    pub upstream_timeout_secs: u64,

    /// Search engine endpoint (`GOOGLE_CSE_API_URL`).
    pub google_cse_api_url: String,

    /// Icon marketplace API root (`NOUN_PROJECT_BASE_URL`).
    pub noun_project_base_url: String,

    /// NASA image library API root (`NASA_IMAGES_API_URL`).
    pub nasa_images_api_url: String,

    /// OpenAI-compatible TTS server base URL (`ORPHEUS_TTS_URL`).
    pub orpheus_tts_url: Option<String>,

    /// Chart calculation service base URL (`ASTROLOGY_API_URL`).
    pub astrology_api_url: Option<String>,

    /// Fallback chart latitude (`DEFAULT_LATITUDE`).
    pub default_latitude: f64,

    /// Fallback chart longitude (`DEFAULT_LONGITUDE`).
    pub default_longitude: f64,

    /// Directory generated files are written under (`MCP_OUTPUTS_DIR`).
    pub outputs_dir: PathBuf,

    /// Public URL that serves `outputs_dir` (`OUTPUTS_WEB_BASE_URL`).
    pub outputs_web_base_url: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: ToolGroup::ALL.to_vec(),
            upstream_timeout_secs: 30,
            google_cse_api_url: DEFAULT_GOOGLE_CSE_API_URL.to_string(),
            noun_project_base_url: DEFAULT_NOUN_PROJECT_BASE_URL.to_string(),
            nasa_images_api_url: DEFAULT_NASA_IMAGES_API_URL.to_string(),
            orpheus_tts_url: None,
            astrology_api_url: None,
            default_latitude: DEFAULT_CHART_LOCATION.0,
            default_longitude: DEFAULT_CHART_LOCATION.1,
            outputs_dir: PathBuf::from("outputs"),
            outputs_web_base_url: None,
        }
    }
}

impl ToolsConfig {
    /// Timeout applied to every upstream request.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "mcp-operator".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            credentials: CredentialsConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(name) = get("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = get("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_lookup(&get);

        let credentials = &mut config.credentials;
        credentials.google_api_key = get("GOOGLE_API_KEY");
        credentials.google_cse_id = get("GOOGLE_CSE_ID");
        credentials.noun_project_client_key = get("NOUN_PROJECT_CLIENT_KEY");
        credentials.noun_project_client_secret = get("NOUN_PROJECT_CLIENT_SECRET");
        credentials.nasa_api_key = get("NASA_API_KEY");

        let tools = &mut config.tools;

        if let Some(enabled) = get("MCP_ENABLED_TOOLS") {
            tools.enabled = enabled
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|s| match s.parse::<ToolGroup>() {
                    Ok(group) => Some(group),
                    Err(e) => {
                        warn!("Ignoring MCP_ENABLED_TOOLS entry: {}", e);
                        None
                    }
                })
                .collect();
        }

        if let Some(timeout) = get("MCP_UPSTREAM_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => tools.upstream_timeout_secs = secs,
                Err(_) => warn!("Invalid MCP_UPSTREAM_TIMEOUT_SECS '{}', keeping default", timeout),
            }
        }

        if let Some(url) = get("GOOGLE_CSE_API_URL") {
            tools.google_cse_api_url = url;
        }
        if let Some(url) = get("NOUN_PROJECT_BASE_URL") {
            tools.noun_project_base_url = url;
        }
        if let Some(url) = get("NASA_IMAGES_API_URL") {
            tools.nasa_images_api_url = url;
        }
        tools.orpheus_tts_url = get("ORPHEUS_TTS_URL");
        tools.astrology_api_url = get("ASTROLOGY_API_URL");
        if let Some(lat) = parse_coordinate(get("DEFAULT_LATITUDE"), "DEFAULT_LATITUDE", 90.0) {
            tools.default_latitude = lat;
        }
        if let Some(lon) = parse_coordinate(get("DEFAULT_LONGITUDE"), "DEFAULT_LONGITUDE", 180.0) {
            tools.default_longitude = lon;
        }

        if let Some(dir) = get("MCP_OUTPUTS_DIR") {
            tools.outputs_dir = PathBuf::from(dir);
        }
        tools.outputs_web_base_url = get("OUTPUTS_WEB_BASE_URL");

        config
    }

    /// Log enabled groups and warn about missing settings.
    pub fn log_summary(&self) {
        let enabled: Vec<_> = self.tools.enabled.iter().map(|g| g.as_str()).collect();
        info!("Enabled tool groups: {}", enabled.join(", "));

        if self.credentials.google_api_key.is_none() || self.credentials.google_cse_id.is_none() {
            warn!("GOOGLE_API_KEY or GOOGLE_CSE_ID not set - image search calls will fail");
        }
        if self.credentials.noun_project_client_key.is_none()
            || self.credentials.noun_project_client_secret.is_none()
        {
            warn!("Icon marketplace credentials not set - icon calls will fail");
        }
        if self.tools.outputs_web_base_url.is_none() {
            warn!("OUTPUTS_WEB_BASE_URL not set - chart image actions cannot return URLs");
        }
    }
}

/// Parse a coordinate override. Values outside `-limit..=limit` are ignored.
fn parse_coordinate(raw: Option<String>, key: &str, limit: f64) -> Option<f64> {
    let raw = raw?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && (-limit..=limit).contains(&v) => Some(v),
        Ok(_) => {
            warn!("Ignoring {}: '{}' is outside -{}..={}", key, raw, limit, limit);
            None
        }
        Err(_) => {
            warn!("Ignoring {}: '{}' is not a number", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("GOOGLE_CSE_ID", "cse-1"),
            ("NOUN_PROJECT_CLIENT_KEY", "nk"),
            ("NOUN_PROJECT_CLIENT_SECRET", "ns"),
        ]));
        assert_eq!(config.credentials.google_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.credentials.google_cse_id.as_deref(), Some("cse-1"));
        assert_eq!(config.credentials.noun_project_client_key.as_deref(), Some("nk"));
        assert_eq!(
            config.credentials.noun_project_client_secret.as_deref(),
            Some("ns")
        );
        assert!(config.credentials.nasa_api_key.is_none());
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")]));
        assert!(config.credentials.google_api_key.is_none());
    }

    #[test]
    fn test_endpoint_defaults_and_overrides() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.tools.google_cse_api_url, DEFAULT_GOOGLE_CSE_API_URL);
        assert_eq!(config.tools.noun_project_base_url, DEFAULT_NOUN_PROJECT_BASE_URL);
        assert!(config.tools.astrology_api_url.is_none());

        let config = Config::from_lookup(lookup(&[
            ("NOUN_PROJECT_BASE_URL", "http://localhost:9000"),
            ("ASTROLOGY_API_URL", "http://charts:8000"),
            ("MCP_UPSTREAM_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.tools.noun_project_base_url, "http://localhost:9000");
        assert_eq!(config.tools.astrology_api_url.as_deref(), Some("http://charts:8000"));
        assert_eq!(config.tools.upstream_timeout_secs, 5);
    }

    #[test]
    fn test_default_location() {
        let config = Config::from_lookup(lookup(&[
            ("DEFAULT_LATITUDE", "42.48"),
            ("DEFAULT_LONGITUDE", "not-a-number"),
        ]));
        assert_eq!(config.tools.default_latitude, 42.48);
        assert_eq!(config.tools.default_longitude, DEFAULT_CHART_LOCATION.1);

        let config = Config::from_lookup(lookup(&[
            ("DEFAULT_LATITUDE", "-33.87"),
            ("DEFAULT_LONGITUDE", "151.21"),
        ]));
        assert_eq!(config.tools.default_latitude, -33.87);
        assert_eq!(config.tools.default_longitude, 151.21);
    }

    #[test]
    fn test_default_location_out_of_range_is_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("DEFAULT_LATITUDE", "500"),
            ("DEFAULT_LONGITUDE", "NaN"),
        ]));
        assert_eq!(
            (config.tools.default_latitude, config.tools.default_longitude),
            DEFAULT_CHART_LOCATION
        );

        let config = Config::from_lookup(lookup(&[
            ("DEFAULT_LATITUDE", "inf"),
            ("DEFAULT_LONGITUDE", "-180.5"),
        ]));
        assert_eq!(
            (config.tools.default_latitude, config.tools.default_longitude),
            DEFAULT_CHART_LOCATION
        );
    }

    #[test]
    fn test_enabled_tools() {
        let config = Config::from_lookup(lookup(&[("MCP_ENABLED_TOOLS", "icons, astrology,bogus")]));
        assert_eq!(
            config.tools.enabled,
            vec![ToolGroup::Icons, ToolGroup::Astrology]
        );

        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.tools.enabled.len(), ToolGroup::ALL.len());
    }

    #[test]
    fn test_credentials_redacted_in_debug() {
        let creds = CredentialsConfig {
            google_api_key: Some("super_secret_key".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }
}
