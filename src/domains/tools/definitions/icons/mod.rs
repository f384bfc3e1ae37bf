//! Icon marketplace tools.
//!
//! Both tools sign their requests with two-legged OAuth 1.0a using the
//! project's client key and secret.

mod download;
mod search;

pub use download::{DownloadIconParams, IconDownloadTool, IconFiletype};
pub use search::{IconSearchTool, IconStyle, SearchIconsParams};

use super::common::require_setting;
use crate::core::config::Config;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::upstream::OAuth1Signer;

const MISSING_CREDENTIALS: &str =
    "Missing API credentials: set NOUN_PROJECT_CLIENT_KEY and NOUN_PROJECT_CLIENT_SECRET";

/// Build the OAuth1 signer, or fail before any request is made.
fn signer(config: &Config) -> Result<OAuth1Signer, ToolError> {
    let credentials = &config.credentials;
    let key = require_setting(
        credentials.noun_project_client_key.as_deref(),
        MISSING_CREDENTIALS,
    )?;
    let secret = require_setting(
        credentials.noun_project_client_secret.as_deref(),
        MISSING_CREDENTIALS,
    )?;
    Ok(OAuth1Signer::new(key, secret))
}

#[cfg(test)]
fn test_config() -> Config {
    let mut config = Config::default();
    config.credentials.noun_project_client_key = Some("ck".into());
    config.credentials.noun_project_client_secret = Some("cs".into());
    config
}
