//! Image search tool definition.
//!
//! Wraps a programmable search engine's image vertical. The API key travels
//! as the `key` query parameter; the engine identifier as `cx`.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::require_setting;
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{ApiKeyQuery, UpstreamRequest, UpstreamResponse};

/// Upper bound the search engine accepts for `num`.
pub const MAX_IMAGES_PER_SEARCH: i64 = 10;

const SAFE_SEARCH_LEVELS: &[&str] = &["active", "off"];

const MISSING_CREDENTIALS: &str =
    "Missing API credentials: set GOOGLE_API_KEY and GOOGLE_CSE_ID to enable image search";

/// Safe-search filtering level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    Active,
    Off,
}

impl SafeSearch {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Off => "off",
        }
    }
}

/// Parameters for the image search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchImagesParams {
    /// What to search for.
    pub query: String,

    /// Number of images to return (1-10, default 5). Larger values are narrowed to 10.
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Safe-search level.
    #[serde(default)]
    pub safe_search: SafeSearch,

    /// Restrict results to one site, e.g. "nasa.gov".
    #[serde(default)]
    pub site_restrict: Option<String>,
}

fn default_num_results() -> u32 {
    5
}

/// One image hit. Fields the engine omits are reported as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageHit {
    pub title: Option<String>,
    pub url: String,
    pub source_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Result of an image search.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSearchResult {
    pub images: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    link: String,
    image: Option<ItemImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemImage {
    context_link: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Image search tool.
pub struct ImageSearchTool {
    config: Arc<Config>,
}

impl ImageSearchTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for ImageSearchTool {
    type Params = SearchImagesParams;
    type Context = ();
    type Output = ImageSearchResult;

    const NAME: &'static str = "search_images";
    const DESCRIPTION: &'static str = "Search the web for images. Returns up to 10 results with \
        the image URL, the page it was found on, its title and its pixel dimensions.";
    const FAILURE_CONTEXT: &'static str = "Search";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("query", ParamKind::String),
        ParameterSpec::optional("num_results", ParamKind::Integer)
            .with_default(DefaultValue::Int(5))
            .clamp(1, MAX_IMAGES_PER_SEARCH),
        ParameterSpec::optional("safe_search", ParamKind::Enum(SAFE_SEARCH_LEVELS))
            .with_default(DefaultValue::Str("active")),
        ParameterSpec::optional("site_restrict", ParamKind::String),
    ];

    fn prepare(&self, params: SearchImagesParams) -> Result<(UpstreamRequest, ()), ToolError> {
        let credentials = &self.config.credentials;
        let api_key = require_setting(credentials.google_api_key.as_deref(), MISSING_CREDENTIALS)?;
        let engine_id = require_setting(credentials.google_cse_id.as_deref(), MISSING_CREDENTIALS)?;

        let request = UpstreamRequest::get(&self.config.tools.google_cse_api_url)
            .query("cx", engine_id)
            .query("q", &params.query)
            .query("searchType", "image")
            .query("num", params.num_results)
            .query("safe", params.safe_search.as_str())
            .query_opt("siteSearch", params.site_restrict.as_deref())
            .signed_with(ApiKeyQuery::new("key", api_key));

        Ok((request, ()))
    }

    fn normalize(&self, _: (), response: UpstreamResponse) -> Result<ImageSearchResult, ToolError> {
        let body: SearchResponse = response.decode()?;

        let images = body
            .items
            .into_iter()
            .map(|item| {
                let image = item.image;
                ImageHit {
                    title: item.title,
                    url: item.link,
                    source_url: image.as_ref().and_then(|i| i.context_link.clone()),
                    width: image.as_ref().and_then(|i| i.width),
                    height: image.as_ref().and_then(|i| i.height),
                }
            })
            .collect();

        Ok(ImageSearchResult { images })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::action::run_action;
    use crate::domains::tools::testing::StubClient;
    use serde_json::{Map, Value, json};

    fn configured() -> ImageSearchTool {
        let mut config = Config::default();
        config.credentials.google_api_key = Some("test-key".into());
        config.credentials.google_cse_id = Some("engine-1".into());
        ImageSearchTool::new(Arc::new(config))
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_items() {
        let client = StubClient::json(json!({
            "items": [
                {
                    "title": "Nebula",
                    "link": "https://img.test/a.jpg",
                    "image": {"contextLink": "https://page.test/a", "width": 800, "height": 600}
                },
                {"link": "https://img.test/b.jpg"}
            ]
        }));

        let response = run_action(&configured(), &client, &args(json!({"query": "nebula"}))).await;
        assert!(response.is_successful(), "{:?}", response.error());
        assert_eq!(
            response.result().unwrap(),
            &json!({"images": [
                {"title": "Nebula", "url": "https://img.test/a.jpg",
                 "source_url": "https://page.test/a", "width": 800, "height": 600},
                {"title": null, "url": "https://img.test/b.jpg",
                 "source_url": null, "width": null, "height": null}
            ]})
        );

        let request = client.last_request().unwrap();
        assert_eq!(request.query_value("q"), Some("nebula"));
        assert_eq!(request.query_value("cx"), Some("engine-1"));
        assert_eq!(request.query_value("searchType"), Some("image"));
        assert_eq!(request.query_value("num"), Some("5"));
        assert_eq!(request.query_value("safe"), Some("active"));
        assert_eq!(request.query_value("key"), Some("test-key"));
        assert_eq!(request.query_value("siteSearch"), None);
    }

    #[tokio::test]
    async fn test_num_results_clamped_to_ten() {
        let client = StubClient::json(json!({"items": []}));
        let arguments = args(json!({"query": "x", "num_results": 37, "site_restrict": "nasa.gov"}));
        run_action(&configured(), &client, &arguments).await;

        let request = client.last_request().unwrap();
        assert_eq!(request.query_value("num"), Some("10"));
        assert_eq!(request.query_value("siteSearch"), Some("nasa.gov"));
    }

    #[tokio::test]
    async fn test_zero_results_is_success() {
        let client = StubClient::json(json!({"kind": "customsearch#search"}));
        let response = run_action(&configured(), &client, &args(json!({"query": "zzzz"}))).await;
        assert!(response.is_successful());
        assert_eq!(response.result().unwrap(), &json!({"images": []}));
    }

    #[tokio::test]
    async fn test_missing_credentials_never_calls_upstream() {
        let client = StubClient::json(json!({}));
        let tool = ImageSearchTool::new(Arc::new(Config::default()));
        let response = run_action(&tool, &client, &args(json!({"query": "Orion"}))).await;

        assert!(!response.is_successful());
        assert!(response.error().unwrap().starts_with("Missing API credentials"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_item_without_link_is_normalization_failure() {
        let client = StubClient::json(json!({"items": [{"title": "no link"}]}));
        let response = run_action(&configured(), &client, &args(json!({"query": "x"}))).await;
        assert!(
            response
                .error()
                .unwrap()
                .starts_with("Search failed: invalid upstream response")
        );
    }
}
