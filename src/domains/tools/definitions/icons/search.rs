//! Icon search tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::signer;
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::definitions::common::endpoint;
use crate::domains::tools::error::{ToolError, ValidationError};
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const STYLES: &[&str] = &["solid", "line"];

/// A single weight 1-60, or an ascending range such as `18-20`.
const LINE_WEIGHT_PATTERN: &str = r"^([1-9]|[1-5][0-9]|60)(-([1-9]|[1-5][0-9]|60))?$";

/// Icon drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IconStyle {
    Solid,
    Line,
}

impl IconStyle {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Line => "line",
        }
    }
}

/// Parameters for the icon search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchIconsParams {
    /// Search term, e.g. "rocket".
    pub query: String,

    /// Only return icons drawn in these styles.
    #[serde(default)]
    pub styles: Vec<IconStyle>,

    /// Line weight filter for line icons: "18" or "18-20" (1-60).
    #[serde(default)]
    pub line_weight: Option<String>,

    /// Maximum number of icons (1-100, default 20).
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconSummary {
    pub id: IconId,
    pub term: String,
    pub preview_url: String,
    pub permalink: String,
    pub attribution: String,
    pub styles: Vec<String>,
    pub tags: Vec<String>,
    pub license: String,
}

/// Icon identifiers are numeric in some API versions and strings in others;
/// they are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IconId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct IconSearchResult {
    pub icons: Vec<IconSummary>,
    pub count: usize,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    icons: Vec<RawIcon>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct RawIcon {
    id: IconId,
    term: String,
    thumbnail_url: String,
    permalink: String,
    attribution: String,
    license_description: String,
    #[serde(default)]
    styles: Vec<RawStyle>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawStyle {
    style: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTag {
    Plain(String),
    Term { term: String },
}

impl RawTag {
    fn into_term(self) -> String {
        match self {
            Self::Plain(term) | Self::Term { term } => term,
        }
    }
}

/// Check that a range is ascending; the pattern already bounds each side.
fn check_line_weight(weight: &str) -> Result<(), ValidationError> {
    if let Some((low, high)) = weight.split_once('-') {
        let low: u8 = low.parse().unwrap_or(0);
        let high: u8 = high.parse().unwrap_or(0);
        if low > high {
            return Err(ValidationError::invalid(
                "line_weight",
                format!("range {weight} must be ascending"),
            ));
        }
    }
    Ok(())
}

/// Icon search tool.
pub struct IconSearchTool {
    config: Arc<Config>,
}

impl IconSearchTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for IconSearchTool {
    type Params = SearchIconsParams;
    type Context = ();
    type Output = IconSearchResult;

    const NAME: &'static str = "search_icons";
    const DESCRIPTION: &'static str = "Search the icon library by keyword, optionally \
        filtered by style (solid or line) and line weight. Returns icon ids for download_icon.";
    const FAILURE_CONTEXT: &'static str = "Search";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("query", ParamKind::String),
        ParameterSpec::optional("styles", ParamKind::List(&ParamKind::Enum(STYLES))),
        ParameterSpec::optional("line_weight", ParamKind::String)
            .pattern(LINE_WEIGHT_PATTERN, "a weight from 1 to 60, or a range such as 18-20"),
        ParameterSpec::optional("limit", ParamKind::Integer)
            .with_default(DefaultValue::Int(20))
            .clamp(1, 100),
    ];

    fn prepare(&self, params: SearchIconsParams) -> Result<(UpstreamRequest, ()), ToolError> {
        let signer = signer(&self.config)?;

        let url = endpoint(&self.config.tools.noun_project_base_url, "/v2/icon");
        let mut request = UpstreamRequest::get(url)
            .query("query", &params.query)
            .query("limit", params.limit);

        if !params.styles.is_empty() {
            let styles: Vec<&str> = params.styles.iter().map(IconStyle::as_str).collect();
            request = request.query("styles", styles.join(","));

            if let Some(weight) = &params.line_weight {
                if params.styles.contains(&IconStyle::Line) {
                    check_line_weight(weight)?;
                    request = request.query("line_weight", weight);
                }
            }
        }

        Ok((request.signed_with(signer), ()))
    }

    fn normalize(&self, _: (), response: UpstreamResponse) -> Result<IconSearchResult, ToolError> {
        let body: SearchResponse = response.decode()?;

        let icons: Vec<IconSummary> = body
            .icons
            .into_iter()
            .map(|icon| IconSummary {
                id: icon.id,
                term: icon.term,
                preview_url: icon.thumbnail_url,
                permalink: icon.permalink,
                attribution: icon.attribution,
                styles: icon.styles.into_iter().map(|s| s.style).collect(),
                tags: icon.tags.into_iter().map(RawTag::into_term).collect(),
                license: icon.license_description,
            })
            .collect();

        Ok(IconSearchResult {
            count: icons.len(),
            total: body.total,
            icons,
        })
    }
}
