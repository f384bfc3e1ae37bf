//! Icon download tool definition.
//!
//! The marketplace answers either with the raw file or with a JSON document
//! carrying `base64_encoded_file`. Both come back to the caller as base64.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::signer;
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::definitions::common::{endpoint, media_type_for};
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const FILETYPES: &[&str] = &["png", "svg"];

const NO_DATA: &str = "No image data in response";

/// Output format of a downloaded icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IconFiletype {
    Png,
    Svg,
}

impl IconFiletype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Parameters for the icon download tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DownloadIconParams {
    /// Numeric icon id from search_icons.
    pub icon_id: u64,

    /// File format.
    pub filetype: IconFiletype,

    /// Hex color without '#', e.g. "FF8800".
    #[serde(default)]
    pub color: Option<String>,

    /// Pixel size for PNG downloads (20-1200). Ignored for SVG.
    #[serde(default)]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IconDownload {
    pub icon_id: u64,
    pub filetype: IconFiletype,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
struct EncodedFile {
    #[serde(default)]
    base64_encoded_file: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
}

/// Icon download tool.
pub struct IconDownloadTool {
    config: Arc<Config>,
}

impl IconDownloadTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for IconDownloadTool {
    type Params = DownloadIconParams;
    type Context = DownloadIconParams;
    type Output = IconDownload;

    const NAME: &'static str = "download_icon";
    const DESCRIPTION: &'static str = "Download an icon by id as PNG or SVG, optionally \
        recolored and (for PNG) resized. Returns the file as base64.";
    const FAILURE_CONTEXT: &'static str = "Download";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("icon_id", ParamKind::Integer).range(1.0, u32::MAX as f64),
        ParameterSpec::required("filetype", ParamKind::Enum(FILETYPES)),
        ParameterSpec::optional("color", ParamKind::String)
            .pattern("^[0-9A-Fa-f]{6}$", "6-digit hex color such as FF8800"),
        ParameterSpec::optional("size", ParamKind::Integer).range(20.0, 1200.0),
    ];

    fn prepare(
        &self,
        params: DownloadIconParams,
    ) -> Result<(UpstreamRequest, DownloadIconParams), ToolError> {
        let signer = signer(&self.config)?;

        let path = format!("/v2/icon/{}/download", params.icon_id);
        let size = match params.filetype {
            IconFiletype::Png => params.size,
            IconFiletype::Svg => None,
        };

        let request = UpstreamRequest::get(endpoint(&self.config.tools.noun_project_base_url, &path))
            .query("filetype", params.filetype.as_str())
            .query_opt("color", params.color.as_deref())
            .query_opt("size", size)
            .signed_with(signer);

        Ok((request, params))
    }

    fn normalize(
        &self,
        params: DownloadIconParams,
        response: UpstreamResponse,
    ) -> Result<IconDownload, ToolError> {
        let fallback_type = media_type_for(params.filetype.as_str());

        let (content_type, data) = if response.is_json() {
            let file: EncodedFile = response.decode()?;
            let data = file
                .base64_encoded_file
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| ToolError::normalization(NO_DATA))?;
            BASE64
                .decode(data.trim())
                .map_err(|e| ToolError::normalization(format!("file is not valid base64: {e}")))?;
            let content_type = file
                .content_type
                .unwrap_or_else(|| fallback_type.to_string());
            (content_type, data.trim().to_string())
        } else {
            if response.body.is_empty() {
                return Err(ToolError::normalization(NO_DATA));
            }
            let content_type = response
                .media_type()
                .filter(|mt| mt != "application/octet-stream")
                .unwrap_or_else(|| fallback_type.to_string());
            (content_type, BASE64.encode(&response.body))
        };

        debug!(icon_id = params.icon_id, content_type = %content_type, "Icon downloaded");

        Ok(IconDownload {
            icon_id: params.icon_id,
            filetype: params.filetype,
            content_type,
            data,
        })
    }
}
