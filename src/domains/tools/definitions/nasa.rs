//! NASA Image and Video Library tools.
//!
//! The library is public; when `NASA_API_KEY` is set it is sent as a bearer
//! token.

use std::sync::Arc;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::endpoint;
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::{ToolError, ValidationError};
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{BearerToken, UpstreamRequest, UpstreamResponse};

const MEDIA_TYPES: &[&str] = &["image", "video", "audio"];

/// Characters escaped when a NASA id is used as a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

const EARLIEST_YEAR: f64 = 1900.0;
const LATEST_YEAR: f64 = 2100.0;

/// `/{kind}/{id}` with `id` escaped as a single path segment.
fn item_path(kind: &str, id: &str) -> String {
    format!("/{kind}/{}", utf8_percent_encode(id, PATH_SEGMENT))
}

/// Attach the bearer token when one is configured.
fn authorize(request: UpstreamRequest, config: &Config) -> UpstreamRequest {
    match config.credentials.nasa_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => request.signed_with(BearerToken::new(key.trim())),
        _ => request,
    }
}

// ============================================================================
// search_nasa_images
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NasaMediaType {
    Image,
    Video,
    Audio,
}

impl NasaMediaType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// Parameters for the NASA search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchNasaImagesParams {
    /// Free-text search terms.
    pub query: String,

    /// Restrict to one media type.
    #[serde(default)]
    pub media_type: Option<NasaMediaType>,

    /// Earliest year of creation.
    #[serde(default)]
    pub year_start: Option<u16>,

    /// Latest year of creation.
    #[serde(default)]
    pub year_end: Option<u16>,

    /// Result page, starting at 1.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Results per page (1-100, default 25).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    25
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaItem {
    pub nasa_id: String,
    pub title: String,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub date_created: Option<String>,
    pub center: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaSearchResult {
    pub items: Vec<NasaItem>,
    pub total_hits: u64,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    collection: SearchCollection,
}

#[derive(Debug, Deserialize)]
struct SearchCollection {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    metadata: Option<CollectionMetadata>,
}

#[derive(Debug, Deserialize)]
struct CollectionMetadata {
    #[serde(default)]
    total_hits: u64,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    data: Vec<ItemData>,
    #[serde(default)]
    links: Vec<ItemLink>,
}

#[derive(Debug, Deserialize)]
struct ItemData {
    nasa_id: String,
    title: String,
    description: Option<String>,
    media_type: Option<String>,
    date_created: Option<String>,
    center: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemLink {
    href: String,
}

/// NASA image search tool.
pub struct NasaSearchTool {
    config: Arc<Config>,
}

impl NasaSearchTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for NasaSearchTool {
    type Params = SearchNasaImagesParams;
    type Context = ();
    type Output = NasaSearchResult;

    const NAME: &'static str = "search_nasa_images";
    const DESCRIPTION: &'static str = "Search the NASA Image and Video Library. Returns NASA ids, \
        titles, descriptions and preview links; use get_nasa_asset for the full files.";
    const FAILURE_CONTEXT: &'static str = "NASA search";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("query", ParamKind::String),
        ParameterSpec::optional("media_type", ParamKind::Enum(MEDIA_TYPES)),
        ParameterSpec::optional("year_start", ParamKind::Integer).range(EARLIEST_YEAR, LATEST_YEAR),
        ParameterSpec::optional("year_end", ParamKind::Integer).range(EARLIEST_YEAR, LATEST_YEAR),
        ParameterSpec::optional("page", ParamKind::Integer)
            .with_default(DefaultValue::Int(1))
            .range(1.0, 10_000.0),
        ParameterSpec::optional("page_size", ParamKind::Integer)
            .with_default(DefaultValue::Int(25))
            .clamp(1, 100),
    ];

    fn prepare(&self, params: SearchNasaImagesParams) -> Result<(UpstreamRequest, ()), ToolError> {
        if let (Some(start), Some(end)) = (params.year_start, params.year_end) {
            if start > end {
                return Err(ValidationError::invalid(
                    "year_start",
                    format!("{start} is after year_end {end}"),
                )
                .into());
            }
        }

        let url = endpoint(&self.config.tools.nasa_images_api_url, "/search");
        let request = UpstreamRequest::get(url)
            .query("q", &params.query)
            .query_opt("media_type", params.media_type.as_ref().map(NasaMediaType::as_str))
            .query_opt("year_start", params.year_start)
            .query_opt("year_end", params.year_end)
            .query("page", params.page)
            .query("page_size", params.page_size);

        Ok((authorize(request, &self.config), ()))
    }

    fn normalize(&self, _: (), response: UpstreamResponse) -> Result<NasaSearchResult, ToolError> {
        let body: SearchEnvelope = response.decode()?;
        collect_items(body.collection)
    }
}

/// Flatten a search-style collection into items. Shared by search and albums.
fn collect_items(collection: SearchCollection) -> Result<NasaSearchResult, ToolError> {
    let items = collection
        .items
        .into_iter()
        .map(|item| {
            let preview_url = item.links.into_iter().next().map(|l| l.href);
            let data = item
                .data
                .into_iter()
                .next()
                .ok_or_else(|| ToolError::normalization("search item without data"))?;
            Ok(NasaItem {
                nasa_id: data.nasa_id,
                title: data.title,
                description: data.description,
                media_type: data.media_type,
                date_created: data.date_created,
                center: data.center,
                preview_url,
            })
        })
        .collect::<Result<Vec<_>, ToolError>>()?;

    Ok(NasaSearchResult {
        total_hits: collection.metadata.map(|m| m.total_hits).unwrap_or(0),
        items,
    })
}

// ============================================================================
// get_nasa_asset
// ============================================================================

/// Parameters for the NASA asset tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetNasaAssetParams {
    /// NASA id from search_nasa_images, e.g. "as11-40-5874".
    pub nasa_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaAsset {
    pub nasa_id: String,
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    collection: AssetCollection,
}

#[derive(Debug, Deserialize)]
struct AssetCollection {
    #[serde(default)]
    items: Vec<ItemLink>,
}

/// NASA asset manifest tool.
pub struct NasaAssetTool {
    config: Arc<Config>,
}

impl NasaAssetTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for NasaAssetTool {
    type Params = GetNasaAssetParams;
    type Context = String;
    type Output = NasaAsset;

    const NAME: &'static str = "get_nasa_asset";
    const DESCRIPTION: &'static str = "List the downloadable files (all sizes and formats) of \
        one NASA library item.";
    const FAILURE_CONTEXT: &'static str = "NASA asset lookup";
    const PARAMETERS: &'static [ParameterSpec] =
        &[ParameterSpec::required("nasa_id", ParamKind::String)];

    fn prepare(&self, params: GetNasaAssetParams) -> Result<(UpstreamRequest, String), ToolError> {
        let path = item_path("asset", &params.nasa_id);
        let request = UpstreamRequest::get(endpoint(&self.config.tools.nasa_images_api_url, &path));
        Ok((authorize(request, &self.config), params.nasa_id))
    }

    fn normalize(&self, nasa_id: String, response: UpstreamResponse) -> Result<NasaAsset, ToolError> {
        let body: AssetEnvelope = response.decode()?;
        Ok(NasaAsset {
            nasa_id,
            files: body.collection.items.into_iter().map(|i| i.href).collect(),
        })
    }
}

// ============================================================================
// get_nasa_metadata / get_nasa_captions
// ============================================================================

/// Parameters for the NASA metadata and captions tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NasaItemParams {
    /// NASA id from search_nasa_images.
    pub nasa_id: String,
}

/// The library answers both lookups with the URL of a file.
#[derive(Debug, Deserialize)]
struct LocationEnvelope {
    location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaMetadata {
    pub nasa_id: String,
    pub metadata_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaCaptions {
    pub nasa_id: String,
    pub captions_url: String,
}

/// GET `/{kind}/{nasa_id}`, bearer-signed when a key is configured.
fn location_request(config: &Config, kind: &str, nasa_id: &str) -> UpstreamRequest {
    let path = item_path(kind, nasa_id);
    authorize(
        UpstreamRequest::get(endpoint(&config.tools.nasa_images_api_url, &path)),
        config,
    )
}

/// NASA metadata location tool.
pub struct NasaMetadataTool {
    config: Arc<Config>,
}

impl NasaMetadataTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for NasaMetadataTool {
    type Params = NasaItemParams;
    type Context = String;
    type Output = NasaMetadata;

    const NAME: &'static str = "get_nasa_metadata";
    const DESCRIPTION: &'static str = "Get the URL of the full metadata document (EXIF, \
        keywords, photographer) of one NASA library item.";
    const FAILURE_CONTEXT: &'static str = "NASA metadata lookup";
    const PARAMETERS: &'static [ParameterSpec] =
        &[ParameterSpec::required("nasa_id", ParamKind::String)];

    fn prepare(&self, params: NasaItemParams) -> Result<(UpstreamRequest, String), ToolError> {
        let request = location_request(&self.config, "metadata", &params.nasa_id);
        Ok((request, params.nasa_id))
    }

    fn normalize(&self, nasa_id: String, response: UpstreamResponse) -> Result<NasaMetadata, ToolError> {
        let body: LocationEnvelope = response.decode()?;
        Ok(NasaMetadata {
            nasa_id,
            metadata_url: body.location,
        })
    }
}

/// NASA captions location tool.
pub struct NasaCaptionsTool {
    config: Arc<Config>,
}

impl NasaCaptionsTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for NasaCaptionsTool {
    type Params = NasaItemParams;
    type Context = String;
    type Output = NasaCaptions;

    const NAME: &'static str = "get_nasa_captions";
    const DESCRIPTION: &'static str = "Get the URL of the caption file of one NASA video item.";
    const FAILURE_CONTEXT: &'static str = "NASA captions lookup";
    const PARAMETERS: &'static [ParameterSpec] =
        &[ParameterSpec::required("nasa_id", ParamKind::String)];

    fn prepare(&self, params: NasaItemParams) -> Result<(UpstreamRequest, String), ToolError> {
        let request = location_request(&self.config, "captions", &params.nasa_id);
        Ok((request, params.nasa_id))
    }

    fn normalize(&self, nasa_id: String, response: UpstreamResponse) -> Result<NasaCaptions, ToolError> {
        let body: LocationEnvelope = response.decode()?;
        Ok(NasaCaptions {
            nasa_id,
            captions_url: body.location,
        })
    }
}

// ============================================================================
// get_nasa_album
// ============================================================================

/// Parameters for the NASA album tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetNasaAlbumParams {
    /// Album name, e.g. "Apollo-at-50".
    pub album_name: String,

    /// Result page, starting at 1.
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NasaAlbum {
    pub album_name: String,
    pub page: u32,
    pub items: Vec<NasaItem>,
    pub total_hits: u64,
}

/// NASA album listing tool.
pub struct NasaAlbumTool {
    config: Arc<Config>,
}

impl NasaAlbumTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for NasaAlbumTool {
    type Params = GetNasaAlbumParams;
    type Context = (String, u32);
    type Output = NasaAlbum;

    const NAME: &'static str = "get_nasa_album";
    const DESCRIPTION: &'static str = "List the items of a named NASA library album, one page \
        at a time.";
    const FAILURE_CONTEXT: &'static str = "NASA album lookup";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("album_name", ParamKind::String),
        ParameterSpec::optional("page", ParamKind::Integer)
            .with_default(DefaultValue::Int(1))
            .range(1.0, 10_000.0),
    ];

    fn prepare(
        &self,
        params: GetNasaAlbumParams,
    ) -> Result<(UpstreamRequest, (String, u32)), ToolError> {
        let path = item_path("album", &params.album_name);
        let request = UpstreamRequest::get(endpoint(&self.config.tools.nasa_images_api_url, &path))
            .query("page", params.page);
        Ok((authorize(request, &self.config), (params.album_name, params.page)))
    }

    fn normalize(
        &self,
        (album_name, page): (String, u32),
        response: UpstreamResponse,
    ) -> Result<NasaAlbum, ToolError> {
        let body: SearchEnvelope = response.decode()?;
        let listing = collect_items(body.collection)?;
        Ok(NasaAlbum {
            album_name,
            page,
            items: listing.items,
            total_hits: listing.total_hits,
        })
    }
}
