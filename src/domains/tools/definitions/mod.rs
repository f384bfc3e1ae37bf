//! Tool definitions module.
//!
//! One file (or directory) per external integration. Each tool implements
//! `ToolAction`: it declares its parameters, builds the single upstream
//! request and maps the answer into its output shape.

mod common;

pub mod astrology;
pub mod icons;
pub mod image_search;
pub mod nasa;
pub mod speech;

pub use astrology::{
    BirthChartTool, CompositeChartTool, DetailedReportTool, GenericHoroscopeTool,
    RelationshipScoreTool, TransitsTool, VisualChartTool,
};
pub use icons::{IconDownloadTool, IconSearchTool};
pub use image_search::{ImageSearchTool, SafeSearch, SearchImagesParams};
pub use nasa::{
    GetNasaAlbumParams, GetNasaAssetParams, NasaAlbumTool, NasaAssetTool, NasaCaptionsTool,
    NasaItemParams, NasaMediaType, NasaMetadataTool, NasaSearchTool, SearchNasaImagesParams,
};
pub use speech::{GenerateSpeechParams, SpeechTool, Voice};
