//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A static name -> action mapping, built once at startup
//! - Dispatch of tool calls into result envelopes
//! - Tool metadata for listing

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::config::{Config, ToolGroup};

use super::action::{DynAction, ToolAction};
use super::definitions::{
    BirthChartTool, CompositeChartTool, DetailedReportTool, GenericHoroscopeTool, IconDownloadTool,
    IconSearchTool, ImageSearchTool, NasaAlbumTool, NasaAssetTool, NasaCaptionsTool,
    NasaMetadataTool, NasaSearchTool, RelationshipScoreTool, SpeechTool, TransitsTool,
    VisualChartTool,
};
use super::envelope::{ToolCall, ToolResponse};
use super::error::{ToolError, UpstreamError};
use super::upstream::{HttpUpstreamClient, UpstreamClient};

/// Tool registry - manages all available tools.
///
/// The mapping is fixed after construction; there is no runtime
/// registration.
pub struct ToolRegistry {
    client: Arc<dyn UpstreamClient>,
    actions: BTreeMap<&'static str, Arc<dyn DynAction>>,
}

impl ToolRegistry {
    /// Create a registry backed by the reqwest client.
    pub fn new(config: Arc<Config>) -> Result<Self, UpstreamError> {
        let client = HttpUpstreamClient::new(config.tools.upstream_timeout())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Create a registry with a caller-supplied upstream client.
    pub fn with_client(config: Arc<Config>, client: Arc<dyn UpstreamClient>) -> Self {
        let mut registry = Self {
            client,
            actions: BTreeMap::new(),
        };

        for group in &config.tools.enabled {
            registry.register_group(*group, &config);
        }

        info!(
            "Registered {} tools: {}",
            registry.actions.len(),
            registry.tool_names().join(", ")
        );
        registry
    }

    fn register_group(&mut self, group: ToolGroup, config: &Arc<Config>) {
        match group {
            ToolGroup::ImageSearch => {
                self.register(ImageSearchTool::new(config.clone()));
            }
            ToolGroup::Icons => {
                self.register(IconSearchTool::new(config.clone()));
                self.register(IconDownloadTool::new(config.clone()));
            }
            ToolGroup::Speech => {
                self.register(SpeechTool::new(config.clone()));
            }
            ToolGroup::Nasa => {
                self.register(NasaSearchTool::new(config.clone()));
                self.register(NasaAssetTool::new(config.clone()));
                self.register(NasaMetadataTool::new(config.clone()));
                self.register(NasaCaptionsTool::new(config.clone()));
                self.register(NasaAlbumTool::new(config.clone()));
            }
            ToolGroup::Astrology => {
                self.register(BirthChartTool::new(config.clone()));
                self.register(VisualChartTool::new(config.clone()));
                self.register(CompositeChartTool::new(config.clone()));
                self.register(RelationshipScoreTool::new(config.clone()));
                self.register(TransitsTool::new(config.clone()));
                self.register(GenericHoroscopeTool::new(config.clone()));
                self.register(DetailedReportTool::new(config.clone()));
            }
        }
    }

    fn register<A: ToolAction>(&mut self, action: A) {
        self.actions.insert(A::NAME, Arc::new(action));
    }

    /// Get all tool names, sorted.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both the rmcp router and the HTTP transport list tools from here.
    pub fn tools(&self) -> Vec<Tool> {
        self.actions.values().map(|action| action.tool()).collect()
    }

    /// Run a tool call. Unknown names produce a failure envelope, never a panic.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResponse {
        match self.actions.get(call.function_name.as_str()) {
            Some(action) => action.call(self.client.as_ref(), &call.parameters).await,
            None => {
                warn!("Unknown tool requested: {}", call.function_name);
                ToolResponse::failure(ToolError::not_found(&call.function_name).to_string())
            }
        }
    }

    /// Dispatch a raw JSON call and return the rmcp result as JSON.
    ///
    /// This is used by the HTTP transport.
    #[cfg(feature = "http")]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, String> {
        let response = self.dispatch(&ToolCall::from_value(name, arguments)).await;
        serde_json::to_value(response.into_call_tool_result())
            .map_err(|e| format!("Failed to serialize result: {}", e))
    }

    /// Convenience wrapper returning the envelope as JSON.
    pub async fn call_envelope(&self, name: &str, arguments: Value) -> Value {
        self.dispatch(&ToolCall::from_value(name, arguments))
            .await
            .to_value()
    }
}
