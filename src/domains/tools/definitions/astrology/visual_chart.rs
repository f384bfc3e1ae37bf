//! Visual natal chart tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::store::ChartStore;
use super::subject::{BirthData, HouseSystem};
use super::{HOUSE_SYSTEMS, service_url};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

/// Parameters for the visual natal chart tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct VisualChartParams {
    /// Birth time, ISO 8601. Times without an offset are UTC.
    pub time_utc: String,

    /// Birth latitude in degrees. Falls back to the configured default.
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Birth longitude in degrees. Falls back to the configured default.
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Label drawn on the chart.
    #[serde(default = "default_name")]
    pub name: String,

    /// House system.
    #[serde(default)]
    pub house_system: HouseSystem,
}

fn default_name() -> String {
    "Unnamed".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartUrl {
    pub chart_url: String,
}

/// Pull the SVG document out of a render response.
pub(super) fn svg_document(response: &UpstreamResponse) -> Result<&str, ToolError> {
    let text = response.text()?;
    if text.contains("<svg") {
        Ok(text)
    } else {
        Err(ToolError::normalization("expected an SVG document"))
    }
}

/// Visual natal chart tool.
pub struct VisualChartTool {
    config: Arc<Config>,
}

impl VisualChartTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for VisualChartTool {
    type Params = VisualChartParams;
    type Context = (ChartStore, String);
    type Output = ChartUrl;

    const NAME: &'static str = "generate_visual_chart";
    const DESCRIPTION: &'static str = "Render a natal chart wheel as SVG and return a URL where \
        the image can be viewed.";
    const FAILURE_CONTEXT: &'static str = "Chart generation";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("time_utc", ParamKind::String),
        ParameterSpec::optional("latitude", ParamKind::Float).range(-90.0, 90.0),
        ParameterSpec::optional("longitude", ParamKind::Float).range(-180.0, 180.0),
        ParameterSpec::optional("name", ParamKind::String).with_default(DefaultValue::Str("Unnamed")),
        ParameterSpec::optional("house_system", ParamKind::Enum(HOUSE_SYSTEMS))
            .with_default(DefaultValue::Str("Placidus")),
    ];

    fn prepare(
        &self,
        params: VisualChartParams,
    ) -> Result<(UpstreamRequest, (ChartStore, String)), ToolError> {
        let tools = &self.config.tools;
        let store = ChartStore::from_config(tools)?;
        let birth = BirthData::resolve(
            "",
            params.name,
            &params.time_utc,
            params.latitude,
            params.longitude,
            tools,
        )?;

        let request = UpstreamRequest::post(service_url(tools, "/natal/svg")?).json(json!({
            "subject": birth.subject(),
            "house_system": params.house_system.code(),
        }));

        Ok((request, (store, birth.name)))
    }

    fn normalize(
        &self,
        (store, name): (ChartStore, String),
        response: UpstreamResponse,
    ) -> Result<ChartUrl, ToolError> {
        let svg = svg_document(&response)?;
        let chart_url = store.save("natal_chart", &[&name], svg)?;
        Ok(ChartUrl { chart_url })
    }
}
