//! Birth chart data tool definition.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::HOUSE_SYSTEMS;
use super::chart::ChartPositions;
use super::subject::{BirthData, HouseSystem, format_utc};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

/// Parameters for the birth chart tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BirthChartParams {
    /// Birth time, ISO 8601 (e.g. "1990-07-14T08:30:00Z"). Times without an offset are UTC.
    pub time_utc: String,

    /// Birth latitude in degrees (-90 to 90). Falls back to the configured default.
    #[serde(default)]
    pub latitude: Option<f64>,

    /// Birth longitude in degrees (-180 to 180). Falls back to the configured default.
    #[serde(default)]
    pub longitude: Option<f64>,

    /// Label for the chart.
    #[serde(default = "default_name")]
    pub name: String,

    /// House system.
    #[serde(default)]
    pub house_system: HouseSystem,

    /// Maximum orb in degrees for reported aspects.
    #[serde(default = "default_orb")]
    pub aspect_orb: f64,
}

fn default_name() -> String {
    "Unnamed".to_string()
}

fn default_orb() -> f64 {
    8.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BirthChartData {
    pub name: String,
    pub datetime_utc: String,
    pub location: Location,
    pub house_system: &'static str,
    pub aspect_orb_used: f64,
    #[serde(flatten)]
    pub chart: ChartPositions,
}

/// Request context carried to normalization.
pub struct BirthChartContext {
    birth: BirthData,
    house_system: HouseSystem,
    aspect_orb: f64,
}

/// Birth chart data tool.
pub struct BirthChartTool {
    config: Arc<Config>,
}

impl BirthChartTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for BirthChartTool {
    type Params = BirthChartParams;
    type Context = BirthChartContext;
    type Output = BirthChartData;

    const NAME: &'static str = "generate_birth_chart_data";
    const DESCRIPTION: &'static str = "Calculate a natal chart: planetary positions (longitude, \
        sign, house, speed, retrograde), house cusps with ascendant and midheaven, and aspects \
        within the given orb.";
    const FAILURE_CONTEXT: &'static str = "Chart calculation";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("time_utc", ParamKind::String),
        ParameterSpec::optional("latitude", ParamKind::Float).range(-90.0, 90.0),
        ParameterSpec::optional("longitude", ParamKind::Float).range(-180.0, 180.0),
        ParameterSpec::optional("name", ParamKind::String).with_default(DefaultValue::Str("Unnamed")),
        ParameterSpec::optional("house_system", ParamKind::Enum(HOUSE_SYSTEMS))
            .with_default(DefaultValue::Str("Placidus")),
        ParameterSpec::optional("aspect_orb", ParamKind::Float)
            .with_default(DefaultValue::Float(8.0))
            .range(0.0, 30.0),
    ];

    fn prepare(
        &self,
        params: BirthChartParams,
    ) -> Result<(UpstreamRequest, BirthChartContext), ToolError> {
        let tools = &self.config.tools;
        let birth = BirthData::resolve(
            "",
            params.name,
            &params.time_utc,
            params.latitude,
            params.longitude,
            tools,
        )?;
        let request = ChartPositions::request(tools, &birth, params.house_system, params.aspect_orb)?;

        Ok((
            request,
            BirthChartContext {
                birth,
                house_system: params.house_system,
                aspect_orb: params.aspect_orb,
            },
        ))
    }

    fn normalize(
        &self,
        context: BirthChartContext,
        response: UpstreamResponse,
    ) -> Result<BirthChartData, ToolError> {
        let chart = ChartPositions::from_response(&response, context.house_system)?;
        let birth = context.birth;

        Ok(BirthChartData {
            datetime_utc: format_utc(&birth.datetime),
            location: Location {
                latitude: birth.latitude,
                longitude: birth.longitude,
            },
            name: birth.name,
            house_system: context.house_system.name(),
            aspect_orb_used: context.aspect_orb,
            chart,
        })
    }
}
