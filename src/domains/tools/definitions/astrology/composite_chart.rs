//! Composite chart tool definition, plus the two-person parameters it shares
//! with the relationship score.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::store::ChartStore;
use super::subject::{BirthData, HouseSystem};
use super::visual_chart::svg_document;
use super::{HOUSE_SYSTEMS, service_url};
use crate::core::config::{Config, ToolsConfig};
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

/// Birth data for two people.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TwoPeopleParams {
    /// First person's birth time, ISO 8601.
    pub person1_time_utc: String,
    /// First person's birth latitude.
    #[serde(default)]
    pub person1_latitude: Option<f64>,
    /// First person's birth longitude.
    #[serde(default)]
    pub person1_longitude: Option<f64>,
    /// First person's name.
    #[serde(default = "default_person1")]
    pub person1_name: String,

    /// Second person's birth time, ISO 8601.
    pub person2_time_utc: String,
    /// Second person's birth latitude.
    #[serde(default)]
    pub person2_latitude: Option<f64>,
    /// Second person's birth longitude.
    #[serde(default)]
    pub person2_longitude: Option<f64>,
    /// Second person's name.
    #[serde(default = "default_person2")]
    pub person2_name: String,

    /// House system.
    #[serde(default)]
    pub house_system: HouseSystem,
}

fn default_person1() -> String {
    "Person 1".to_string()
}

fn default_person2() -> String {
    "Person 2".to_string()
}

pub(super) const TWO_PEOPLE_PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::required("person1_time_utc", ParamKind::String),
    ParameterSpec::optional("person1_latitude", ParamKind::Float).range(-90.0, 90.0),
    ParameterSpec::optional("person1_longitude", ParamKind::Float).range(-180.0, 180.0),
    ParameterSpec::optional("person1_name", ParamKind::String)
        .with_default(DefaultValue::Str("Person 1")),
    ParameterSpec::required("person2_time_utc", ParamKind::String),
    ParameterSpec::optional("person2_latitude", ParamKind::Float).range(-90.0, 90.0),
    ParameterSpec::optional("person2_longitude", ParamKind::Float).range(-180.0, 180.0),
    ParameterSpec::optional("person2_name", ParamKind::String)
        .with_default(DefaultValue::Str("Person 2")),
    ParameterSpec::optional("house_system", ParamKind::Enum(HOUSE_SYSTEMS))
        .with_default(DefaultValue::Str("Placidus")),
];

impl TwoPeopleParams {
    pub(super) fn resolve(self, config: &ToolsConfig) -> Result<(BirthData, BirthData), ToolError> {
        let first = BirthData::resolve(
            "person1_",
            self.person1_name,
            &self.person1_time_utc,
            self.person1_latitude,
            self.person1_longitude,
            config,
        )?;
        let second = BirthData::resolve(
            "person2_",
            self.person2_name,
            &self.person2_time_utc,
            self.person2_latitude,
            self.person2_longitude,
            config,
        )?;
        Ok((first, second))
    }
}

/// Composite chart tool.
pub struct CompositeChartTool {
    config: Arc<Config>,
}

impl CompositeChartTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// Rendered composite charts are stored under both names.
pub struct CompositeContext {
    store: ChartStore,
    names: (String, String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositeChartUrl {
    pub composite_chart_url: String,
}

impl ToolAction for CompositeChartTool {
    type Params = TwoPeopleParams;
    type Context = CompositeContext;
    type Output = CompositeChartUrl;

    const NAME: &'static str = "generate_composite_chart";
    const DESCRIPTION: &'static str = "Render the composite (midpoint) chart of two people as SVG \
        and return a URL where the image can be viewed.";
    const FAILURE_CONTEXT: &'static str = "Chart generation";
    const PARAMETERS: &'static [ParameterSpec] = TWO_PEOPLE_PARAMETERS;

    fn prepare(
        &self,
        params: TwoPeopleParams,
    ) -> Result<(UpstreamRequest, CompositeContext), ToolError> {
        let tools = &self.config.tools;
        let store = ChartStore::from_config(tools)?;
        let house_system = params.house_system;
        let (first, second) = params.resolve(tools)?;

        let request = UpstreamRequest::post(service_url(tools, "/composite/svg")?).json(json!({
            "first": first.subject(),
            "second": second.subject(),
            "house_system": house_system.code(),
        }));

        Ok((
            request,
            CompositeContext {
                store,
                names: (first.name, second.name),
            },
        ))
    }

    fn normalize(
        &self,
        context: CompositeContext,
        response: UpstreamResponse,
    ) -> Result<CompositeChartUrl, ToolError> {
        let svg = svg_document(&response)?;
        let (first, second) = &context.names;
        let composite_chart_url = context
            .store
            .save("composite_chart", &[first.as_str(), second.as_str()], svg)?;
        Ok(CompositeChartUrl {
            composite_chart_url,
        })
    }
}
