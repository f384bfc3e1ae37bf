//! Transit calculation tool definition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::subject::{BirthData, HouseSystem, format_utc, parse_utc};
use super::{HOUSE_SYSTEMS, service_url};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::definitions::common::round_to;
use crate::domains::tools::error::{ToolError, ValidationError};
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const DEGREE_PLACES: i32 = 4;

/// Parameters for the transit tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TransitsParams {
    /// Natal birth time, ISO 8601.
    pub natal_time_utc: String,
    /// Natal latitude. Falls back to the configured default.
    #[serde(default)]
    pub natal_latitude: Option<f64>,
    /// Natal longitude. Falls back to the configured default.
    #[serde(default)]
    pub natal_longitude: Option<f64>,
    /// Label for the natal chart.
    #[serde(default = "default_natal_name")]
    pub natal_name: String,
    /// Start of the search window, ISO 8601.
    pub start_time_utc: String,
    /// End of the search window, ISO 8601. Must be after the start.
    pub end_time_utc: String,
    /// Maximum orb in degrees for a transit to count.
    #[serde(default = "default_orb")]
    pub orb: f64,
    /// House system of the natal chart.
    #[serde(default)]
    pub house_system: HouseSystem,
}

fn default_natal_name() -> String {
    "Natal Chart".to_string()
}

fn default_orb() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TransitsResponse {
    #[serde(default)]
    transits: Vec<RawTransit>,
}

#[derive(Debug, Deserialize)]
struct RawTransit {
    transiting_planet: String,
    natal_point: String,
    aspect: String,
    exact_datetime_utc: String,
    orb_at_exact: f64,
    ideal_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitEvent {
    pub transiting_planet: String,
    pub natal_point: String,
    pub aspect: String,
    pub exact_datetime_utc: String,
    pub orb_at_exact: f64,
    pub ideal_angle_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitReport {
    pub natal_chart_name: String,
    pub time_range_utc: TimeRange,
    pub orb_used: f64,
    pub transits: Vec<TransitEvent>,
}

pub struct TransitsContext {
    natal_name: String,
    range: TimeRange,
    orb: f64,
}

/// Transit search tool.
pub struct TransitsTool {
    config: Arc<Config>,
}

impl TransitsTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for TransitsTool {
    type Params = TransitsParams;
    type Context = TransitsContext;
    type Output = TransitReport;

    const NAME: &'static str = "get_transits_over_time_range";
    const DESCRIPTION: &'static str = "Find the moments within a time range when transiting \
        planets form exact aspects to the points of a natal chart.";
    const FAILURE_CONTEXT: &'static str = "Transit calculation";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("natal_time_utc", ParamKind::String),
        ParameterSpec::optional("natal_latitude", ParamKind::Float).range(-90.0, 90.0),
        ParameterSpec::optional("natal_longitude", ParamKind::Float).range(-180.0, 180.0),
        ParameterSpec::optional("natal_name", ParamKind::String)
            .with_default(DefaultValue::Str("Natal Chart")),
        ParameterSpec::required("start_time_utc", ParamKind::String),
        ParameterSpec::required("end_time_utc", ParamKind::String),
        ParameterSpec::optional("orb", ParamKind::Float)
            .with_default(DefaultValue::Float(1.0))
            .range(0.0, 30.0),
        ParameterSpec::optional("house_system", ParamKind::Enum(HOUSE_SYSTEMS))
            .with_default(DefaultValue::Str("Placidus")),
    ];

    fn prepare(
        &self,
        params: TransitsParams,
    ) -> Result<(UpstreamRequest, TransitsContext), ToolError> {
        let tools = &self.config.tools;
        let natal = BirthData::resolve(
            "natal_",
            params.natal_name,
            &params.natal_time_utc,
            params.natal_latitude,
            params.natal_longitude,
            tools,
        )?;
        let start = parse_utc("start_time_utc", &params.start_time_utc)?;
        let end = parse_utc("end_time_utc", &params.end_time_utc)?;
        if start >= end {
            return Err(ValidationError::invalid(
                "start_time_utc",
                "start time must be before end time",
            )
            .into());
        }

        let range = TimeRange {
            start: format_utc(&start),
            end: format_utc(&end),
        };
        let request = UpstreamRequest::post(service_url(tools, "/transits")?).json(json!({
            "natal": natal.subject(),
            "start_utc": range.start,
            "end_utc": range.end,
            "orb": params.orb,
            "house_system": params.house_system.code(),
        }));

        Ok((
            request,
            TransitsContext {
                natal_name: natal.name,
                range,
                orb: params.orb,
            },
        ))
    }

    fn normalize(
        &self,
        context: TransitsContext,
        response: UpstreamResponse,
    ) -> Result<TransitReport, ToolError> {
        let body: TransitsResponse = response.decode()?;

        let mut events: Vec<(DateTime<Utc>, TransitEvent)> = body
            .transits
            .into_iter()
            .map(|raw| -> Result<_, ToolError> {
                let exact = DateTime::parse_from_rfc3339(&raw.exact_datetime_utc)
                    .map_err(|e| {
                        ToolError::normalization(format!(
                            "bad transit time '{}': {e}",
                            raw.exact_datetime_utc
                        ))
                    })?
                    .with_timezone(&Utc);
                Ok((
                    exact,
                    TransitEvent {
                        transiting_planet: raw.transiting_planet,
                        natal_point: raw.natal_point,
                        aspect: raw.aspect.to_lowercase(),
                        exact_datetime_utc: format_utc(&exact),
                        orb_at_exact: round_to(raw.orb_at_exact, DEGREE_PLACES),
                        ideal_angle_deg: round_to(raw.ideal_angle, DEGREE_PLACES),
                    },
                ))
            })
            .collect::<Result<_, _>>()?;

        // stable, so same-instant events keep service order
        events.sort_by_key(|(exact, _)| *exact);

        Ok(TransitReport {
            natal_chart_name: context.natal_name,
            time_range_utc: context.range,
            orb_used: context.orb,
            transits: events.into_iter().map(|(_, event)| event).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::action::run_action;
    use crate::domains::tools::definitions::astrology::test_config;
    use crate::domains::tools::testing::StubClient;
    use serde_json::{Map, Value};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn transit_args() -> Map<String, Value> {
        args(json!({
            "natal_time_utc": "1990-07-14T08:30:00Z",
            "natal_latitude": 51.5,
            "natal_longitude": -0.12,
            "start_time_utc": "2024-01-01T00:00:00Z",
            "end_time_utc": "2024-02-01T00:00:00Z"
        }))
    }

    #[tokio::test]
    async fn test_transits_sorted_by_exact_time() {
        let client = StubClient::json(json!({"transits": [
            {"transiting_planet": "Mars", "natal_point": "Sun", "aspect": "Square",
             "exact_datetime_utc": "2024-01-20T05:00:00+00:00", "orb_at_exact": 0.000012,
             "ideal_angle": 90.0},
            {"transiting_planet": "Venus", "natal_point": "Moon", "aspect": "Trine",
             "exact_datetime_utc": "2024-01-03T12:00:00Z", "orb_at_exact": 0.123456,
             "ideal_angle": 120.0}
        ]}));
        let tool = TransitsTool::new(Arc::new(test_config()));
        let response = run_action(&tool, &client, &transit_args()).await;

        assert!(response.is_successful(), "{:?}", response.error());
        let result = response.result().unwrap();
        assert_eq!(result["natal_chart_name"], "Natal Chart");
        assert_eq!(
            result["time_range_utc"],
            json!({"start": "2024-01-01T00:00:00Z", "end": "2024-02-01T00:00:00Z"})
        );
        assert_eq!(result["orb_used"], 1.0);
        assert_eq!(result["transits"][0]["transiting_planet"], "Venus");
        assert_eq!(result["transits"][0]["orb_at_exact"], 0.1235);
        assert_eq!(result["transits"][1]["aspect"], "square");
        assert_eq!(result["transits"][1]["exact_datetime_utc"], "2024-01-20T05:00:00Z");

        let body = client.last_request().unwrap().body.unwrap();
        assert_eq!(body["start_utc"], "2024-01-01T00:00:00Z");
        assert_eq!(body["natal"]["name"], "Natal Chart");
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let client = StubClient::json(json!({"transits": []}));
        let tool = TransitsTool::new(Arc::new(test_config()));
        let mut arguments = transit_args();
        arguments.insert("start_time_utc".into(), json!("2024-03-01T00:00:00Z"));

        let response = run_action(&tool, &client, &arguments).await;
        assert_eq!(
            response.error(),
            Some("Input error: Invalid parameter 'start_time_utc': start time must be before end time")
        );
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_event_time_is_normalization_failure() {
        let client = StubClient::json(json!({"transits": [
            {"transiting_planet": "Mars", "natal_point": "Sun", "aspect": "Square",
             "exact_datetime_utc": "soon", "orb_at_exact": 0.1, "ideal_angle": 90.0}
        ]}));
        let tool = TransitsTool::new(Arc::new(test_config()));
        let response = run_action(&tool, &client, &transit_args()).await;
        assert!(
            response
                .error()
                .unwrap()
                .starts_with("Transit calculation failed: invalid upstream response: bad transit time")
        );
    }
}
