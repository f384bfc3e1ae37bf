//! Detailed natal report tool definition.

use std::fmt::Write as _;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::chart::ChartPositions;
use super::subject::{BirthData, HouseSystem, format_utc};
use super::{HOUSE_SYSTEMS, sign_for_longitude};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::{DefaultValue, ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const REPORT_ORB: f64 = 8.0;

/// Parameters for the detailed report tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReportParams {
    /// Birth time, ISO 8601.
    pub time_utc: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub house_system: HouseSystem,
}

fn default_name() -> String {
    "Unnamed".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedReport {
    pub name: String,
    pub datetime_utc: String,
    pub house_system: &'static str,
    pub report_text: String,
}

/// Detailed natal report tool.
pub struct DetailedReportTool {
    config: Arc<Config>,
}

impl DetailedReportTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

fn degrees_in_sign(longitude: f64) -> f64 {
    longitude.rem_euclid(30.0)
}

/// Plain-text rendering of a chart.
fn render(name: &str, datetime_utc: &str, chart: &ChartPositions) -> String {
    let mut text = format!("Natal report for {name} ({datetime_utc})\n\nPlanets:\n");

    for (planet, position) in &chart.planetary_positions {
        let _ = write!(
            text,
            "- {planet}: {:.2}° {}",
            position.sign_degree, position.sign
        );
        if let Some(house) = position.house {
            let _ = write!(text, ", house {house}");
        }
        if position.is_retrograde {
            text.push_str(", retrograde");
        }
        text.push('\n');
    }

    let houses = &chart.house_cusps;
    let _ = write!(
        text,
        "\nAngles ({} houses):\n- Ascendant: {:.2}° {}\n- Midheaven: {:.2}° {}\n",
        houses.house_system,
        degrees_in_sign(houses.ascendant_deg),
        sign_for_longitude(houses.ascendant_deg),
        degrees_in_sign(houses.midheaven_deg),
        sign_for_longitude(houses.midheaven_deg),
    );

    text.push_str("\nAspects:\n");
    if chart.aspects.is_empty() {
        text.push_str("- none within orb\n");
    }
    for aspect in &chart.aspects {
        let _ = writeln!(
            text,
            "- {} {} {} (orb {:.2}°)",
            aspect.body1, aspect.aspect, aspect.body2, aspect.orb_applied_deg
        );
    }

    text
}

impl ToolAction for DetailedReportTool {
    type Params = ReportParams;
    type Context = (BirthData, HouseSystem);
    type Output = DetailedReport;

    const NAME: &'static str = "generate_detailed_report";
    const DESCRIPTION: &'static str = "Produce a plain-text natal report: planets by sign and \
        house, the angles and the major aspects.";
    const FAILURE_CONTEXT: &'static str = "Report generation";
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
        params: ReportParams,
    ) -> Result<(UpstreamRequest, (BirthData, HouseSystem)), ToolError> {
        let tools = &self.config.tools;
        let birth = BirthData::resolve(
            "",
            params.name,
            &params.time_utc,
            params.latitude,
            params.longitude,
            tools,
        )?;
        let request = ChartPositions::request(tools, &birth, params.house_system, REPORT_ORB)?;
        Ok((request, (birth, params.house_system)))
    }

    fn normalize(
        &self,
        (birth, house_system): (BirthData, HouseSystem),
        response: UpstreamResponse,
    ) -> Result<DetailedReport, ToolError> {
        let chart = ChartPositions::from_response(&response, house_system)?;
        let datetime_utc = format_utc(&birth.datetime);

        Ok(DetailedReport {
            report_text: render(&birth.name, &datetime_utc, &chart),
            name: birth.name,
            datetime_utc,
            house_system: house_system.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::action::run_action;
    use crate::domains::tools::definitions::astrology::{natal_fixture, test_config};
    use crate::domains::tools::testing::StubClient;
    use serde_json::{Map, Value, json};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_report_text() {
        let client = StubClient::json(natal_fixture());
        let tool = DetailedReportTool::new(Arc::new(test_config()));
        let arguments = args(json!({"time_utc": "1990-07-14T08:30:00Z", "latitude": 51.5,
                                    "longitude": -0.12, "name": "Ada"}));
        let response = run_action(&tool, &client, &arguments).await;

        assert!(response.is_successful(), "{:?}", response.error());
        let result = response.result().unwrap();
        assert_eq!(result["name"], "Ada");
        assert_eq!(result["house_system"], "Placidus");

        let text = result["report_text"].as_str().unwrap();
        assert!(text.starts_with("Natal report for Ada (1990-07-14T08:30:00Z)"));
        assert!(text.contains("- Sun: 21.54° Cancer, house 10\n"));
        assert!(text.contains("- Mercury: 10.00° Cancer, house 9, retrograde\n"));
        assert!(text.contains("- Ascendant: 20.12° Libra"));
        assert!(text.contains("- Midheaven: 20.50° Cancer"));
        assert!(text.contains("- Sun trine Moon (orb 13.58°)"));
    }

    #[tokio::test]
    async fn test_malformed_chart_is_normalization_failure() {
        let client = StubClient::json(json!({"planets": []}));
        let tool = DetailedReportTool::new(Arc::new(test_config()));
        let arguments = args(json!({"time_utc": "1990-07-14T08:30:00Z", "latitude": 1.0, "longitude": 1.0}));
        let response = run_action(&tool, &client, &arguments).await;
        assert!(
            response
                .error()
                .unwrap()
                .starts_with("Report generation failed: invalid upstream response")
        );
    }
}
