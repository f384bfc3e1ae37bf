//! Generic horoscope tool definition.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ZODIAC_SIGNS;
use super::chart::ChartPositions;
use super::subject::{BirthData, HouseSystem};
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::error::{ToolError, ValidationError};
use crate::domains::tools::params::{ParamKind, ParameterSpec};
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const SIGN_PATTERN: &str = "(?i)^(aries|taurus|gemini|cancer|leo|virgo|libra|scorpio|\
    sagittarius|capricorn|aquarius|pisces)$";
const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

/// Parameters for the generic horoscope tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HoroscopeParams {
    /// Zodiac sign, case-insensitive (e.g. "leo").
    pub sign: String,

    /// Day to read, `YYYY-MM-DD`. Defaults to today (UTC).
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetInSign {
    pub name: String,
    pub sign_degree: f64,
    pub is_retrograde: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Horoscope {
    pub sign: String,
    pub date: String,
    pub planets_in_sign: Vec<PlanetInSign>,
    pub horoscope_text: String,
}

pub struct HoroscopeContext {
    sign: &'static str,
    date: NaiveDate,
}

/// Generic (sun sign) horoscope tool.
pub struct GenericHoroscopeTool {
    config: Arc<Config>,
}

impl GenericHoroscopeTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

fn canonical_sign(sign: &str) -> Result<&'static str, ValidationError> {
    ZODIAC_SIGNS
        .iter()
        .copied()
        .find(|s| s.eq_ignore_ascii_case(sign))
        .ok_or_else(|| ValidationError::invalid("sign", format!("'{sign}' is not a zodiac sign")))
}

fn horoscope_text(sign: &str, date: &str, planets: &[PlanetInSign]) -> String {
    if planets.is_empty() {
        return format!("No planets occupy {sign} on {date}.");
    }

    let listed: Vec<String> = planets
        .iter()
        .map(|p| {
            let retrograde = if p.is_retrograde { ", retrograde" } else { "" };
            format!("{} ({:.2}°{retrograde})", p.name, p.sign_degree)
        })
        .collect();
    let verb = if planets.len() == 1 { "is" } else { "are" };

    format!("On {date}, {} {verb} in {sign}.", listed.join(", "))
}

impl ToolAction for GenericHoroscopeTool {
    type Params = HoroscopeParams;
    type Context = HoroscopeContext;
    type Output = Horoscope;

    const NAME: &'static str = "get_generic_horoscope";
    const DESCRIPTION: &'static str = "Describe which planets occupy a zodiac sign on a given day, \
        computed for noon UTC.";
    const FAILURE_CONTEXT: &'static str = "Horoscope";
    const PARAMETERS: &'static [ParameterSpec] = &[
        ParameterSpec::required("sign", ParamKind::String)
            .pattern(SIGN_PATTERN, "a zodiac sign such as Leo"),
        ParameterSpec::optional("date", ParamKind::String).pattern(DATE_PATTERN, "YYYY-MM-DD"),
    ];

    fn prepare(
        &self,
        params: HoroscopeParams,
    ) -> Result<(UpstreamRequest, HoroscopeContext), ToolError> {
        let tools = &self.config.tools;
        let sign = canonical_sign(&params.sign)?;
        let date = match params.date.as_deref() {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::invalid("date", format!("'{raw}' is not a calendar date"))
            })?,
            None => Utc::now().date_naive(),
        };

        let sky = BirthData::resolve(
            "",
            format!("Sky {date}"),
            &format!("{date}T12:00:00Z"),
            None,
            None,
            tools,
        )?;
        let request = ChartPositions::request(tools, &sky, HouseSystem::WholeSign, 0.0)?;

        Ok((request, HoroscopeContext { sign, date }))
    }

    fn normalize(
        &self,
        context: HoroscopeContext,
        response: UpstreamResponse,
    ) -> Result<Horoscope, ToolError> {
        let chart = ChartPositions::from_response(&response, HouseSystem::WholeSign)?;
        let planets_in_sign: Vec<PlanetInSign> = chart
            .planetary_positions
            .into_iter()
            .filter(|(_, position)| position.sign.eq_ignore_ascii_case(context.sign))
            .map(|(name, position)| PlanetInSign {
                name,
                sign_degree: position.sign_degree,
                is_retrograde: position.is_retrograde,
            })
            .collect();

        let date = context.date.format("%Y-%m-%d").to_string();
        Ok(Horoscope {
            horoscope_text: horoscope_text(context.sign, &date, &planets_in_sign),
            sign: context.sign.to_string(),
            date,
            planets_in_sign,
        })
    }
}
