//! Birth data shared by every chart request.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::config::ToolsConfig;
use crate::domains::tools::error::ValidationError;

/// Naive layouts accepted besides RFC 3339. They are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// House division system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum HouseSystem {
    #[default]
    Placidus,
    Koch,
    Regiomontanus,
    #[serde(rename = "Whole Sign")]
    WholeSign,
    Equal,
    Campanus,
    Porphyry,
}

impl HouseSystem {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Placidus => "Placidus",
            Self::Koch => "Koch",
            Self::Regiomontanus => "Regiomontanus",
            Self::WholeSign => "Whole Sign",
            Self::Equal => "Equal",
            Self::Campanus => "Campanus",
            Self::Porphyry => "Porphyry",
        }
    }

    /// Single-letter code understood by the chart service.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Placidus => "P",
            Self::Koch => "K",
            Self::Regiomontanus => "R",
            Self::WholeSign => "W",
            Self::Equal => "E",
            Self::Campanus => "C",
            Self::Porphyry => "O",
        }
    }
}

/// Parse an ISO 8601 timestamp. Offsets are converted to UTC; naive times
/// are taken to be UTC already.
pub fn parse_utc(name: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            ValidationError::invalid(
                name,
                format!("'{value}' is not an ISO 8601 date-time such as 1990-07-14T08:30:00Z"),
            )
        })
}

/// Canonical `YYYY-MM-DDTHH:MM:SSZ` rendering.
pub fn format_utc(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolved birth data: a UTC instant and a location.
#[derive(Debug, Clone, PartialEq)]
pub struct BirthData {
    pub name: String,
    pub datetime: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

impl BirthData {
    /// Resolve birth data from flat parameters named `{prefix}time_utc`,
    /// `{prefix}latitude` and `{prefix}longitude`.
    ///
    /// Missing coordinates fall back to the configured default location.
    pub fn resolve(
        prefix: &str,
        name: String,
        time_utc: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
        config: &ToolsConfig,
    ) -> Result<Self, ValidationError> {
        let datetime = parse_utc(&format!("{prefix}time_utc"), time_utc)?;
        Ok(Self {
            name,
            datetime,
            latitude: latitude.unwrap_or(config.default_latitude),
            longitude: longitude.unwrap_or(config.default_longitude),
        })
    }

    pub fn subject(&self) -> ChartSubject {
        ChartSubject {
            name: self.name.clone(),
            datetime_utc: format_utc(&self.datetime),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Birth data as sent to the chart service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSubject {
    pub name: String,
    pub datetime_utc: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc_variants() {
        let expected = Utc.with_ymd_and_hms(1990, 7, 14, 8, 30, 0).unwrap();
        assert_eq!(parse_utc("t", "1990-07-14T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_utc("t", "1990-07-14T10:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_utc("t", "1990-07-14T08:30:00").unwrap(), expected);
        assert_eq!(parse_utc("t", "1990-07-14T08:30").unwrap(), expected);
        assert_eq!(parse_utc("t", "1990-07-14 08:30:00").unwrap(), expected);
    }

    #[test]
    fn test_parse_utc_rejects_garbage() {
        let err = parse_utc("person1_time_utc", "yesterday").unwrap_err();
        assert_eq!(err.parameter(), "person1_time_utc");
        assert!(parse_utc("t", "1990-13-40T00:00:00Z").is_err());
    }

    #[test]
    fn test_format_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_utc(&dt), "2024-03-01T12:00:00Z");
    }

    #[test]
    fn test_resolve_uses_default_location() {
        let mut config = ToolsConfig::default();
        config.default_latitude = 51.5;
        config.default_longitude = -0.12;

        let data = BirthData::resolve("", "Ada".into(), "1990-07-14T08:30:00Z", None, Some(2.35), &config)
            .unwrap();
        assert_eq!(data.latitude, 51.5);
        assert_eq!(data.longitude, 2.35);
        assert_eq!(data.subject().datetime_utc, "1990-07-14T08:30:00Z");
    }

    #[test]
    fn test_resolve_without_location_uses_builtin_default() {
        let data = BirthData::resolve(
            "natal_",
            "Ada".into(),
            "1990-07-14T08:30:00Z",
            None,
            None,
            &ToolsConfig::default(),
        )
        .unwrap();
        assert_eq!(data.latitude, 42.48);
        assert_eq!(data.longitude, -71.02);
    }

    #[test]
    fn test_house_system_names_and_codes() {
        let parsed: HouseSystem = serde_json::from_str("\"Whole Sign\"").unwrap();
        assert_eq!(parsed, HouseSystem::WholeSign);
        assert_eq!(parsed.code(), "W");
        assert_eq!(HouseSystem::default().name(), "Placidus");
        for name in super::super::HOUSE_SYSTEMS {
            let system: HouseSystem = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(system.name(), *name);
        }
    }
}
