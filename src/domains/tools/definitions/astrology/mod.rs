//! Astrology tools.
//!
//! Ephemeris work happens in a chart service reached at `ASTROLOGY_API_URL`:
//!
//! | endpoint | returns |
//! |---|---|
//! | `POST /natal` | planets, houses and aspects of one chart |
//! | `POST /natal/svg` | rendered natal wheel |
//! | `POST /composite/svg` | rendered composite wheel |
//! | `POST /relationship` | compatibility score |
//! | `POST /transits` | transit events over a time range |
//!
//! The tools here validate birth data, shape those requests and map the
//! answers; rendered charts are stored under the outputs directory and
//! returned as URLs.

mod birth_chart;
mod chart;
mod composite_chart;
mod horoscope;
mod relationship;
mod report;
mod store;
mod subject;
mod transits;
mod visual_chart;

pub use birth_chart::{BirthChartData, BirthChartParams, BirthChartTool};
pub use chart::{AspectData, ChartPositions, HouseCusps, PlanetPosition};
pub use composite_chart::{CompositeChartTool, TwoPeopleParams};
pub use horoscope::{GenericHoroscopeTool, HoroscopeParams};
pub use relationship::RelationshipScoreTool;
pub use report::{DetailedReportTool, ReportParams};
pub use subject::{BirthData, ChartSubject, HouseSystem};
pub use transits::{TransitsParams, TransitsTool};
pub use visual_chart::{VisualChartParams, VisualChartTool};

use super::common::{endpoint, require_setting};
use crate::core::config::ToolsConfig;
use crate::domains::tools::error::ToolError;

/// Accepted house system names, as shown to callers.
pub const HOUSE_SYSTEMS: &[&str] = &[
    "Placidus",
    "Koch",
    "Regiomontanus",
    "Whole Sign",
    "Equal",
    "Campanus",
    "Porphyry",
];

/// The twelve signs in zodiacal order from 0° Aries.
pub const ZODIAC_SIGNS: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

const NOT_CONFIGURED: &str = "Chart service not configured: set ASTROLOGY_API_URL";

/// Resolve a chart service endpoint.
fn service_url(config: &ToolsConfig, path: &str) -> Result<String, ToolError> {
    let base = require_setting(config.astrology_api_url.as_deref(), NOT_CONFIGURED)?;
    Ok(endpoint(base, path))
}

/// Sign containing an ecliptic longitude.
pub fn sign_for_longitude(longitude: f64) -> &'static str {
    let index = (longitude.rem_euclid(360.0) / 30.0) as usize;
    ZODIAC_SIGNS[index.min(11)]
}

#[cfg(test)]
fn test_config() -> crate::core::config::Config {
    let mut config = crate::core::config::Config::default();
    config.tools.astrology_api_url = Some("http://charts.test".into());
    config
}

#[cfg(test)]
fn natal_fixture() -> serde_json::Value {
    serde_json::json!({
        "planets": [
            {"name": "Sun", "longitude": 111.54321, "latitude": 0.0001, "speed": 0.9533,
             "retrograde": false, "sign": "Cancer", "sign_degree": 21.54321, "house": 10,
             "dignity": null},
            {"name": "Moon", "longitude": 245.12, "sign": "Sagittarius", "sign_degree": 5.12,
             "house": 3},
            {"name": "Mercury", "longitude": 100.0, "speed": -0.2, "retrograde": true,
             "sign": "Cancer", "sign_degree": 10.0, "house": 9}
        ],
        "houses": {
            "ascendant": 200.123456,
            "midheaven": 110.5,
            "cusps": [200.1, 230.2, 260.3, 290.4, 320.5, 350.6,
                      20.1, 50.2, 80.3, 110.4, 140.5, 170.6]
        },
        "aspects": [
            {"body1": "Sun", "body2": "Moon", "aspect": "Trine", "angle": 133.57679,
             "orb": 13.57679, "ideal_angle": 120.0}
        ]
    })
}
