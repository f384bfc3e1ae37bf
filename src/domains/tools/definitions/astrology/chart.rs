//! Natal chart data as returned by `POST /natal`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::service_url;
use super::subject::{BirthData, HouseSystem};
use crate::core::config::ToolsConfig;
use crate::domains::tools::definitions::common::round_to;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

const DEGREE_PLACES: i32 = 4;
const HOUSE_COUNT: usize = 12;

#[derive(Debug, Deserialize)]
struct NatalResponse {
    planets: Vec<RawPlanet>,
    houses: RawHouses,
    #[serde(default)]
    aspects: Vec<RawAspect>,
}

#[derive(Debug, Deserialize)]
struct RawPlanet {
    name: String,
    longitude: f64,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    retrograde: bool,
    sign: String,
    sign_degree: f64,
    #[serde(default)]
    house: Option<u8>,
    #[serde(default)]
    dignity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawHouses {
    ascendant: f64,
    midheaven: f64,
    cusps: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAspect {
    body1: String,
    body2: String,
    aspect: String,
    angle: f64,
    orb: f64,
    ideal_angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetPosition {
    pub longitude_deg: f64,
    pub latitude_deg: Option<f64>,
    pub speed_deg_per_day: Option<f64>,
    pub is_retrograde: bool,
    pub sign: String,
    pub sign_degree: f64,
    pub house: Option<u8>,
    pub dignity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseCusps {
    pub house_system: &'static str,
    pub ascendant_deg: f64,
    pub midheaven_deg: f64,
    pub house_cusps: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectData {
    pub body1: String,
    pub body2: String,
    pub aspect: String,
    pub angle_deg: f64,
    pub orb_applied_deg: f64,
    pub ideal_angle_deg: f64,
}

/// Positions, houses and aspects of one chart, rounded for output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPositions {
    pub planetary_positions: BTreeMap<String, PlanetPosition>,
    pub house_cusps: HouseCusps,
    pub aspects: Vec<AspectData>,
}

impl ChartPositions {
    /// Build the `POST /natal` request.
    pub fn request(
        config: &ToolsConfig,
        birth: &BirthData,
        house_system: HouseSystem,
        aspect_orb: f64,
    ) -> Result<UpstreamRequest, ToolError> {
        Ok(UpstreamRequest::post(service_url(config, "/natal")?).json(json!({
            "subject": birth.subject(),
            "house_system": house_system.code(),
            "aspect_orb": aspect_orb,
        })))
    }

    /// Map a `POST /natal` response.
    pub fn from_response(
        response: &UpstreamResponse,
        house_system: HouseSystem,
    ) -> Result<Self, ToolError> {
        let raw: NatalResponse = response.decode()?;

        if raw.houses.cusps.len() != HOUSE_COUNT {
            return Err(ToolError::normalization(format!(
                "expected {HOUSE_COUNT} house cusps, got {}",
                raw.houses.cusps.len()
            )));
        }

        let mut planetary_positions = BTreeMap::new();
        for planet in raw.planets {
            check_longitude(&planet.name, planet.longitude)?;
            planetary_positions.insert(
                planet.name,
                PlanetPosition {
                    longitude_deg: round_to(planet.longitude, DEGREE_PLACES),
                    latitude_deg: planet.latitude.map(|v| round_to(v, DEGREE_PLACES)),
                    speed_deg_per_day: planet.speed.map(|v| round_to(v, DEGREE_PLACES)),
                    is_retrograde: planet.retrograde,
                    sign: planet.sign,
                    sign_degree: round_to(planet.sign_degree, DEGREE_PLACES),
                    house: planet.house,
                    dignity: planet.dignity,
                },
            );
        }

        let house_cusps = HouseCusps {
            house_system: house_system.name(),
            ascendant_deg: round_to(raw.houses.ascendant, DEGREE_PLACES),
            midheaven_deg: round_to(raw.houses.midheaven, DEGREE_PLACES),
            house_cusps: raw
                .houses
                .cusps
                .iter()
                .map(|c| round_to(*c, DEGREE_PLACES))
                .collect(),
        };

        let aspects = raw
            .aspects
            .into_iter()
            .map(|a| AspectData {
                body1: a.body1,
                body2: a.body2,
                aspect: a.aspect.to_lowercase(),
                angle_deg: round_to(a.angle, DEGREE_PLACES),
                orb_applied_deg: round_to(a.orb, DEGREE_PLACES),
                ideal_angle_deg: round_to(a.ideal_angle, DEGREE_PLACES),
            })
            .collect();

        Ok(Self {
            planetary_positions,
            house_cusps,
            aspects,
        })
    }
}

fn check_longitude(body: &str, longitude: f64) -> Result<(), ToolError> {
    if longitude.is_finite() && (0.0..360.0).contains(&longitude) {
        Ok(())
    } else {
        Err(ToolError::normalization(format!(
            "longitude {longitude} of {body} is outside 0..360"
        )))
    }
}
