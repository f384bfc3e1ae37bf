//! Relationship score tool definition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::composite_chart::{TWO_PEOPLE_PARAMETERS, TwoPeopleParams};
use super::service_url;
use crate::core::config::Config;
use crate::domains::tools::action::ToolAction;
use crate::domains::tools::definitions::common::round_to;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::params::ParameterSpec;
use crate::domains::tools::upstream::{UpstreamRequest, UpstreamResponse};

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipScore {
    pub person1_name: String,
    pub person2_name: String,
    pub relationship_score: f64,
    pub description: Option<String>,
}

/// Relationship score tool.
pub struct RelationshipScoreTool {
    config: Arc<Config>,
}

impl RelationshipScoreTool {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ToolAction for RelationshipScoreTool {
    type Params = TwoPeopleParams;
    type Context = (String, String);
    type Output = RelationshipScore;

    const NAME: &'static str = "get_relationship_score";
    const DESCRIPTION: &'static str = "Score the astrological compatibility of two people from \
        their birth data (synastry).";
    const FAILURE_CONTEXT: &'static str = "Relationship score";
    const PARAMETERS: &'static [ParameterSpec] = TWO_PEOPLE_PARAMETERS;

    fn prepare(
        &self,
        params: TwoPeopleParams,
    ) -> Result<(UpstreamRequest, (String, String)), ToolError> {
        let tools = &self.config.tools;
        let house_system = params.house_system;
        let (first, second) = params.resolve(tools)?;

        let request = UpstreamRequest::post(service_url(tools, "/relationship")?).json(json!({
            "first": first.subject(),
            "second": second.subject(),
            "house_system": house_system.code(),
        }));

        Ok((request, (first.name, second.name)))
    }

    fn normalize(
        &self,
        (person1_name, person2_name): (String, String),
        response: UpstreamResponse,
    ) -> Result<RelationshipScore, ToolError> {
        let body: ScoreResponse = response.decode()?;
        if !body.score.is_finite() {
            return Err(ToolError::normalization("score is not a finite number"));
        }

        Ok(RelationshipScore {
            person1_name,
            person2_name,
            relationship_score: round_to(body.score, 2),
            description: body.description,
        })
    }
}
