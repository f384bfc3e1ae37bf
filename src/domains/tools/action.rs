//! Typed tool actions and the call pipeline.
//!
//! An action is a validator / request builder / normalizer triple. The
//! pipeline runs it as
//! `Received -> Validated -> UpstreamCalled -> Normalized -> Returned`,
//! dropping into `Failed` from any step. There is no retry transition.

use async_trait::async_trait;
use rmcp::{handler::server::tool::cached_schema_for_type, model::Tool};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::envelope::ToolResponse;
use super::error::ToolError;
use super::params::{self, ParameterSpec};
use super::upstream::{UpstreamClient, UpstreamRequest, UpstreamResponse};

/// One callable action exposed over MCP.
pub trait ToolAction: Send + Sync + 'static {
    /// Typed arguments, deserialized from the validated parameter map.
    type Params: DeserializeOwned + JsonSchema + Send + 'static;

    /// Whatever `prepare` resolved that `normalize` still needs.
    type Context: Send;

    /// Result schema.
    type Output: Serialize;

    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Prefix for upstream and normalization failures ("Search", "Download", ...).
    const FAILURE_CONTEXT: &'static str;

    /// Parameter contract checked before anything else.
    const PARAMETERS: &'static [ParameterSpec];

    /// Build the single upstream request. Configuration is checked here,
    /// before any I/O.
    fn prepare(&self, params: Self::Params)
    -> Result<(UpstreamRequest, Self::Context), ToolError>;

    /// Map the upstream answer into the output schema.
    fn normalize(
        &self,
        context: Self::Context,
        response: UpstreamResponse,
    ) -> Result<Self::Output, ToolError>;
}

/// Position of a call in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Received,
    Validated,
    UpstreamCalled,
    Normalized,
    Returned,
    Failed,
}

impl CallStage {
    fn advance(&mut self, next: CallStage) {
        debug!(from = ?*self, to = ?next, "Call stage");
        *self = next;
    }
}

/// Run an action end to end. Always yields an envelope.
#[instrument(skip_all, fields(tool = A::NAME))]
pub async fn run_action<A: ToolAction>(
    action: &A,
    client: &dyn UpstreamClient,
    arguments: &Map<String, Value>,
) -> ToolResponse {
    let mut stage = CallStage::Received;

    match execute(action, client, arguments, &mut stage).await {
        Ok(result) => {
            stage.advance(CallStage::Returned);
            info!("Tool call succeeded");
            ToolResponse::success(result)
        }
        Err(e) => {
            warn!(
                stage = ?stage,
                category = e.category(),
                "Tool call failed: {}",
                e
            );
            stage.advance(CallStage::Failed);
            ToolResponse::failure(e.describe(A::FAILURE_CONTEXT))
        }
    }
}

async fn execute<A: ToolAction>(
    action: &A,
    client: &dyn UpstreamClient,
    arguments: &Map<String, Value>,
    stage: &mut CallStage,
) -> Result<Value, ToolError> {
    let resolved = params::validate(arguments, A::PARAMETERS)?;
    let params: A::Params = serde_json::from_value(Value::Object(resolved))
        .map_err(|e| ToolError::internal(format!("validated parameters did not bind: {e}")))?;
    stage.advance(CallStage::Validated);

    let (request, context) = action.prepare(params)?;
    let response = client.send(request).await?;
    stage.advance(CallStage::UpstreamCalled);

    let output = action.normalize(context, response)?;
    stage.advance(CallStage::Normalized);

    serde_json::to_value(output)
        .map_err(|e| ToolError::internal(format!("failed to serialize result: {e}")))
}

/// Object-safe view of a [`ToolAction`] so the registry can hold a mix of them.
#[async_trait]
pub trait DynAction: Send + Sync {
    fn name(&self) -> &'static str;

    /// MCP metadata, including the JSON schema of the parameters.
    fn tool(&self) -> Tool;

    async fn call(&self, client: &dyn UpstreamClient, arguments: &Map<String, Value>)
    -> ToolResponse;
}

#[async_trait]
impl<A: ToolAction> DynAction for A {
    fn name(&self) -> &'static str {
        A::NAME
    }

    fn tool(&self) -> Tool {
        Tool {
            name: A::NAME.into(),
            description: Some(A::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<A::Params>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    async fn call(
        &self,
        client: &dyn UpstreamClient,
        arguments: &Map<String, Value>,
    ) -> ToolResponse {
        run_action(self, client, arguments).await
    }
}
