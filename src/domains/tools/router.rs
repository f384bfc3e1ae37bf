//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Every registered action gets one route. Routes never return an rmcp
//! error: failures travel inside the envelope with `is_error` set.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
};

use super::envelope::ToolCall;
use super::registry::ToolRegistry;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .tools()
        .into_iter()
        .fold(ToolRouter::new(), |router, tool| {
            let registry = registry.clone();
            let name = tool.name.to_string();

            router.with_route(ToolRoute::new_dyn(
                tool,
                move |ctx: ToolCallContext<'_, S>| {
                    let args = ctx.arguments.clone().unwrap_or_default();
                    let registry = registry.clone();
                    let call = ToolCall::new(name.clone(), args);
                    async move {
                        let response = registry.dispatch(&call).await;
                        Ok::<_, McpError>(response.into_call_tool_result())
                    }
                    .boxed()
                },
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::testing::StubClient;
    use serde_json::json;

    struct TestServer {}

    fn test_registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::with_client(
            Arc::new(Config::default()),
            Arc::new(StubClient::json(json!({}))),
        ))
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_registry());
        let tools = router.list_all();
        assert_eq!(tools.len(), 16);

        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert!(names.contains(&"search_images"));
        assert!(names.contains(&"download_icon"));
        assert!(names.contains(&"generate_visual_chart"));
    }

    #[test]
    fn test_registry_matches_router() {
        let registry = test_registry();
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(registry);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
