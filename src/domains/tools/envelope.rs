//! Tool call and result envelope.
//!
//! Every action returns a [`ToolResponse`]: either a result mapping or an
//! error string, never both and never neither.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named operation request from an MCP caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which action to run.
    pub function_name: String,

    /// Arguments keyed by parameter name.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ToolCall {
    pub fn new(function_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            function_name: function_name.into(),
            parameters,
        }
    }

    /// Build a call from a JSON value; anything but an object means "no arguments".
    pub fn from_value(function_name: impl Into<String>, arguments: Value) -> Self {
        let parameters = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(function_name, parameters)
    }
}

/// Uniform result envelope returned by every action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    is_successful: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolResponse {
    /// Create a successful envelope.
    pub fn success(result: Value) -> Self {
        Self {
            is_successful: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create a failed envelope.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            is_successful: false,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.is_successful
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serialize the envelope to a JSON value.
    pub fn to_value(&self) -> Value {
        // Only a non-string map key could fail here, and `Value` has none.
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({"is_successful": false, "error": format!("Internal error: {e}")})
        })
    }

    /// Convert into the rmcp result type.
    ///
    /// The envelope travels as structured content and as a JSON text block
    /// for clients that only read text.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let structured = self.to_value();
        let text = structured.to_string();

        CallToolResult {
            content: vec![Content::text(text)],
            structured_content: Some(structured),
            is_error: Some(!self.is_successful),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_has_only_result() {
        let response = ToolResponse::success(json!({"images": []}));
        assert!(response.is_successful());
        assert!(response.result().is_some());
        assert!(response.error().is_none());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"is_successful": true, "result": {"images": []}})
        );
    }

    #[test]
    fn test_failure_has_only_error() {
        let response = ToolResponse::failure("Missing API credentials");
        assert!(!response.is_successful());
        assert!(response.result().is_none());
        assert_eq!(response.error(), Some("Missing API credentials"));
        assert_eq!(
            response.to_value(),
            json!({"is_successful": false, "error": "Missing API credentials"})
        );
    }

    #[test]
    fn test_call_tool_result_flags_errors() {
        let ok = ToolResponse::success(json!({"count": 0})).into_call_tool_result();
        assert_eq!(ok.is_error, Some(false));
        assert!(ok.structured_content.is_some());

        let failed = ToolResponse::failure("boom").into_call_tool_result();
        assert_eq!(failed.is_error, Some(true));
    }

    #[test]
    fn test_to_value_matches_serialized_form() {
        for response in [
            ToolResponse::success(json!({"images": [{"title": "M31"}]})),
            ToolResponse::failure("Search failed: HTTP 429: Quota exceeded"),
        ] {
            assert_eq!(response.to_value(), serde_json::to_value(&response).unwrap());
        }

        let structured = ToolResponse::success(json!([1, 2]))
            .into_call_tool_result()
            .structured_content
            .unwrap();
        assert_eq!(structured, json!({"is_successful": true, "result": [1, 2]}));
    }

    #[test]
    fn test_tool_call_from_non_object() {
        let call = ToolCall::from_value("search_images", json!("oops"));
        assert!(call.parameters.is_empty());
        assert_eq!(call.function_name, "search_images");
    }
}
