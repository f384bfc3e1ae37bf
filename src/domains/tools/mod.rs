//! Tools domain module.
//!
//! Every tool is an adapter around one external service. A call moves through
//! the same stages regardless of the tool:
//!
//! ```text
//! RECEIVED -> VALIDATED -> UPSTREAM_CALLED -> NORMALIZED -> RETURNED
//!     \___________\_______________\________________\______-> FAILED
//! ```
//!
//! ## Architecture
//!
//! - `action.rs` - the `ToolAction` contract and the shared call pipeline
//! - `params.rs` - declarative parameter validation
//! - `envelope.rs` - the `{is_successful, result | error}` response shape
//! - `upstream/` - outbound request description, HTTP client and signing
//! - `definitions/` - the individual tools
//! - `registry.rs` - name to action dispatch
//! - `router.rs` - rmcp `ToolRouter` built from the registry
//! - `error.rs` - error categories and their caller-facing messages
//!
//! ## Adding a New Tool
//!
//! 1. Create a file in `definitions/` with a params struct and a type
//!    implementing `ToolAction`
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it in `ToolRegistry::with_client` under its `ToolGroup`
//!
//! The router and the HTTP transport pick it up from the registry.

pub mod action;
pub mod definitions;
pub mod envelope;
mod error;
pub mod params;
mod registry;
pub mod router;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use action::{DynAction, ToolAction};
pub use envelope::{ToolCall, ToolResponse};
pub use error::{ToolError, UpstreamError, ValidationError};
pub use registry::ToolRegistry;
pub use router::build_tool_router;
