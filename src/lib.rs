//! MCP Operator Library
//!
//! An MCP server whose tools are thin adapters over external services:
//! Google image search, the Noun Project icon API, an Orpheus speech server,
//! the NASA image library and an astrology chart service.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server and its transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: the adapter pipeline and the individual tools
//!
//! Every tool call is answered with the same envelope:
//!
//! ```json
//! {"is_successful": true, "result": {}}
//! {"is_successful": false, "error": "Input error: Missing required parameter: query"}
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_operator::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
