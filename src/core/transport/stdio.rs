//! STDIO transport: one rmcp session over the process's stdin/stdout.
//!
//! Logging goes to stderr, so stdout carries JSON-RPC only.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    /// Serve until the client closes stdin.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(
            "{} ready on stdin/stdout ({} tools)",
            server.name(),
            server.registry().tool_names().len()
        );

        let session = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let reason = session
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO session closed: {:?}", reason);
        Ok(())
    }
}
