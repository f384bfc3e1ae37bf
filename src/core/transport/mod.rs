//! Transports that carry MCP traffic to the tool registry.
//!
//! | feature | transport | framing |
//! |---|---|---|
//! | `stdio` (default) | `StdioTransport` | rmcp session on stdin/stdout |
//! | `tcp` | `TcpTransport` | line-delimited JSON-RPC, one session per connection |
//! | `http` | `HttpTransport` | JSON-RPC over POST plus a bare envelope endpoint |
//!
//! All of them dispatch through the same `ToolRegistry`, so a tool call
//! yields the same `{is_successful, result | error}` envelope everywhere.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
