//! xhs-pilot MCP server: exposes the Xiaohongshu pilot service as MCP tools.

pub mod config;
pub mod protocol;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_config, CliOverrides};
pub use protocol::ProtocolHandler;
pub use tools::ToolRegistry;
pub use transport::StdioTransport;
