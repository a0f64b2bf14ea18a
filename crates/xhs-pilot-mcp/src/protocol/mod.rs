//! JSON-RPC dispatch for the MCP server.

pub mod handler;
pub mod negotiation;
pub mod validator;

pub use handler::ProtocolHandler;
