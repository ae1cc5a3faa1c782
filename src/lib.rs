//! A minimal Model Context Protocol server: a JSON-RPC 2.0 dispatcher with
//! one built-in tool, served over HTTP POST or line-delimited stdio.

// types is shared between the dispatcher and both transports
pub mod types;
pub use types::ServerError;

pub mod server;
pub use server::{McpServer, McpTool};

pub mod tools;
