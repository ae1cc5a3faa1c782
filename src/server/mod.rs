pub mod server;
pub mod transport;

pub use server::{McpServer, McpTool, SERVER_NAME, SERVER_VERSION};
