use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mcp_timeserver::server::transport::{http, stdio};
use mcp_timeserver::server::{McpServer, SERVER_NAME, SERVER_VERSION};
use mcp_timeserver::tools::CurrentTimeTool;
use mcp_timeserver::types::ServerError;

#[derive(Debug, Parser)]
#[command(name = "mcp-timeserver")]
#[command(version, about = "Minimal MCP server exposing the current time")]
struct Args {
    /// Transport to serve requests on
    #[arg(long, value_enum, default_value_t = TransportKind::Http)]
    transport: TransportKind,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportKind {
    Http,
    Stdio,
}

fn main() -> Result<(), ServerError> {
    // Diagnostics go to stderr; in stdio mode stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut server = McpServer::new(SERVER_NAME, SERVER_VERSION);
    server.add_tool(CurrentTimeTool)?;

    match args.transport {
        TransportKind::Stdio => stdio::run(&server),
        TransportKind::Http => http::run(Arc::new(server)),
    }
}
