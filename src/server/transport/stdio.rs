//! Stdio transport: newline-delimited JSON requests on stdin, one compact
//! JSON response per line on stdout, flushed before the next read.

use std::io::{self, BufRead, Write};

use serde_json::Value;
use tracing::debug;

use crate::server::McpServer;
use crate::types::{error_codes, JsonRpcRequest, JsonRpcResponse, ServerError};

/// Run the stdio loop over the process's stdin/stdout until end-of-stream.
pub fn run(server: &McpServer) -> Result<(), ServerError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(server, stdin.lock(), stdout.lock())
}

/// Serve requests line by line from `reader`, writing responses to `writer`.
///
/// Blank lines are skipped without producing output. A line that is not
/// valid JSON answers `-32700`; a JSON value that is not a valid request
/// envelope answers `-32603`. End-of-stream returns cleanly.
pub fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<(), ServerError>
where
    R: BufRead,
    W: Write,
{
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Err(_) => JsonRpcResponse::error(None, error_codes::PARSE_ERROR, "Parse error"),
            Ok(value) => match serde_json::from_value::<JsonRpcRequest>(value) {
                Err(e) => JsonRpcResponse::error(
                    None,
                    error_codes::INTERNAL_ERROR,
                    format!("Internal error: {e}"),
                ),
                Ok(request) => server.handle_request(request),
            },
        };

        write_response(&mut writer, &response)?;
    }

    debug!("stdin closed, stdio transport exiting");
    Ok(())
}

fn write_response<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), ServerError> {
    serde_json::to_writer(&mut *writer, response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
