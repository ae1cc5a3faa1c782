//! HTTP transport: one JSON-RPC request per `POST` body, one JSON response
//! body per request. Protocol-level errors still travel as HTTP 200; the
//! status code never signals a JSON-RPC outcome.

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::server::McpServer;
use crate::types::{error_codes, JsonRpcRequest, JsonRpcResponse, ServerError};

/// Port the production server listens on, on all interfaces.
pub const DEFAULT_PORT: u16 = 8044;

/// Bind 0.0.0.0:8044 and serve requests until externally terminated.
pub fn run(server: Arc<McpServer>) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let addr = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT));
        let http = HttpServer::start(addr, server).await?;
        info!("listening on {}", http.url());
        std::future::pending::<()>().await;
        Ok(())
    })
}

/// A running HTTP adapter around the dispatcher.
///
/// Accepts connections on its own task; each connection is served
/// concurrently. The dispatcher is stateless, so no locking is involved.
pub struct HttpServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: JoinHandle<()>,
}

impl HttpServer {
    /// Start serving on `addr`. Pass port 0 to let the OS pick one.
    pub async fn start(addr: SocketAddr, server: Arc<McpServer>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let port = local_addr.port();

        debug!("HTTP transport listening on {}", local_addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            Self::accept_loop(listener, server, shutdown_rx).await;
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        })
    }

    /// The URL of the running server (e.g. `http://127.0.0.1:8044`).
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// The port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Stop accepting connections.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    async fn accept_loop(
        listener: TcpListener,
        server: Arc<McpServer>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("connection from {}", addr);
                            let server = Arc::clone(&server);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let server = Arc::clone(&server);
                                    handle(server, req)
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    error!("connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("HTTP transport shutting down");
                    break;
                }
            }
        }
    }
}

/// Handle one HTTP request by decoding the body and dispatching it.
async fn handle(
    server: Arc<McpServer>,
    req: Request<hyper::body::Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    if req.method() != Method::POST {
        let body = JsonRpcResponse::error(
            None,
            error_codes::INVALID_REQUEST,
            "Method not allowed, use POST",
        );
        return Ok(json_response(StatusCode::METHOD_NOT_ALLOWED, &body));
    }

    let body = req.collect().await?.to_bytes();

    // A body that does not decode into a request envelope answers as a
    // parse error over HTTP 200, with no id to echo.
    let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!("undecodable request body: {}", e);
            let body = JsonRpcResponse::error(None, error_codes::PARSE_ERROR, "Parse error");
            return Ok(json_response(StatusCode::OK, &body));
        }
    };

    let rpc_response = server.handle_request(rpc_request);
    Ok(json_response(StatusCode::OK, &rpc_response))
}

fn json_response(status: StatusCode, body: &JsonRpcResponse) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(bytes)))
        .unwrap_or_else(|_| {
            warn!("failed to build HTTP response, returning empty 500");
            let mut resp = Response::new(Full::new(Bytes::new()));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}
