use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{
    error_codes, CallToolResponse, Implementation, InitializeResponse, JsonRpcRequest,
    JsonRpcResponse, ListToolsResponse, RequestId, ServerCapabilities, ServerError,
    ToolCapabilities, ToolDefinition, PROTOCOL_VERSION,
};

/// Wire-visible server identity, echoed verbatim in `initialize` responses.
pub const SERVER_NAME: &str = "mcp-server-py";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core tool interface
pub trait McpTool: Send + Sync {
    /// Tool name (must be unique)
    fn name(&self) -> &str;

    /// Tool description
    fn description(&self) -> &str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool with given arguments
    fn execute(&self, arguments: Value) -> Result<CallToolResponse, ServerError>;
}

/// The known protocol methods, plus everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    ListTools,
    CallTool,
    Unknown,
}

impl Method {
    fn from_name(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            _ => Self::Unknown,
        }
    }
}

/// The MCP server: a tool table plus a request dispatcher.
///
/// Holds no mutable state after startup; `handle_request` is reentrant and
/// a pure function of its input apart from reading the wall clock inside
/// tool execution.
pub struct McpServer {
    name: String,
    version: String,
    tools: HashMap<String, Box<dyn McpTool>>,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools: HashMap::new(),
        }
    }

    pub fn add_tool<T>(&mut self, tool: T) -> Result<(), ServerError>
    where
        T: McpTool + 'static,
    {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ServerError::DuplicateTool(name));
        }

        self.tools.insert(name, Box::new(tool));
        Ok(())
    }

    /// Dispatch one request to the matching handler.
    pub fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching request: {:?}", request);
        match Method::from_name(&request.method) {
            Method::Initialize => self.handle_initialize(request.id),
            Method::ListTools => self.handle_list_tools(request.id),
            Method::CallTool => self.handle_call_tool(request.id, &request.params),
            Method::Unknown => JsonRpcResponse::error(
                Some(request.id),
                error_codes::METHOD_NOT_FOUND,
                "Method not found",
            ),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> JsonRpcResponse {
        let result = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolCapabilities { list_changed: true },
            },
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
            },
        };
        Self::success_or_internal(id, &result)
    }

    fn handle_list_tools(&self, id: RequestId) -> JsonRpcResponse {
        let tools = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();

        Self::success_or_internal(id, &ListToolsResponse { tools })
    }

    fn handle_call_tool(&self, id: RequestId, params: &Map<String, Value>) -> JsonRpcResponse {
        // An unknown, missing, or non-string tool name answers with the
        // method-not-found code and message, never a tool-specific error.
        let tool = params
            .get("name")
            .and_then(Value::as_str)
            .and_then(|name| self.tools.get(name));

        let tool = match tool {
            Some(tool) => tool,
            None => {
                return JsonRpcResponse::error(
                    Some(id),
                    error_codes::METHOD_NOT_FOUND,
                    "Method not found",
                );
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        match tool.execute(arguments) {
            Ok(result) => Self::success_or_internal(id, &result),
            Err(e) => JsonRpcResponse::error(
                Some(id),
                error_codes::INTERNAL_ERROR,
                format!("Internal error: {e}"),
            ),
        }
    }

    fn success_or_internal(id: RequestId, result: &impl serde::Serialize) -> JsonRpcResponse {
        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(
                Some(id),
                error_codes::INTERNAL_ERROR,
                format!("Internal error: {e}"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::CurrentTimeTool;
    use chrono::{Local, NaiveDateTime};
    use serde_json::json;

    fn test_server() -> McpServer {
        let mut server = McpServer::new(SERVER_NAME, SERVER_VERSION);
        server.add_tool(CurrentTimeTool).unwrap();
        server
    }

    fn request(method: &str, id: RequestId, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let server = test_server();
        let resp = server.handle_request(request("initialize", 1, json!({})));
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(result["serverInfo"]["name"], "mcp-server-py");
        assert_eq!(result["serverInfo"]["version"], "0.1.0");
    }

    #[test]
    fn initialize_ignores_params() {
        let server = test_server();
        let resp = server.handle_request(request(
            "initialize",
            2,
            json!({"clientInfo": {"name": "x"}, "bogus": 42}),
        ));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn list_tools_returns_single_descriptor() {
        let server = test_server();
        let resp = server.handle_request(request("tools/list", 1, json!({})));
        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get_current_time");
        assert_eq!(tools[0]["description"], "Get the current date and time");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
        assert_eq!(tools[0]["inputSchema"]["properties"], json!({}));
        assert_eq!(tools[0]["inputSchema"]["required"], json!([]));
    }

    #[test]
    fn call_tool_returns_current_time() {
        let server = test_server();
        let before = Local::now().naive_local();
        let resp =
            server.handle_request(request("tools/call", 1, json!({"name": "get_current_time"})));
        let after = Local::now().naive_local();

        let result = resp.result.unwrap();
        let content = result["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");

        let text = content[0]["text"].as_str().unwrap();
        let stamp = text.strip_prefix("Current time: ").unwrap();
        let parsed = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f").unwrap();
        assert!(parsed >= before - chrono::Duration::seconds(1));
        assert!(parsed <= after + chrono::Duration::seconds(1));
    }

    #[test]
    fn call_tool_unknown_name_is_method_not_found() {
        let server = test_server();
        let resp = server.handle_request(request("tools/call", 7, json!({"name": "nope"})));
        assert!(resp.result.is_none());
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found");
    }

    #[test]
    fn call_tool_missing_name_is_method_not_found() {
        let server = test_server();
        let resp = server.handle_request(request("tools/call", 8, json!({})));
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn call_tool_non_string_name_is_method_not_found() {
        let server = test_server();
        let resp = server.handle_request(request("tools/call", 9, json!({"name": 5})));
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let server = test_server();
        let resp = server.handle_request(request("resources/list", 1, json!({})));
        let error = resp.error.unwrap();
        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found");
    }

    #[test]
    fn response_echoes_request_id() {
        let server = test_server();
        let resp = server.handle_request(request("initialize", 99, json!({})));
        assert_eq!(resp.id, Some(99));
    }

    #[test]
    fn duplicate_tool_registration_fails() {
        let mut server = test_server();
        let result = server.add_tool(CurrentTimeTool);
        assert!(matches!(result, Err(ServerError::DuplicateTool(_))));
    }
}
