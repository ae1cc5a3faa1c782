mod errors;
mod messaging;

pub use errors::ServerError;
pub use messaging::{
    error_codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse, JsonRpcVersion, RequestId,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    pub tools: ToolCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolCapabilities {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: Implementation,
}

// Tool-related types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResponse {
    pub content: Vec<ToolResponseContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResponseContent {
    Text { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initialize_response_wire_format() {
        let resp = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolCapabilities { list_changed: true },
            },
            server_info: Implementation {
                name: "mcp-server-py".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["protocolVersion"], "2024-11-05");
        assert_eq!(value["capabilities"]["tools"]["listChanged"], true);
        assert_eq!(value["serverInfo"]["name"], "mcp-server-py");
        assert_eq!(value["serverInfo"]["version"], "0.1.0");
    }

    #[test]
    fn tool_definition_uses_camel_case_schema_key() {
        let def = ToolDefinition {
            name: "get_current_time".to_string(),
            description: "Get the current date and time".to_string(),
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        };
        let value = serde_json::to_value(&def).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn text_content_wire_format() {
        let content = ToolResponseContent::Text {
            text: "hello".to_string(),
        };
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["text"], "hello");
    }
}
