use chrono::Local;
use serde_json::{json, Value};

use crate::server::McpTool;
use crate::types::{CallToolResponse, ServerError, ToolResponseContent};

/// Reports the local wall-clock time as ISO-8601 text.
pub struct CurrentTimeTool;

impl McpTool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    fn execute(&self, _arguments: Value) -> Result<CallToolResponse, ServerError> {
        // Naive local time with microsecond precision, no offset suffix.
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        Ok(CallToolResponse {
            content: vec![ToolResponseContent::Text {
                text: format!("Current time: {now}"),
            }],
        })
    }
}
