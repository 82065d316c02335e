//! Translation of provider tool descriptors into completion-API function schemas

use crate::llm::{FunctionDefinition, ToolDefinition};
use crate::protocol::ToolDescriptor;
use serde_json::json;

/// Convert one descriptor. The input schema is passed through untouched;
/// a provider that omits it gets an empty object schema.
pub fn to_tool_definition(tool: &ToolDescriptor) -> ToolDefinition {
    ToolDefinition {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: tool
                .input_schema
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        },
    }
}

/// Convert a whole catalog, preserving order
pub fn to_tool_definitions(tools: &[ToolDescriptor]) -> Vec<ToolDefinition> {
    tools.iter().map(to_tool_definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_passes_through_verbatim() {
        let schema = json!({
            "type": "object",
            "properties": {"city": {"type": "string", "title": "City"}},
            "required": ["city"],
            "x-vendor": {"anything": [1, 2, 3]}
        });
        let tool = ToolDescriptor {
            name: "query_weather".to_string(),
            description: Some("today's weather".to_string()),
            input_schema: Some(schema.clone()),
        };

        let def = to_tool_definition(&tool);
        assert_eq!(def.tool_type, "function");
        assert_eq!(def.function.name, "query_weather");
        assert_eq!(def.function.description, "today's weather");
        assert_eq!(def.function.parameters, schema);

        let wire = serde_json::to_value(&def).unwrap();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["parameters"], schema);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let tool = ToolDescriptor {
            name: "noop".to_string(),
            description: None,
            input_schema: None,
        };
        let def = to_tool_definition(&tool);
        assert_eq!(def.function.description, "");
        assert_eq!(def.function.parameters["type"], "object");
    }

    #[test]
    fn test_order_preserved() {
        let tools: Vec<ToolDescriptor> = ["b", "a", "c"]
            .iter()
            .map(|name| ToolDescriptor {
                name: name.to_string(),
                description: None,
                input_schema: None,
            })
            .collect();
        let names: Vec<String> = to_tool_definitions(&tools)
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
