//! Tool catalogue and `tools/call` routing.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::Result;
use crate::protocol::{CallToolResult, JsonRpcError, ToolDefinition};

use super::handlers::{ActivateArgs, CreateArgs, DeleteArgs, EditArgs, PersonaHandlers};

// ─────────────────────────────────────────────────────────────────
// Tool Names
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    ListPersonas,
    ActivatePersona,
    CreatePersona,
    EditPersona,
    DeletePersona,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ListPersonas => "list_personas",
            ToolName::ActivatePersona => "activate_persona",
            ToolName::CreatePersona => "create_persona",
            ToolName::EditPersona => "edit_persona",
            ToolName::DeletePersona => "delete_persona",
        }
    }

    pub fn all() -> &'static [ToolName] {
        &[
            ToolName::ListPersonas,
            ToolName::ActivatePersona,
            ToolName::CreatePersona,
            ToolName::EditPersona,
            ToolName::DeletePersona,
        ]
    }
}

impl FromStr for ToolName {
    type Err = JsonRpcError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ToolName::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", s)))
    }
}

// ─────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────

/// Tool list advertised in `tools/list`
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let name_property = json!({
        "type": "string",
        "description": "Persona name: the filename without .md (lowercase letters, numbers and hyphens)",
        "pattern": "^[a-z0-9-]+$",
        "maxLength": 50
    });

    vec![
        ToolDefinition {
            name: ToolName::ListPersonas.as_str(),
            description: "List all available personas with their metadata",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDefinition {
            name: ToolName::ActivatePersona.as_str(),
            description: "Load and activate a specific persona's instructions mid-conversation",
            input_schema: json!({
                "type": "object",
                "properties": { "name": name_property },
                "required": ["name"]
            }),
        },
        ToolDefinition {
            name: ToolName::CreatePersona.as_str(),
            description: "Create a new persona file with specified name, description, and instructions",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": name_property,
                    "description": {
                        "type": "string",
                        "description": "Brief description (10-200 characters)",
                        "minLength": 10,
                        "maxLength": 200
                    },
                    "instructions": {
                        "type": "string",
                        "description": "Full instructions applied when the persona is active (minimum 20 characters)",
                        "minLength": 20
                    },
                    "author": {
                        "type": "string",
                        "description": "Author name",
                        "default": "User"
                    }
                },
                "required": ["name", "description", "instructions"]
            }),
        },
        ToolDefinition {
            name: ToolName::EditPersona.as_str(),
            description: "Update an existing persona's metadata or instructions",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": name_property,
                    "field": {
                        "type": "string",
                        "enum": ["description", "instructions", "author", "version"]
                    },
                    "value": {
                        "type": "string",
                        "description": "New value for the field"
                    }
                },
                "required": ["name", "field", "value"]
            }),
        },
        ToolDefinition {
            name: ToolName::DeletePersona.as_str(),
            description: "Remove a persona file from the personas directory (requires confirmation)",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": name_property,
                    "confirm": {
                        "type": "boolean",
                        "description": "Must be true to confirm deletion"
                    }
                },
                "required": ["name", "confirm"]
            }),
        },
    ]
}

// ─────────────────────────────────────────────────────────────────
// Invocation
// ─────────────────────────────────────────────────────────────────

/// Result of one tool call
#[derive(Debug)]
pub struct ToolOutcome {
    pub result: CallToolResult,

    /// Hosts should re-fetch `prompts/list`
    pub prompts_changed: bool,
}

/// Run a tool. Domain failures come back as `isError` results; only an
/// unknown tool or unreadable arguments are protocol errors.
pub fn call_tool(
    handlers: &PersonaHandlers,
    name: &str,
    arguments: Option<Value>,
) -> std::result::Result<ToolOutcome, JsonRpcError> {
    let tool: ToolName = name.parse()?;
    let arguments = arguments.unwrap_or_else(|| json!({}));

    match tool {
        ToolName::ListPersonas => respond(tool, handlers.list_personas(), false),
        ToolName::ActivatePersona => {
            let args: ActivateArgs = parse_args(tool, arguments)?;
            respond(tool, handlers.activate_persona(&args), false)
        }
        ToolName::CreatePersona => {
            let args: CreateArgs = parse_args(tool, arguments)?;
            respond(tool, handlers.create_persona(&args), true)
        }
        ToolName::EditPersona => {
            let args: EditArgs = parse_args(tool, arguments)?;
            let result = handlers.edit_persona(&args);
            let changed = result
                .as_ref()
                .map(|r| r.field_updated.affects_prompts())
                .unwrap_or(false);
            respond(tool, result, changed)
        }
        ToolName::DeletePersona => {
            let args: DeleteArgs = parse_args(tool, arguments)?;
            respond(tool, handlers.delete_persona(&args), true)
        }
    }
}

fn parse_args<T: DeserializeOwned>(
    tool: ToolName,
    arguments: Value,
) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("{}: {}", tool.as_str(), e)))
}

fn respond<T: Serialize>(
    tool: ToolName,
    result: Result<T>,
    changes_prompts: bool,
) -> std::result::Result<ToolOutcome, JsonRpcError> {
    match result {
        Ok(body) => {
            info!(tool = tool.as_str(), "Tool call succeeded");
            let value = serde_json::to_value(body).map_err(JsonRpcError::internal)?;
            Ok(ToolOutcome {
                result: CallToolResult::from_value(value, false),
                prompts_changed: changes_prompts,
            })
        }
        Err(e) => {
            warn!(tool = tool.as_str(), error = %e.format_for_log(), "Tool call failed");
            let body = json!({ "success": false, "error": e.to_body() });
            Ok(ToolOutcome {
                result: CallToolResult::from_value(body, true),
                prompts_changed: false,
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaStore;
    use crate::protocol::INVALID_PARAMS;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_handlers() -> (PersonaHandlers, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = PersonaStore::new(tmp.path().join("personas"));
        (PersonaHandlers::new(Arc::new(store)), tmp)
    }

    fn create(handlers: &PersonaHandlers, name: &str) -> ToolOutcome {
        call_tool(
            handlers,
            "create_persona",
            Some(json!({
                "name": name,
                "description": "Reviews code carefully",
                "instructions": "Review every change for correctness and clarity."
            })),
        )
        .unwrap()
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "list_personas",
                "activate_persona",
                "create_persona",
                "edit_persona",
                "delete_persona"
            ]
        );
        for def in &defs {
            assert_eq!(def.input_schema["type"], "object");
        }
    }

    #[test]
    fn test_unknown_tool_is_protocol_error() {
        let (handlers, _tmp) = test_handlers();
        let err = call_tool(&handlers, "rename_persona", None).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn test_missing_argument_is_protocol_error() {
        let (handlers, _tmp) = test_handlers();
        let err = call_tool(&handlers, "activate_persona", Some(json!({}))).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert!(err.message.contains("name"));
    }

    #[test]
    fn test_create_signals_prompt_change() {
        let (handlers, _tmp) = test_handlers();
        let outcome = create(&handlers, "reviewer");
        assert!(!outcome.result.is_error);
        assert!(outcome.prompts_changed);
        assert_eq!(outcome.result.structured_content["success"], true);
    }

    #[test]
    fn test_domain_error_is_tool_error() {
        let (handlers, _tmp) = test_handlers();
        create(&handlers, "reviewer");
        let outcome = create(&handlers, "reviewer");

        assert!(outcome.result.is_error);
        assert!(!outcome.prompts_changed);
        let error = &outcome.result.structured_content["error"];
        assert_eq!(outcome.result.structured_content["success"], false);
        assert_eq!(error["kind"], "persona_already_exists");
        assert_eq!(error["code"], "E201");
    }

    #[test]
    fn test_activate_miss_carries_available() {
        let (handlers, _tmp) = test_handlers();
        create(&handlers, "reviewer");
        let outcome =
            call_tool(&handlers, "activate_persona", Some(json!({"name": "nobody"}))).unwrap();
        assert!(outcome.result.is_error);
        let details = &outcome.result.structured_content["error"]["details"];
        assert_eq!(details["available_personas"], json!(["reviewer"]));
    }

    #[test]
    fn test_edit_author_does_not_change_prompts() {
        let (handlers, _tmp) = test_handlers();
        create(&handlers, "reviewer");

        let outcome = call_tool(
            &handlers,
            "edit_persona",
            Some(json!({"name": "reviewer", "field": "author", "value": "Me"})),
        )
        .unwrap();
        assert!(!outcome.result.is_error);
        assert!(!outcome.prompts_changed);

        let outcome = call_tool(
            &handlers,
            "edit_persona",
            Some(json!({"name": "reviewer", "field": "description", "value": "Reviews code very carefully"})),
        )
        .unwrap();
        assert!(outcome.prompts_changed);
    }

    #[test]
    fn test_delete_without_confirm() {
        let (handlers, _tmp) = test_handlers();
        create(&handlers, "reviewer");
        let outcome =
            call_tool(&handlers, "delete_persona", Some(json!({"name": "reviewer"}))).unwrap();
        assert!(outcome.result.is_error);
        assert_eq!(
            outcome.result.structured_content["error"]["kind"],
            "confirmation_required"
        );
    }
}
