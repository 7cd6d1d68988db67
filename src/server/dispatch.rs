//! JSON-RPC method dispatch.
//!
//! `McpServer` turns one input line into at most one response plus any
//! notifications that should follow it. It holds no per-session state, so
//! the transport decides everything about ordering and framing.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::ServerSettings;
use crate::protocol::{
    negotiate, CallToolParams, Content, GetPromptParams, GetPromptResult, Implementation,
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ListChangedCapability, PromptDescriptor, PromptMessage, RequestId,
    ServerCapabilities, JSONRPC_VERSION,
};

use super::handlers::PersonaHandlers;
use super::tools;

/// Everything to write back for one input line
#[derive(Debug, Default)]
pub struct Reply {
    pub response: Option<JsonRpcResponse>,
    pub notifications: Vec<JsonRpcNotification>,
}

impl Reply {
    fn respond(response: JsonRpcResponse) -> Self {
        Self {
            response: Some(response),
            notifications: Vec::new(),
        }
    }

    /// Serialized lines in write order
    pub fn lines(&self) -> Result<Vec<String>, serde_json::Error> {
        let mut lines = Vec::with_capacity(1 + self.notifications.len());
        if let Some(ref response) = self.response {
            lines.push(response.to_json()?);
        }
        for notification in &self.notifications {
            lines.push(notification.to_json()?);
        }
        Ok(lines)
    }
}

/// Successful method result plus whether prompts changed
struct Handled {
    result: Value,
    prompts_changed: bool,
}

impl Handled {
    fn value<T: Serialize>(body: T) -> Result<Self, JsonRpcError> {
        Ok(Self {
            result: serde_json::to_value(body).map_err(JsonRpcError::internal)?,
            prompts_changed: false,
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────

pub struct McpServer {
    handlers: PersonaHandlers,
    server_info: Implementation,
}

impl McpServer {
    pub fn new(handlers: PersonaHandlers, settings: &ServerSettings) -> Self {
        Self {
            handlers,
            server_info: Implementation {
                name: settings.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Handle one line of input
    pub fn handle_line(&self, line: &str) -> Reply {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Unparsable request line");
                return Reply::respond(JsonRpcResponse::failure(None, JsonRpcError::parse_error(e)));
            }
        };

        // Recover the id, if any, so even a malformed request gets a matched reply
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value::<RequestId>(id).ok());

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Reply::respond(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Reply::respond(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!("unsupported jsonrpc '{}'", request.jsonrpc)),
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return Reply::default();
        }

        debug!(method = %request.method, id = ?request.id, "Request received");

        match self.dispatch(&request) {
            Ok(handled) => Reply {
                response: Some(JsonRpcResponse::success(request.id, handled.result)),
                notifications: if handled.prompts_changed {
                    vec![JsonRpcNotification::prompts_list_changed()]
                } else {
                    Vec::new()
                },
            },
            Err(error) => {
                debug!(method = %request.method, code = error.code, "Request failed");
                Reply::respond(JsonRpcResponse::failure(request.id, error))
            }
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => info!("Host initialized session"),
            "notifications/cancelled" => debug!("Host cancelled a request"),
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn dispatch(&self, request: &JsonRpcRequest) -> Result<Handled, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => self.initialize(request),
            "ping" => Handled::value(json!({})),
            "tools/list" => Handled::value(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => {
                let params: CallToolParams = request
                    .params_as()
                    .map_err(JsonRpcError::invalid_params)?;
                let outcome = tools::call_tool(&self.handlers, &params.name, params.arguments)?;
                Ok(Handled {
                    result: serde_json::to_value(outcome.result)
                        .map_err(JsonRpcError::internal)?,
                    prompts_changed: outcome.prompts_changed,
                })
            }
            "prompts/list" => self.list_prompts(),
            "prompts/get" => self.get_prompt(request),
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, request: &JsonRpcRequest) -> Result<Handled, JsonRpcError> {
        let params: InitializeParams = request
            .params_as()
            .map_err(JsonRpcError::invalid_params)?;
        let version = negotiate(params.protocol_version.as_deref());

        info!(
            client = %params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            requested = ?params.protocol_version,
            protocol_version = %version,
            "Session initialized"
        );

        Handled::value(InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChangedCapability { list_changed: false },
                prompts: ListChangedCapability { list_changed: true },
            },
            server_info: self.server_info.clone(),
        })
    }

    /// One prompt per loadable persona, named by slug
    fn list_prompts(&self) -> Result<Handled, JsonRpcError> {
        let personas = self
            .handlers
            .store()
            .list()
            .map_err(|e| JsonRpcError::internal(e.format_for_log()))?;

        let prompts: Vec<PromptDescriptor> = personas
            .into_iter()
            .map(|p| PromptDescriptor {
                name: p.slug,
                description: p.description,
            })
            .collect();

        Handled::value(json!({ "prompts": prompts }))
    }

    fn get_prompt(&self, request: &JsonRpcRequest) -> Result<Handled, JsonRpcError> {
        let params: GetPromptParams = request
            .params_as()
            .map_err(JsonRpcError::invalid_params)?;

        let persona = self.handlers.store().get(&params.name).map_err(|e| {
            let mut error = JsonRpcError::invalid_params(&e);
            error.data = serde_json::to_value(e.to_body()).ok();
            error
        })?;

        Handled::value(GetPromptResult {
            description: persona.metadata.description,
            messages: vec![PromptMessage {
                role: "user",
                content: Content::Text {
                    text: persona.instructions,
                },
            }],
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaStore;
    use crate::protocol::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_server() -> (McpServer, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = PersonaStore::new(tmp.path().join("personas"));
        store.ensure_initialized().unwrap();
        let server = McpServer::new(
            PersonaHandlers::new(Arc::new(store)),
            &ServerSettings::default(),
        );
        (server, tmp)
    }

    fn call(server: &McpServer, request: Value) -> (Value, Vec<String>) {
        let reply = server.handle_line(&request.to_string());
        let response = serde_json::to_value(reply.response.expect("response")).unwrap();
        let notifications = reply.notifications.into_iter().map(|n| n.method).collect();
        (response, notifications)
    }

    #[test]
    fn test_initialize() {
        let (server, _tmp) = test_server();
        let (response, _) = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-host", "version": "1.0"}
            }}),
        );
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "PersonaSwitcher");
        assert_eq!(
            response["result"]["capabilities"]["prompts"]["listChanged"],
            true
        );
    }

    #[test]
    fn test_notification_gets_no_reply() {
        let (server, _tmp) = test_server();
        let reply = server.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert!(reply.response.is_none());
        assert!(reply.notifications.is_empty());
    }

    #[test]
    fn test_protocol_errors() {
        let (server, _tmp) = test_server();

        let reply = server.handle_line("{not json");
        let response = serde_json::to_value(reply.response.unwrap()).unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert_eq!(response["id"], Value::Null);

        let (response, _) = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "resources/read"}));
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);

        let (response, _) = call(&server, json!({"jsonrpc": "2.0", "id": 3}));
        assert_eq!(response["error"]["code"], INVALID_REQUEST);
        assert_eq!(response["id"], 3);
    }

    #[test]
    fn test_tools_list() {
        let (server, _tmp) = test_server();
        let (response, _) = call(&server, json!({"jsonrpc": "2.0", "id": "t", "method": "tools/list"}));
        assert_eq!(response["id"], "t");
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_create_emits_list_changed() {
        let (server, _tmp) = test_server();
        let (response, notifications) = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
                "name": "create_persona",
                "arguments": {
                    "name": "python-expert",
                    "description": "Python programming expert",
                    "instructions": "You are a Python expert with deep knowledge."
                }
            }}),
        );
        assert_eq!(response["result"]["isError"], false);
        assert_eq!(notifications, vec!["notifications/prompts/list_changed"]);

        let (response, notifications) = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "list_personas"}}),
        );
        assert!(notifications.is_empty());
        assert_eq!(response["result"]["structuredContent"]["count"], 2);
    }

    #[test]
    fn test_prompts() {
        let (server, _tmp) = test_server();
        let (response, _) = call(&server, json!({"jsonrpc": "2.0", "id": 6, "method": "prompts/list"}));
        assert_eq!(response["result"]["prompts"][0]["name"], "example");

        let (response, _) = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 7, "method": "prompts/get", "params": {"name": "example"}}),
        );
        let message = &response["result"]["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(message["content"]["type"], "text");
        assert!(message["content"]["text"].as_str().unwrap().len() >= 20);

        let (response, _) = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 8, "method": "prompts/get", "params": {"name": "missing"}}),
        );
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(response["error"]["data"]["kind"], "persona_not_found");
    }
}
