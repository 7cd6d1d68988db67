//! Request handlers for the five persona tools.
//!
//! Each handler takes typed arguments, calls the store and returns the
//! response body hosts see. Errors stay typed here; turning them into wire
//! bodies happens in the tool layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::persona::{EditableField, PersonaStore, PersonaSummary};

// ─────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateArgs {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateArgs {
    pub name: String,
    pub description: String,
    pub instructions: String,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditArgs {
    pub name: String,
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteArgs {
    pub name: String,

    /// Absent is the same as false
    #[serde(default)]
    pub confirm: bool,
}

// ─────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub personas: Vec<PersonaSummary>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    pub success: bool,

    /// Display name from the metadata block
    pub persona_name: String,
    pub instructions: String,
    pub metadata: ActivateMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivateMetadata {
    pub description: String,
    pub version: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub persona_name: String,
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub success: bool,
    pub persona_name: String,
    pub field_updated: EditableField,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub persona_name: String,
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────

/// Translates tool calls into store operations
#[derive(Clone)]
pub struct PersonaHandlers {
    store: Arc<PersonaStore>,
}

impl PersonaHandlers {
    pub fn new(store: Arc<PersonaStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &PersonaStore {
        &self.store
    }

    pub fn list_personas(&self) -> Result<ListResponse> {
        let personas = self.store.list()?;
        debug!(count = personas.len(), "Listed personas");
        Ok(ListResponse {
            count: personas.len(),
            personas,
        })
    }

    /// Load a persona. A miss carries the slugs that do exist.
    pub fn activate_persona(&self, args: &ActivateArgs) -> Result<ActivateResponse> {
        let persona = match self.store.activate(&args.name) {
            Ok(persona) => persona,
            Err(Error::PersonaNotFound { name, .. }) => {
                return Err(Error::PersonaNotFound {
                    name,
                    available: self.store.available_slugs(),
                })
            }
            Err(e) => return Err(e),
        };

        let meta = persona.metadata;
        Ok(ActivateResponse {
            success: true,
            persona_name: meta.name,
            instructions: persona.instructions,
            metadata: ActivateMetadata {
                description: meta.description,
                version: meta.version,
                author: meta.author,
            },
        })
    }

    pub fn create_persona(&self, args: &CreateArgs) -> Result<CreateResponse> {
        let path = self.store.create(
            &args.name,
            &args.description,
            &args.instructions,
            args.author.as_deref(),
        )?;

        let name = args.name.trim().to_string();
        Ok(CreateResponse {
            success: true,
            message: format!("Persona '{}' created successfully", name),
            file_path: path.display().to_string(),
            persona_name: name,
        })
    }

    pub fn edit_persona(&self, args: &EditArgs) -> Result<EditResponse> {
        let field = self.store.edit(&args.name, &args.field, &args.value)?;

        let name = args.name.trim().to_string();
        Ok(EditResponse {
            success: true,
            message: format!("Persona '{}' updated successfully", name),
            persona_name: name,
            field_updated: field,
        })
    }

    pub fn delete_persona(&self, args: &DeleteArgs) -> Result<DeleteResponse> {
        self.store.delete(&args.name, args.confirm)?;

        let name = args.name.trim().to_string();
        Ok(DeleteResponse {
            success: true,
            message: format!("Persona '{}' deleted successfully", name),
            persona_name: name,
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_handlers() -> (PersonaHandlers, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = PersonaStore::new(tmp.path().join("personas"));
        (PersonaHandlers::new(Arc::new(store)), tmp)
    }

    fn create_args(name: &str) -> CreateArgs {
        CreateArgs {
            name: name.to_string(),
            description: "Python programming expert".to_string(),
            instructions: "You are a Python expert with deep knowledge.".to_string(),
            author: None,
        }
    }

    #[test]
    fn test_create_then_list() {
        let (handlers, _tmp) = test_handlers();
        let created = handlers.create_persona(&create_args("python-expert")).unwrap();
        assert!(created.success);
        assert_eq!(created.persona_name, "python-expert");
        assert!(created.file_path.ends_with("python-expert.md"));

        let listed = handlers.list_personas().unwrap();
        assert_eq!(listed.count, 1);
        let json = serde_json::to_value(&listed).unwrap();
        assert_eq!(json["personas"][0]["filename"], "python-expert");
        assert_eq!(json["personas"][0]["name"], "Python Expert");
    }

    #[test]
    fn test_activate_returns_display_name() {
        let (handlers, _tmp) = test_handlers();
        handlers.create_persona(&create_args("python-expert")).unwrap();

        let active = handlers
            .activate_persona(&ActivateArgs {
                name: "python-expert".into(),
            })
            .unwrap();
        assert_eq!(active.persona_name, "Python Expert");
        assert_eq!(active.metadata.author, "User");
        assert_eq!(
            active.instructions,
            "You are a Python expert with deep knowledge."
        );
    }

    #[test]
    fn test_activate_miss_lists_available() {
        let (handlers, _tmp) = test_handlers();
        handlers.create_persona(&create_args("alpha")).unwrap();
        handlers.create_persona(&create_args("beta")).unwrap();

        let err = handlers
            .activate_persona(&ActivateArgs {
                name: "gamma".into(),
            })
            .unwrap_err();
        match err {
            Error::PersonaNotFound { name, available } => {
                assert_eq!(name, "gamma");
                assert_eq!(available, vec!["alpha", "beta"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_edit_reports_field() {
        let (handlers, _tmp) = test_handlers();
        handlers.create_persona(&create_args("coder")).unwrap();

        let edited = handlers
            .edit_persona(&EditArgs {
                name: "coder".into(),
                field: "version".into(),
                value: "2.0".into(),
            })
            .unwrap();
        let json = serde_json::to_value(&edited).unwrap();
        assert_eq!(json["field_updated"], "version");
        assert_eq!(json["message"], "Persona 'coder' updated successfully");
    }

    #[test]
    fn test_delete_needs_confirm() {
        let (handlers, _tmp) = test_handlers();
        handlers.create_persona(&create_args("coder")).unwrap();

        let args: DeleteArgs = serde_json::from_str(r#"{"name":"coder"}"#).unwrap();
        assert!(matches!(
            handlers.delete_persona(&args),
            Err(Error::ConfirmationRequired { .. })
        ));

        let deleted = handlers
            .delete_persona(&DeleteArgs {
                name: "coder".into(),
                confirm: true,
            })
            .unwrap();
        assert_eq!(deleted.message, "Persona 'coder' deleted successfully");
        assert_eq!(handlers.list_personas().unwrap().count, 0);
    }
}
