//! Error types for persona-switcher
//!
//! Every failure carries an `E`-prefixed code, a stable `kind` string for
//! MCP hosts, an optional hint, and the exit code the CLI terminates with.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type alias for persona operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable numeric codes, grouped by hundreds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Validation errors (1xx)
    InvalidName = 100,
    InvalidDescription = 101,
    InvalidInstructions = 102,
    InvalidField = 103,
    InvalidValue = 104,

    // Persona errors (2xx)
    PersonaNotFound = 200,
    PersonaAlreadyExists = 201,
    ConfirmationRequired = 202,
    PersonaCorrupt = 203,

    // Storage errors (3xx)
    IoRead = 300,
    IoWrite = 301,
    IoPermission = 302,
    StorageFull = 303,
    IoNotFound = 304,

    // Configuration errors (4xx)
    ConfigNotFound = 400,
    ConfigParseError = 401,
    ConfigValidation = 402,

    // Protocol errors (5xx)
    ProtocolMalformed = 500,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// "E100" style rendering
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Process exit status for the CLI, one per hundred-group
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Validation errors
            200..=299 => 20, // Persona errors
            300..=399 => 30, // Storage errors
            400..=499 => 40, // Config errors
            500..=599 => 50, // Protocol errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for persona operations
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona slug does not match the naming rules
    #[error("Invalid persona name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Description outside the allowed length
    #[error("Invalid description: {reason}")]
    InvalidDescription { reason: String },

    /// Instructions too short
    #[error("Invalid instructions: {reason}")]
    InvalidInstructions { reason: String },

    /// Field is not editable
    #[error("Invalid field name '{field}'. Allowed fields: description, instructions, author, version")]
    InvalidField { field: String },

    /// Value rejected for an otherwise valid field
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Persona Errors
    // ─────────────────────────────────────────────────────────────

    /// No file for this slug
    #[error("Persona '{name}' not found")]
    PersonaNotFound {
        name: String,
        /// Slugs that do exist, filled in when activation fails
        available: Vec<String>,
    },

    /// A file for this slug already exists
    #[error("Persona '{name}' already exists")]
    PersonaAlreadyExists { name: String, path: PathBuf },

    /// Destructive operation attempted without confirm=true
    #[error("Confirmation required to delete persona '{name}'. Set confirm=true to proceed.")]
    ConfirmationRequired { name: String },

    /// On-disk file could not be parsed into a persona
    #[error("Persona '{name}' is corrupt: {reason}")]
    CorruptPersona { name: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read {path}: {source}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File write or rename error
    #[error("Failed to write {path}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File removal error
    #[error("Failed to delete {path}: {source}")]
    IoDelete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Disk full or quota exceeded while writing
    #[error("No space left on device while writing {path}: {source}")]
    StorageFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Protocol Errors
    // ─────────────────────────────────────────────────────────────

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed request from the host
    #[error("Protocol error: {0}")]
    Protocol(String),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Classification used by both the CLI and MCP bodies
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidName { .. } => ErrorCode::InvalidName,
            Error::InvalidDescription { .. } => ErrorCode::InvalidDescription,
            Error::InvalidInstructions { .. } => ErrorCode::InvalidInstructions,
            Error::InvalidField { .. } => ErrorCode::InvalidField,
            Error::InvalidValue { .. } => ErrorCode::InvalidValue,

            Error::PersonaNotFound { .. } => ErrorCode::PersonaNotFound,
            Error::PersonaAlreadyExists { .. } => ErrorCode::PersonaAlreadyExists,
            Error::ConfirmationRequired { .. } => ErrorCode::ConfirmationRequired,
            Error::CorruptPersona { .. } => ErrorCode::PersonaCorrupt,

            Error::IoRead { source, .. }
            | Error::IoWrite { source, .. }
            | Error::IoDelete { source, .. }
            | Error::Io(source) => match source.kind() {
                io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ if matches!(self, Error::IoRead { .. }) => ErrorCode::IoRead,
                _ => ErrorCode::IoWrite,
            },
            Error::StorageFull { .. } => ErrorCode::StorageFull,

            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::Json(_) | Error::Protocol(_) => ErrorCode::ProtocolMalformed,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Machine-readable error kind reported to hosts
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidName { .. }
            | Error::InvalidDescription { .. }
            | Error::InvalidInstructions { .. }
            | Error::InvalidField { .. }
            | Error::InvalidValue { .. } => "validation_error",
            Error::PersonaNotFound { .. } => "persona_not_found",
            Error::PersonaAlreadyExists { .. } => "persona_already_exists",
            Error::ConfirmationRequired { .. } => "confirmation_required",
            Error::CorruptPersona { .. } => "invalid_persona_format",
            Error::IoRead { .. } | Error::IoWrite { .. } | Error::IoDelete { .. } | Error::Io(_) => {
                "file_access_error"
            }
            Error::StorageFull { .. } => "storage_error",
            Error::ConfigNotFound { .. }
            | Error::ConfigParse { .. }
            | Error::ConfigValidation { .. }
            | Error::Toml(_) => "config_error",
            Error::Json(_) | Error::Protocol(_) => "protocol_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether this is an input validation failure
    pub fn is_validation(&self) -> bool {
        self.kind() == "validation_error"
    }

    /// See [`ErrorCode::exit_code`]
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// What the caller can do about it, if anything
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::InvalidName { .. } => Some(
                "Use 1-50 lowercase letters, numbers, and hyphens (e.g. 'code-reviewer').",
            ),
            Error::InvalidDescription { .. } => {
                Some("Provide a description between 10 and 200 characters.")
            }
            Error::InvalidInstructions { .. } => {
                Some("Provide instructions of at least 20 characters.")
            }
            Error::InvalidField { .. } => {
                Some("Editable fields are: description, instructions, author, version.")
            }
            Error::InvalidValue { .. } => Some("Provide a non-empty value."),

            Error::PersonaNotFound { .. } => Some(
                "Check the persona name or use list_personas to see available personas.",
            ),
            Error::PersonaAlreadyExists { .. } => Some(
                "Choose a different name, or use edit_persona to change the existing persona.",
            ),
            Error::ConfirmationRequired { .. } => Some(
                "Set confirm=true (or pass --yes on the command line). Deletion cannot be undone.",
            ),
            Error::CorruptPersona { .. } => Some(
                "Fix the metadata block between the '---' lines; it must define 'name' and 'description'.",
            ),

            Error::IoRead { .. } | Error::IoWrite { .. } | Error::IoDelete { .. } | Error::Io(_) => {
                Some("Check that the personas directory exists and is writable by this process.")
            }
            Error::StorageFull { .. } => Some("Free up disk space and try again."),

            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-switcher config init' to create a default configuration file.",
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'persona-switcher config validate' to see details.",
            ),
            Error::ConfigValidation { .. } => {
                Some("Review the configuration file and fix the invalid values.")
            }

            _ => None,
        }
    }

    /// Red code line plus a yellow hint, for stderr
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Single uncoloured line for tracing fields
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }

    /// Structured context sent alongside the message
    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        match self {
            Error::InvalidName { name, .. } => {
                details.insert("field".into(), "name".into());
                details.insert("persona_name".into(), name.clone().into());
            }
            Error::InvalidDescription { .. } => {
                details.insert("field".into(), "description".into());
            }
            Error::InvalidInstructions { .. } => {
                details.insert("field".into(), "instructions".into());
            }
            Error::InvalidField { field } => {
                details.insert("field".into(), "field".into());
                details.insert("value".into(), field.clone().into());
            }
            Error::InvalidValue { field, .. } => {
                details.insert("field".into(), field.clone().into());
            }
            Error::PersonaNotFound { name, available } => {
                details.insert("persona_name".into(), name.clone().into());
                if !available.is_empty() {
                    details.insert("available_personas".into(), available.clone().into());
                }
            }
            Error::PersonaAlreadyExists { name, path } => {
                details.insert("persona_name".into(), name.clone().into());
                details.insert("file_path".into(), path.display().to_string().into());
            }
            Error::ConfirmationRequired { name } | Error::CorruptPersona { name, .. } => {
                details.insert("persona_name".into(), name.clone().into());
            }
            Error::IoRead { path, .. }
            | Error::IoWrite { path, .. }
            | Error::IoDelete { path, .. }
            | Error::StorageFull { path, .. } => {
                details.insert("file_path".into(), path.display().to_string().into());
            }
            _ => {}
        }
        details
    }

    /// Convert into the wire representation used by request handlers
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            code: self.code().as_str(),
            message: self.to_string(),
            hint: self.suggestion(),
            details: self.details(),
        }
    }
}

/// Serializable error returned to hosts in place of a success payload
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a persona not found error
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::PersonaNotFound {
            name: name.into(),
            available: Vec::new(),
        }
    }

    /// Create a corrupt persona error
    pub fn corrupt(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::CorruptPersona {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify a failed write, separating disk-full from other failures
    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if is_storage_full(&source) {
            Error::StorageFull { path, source }
        } else {
            Error::IoWrite { path, source }
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// ENOSPC and EDQUOT, falling back to the OS message on other platforms
fn is_storage_full(err: &io::Error) -> bool {
    if cfg!(target_os = "linux") && matches!(err.raw_os_error(), Some(28 | 122)) {
        return true;
    }
    let message = err.to_string();
    message.contains("No space left") || message.contains("Disk quota")
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::InvalidName.as_str(), "E100");
        assert_eq!(ErrorCode::PersonaNotFound.as_str(), "E200");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::InvalidDescription.exit_code(), 10);
        assert_eq!(ErrorCode::PersonaAlreadyExists.exit_code(), 20);
        assert_eq!(ErrorCode::StorageFull.exit_code(), 30);
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 40);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::InvalidField { field: "name".into() }.kind(),
            "validation_error"
        );
        assert_eq!(Error::not_found("x").kind(), "persona_not_found");
        assert_eq!(
            Error::ConfirmationRequired { name: "x".into() }.kind(),
            "confirmation_required"
        );
        assert_eq!(Error::corrupt("x", "bad").kind(), "invalid_persona_format");
        assert!(Error::InvalidDescription { reason: "short".into() }.is_validation());
        assert!(!Error::not_found("x").is_validation());
    }

    #[test]
    fn test_write_failed_classification() {
        let err = Error::write_failed(
            "/tmp/x.md",
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
        );
        assert!(matches!(err, Error::StorageFull { .. }));
        assert_eq!(err.kind(), "storage_error");

        let err = Error::write_failed(
            "/tmp/x.md",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, Error::IoWrite { .. }));
        assert_eq!(err.code(), ErrorCode::IoPermission);
        // OS message is carried verbatim
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_not_found_suggestion_mentions_list() {
        let err = Error::not_found("ghost");
        assert!(err.suggestion().unwrap().contains("list_personas"));
    }

    #[test]
    fn test_to_body_details() {
        let err = Error::PersonaNotFound {
            name: "ghost".into(),
            available: vec!["example".into()],
        };
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["kind"], "persona_not_found");
        assert_eq!(body["code"], "E200");
        assert_eq!(body["details"]["persona_name"], "ghost");
        assert_eq!(body["details"]["available_personas"][0], "example");
        assert!(body["hint"].is_string());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::ConfirmationRequired { name: "x".into() };
        let formatted = err.format_for_terminal();
        assert!(formatted.contains("E202"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let formatted = Error::not_found("x").format_for_log();
        assert!(formatted.contains("[E200]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.code(), ErrorCode::IoNotFound);
        assert_eq!(err.kind(), "file_access_error");
    }
}
