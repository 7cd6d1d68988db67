//! Persona system — named instruction sets stored as Markdown files.
//!
//! Each persona is one `<slug>.md` file in the personas directory: a small
//! metadata block (name, description, version, author) followed by the
//! instructions a host applies when the persona is activated.

pub mod document;
pub mod registry;
pub mod store;
pub mod types;
pub mod validate;

pub use document::{DocumentError, PersonaDocument};
pub use registry::PersonaRegistry;
pub use store::PersonaStore;
pub use types::{EditableField, Persona, PersonaMetadata, PersonaSummary};
