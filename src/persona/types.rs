//! Core types for the persona system.
//!
//! A persona is one `<slug>.md` file: a metadata block followed by the
//! instruction body. The slug is the file stem and the lookup key; `name` is
//! the display name stored in the metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Version written when a persona is created
pub const DEFAULT_VERSION: &str = "1.0";

/// Author written when the caller does not supply one
pub const DEFAULT_AUTHOR: &str = "User";

// ─────────────────────────────────────────────────────────────────
// Editable Field
// ─────────────────────────────────────────────────────────────────

/// Fields that `edit` may replace. `name` is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditableField {
    Description,
    Instructions,
    Author,
    Version,
}

impl EditableField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditableField::Description => "description",
            EditableField::Instructions => "instructions",
            EditableField::Author => "author",
            EditableField::Version => "version",
        }
    }

    pub fn all() -> &'static [EditableField] {
        &[
            EditableField::Description,
            EditableField::Instructions,
            EditableField::Author,
            EditableField::Version,
        ]
    }

    /// Whether hosts should refresh their prompt list after this field changes
    pub fn affects_prompts(&self) -> bool {
        matches!(self, EditableField::Description | EditableField::Instructions)
    }
}

impl fmt::Display for EditableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditableField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditableField::all()
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::InvalidField {
                field: s.to_string(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// Metadata block of a persona file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,

    /// Keys this crate does not interpret, kept in file order
    #[serde(skip)]
    pub extra: serde_yaml::Mapping,
}

/// A fully loaded persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persona {
    /// File stem and lookup key
    pub slug: String,

    #[serde(flatten)]
    pub metadata: PersonaMetadata,

    /// Body text following the metadata block
    pub instructions: String,
}

impl Persona {
    pub fn summary(&self) -> PersonaSummary {
        PersonaSummary {
            name: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
            version: self.metadata.version.clone(),
            author: self.metadata.author.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaSummary {
    pub name: String,
    pub description: String,
    pub version: String,
    pub author: String,

    /// Reported to hosts as `filename`, the key they pass back to other tools
    #[serde(rename = "filename")]
    pub slug: String,
}

/// Display name derived from a slug: `python-expert` → `Python Expert`
pub fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
