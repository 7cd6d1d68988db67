//! Persona file codec.
//!
//! ```text
//! ---
//! name: Python Expert
//! description: Python programming expert
//! version: '1.0'
//! author: User
//! ---
//! You are a Python expert with deep knowledge.
//! ```
//!
//! The block between the `---` lines is YAML, decoded into an ordered
//! mapping. Keys this crate does not interpret keep their position and
//! their value, lists and nested maps included, across edits.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use super::types::{Persona, PersonaMetadata, DEFAULT_AUTHOR, DEFAULT_VERSION};

const DELIMITER: &str = "---";

/// Why a file could not be read as a persona document
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("file does not start with a '---' metadata block")]
    MissingMetadata,

    #[error("metadata block is not closed by a '---' line")]
    UnterminatedMetadata,

    #[error("metadata block is not valid YAML: {0}")]
    Yaml(String),

    #[error("metadata block must be a mapping of keys to values")]
    NotAMapping,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must be a plain text value")]
    NotText(&'static str),
}

impl From<serde_yaml::Error> for DocumentError {
    fn from(e: serde_yaml::Error) -> Self {
        DocumentError::Yaml(e.to_string())
    }
}

/// Parsed persona file: ordered metadata plus body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonaDocument {
    metadata: Mapping,
    body: String,
}

impl PersonaDocument {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            metadata: Mapping::new(),
            body: body.into(),
        }
    }

    /// String value of `key`; other YAML types read as `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Replace `key` in place, or append it
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.metadata.insert(Value::from(key), Value::String(value.into()));
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().filter_map(Value::as_str)
    }

    /// Parse file content
    pub fn parse(content: &str) -> Result<Self, DocumentError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let (yaml, body) = split_front_matter(content)?;

        let metadata = if yaml.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(yaml)? {
                Value::Mapping(mapping) => mapping,
                Value::Null => Mapping::new(),
                _ => return Err(DocumentError::NotAMapping),
            }
        };

        Ok(PersonaDocument {
            metadata,
            body: body.trim().to_string(),
        })
    }

    /// Render file content
    pub fn render(&self) -> Result<String, DocumentError> {
        let mut out = String::with_capacity(self.body.len() + 128);
        out.push_str(DELIMITER);
        out.push('\n');
        if !self.metadata.is_empty() {
            out.push_str(&serde_yaml::to_string(&self.metadata)?);
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(self.body.trim_end());
        out.push('\n');
        Ok(out)
    }

    /// Interpret the document as a persona stored under `slug`
    pub fn into_persona(self, slug: &str) -> Result<Persona, DocumentError> {
        let name = required_text(&self.metadata, "name")?;
        let description = required_text(&self.metadata, "description")?;
        let version = optional_text(&self.metadata, "version")?
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let author = optional_text(&self.metadata, "author")?
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let extra = self
            .metadata
            .into_iter()
            .filter(|(k, _)| {
                !matches!(k.as_str(), Some("name" | "description" | "version" | "author"))
            })
            .collect();

        Ok(Persona {
            slug: slug.to_string(),
            metadata: PersonaMetadata {
                name,
                description,
                version,
                author,
                extra,
            },
            instructions: self.body,
        })
    }

    /// Build the document for a persona, known keys first
    pub fn from_persona(persona: &Persona) -> Self {
        let meta = &persona.metadata;
        let mut doc = PersonaDocument::new(persona.instructions.clone());
        doc.set("name", meta.name.clone());
        doc.set("description", meta.description.clone());
        doc.set("version", meta.version.clone());
        doc.set("author", meta.author.clone());
        for (key, value) in &meta.extra {
            doc.metadata.insert(key.clone(), value.clone());
        }
        doc
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Split into the YAML between the delimiter lines and the text after them
fn split_front_matter(content: &str) -> Result<(&str, &str), DocumentError> {
    let mut lines = content.split_inclusive('\n');
    let start = match lines.next() {
        Some(first) if is_delimiter(first) => first.len(),
        _ => return Err(DocumentError::MissingMetadata),
    };

    let mut offset = start;
    for line in lines {
        if is_delimiter(line) {
            return Ok((&content[start..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(DocumentError::UnterminatedMetadata)
}

/// Scalars read as text the way they were written; `1.0` stays "1.0"
fn optional_text(metadata: &Mapping, key: &'static str) -> Result<Option<String>, DocumentError> {
    match metadata.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(DocumentError::NotText(key)),
    }
}

fn required_text(metadata: &Mapping, key: &'static str) -> Result<String, DocumentError> {
    optional_text(metadata, key)?.ok_or(DocumentError::MissingField(key))
}
