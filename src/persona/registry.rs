//! Bundled personas shipped inside the binary.
//!
//! Used to seed an empty personas directory so that first-time users see a
//! working example of the file format.

use super::document::{DocumentError, PersonaDocument};
use super::types::Persona;

/// Slug of the persona written on first run
pub const EXAMPLE_SLUG: &str = "example";

const BUNDLED: &[(&str, &str)] = &[(
    EXAMPLE_SLUG,
    include_str!("../../config/personas/example.md"),
)];

/// Registry of personas compiled into the binary.
pub struct PersonaRegistry;

impl PersonaRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Raw file content of a bundled persona.
    pub fn get_bundled(&self, slug: &str) -> Option<&'static str> {
        BUNDLED
            .iter()
            .find(|(s, _)| *s == slug)
            .map(|(_, content)| *content)
    }

    /// Parse a bundled persona.
    pub fn load(&self, slug: &str) -> Option<Result<Persona, DocumentError>> {
        self.get_bundled(slug)
            .map(|content| PersonaDocument::parse(content).and_then(|doc| doc.into_persona(slug)))
    }

    /// The persona used to seed an empty directory.
    pub fn example(&self) -> Result<Persona, DocumentError> {
        self.load(EXAMPLE_SLUG)
            .unwrap_or(Err(DocumentError::MissingMetadata))
    }

    pub fn slugs(&self) -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(slug, _)| *slug)
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::validate;

    #[test]
    fn test_all_bundled_personas_parse() {
        let registry = PersonaRegistry::new();
        for slug in registry.slugs() {
            let persona = registry
                .load(slug)
                .expect("bundled persona present")
                .unwrap_or_else(|e| panic!("bundled persona {slug} invalid: {e}"));
            assert_eq!(persona.slug, slug);
        }
    }

    #[test]
    fn test_example_passes_validation() {
        let persona = PersonaRegistry::new().example().unwrap();
        assert_eq!(persona.metadata.author, "System");
        assert_eq!(persona.metadata.version, "1.0");
        assert!(validate::validate_slug(&persona.slug).is_ok());
        assert!(validate::validate_description(&persona.metadata.description).is_ok());
        assert!(validate::validate_instructions(&persona.instructions).is_ok());
    }

    #[test]
    fn test_unknown_bundle() {
        assert!(PersonaRegistry::new().get_bundled("nope").is_none());
    }
}
