//! Persona store — list, read, create, edit and delete persona files.
//!
//! The store owns one directory of `<slug>.md` files and keeps no other
//! state: every call goes to the filesystem, so external edits are seen
//! immediately and "activation" is just a read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::storage;

use super::document::PersonaDocument;
use super::registry::PersonaRegistry;
use super::types::{
    title_case, EditableField, Persona, PersonaMetadata, PersonaSummary, DEFAULT_AUTHOR,
    DEFAULT_VERSION,
};
use super::validate;

// ─────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────

const PERSONA_EXTENSION: &str = "md";

// ─────────────────────────────────────────────────────────────────
// Persona Store
// ─────────────────────────────────────────────────────────────────

/// CRUD over a directory of persona files.
pub struct PersonaStore {
    /// Directory holding `<slug>.md` files
    personas_dir: PathBuf,

    /// Bundled personas used for seeding
    registry: PersonaRegistry,
}

impl PersonaStore {
    pub fn new(personas_dir: impl Into<PathBuf>) -> Self {
        Self {
            personas_dir: personas_dir.into(),
            registry: PersonaRegistry::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.personas_dir())
    }

    pub fn personas_dir(&self) -> &Path {
        &self.personas_dir
    }

    /// Path of the file backing `slug`. The slug must already be validated.
    pub fn persona_path(&self, slug: &str) -> PathBuf {
        self.personas_dir.join(format!("{}.{}", slug, PERSONA_EXTENSION))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.personas_dir.exists() {
            fs::create_dir_all(&self.personas_dir)
                .map_err(|e| Error::write_failed(&self.personas_dir, e))?;
            info!(path = %self.personas_dir.display(), "Created personas directory");
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // List / Query
    // ─────────────────────────────────────────────────────────────

    /// List every loadable persona, sorted by slug.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn list(&self) -> Result<Vec<PersonaSummary>> {
        if !self.personas_dir.exists() {
            warn!(path = %self.personas_dir.display(), "Personas directory not found");
            return Ok(Vec::new());
        }

        let mut personas: Vec<PersonaSummary> = self
            .candidate_files()?
            .into_iter()
            .filter_map(|(slug, path)| match self.load_file(&slug, &path) {
                Ok(persona) => {
                    debug!(persona = %slug, "Loaded persona");
                    Some(persona.summary())
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping invalid persona file");
                    None
                }
            })
            .collect();

        personas.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(personas)
    }

    /// Slugs of every loadable persona
    pub fn available_slugs(&self) -> Vec<String> {
        match self.list() {
            Ok(personas) => personas.into_iter().map(|p| p.slug).collect(),
            Err(e) => {
                warn!(error = %e, "Could not list personas");
                Vec::new()
            }
        }
    }

    /// `*.md` files whose stem is a valid slug
    fn candidate_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let read_err = |e: io::Error| Error::IoRead {
            path: self.personas_dir.clone(),
            source: e,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.personas_dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(PERSONA_EXTENSION)
            {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!(file = %path.display(), "Skipping file with non UTF-8 name");
                continue;
            };
            match validate::validate_slug(stem) {
                Ok(slug) if slug == stem => files.push((slug, path)),
                _ => warn!(file = %path.display(), "Skipping file: name is not a valid persona slug"),
            }
        }
        Ok(files)
    }

    /// Load a persona by slug.
    pub fn get(&self, slug: &str) -> Result<Persona> {
        let slug = validate::validate_slug(slug)?;
        let path = self.persona_path(&slug);

        if !path.is_file() {
            return Err(Error::not_found(slug));
        }

        self.load_file(&slug, &path)
    }

    /// Read one file and interpret it as a persona.
    fn load_file(&self, slug: &str, path: &Path) -> Result<Persona> {
        self.read_document(slug, path)?
            .into_persona(slug)
            .map_err(|e| Error::corrupt(slug, e.to_string()))
    }

    fn read_document(&self, slug: &str, path: &Path) -> Result<PersonaDocument> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::not_found(slug),
            io::ErrorKind::InvalidData => Error::corrupt(slug, "file is not valid UTF-8"),
            _ => Error::IoRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        PersonaDocument::parse(&content).map_err(|e| Error::corrupt(slug, e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────
    // Activate
    // ─────────────────────────────────────────────────────────────

    /// Load a persona for the caller to apply. Nothing is recorded.
    pub fn activate(&self, slug: &str) -> Result<Persona> {
        let persona = self.get(slug)?;
        info!(persona = %persona.slug, name = %persona.metadata.name, "Persona activated");
        Ok(persona)
    }

    // ─────────────────────────────────────────────────────────────
    // Create / Edit / Delete
    // ─────────────────────────────────────────────────────────────

    /// Create a new persona file and return its path.
    pub fn create(
        &self,
        slug: &str,
        description: &str,
        instructions: &str,
        author: Option<&str>,
    ) -> Result<PathBuf> {
        let slug = validate::validate_slug(slug)?;
        let description = validate::validate_description(description)?;
        let instructions = validate::validate_instructions(instructions)?;
        let author = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_AUTHOR);

        let path = self.persona_path(&slug);
        if path.exists() {
            return Err(Error::PersonaAlreadyExists { name: slug, path });
        }

        self.ensure_dir()?;

        let persona = Persona {
            metadata: PersonaMetadata {
                name: title_case(&slug),
                description,
                version: DEFAULT_VERSION.to_string(),
                author: author.to_string(),
                extra: Default::default(),
            },
            slug,
            instructions,
        };
        let content = PersonaDocument::from_persona(&persona)
            .render()
            .map_err(|e| Error::Internal(format!("Failed to render persona: {}", e)))?;

        storage::create_atomic(&path, &content).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                // Lost a race with a concurrent create of the same slug
                Error::PersonaAlreadyExists {
                    name: persona.slug.clone(),
                    path: path.clone(),
                }
            } else {
                Error::write_failed(&path, e)
            }
        })?;

        info!(persona = %persona.slug, path = %path.display(), "Created persona");
        Ok(path)
    }

    /// Replace one field of an existing persona.
    pub fn edit(&self, slug: &str, field: &str, value: &str) -> Result<EditableField> {
        let field = validate::validate_field_name(field)?;
        let value = validate::validate_field_value(field, value)?;
        let slug = validate::validate_slug(slug)?;

        let path = self.persona_path(&slug);
        if !path.is_file() {
            return Err(Error::not_found(slug));
        }

        let mut doc = self.read_document(&slug, &path)?;
        // Refuse to rewrite a file that is not a loadable persona
        doc.clone()
            .into_persona(&slug)
            .map_err(|e| Error::corrupt(&slug, e.to_string()))?;

        match field {
            EditableField::Instructions => doc.set_body(value),
            _ => doc.set(field.as_str(), value),
        }

        let content = doc.render().map_err(|e| Error::corrupt(&slug, e.to_string()))?;
        storage::write_atomic(&path, &content).map_err(|e| Error::write_failed(&path, e))?;

        info!(persona = %slug, field = %field, "Updated persona");
        Ok(field)
    }

    /// Delete a persona file. `confirm` must be true.
    pub fn delete(&self, slug: &str, confirm: bool) -> Result<PathBuf> {
        if !confirm {
            return Err(Error::ConfirmationRequired {
                name: slug.to_string(),
            });
        }

        let slug = validate::validate_slug(slug)?;
        let path = self.persona_path(&slug);
        if !path.is_file() {
            return Err(Error::not_found(slug));
        }

        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::not_found(&slug),
            _ => Error::IoDelete {
                path: path.clone(),
                source: e,
            },
        })?;

        info!(persona = %slug, "Deleted persona");
        Ok(path)
    }

    // ─────────────────────────────────────────────────────────────
    // First run
    // ─────────────────────────────────────────────────────────────

    /// Create the directory and seed the example persona when it holds no
    /// valid personas. Returns true when the example was written.
    pub fn ensure_initialized(&self) -> Result<bool> {
        self.ensure_dir()?;

        match storage::sweep_temp_files(&self.personas_dir) {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed stale temporary files"),
            Err(e) => warn!(error = %e, "Could not sweep temporary files"),
        }

        if !self.list()?.is_empty() {
            return Ok(false);
        }

        let example = match self.registry.example() {
            Ok(persona) => persona,
            Err(e) => {
                warn!(error = %e, "Bundled example persona is invalid");
                return Ok(false);
            }
        };

        info!(persona = %example.slug, "Creating example persona");
        match self.create(
            &example.slug,
            &example.metadata.description,
            &example.instructions,
            Some(&example.metadata.author),
        ) {
            Ok(_) => Ok(true),
            Err(Error::PersonaAlreadyExists { .. }) => {
                debug!("Example persona file already present");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Failed to create example persona");
                Ok(false)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
