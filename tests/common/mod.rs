//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Get the valid config fixture path
pub fn valid_config_fixture() -> PathBuf {
    fixture_path("valid_config.toml")
}

/// Get the invalid config fixture path
pub fn invalid_config_fixture() -> PathBuf {
    fixture_path("invalid_config.toml")
}

/// Read a fixture persona file
pub fn persona_fixture(slug: &str) -> String {
    fs::read_to_string(fixture_path(&format!("personas/{}.md", slug))).unwrap()
}

pub const DESCRIPTION: &str = "Python programming expert";
pub const INSTRUCTIONS: &str = "You are a Python expert with deep knowledge.";

/// Isolated working directory with its own personas directory.
///
/// Commands built from it run inside the temp dir with a private config
/// home, so no user configuration leaks into tests.
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn personas_dir(&self) -> PathBuf {
        self.root().join("personas")
    }

    pub fn persona_path(&self, slug: &str) -> PathBuf {
        self.personas_dir().join(format!("{}.md", slug))
    }

    /// Write a raw persona file
    pub fn write_persona(&self, file: &str, content: &str) {
        fs::create_dir_all(self.personas_dir()).unwrap();
        fs::write(self.personas_dir().join(file), content).unwrap();
    }

    /// Command for the binary, pointed at this workspace
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("persona-switcher").unwrap();
        cmd.current_dir(self.root())
            .env("HOME", self.root())
            .env("XDG_CONFIG_HOME", self.root().join("xdg"))
            .env("PERSONAS_DIR", self.personas_dir())
            .env_remove("PERSONA_SWITCHER_CONFIG")
            .env_remove("PERSONA_SWITCHER_LOG_FILE")
            .env_remove("PERSONA_SWITCHER_LOG_JSON")
            .env_remove("LOG_LEVEL")
            .env_remove("AUTO_RELOAD")
            .env_remove("RUST_LOG");
        cmd
    }

    /// `create` with the default description and instructions
    pub fn create(&self, slug: &str) {
        self.cmd()
            .args(["create", slug, "-d", DESCRIPTION, "-i", INSTRUCTIONS])
            .assert()
            .success();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
    }

    #[test]
    fn test_valid_config_exists() {
        assert!(
            valid_config_fixture().exists(),
            "Valid config fixture should exist"
        );
    }

    #[test]
    fn test_invalid_config_exists() {
        assert!(
            invalid_config_fixture().exists(),
            "Invalid config fixture should exist"
        );
    }
}
