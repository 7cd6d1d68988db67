//! Configuration system for persona-switcher
//!
//! Later sources win:
//! built-in defaults, then `persona-switcher.toml` (or the user config dir),
//! then `PERSONAS_DIR` / `LOG_LEVEL` / `AUTO_RELOAD` / `PERSONA_SWITCHER_*`,
//! then `--personas-dir` on the command line.
//!
//! The resulting [`ServerConfig`] is built once in `main` and handed down by
//! reference; nothing reads the environment after startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Persona storage location
    pub storage: StorageSettings,

    /// Where diagnostics go; never stdout
    pub logging: LoggingSettings,

    /// Server identity and behaviour
    pub server: ServerSettings,
}

/// Persona storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding `<slug>.md` persona files
    pub personas_dir: String,
}

/// Diagnostic output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,

    /// Optional rolling log file alongside stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Size hint that picks the rotation period
    pub max_file_size_mb: u64,

    /// Rotated files kept on disk
    pub max_files: u32,

    /// Emit JSON lines instead of compact text
    pub json_format: bool,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Name reported to hosts in `serverInfo`
    pub name: String,

    /// Reported to hosts only; every request re-reads the directory
    pub auto_reload: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            personas_dir: "./personas".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 100,
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "PersonaSwitcher".to_string(),
            auto_reload: false,
        }
    }
}

impl ServerConfig {
    /// Resolve the effective configuration; `config_path` must exist when given
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = match Self::locate_file(config_path)? {
            Some(path) => {
                let parsed = Self::from_file(&path)?;
                info!(path = %path.display(), "Read configuration file");
                parsed
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Explicit path, else `./persona-switcher.toml`, else the user config dir
    fn locate_file(explicit: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            let path = PathBuf::from(expand_path(path));
            return match path.exists() {
                true => Ok(Some(path)),
                false => Err(Error::ConfigNotFound { path }),
            };
        }

        let found = std::iter::once(PathBuf::from("persona-switcher.toml"))
            .chain(dirs::config_dir().map(|d| d.join("persona-switcher").join("config.toml")))
            .find(|candidate| candidate.is_file());

        match &found {
            Some(path) => debug!(path = %path.display(), "Using configuration file"),
            None => debug!("No configuration file, using built-in defaults"),
        }
        Ok(found)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PERSONAS_DIR") {
            self.storage.personas_dir = val;
        }

        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.logging.level = normalize_level(&val);
        }
        if let Ok(val) = std::env::var("PERSONA_SWITCHER_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_SWITCHER_LOG_JSON") {
            self.logging.json_format = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("AUTO_RELOAD") {
            self.server.auto_reload = parse_bool(&val);
        }
    }

    /// Expand `~` and variables, then make the personas directory absolute
    pub fn expand_paths(&mut self) {
        self.storage.personas_dir = expand_path(&self.storage.personas_dir);

        let dir = Path::new(&self.storage.personas_dir);
        if dir.is_relative() {
            match std::env::current_dir() {
                Ok(cwd) => {
                    self.storage.personas_dir = cwd.join(dir).display().to_string();
                }
                Err(e) => warn!(error = %e, "Cannot resolve working directory"),
            }
        }

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.storage.personas_dir.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "storage.personas_dir",
                "Personas directory cannot be empty",
            ));
        }

        if !VALID_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    VALID_LEVELS.join(", ")
                ),
            ));
        }

        if self.server.name.trim().is_empty() {
            return Err(Error::config_validation("Server name cannot be empty"));
        }

        Ok(())
    }

    pub fn personas_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.personas_dir)
    }
}

/// Map a `LOG_LEVEL` value onto a tracing level name; unknown values become "info"
fn normalize_level(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        level if VALID_LEVELS.contains(&level) => lower,
        _ => {
            warn!(value = %raw, "Unrecognised LOG_LEVEL, using info");
            "info".to_string()
        }
    }
}

fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// `~` and `$VAR` expansion; the raw string is kept when expansion fails
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Write the commented template, refusing to clobber unless `force`
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let target = match path {
        Some(p) => PathBuf::from(expand_path(p)),
        None => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("persona-switcher")
            .join("config.toml"),
    };

    if target.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            target.display()
        )));
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::write_failed(parent, e))?;
    }
    fs::write(&target, CONFIG_TEMPLATE).map_err(|e| Error::write_failed(&target, e))?;

    Ok(target)
}

const CONFIG_TEMPLATE: &str = r#"# persona-switcher configuration

[storage]
# Directory holding one <slug>.md file per persona
personas_dir = "./personas"

[logging]
# trace | debug | info | warn | error (stdout is reserved for the protocol)
level = "info"

# Also write a rolling log file
# file = "~/.local/state/persona-switcher/server.log"

# Below 10 the file rotates hourly, otherwise daily
max_file_size_mb = 100
max_files = 5

# JSON lines instead of compact text
json_format = false

[server]
# Name reported to MCP hosts
name = "PersonaSwitcher"

# Advertised only; persona files are re-read on every request
auto_reload = false
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.storage.personas_dir, "./personas");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.name, "PersonaSwitcher");
        assert!(!config.server.auto_reload);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file_values() {
        env::set_var("PERSONAS_DIR", "/srv/personas");
        env::set_var("LOG_LEVEL", "WARNING");
        env::set_var("AUTO_RELOAD", "TRUE");

        let mut config = ServerConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.storage.personas_dir, "/srv/personas");
        assert_eq!(config.logging.level, "warn");
        assert!(config.server.auto_reload);

        env::remove_var("PERSONAS_DIR");
        env::remove_var("LOG_LEVEL");
        env::remove_var("AUTO_RELOAD");
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), "debug");
        assert_eq!(normalize_level("warning"), "warn");
        assert_eq!(normalize_level("verbose"), "info");
    }

    #[test]
    fn test_unknown_level_in_file_rejected() {
        let mut config = ServerConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_dir() {
        let mut config = ServerConfig::default();
        config.storage.personas_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_dir_made_absolute() {
        let mut config = ServerConfig::default();
        config.storage.personas_dir = "some/personas".to_string();
        config.expand_paths();
        assert!(config.personas_dir().is_absolute());
        assert!(config.personas_dir().ends_with("some/personas"));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = ServerConfig::default();
        config.storage.personas_dir = "~/personas".to_string();
        config.expand_paths();
        assert!(!config.storage.personas_dir.contains('~'));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
[storage]
personas_dir = "/data/personas"

[logging]
level = "debug"
json_format = true
"#,
        )
        .unwrap();

        assert_eq!(config.storage.personas_dir, "/data/personas");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        // Missing sections fall back to defaults
        assert_eq!(config.server.name, "PersonaSwitcher");
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ServerConfig::load(Some("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    fn test_init_config_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let written = init_config(Some(path.to_str().unwrap()), false).unwrap();
        assert_eq!(written, path);

        let parsed = ServerConfig::from_file(&path).unwrap();
        assert!(parsed.validate().is_ok());

        // Second init without --force refuses to overwrite
        assert!(init_config(Some(path.to_str().unwrap()), false).is_err());
        assert!(init_config(Some(path.to_str().unwrap()), true).is_ok());
    }
}
