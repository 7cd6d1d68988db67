//! Version and build information
//!
//! `build.rs` stamps the git revision, timestamp and toolchain into the
//! binary; `persona-switcher version` prints them with the MCP revisions
//! this build can negotiate.

use std::fmt;

use crate::protocol::SUPPORTED_PROTOCOL_VERSIONS;

/// What was built, from which revision, with which toolchain
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash, "unknown" outside a git checkout
    pub git_hash: &'static str,
    pub dirty: bool,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

impl BuildInfo {
    /// "0.1.0+abc1234", with ".dirty" appended for uncommitted trees
    pub fn full_version(&self) -> String {
        let mut full = format!("{}+{}", self.version, self.git_hash);
        if self.dirty {
            full.push_str(".dirty");
        }
        full
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f)?;
        writeln!(f, "Build Information:")?;
        let dirty = if self.dirty { " (uncommitted changes)" } else { "" };
        writeln!(f, "  Git Hash:  {}{}", self.git_hash, dirty)?;
        writeln!(f, "  Built:     {}", self.built_at)?;
        writeln!(f, "  Profile:   {}", self.profile)?;
        writeln!(f, "  Target:    {}", self.target)?;
        writeln!(f, "  Compiler:  {}", self.rustc)?;
        writeln!(f)?;
        writeln!(f, "MCP revisions: {}", SUPPORTED_PROTOCOL_VERSIONS.join(", "))
    }
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("PERSONA_SWITCHER_GIT_HASH"),
        dirty: env!("PERSONA_SWITCHER_GIT_DIRTY") == "true",
        built_at: env!("PERSONA_SWITCHER_BUILD_TIMESTAMP"),
        target: env!("PERSONA_SWITCHER_TARGET"),
        profile: env!("PERSONA_SWITCHER_PROFILE"),
        rustc: env!("PERSONA_SWITCHER_RUSTC_VERSION"),
    }
}

pub fn print_version() {
    print!("{}", build_info());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dirty: bool) -> BuildInfo {
        BuildInfo {
            name: "persona-switcher",
            version: "1.2.3",
            git_hash: "abc1234",
            dirty,
            built_at: "2026-01-01 00:00:00 UTC",
            target: "x86_64-unknown-linux-gnu",
            profile: "release",
            rustc: "rustc 1.80.0",
        }
    }

    #[test]
    fn test_build_info_names_package() {
        let info = build_info();
        assert_eq!(info.name, "persona-switcher");
        assert!(info.full_version().starts_with(info.version));
    }

    #[test]
    fn test_full_version_marks_dirty_tree() {
        assert_eq!(sample(false).full_version(), "1.2.3+abc1234");
        assert_eq!(sample(true).full_version(), "1.2.3+abc1234.dirty");
    }

    #[test]
    fn test_display_lists_protocol_revisions() {
        let text = sample(true).to_string();
        assert!(text.starts_with("persona-switcher 1.2.3+abc1234.dirty\n"));
        assert!(text.contains("Git Hash:  abc1234 (uncommitted changes)"));
        assert!(text.contains("Target:    x86_64-unknown-linux-gnu"));
        assert!(text.contains("2025-06-18"));
    }
}
