//! Configuration for commitwall.
//!
//! Loaded from a TOML file; every field has a default so the file is
//! optional and command-line arguments can fill in or override the paths.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level commitwall configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WallConfig {
    /// Paths and logging.
    #[serde(default)]
    pub wall: WallSection,

    /// How the author identity of each source repository is resolved.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Replay behaviour.
    #[serde(default)]
    pub replay: ReplayConfig,
}

// ---------------------------------------------------------------------------
// [wall]
// ---------------------------------------------------------------------------

/// Paths and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallSection {
    /// Directory tree scanned for source repositories.
    #[serde(default)]
    pub collection_path: Option<PathBuf>,

    /// Repository that receives the journal and the replay commits.
    #[serde(default)]
    pub target_path: Option<PathBuf>,

    /// Journal file name, relative to the target working tree.
    #[serde(default = "default_journal_file")]
    pub journal_file: String,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for WallSection {
    fn default() -> Self {
        Self {
            collection_path: None,
            target_path: None,
            journal_file: default_journal_file(),
            log_level: default_log_level(),
        }
    }
}

fn default_journal_file() -> String {
    "WALL.log".into()
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// [identity]
// ---------------------------------------------------------------------------

/// Which configuration levels are consulted for `user.name` / `user.email`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScope {
    /// The repository's own `.git/config` only.
    Local,
    /// System, global and local configuration, as `git` itself resolves it.
    #[default]
    Merged,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub scope: IdentityScope,
}

// ---------------------------------------------------------------------------
// [replay]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Create one commit per journal entry in the target repository.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl WallConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: WallConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load_from_file(path) {
            Err(ConfigError::FileNotFound(missing)) => {
                debug!(path = %missing, "no configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Expand a leading `~` in the configured paths.
    pub fn resolve_paths(&mut self) {
        self.wall.collection_path = self.wall.collection_path.as_deref().map(expand_tilde);
        self.wall.target_path = self.wall.target_path.as_deref().map(expand_tilde);
    }

    /// Validate the values that do not depend on the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_journal_file(&self.wall.journal_file)?;

        match self.wall.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "wall.log_level".into(),
                    detail: format!("unknown level '{other}'"),
                })
            }
        }

        Ok(())
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# commitwall configuration

[wall]
# collection_path = "~/src"
# target_path = "~/commit-wall"
journal_file = "WALL.log"
log_level = "info"

[identity]
# "merged" reads user.name / user.email the way git does: repository,
# global and system config. "local" reads each repository's own config only.
scope = "merged"

[replay]
enabled = true
"#
    }
}

/// The journal must live inside the target working tree.
///
/// Returns the name reduced to its plain components (`./WALL.log` becomes
/// `WALL.log`), which is the form the index accepts.
pub fn validate_journal_file(name: &str) -> Result<PathBuf, ConfigError> {
    let invalid = |detail: &str| ConfigError::InvalidValue {
        field: "wall.journal_file".into(),
        detail: detail.into(),
    };
    if name.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return Err(invalid("must be relative to the target repository"));
    }

    let mut normalised = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalised.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must not leave the target repository"))
            }
        }
    }
    if normalised.as_os_str().is_empty() {
        return Err(invalid("must name a file"));
    }
    if normalised.components().next() == Some(Component::Normal(".git".as_ref())) {
        return Err(invalid("must not point into .git"));
    }
    Ok(normalised)
}

/// Expand `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
[wall]
collection_path = "/home/ada/src"
target_path = "/home/ada/wall"
journal_file = "history/WALL.log"
log_level = "debug"

[identity]
scope = "merged"

[replay]
enabled = false
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: WallConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.wall.collection_path, Some(PathBuf::from("/home/ada/src")));
        assert_eq!(config.wall.journal_file, "history/WALL.log");
        assert_eq!(config.identity.scope, IdentityScope::Merged);
        assert!(!config.replay.enabled);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: WallConfig = toml::from_str("").unwrap();
        assert_eq!(config.wall.journal_file, "WALL.log");
        assert_eq!(config.wall.log_level, "info");
        assert_eq!(config.identity.scope, IdentityScope::Merged);
        assert!(config.replay.enabled);
        assert!(config.wall.collection_path.is_none());
    }

    #[test]
    fn test_default_template_parses() {
        let config: WallConfig = toml::from_str(WallConfig::default_template()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.identity.scope, IdentityScope::Merged);
    }

    #[test]
    fn test_local_scope_is_opt_in() {
        let config: WallConfig = toml::from_str("[identity]\nscope = \"local\"\n").unwrap();
        assert_eq!(config.identity.scope, IdentityScope::Local);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, sample_toml()).unwrap();
        let config = WallConfig::load_from_file(&path).unwrap();
        assert_eq!(config.wall.log_level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = WallConfig::load_from_file("/nonexistent/commitwall.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
        let config = WallConfig::load_or_default("/nonexistent/commitwall.toml").unwrap();
        assert!(config.replay.enabled);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[wall\njournal_file = ").unwrap();
        assert!(matches!(
            WallConfig::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_escaping_journal() {
        for bad in [
            "",
            "  ",
            ".",
            "./",
            "/etc/passwd",
            "../outside.log",
            "notes/../../x",
            ".git/WALL.log",
            "./.git/config",
        ] {
            assert!(
                matches!(
                    validate_journal_file(bad),
                    Err(ConfigError::InvalidValue { ref field, .. }) if field == "wall.journal_file"
                ),
                "accepted {bad:?}"
            );
        }
        assert_eq!(validate_journal_file("docs/WALL.md").unwrap(), PathBuf::from("docs/WALL.md"));
    }

    #[test]
    fn test_journal_name_is_normalised() {
        assert_eq!(validate_journal_file("./WALL.log").unwrap(), PathBuf::from("WALL.log"));
        assert_eq!(
            validate_journal_file("./docs/./WALL.md").unwrap(),
            PathBuf::from("docs/WALL.md")
        );
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = WallConfig::default();
        config.wall.log_level = "loud".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "wall.log_level"
        ));
    }

    #[test]
    fn test_validate_allows_target_inside_collection() {
        let mut config = WallConfig::default();
        config.wall.collection_path = Some(PathBuf::from("/src"));
        config.wall.target_path = Some(PathBuf::from("/src"));
        config.validate().unwrap();
        config.wall.target_path = Some(PathBuf::from("/src/wall"));
        config.validate().unwrap();
    }

    #[test]
    fn test_expand_tilde() {
        let plain = expand_tilde(Path::new("/abs/path"));
        assert_eq!(plain, PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/src")), home.join("src"));
        }
    }
}
