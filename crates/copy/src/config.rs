//! Copy defaults.
//!
//! Hosts usually embed these in their own TOML file under a `[copy]` table:
//!
//! ```toml
//! [copy]
//! accepted_flags = ["congruent", "compatible"]
//! validate_schema = true
//! require_uniform_batch_class = false
//! ```
//!
//! Every key is optional and falls back to [`CopyConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::SchemaFlags;

/// Defaults applied to copy requests that leave them unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Schema classifications a copy accepts. A copy proceeds when the
    /// computed classification shares at least one flag with this set.
    pub accepted_flags: SchemaFlags,
    /// Compare source and destination schemas before copying.
    pub validate_schema: bool,
    /// Fail a batch whose instances come from more than one source class
    /// instead of reusing the first instance's classification for all.
    pub require_uniform_batch_class: bool,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            accepted_flags: SchemaFlags::ALL,
            validate_schema: true,
            require_uniform_batch_class: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    copy: CopyConfig,
}

/// Errors from loading a [`CopyConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse copy config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CopyConfig {
    /// Parse the `[copy]` table of a TOML document. Other tables are ignored.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.copy)
    }
}

/// Read and parse the `[copy]` table of the TOML file at `path`.
pub fn read_copy_config(path: &Path) -> Result<CopyConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CopyConfig::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_table_yields_defaults() {
        let config = CopyConfig::from_toml_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config, CopyConfig::default());
        assert_eq!(config.accepted_flags, SchemaFlags::ALL);
        assert!(config.validate_schema);
        assert!(!config.require_uniform_batch_class);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = CopyConfig::from_toml_str(
            r#"
            [copy]
            accepted_flags = ["congruent"]
            require_uniform_batch_class = true
            "#,
        )
        .unwrap();
        assert_eq!(config.accepted_flags, SchemaFlags::CONGRUENT);
        assert!(config.validate_schema);
        assert!(config.require_uniform_batch_class);
    }

    #[test]
    fn unknown_flag_is_a_parse_error() {
        let err = CopyConfig::from_toml_str("[copy]\naccepted_flags = [\"identical\"]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[copy]\nvalidate_schema = false").unwrap();
        let config = read_copy_config(file.path()).unwrap();
        assert!(!config.validate_schema);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_copy_config(Path::new("/nonexistent/copy.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/copy.toml"));
    }
}
