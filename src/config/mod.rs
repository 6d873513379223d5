//! Configuration management.
//!
//! Values are layered: built-in defaults, then a TOML file, then `VECDB_*`
//! environment variables, then command-line flags.

use crate::scoring::Metric;
use crate::storage::{DEFAULT_COLLECTION, DEFAULT_PATH};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for vecdb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecdbConfig {
    /// Path to the container file.
    pub path: PathBuf,
    /// Embedding dimension. Has no default; must be set before opening a store.
    pub emb_dim: Option<usize>,
    /// Collection used when none is named.
    pub collection: String,
    /// Scorer used by the CLI when none is named.
    pub metric: Metric,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Output format: "pretty" or "json".
    pub format: Option<String>,
    /// Filter directive, e.g. "info" or "vecdb=debug".
    pub level: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Container path.
    pub path: Option<String>,
    /// Embedding dimension.
    pub emb_dim: Option<usize>,
    /// Default collection.
    pub collection: Option<String>,
    /// Default metric.
    pub metric: Option<String>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl Default for VecdbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            emb_dim: None,
            collection: DEFAULT_COLLECTION.to_string(),
            metric: Metric::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl VecdbConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the text is not a valid config.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidInput(format!("config file: {e}")))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `vecdb/config.toml` under the platform config dir, then under
    /// `~/.config` when that is a different directory (macOS, Windows).
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        for candidate in config_candidates(base_dirs.config_dir(), base_dirs.home_dir()) {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %candidate.display(), "Ignoring config file: {e}");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `VecdbConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = file.path {
            config.path = PathBuf::from(path);
        }
        if let Some(emb_dim) = file.emb_dim {
            config.emb_dim = Some(validate_emb_dim(emb_dim)?);
        }
        if let Some(collection) = file.collection {
            config.collection = collection;
        }
        if let Some(metric) = file.metric {
            config.metric = parse_metric(&metric)?;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies `VECDB_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a variable holds an invalid value.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, keyed by environment variable name.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a value is invalid.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("VECDB_PATH") {
            self.path = PathBuf::from(path);
        }
        if let Some(emb_dim) = get("VECDB_EMB_DIM") {
            let parsed = emb_dim.trim().parse::<usize>().map_err(|e| {
                Error::InvalidInput(format!("VECDB_EMB_DIM '{emb_dim}': {e}"))
            })?;
            self.emb_dim = Some(validate_emb_dim(parsed)?);
        }
        if let Some(collection) = get("VECDB_COLLECTION") {
            self.collection = collection;
        }
        if let Some(metric) = get("VECDB_METRIC") {
            self.metric = parse_metric(&metric)?;
        }
        if let Some(format) = get("VECDB_LOG_FORMAT") {
            self.logging.format = Some(format);
        }
        if let Some(file) = get("VECDB_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }

    /// Sets the container path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the embedding dimension.
    #[must_use]
    pub const fn with_emb_dim(mut self, emb_dim: usize) -> Self {
        self.emb_dim = Some(emb_dim);
        self
    }

    /// Sets the default collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Returns the embedding dimension, failing if none was configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the dimension is unset or zero.
    pub fn require_emb_dim(&self) -> Result<usize> {
        let emb_dim = self.emb_dim.ok_or_else(|| {
            Error::InvalidInput(
                "embedding dimension is required (--dim, VECDB_EMB_DIM, or emb_dim in config)"
                    .to_string(),
            )
        })?;
        validate_emb_dim(emb_dim)
    }
}

/// Default config file locations, without duplicates.
fn config_candidates(config_dir: &Path, home_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![config_dir.join("vecdb").join("config.toml")];
    let xdg = home_dir.join(".config").join("vecdb").join("config.toml");
    if !candidates.contains(&xdg) {
        candidates.push(xdg);
    }
    candidates
}

fn validate_emb_dim(emb_dim: usize) -> Result<usize> {
    if emb_dim == 0 {
        return Err(Error::InvalidInput(
            "embedding dimension must be positive".to_string(),
        ));
    }
    Ok(emb_dim)
}

fn parse_metric(s: &str) -> Result<Metric> {
    Metric::parse(s).ok_or_else(|| Error::InvalidInput(format!("unknown metric '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = VecdbConfig::new();
        assert_eq!(config.path, PathBuf::from("data.vdb"));
        assert_eq!(config.collection, "main");
        assert_eq!(config.emb_dim, None);
        assert!(config.require_emb_dim().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = VecdbConfig::from_toml(
            r#"
            path = "/var/lib/vecdb/faces.vdb"
            emb_dim = 512
            collection = "faces"
            metric = "euclidean"

            [logging]
            format = "json"
            level = "debug"
            "#,
        )
        .expect("parse");

        assert_eq!(config.path, PathBuf::from("/var/lib/vecdb/faces.vdb"));
        assert_eq!(config.require_emb_dim().expect("dim"), 512);
        assert_eq!(config.collection, "faces");
        assert_eq!(config.metric, Metric::Euclidean);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_config_candidates_deduplicated() {
        let home = Path::new("/home/ada");
        assert_eq!(
            config_candidates(&home.join(".config"), home),
            vec![PathBuf::from("/home/ada/.config/vecdb/config.toml")]
        );
        assert_eq!(
            config_candidates(Path::new("/Users/ada/Library/Application Support"), home),
            vec![
                PathBuf::from("/Users/ada/Library/Application Support/vecdb/config.toml"),
                PathBuf::from("/home/ada/.config/vecdb/config.toml"),
            ]
        );
    }

    #[test]
    fn test_unreadable_config_file_is_operation_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = VecdbConfig::load_from_file(&dir.path().join("missing.toml"));
        assert!(matches!(
            result,
            Err(Error::OperationFailed { ref operation, .. }) if operation == "read_config_file"
        ));
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(VecdbConfig::from_toml("emb_dim = 0").is_err());
        assert!(VecdbConfig::from_toml("metric = \"hamming\"").is_err());
        assert!(VecdbConfig::from_toml("unknown_key = 1").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("VECDB_PATH", "other.vdb"),
            ("VECDB_EMB_DIM", " 128 "),
            ("VECDB_COLLECTION", ""),
            ("VECDB_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = VecdbConfig::new().with_collection("faces");
        config
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .expect("overrides");

        assert_eq!(config.path, PathBuf::from("other.vdb"));
        assert_eq!(config.emb_dim, Some(128));
        assert_eq!(config.collection, "faces");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_override_rejects_garbage_dimension() {
        let mut config = VecdbConfig::new();
        let result = config.apply_overrides(|key| {
            (key == "VECDB_EMB_DIM").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
