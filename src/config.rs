//! Configuration loaded from `pgpattern.toml`.
//!
//! ```toml
//! force_escape = false
//! default_target = "tables"
//!
//! [targets.partitions]
//! schema_var = "n.nspname"
//! name_var = "c.relname"
//! visibility_rule = "pg_catalog.pg_table_is_visible(c.oid)"
//! ```
//!
//! Configured targets shadow built-in ones with the same name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PatternError, PatternResult};
use crate::target::{self, Target};

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "pgpattern.toml";

const DEFAULT_TARGET: &str = "tables";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Escape regex metacharacters outside quotes too.
    pub force_escape: bool,
    /// Target used when none is given on the command line.
    pub default_target: Option<String>,
    /// User-defined targets.
    pub targets: BTreeMap<String, Target>,
}

/// Where a listed target comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Builtin,
    Configured,
}

impl Config {
    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> PatternResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a specific file. A missing file is an error.
    pub fn load_file(path: &Path) -> PatternResult<Self> {
        if !path.exists() {
            return Err(PatternError::Config(format!(
                "{} not found",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded {} target(s) from {}",
            config.targets.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load `explicit` if given, otherwise the first file found on the
    /// search path, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> PatternResult<Self> {
        Self::load_from(explicit, &Self::search_paths())
    }

    /// Like [`Config::load`], with the search path given by the caller.
    pub fn load_from(explicit: Option<&Path>, search_paths: &[PathBuf]) -> PatternResult<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        for path in search_paths {
            if path.exists() {
                return Self::load_file(path);
            }
        }
        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// `./pgpattern.toml`, then `<config dir>/pgpattern/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("pgpattern").join("config.toml"));
        }
        paths
    }

    /// Resolve a target by name, configured targets first.
    pub fn target(&self, name: &str) -> PatternResult<Target> {
        self.targets
            .get(name)
            .cloned()
            .or_else(|| target::builtin(name))
            .ok_or_else(|| PatternError::UnknownTarget(name.to_string()))
    }

    pub fn default_target_name(&self) -> &str {
        self.default_target.as_deref().unwrap_or(DEFAULT_TARGET)
    }

    /// All targets, built-in ones first, with configured overrides applied.
    pub fn all_targets(&self) -> Vec<(String, Target, TargetSource)> {
        let mut all: Vec<(String, Target, TargetSource)> = target::builtin_targets()
            .into_iter()
            .filter(|(name, _)| !self.targets.contains_key(*name))
            .map(|(name, t)| (name.to_string(), t, TargetSource::Builtin))
            .collect();
        all.extend(
            self.targets
                .iter()
                .map(|(name, t)| (name.clone(), t.clone(), TargetSource::Configured)),
        );
        all
    }

    fn validate(&self) -> PatternResult<()> {
        for (name, t) in &self.targets {
            t.validate(name)?;
        }
        if let Some(name) = &self.default_target {
            self.target(name).map_err(|_| {
                PatternError::Config(format!("default_target '{}' is not a known target", name))
            })?;
        }
        Ok(())
    }
}
