//! Trace configuration.
//!
//! Loaded from TOML and validated into [`TraceSettings`] before any event is
//! processed, so configuration mistakes fail fast.
//!
//! ```toml
//! include = ["com.acme.*"]
//! exclude = ["com.acme.generated.*"]
//! boundary_methods = ["com.acme.Db.query"]
//! public_only = false
//! start_method = "com.acme.App.run"
//! std_excludes = true
//!
//! [hierarchy]
//! "com.acme.SavingsAccount" = "com.acme.Account"
//! ```

use crate::model::QualifiedMethod;
use crate::pattern::PatternSet;
use crate::transform::SuperclassTable;
use crate::utils::config::STANDARD_EXCLUDES;
use crate::utils::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

fn default_std_excludes() -> bool {
    true
}

/// Raw configuration as written by the user
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    /// Owner patterns to trace (empty = everything)
    pub include: Vec<String>,

    /// Owner patterns never traced
    pub exclude: Vec<String>,

    /// Fully-qualified methods whose callees are not traced
    pub boundary_methods: Vec<String>,

    /// Only record entries into public members
    pub public_only: bool,

    /// Defer tracing until this fully-qualified method is reached
    pub start_method: Option<String>,

    /// Append the standard library excludes
    #[serde(default = "default_std_excludes")]
    pub std_excludes: bool,

    /// `type = "direct superclass"` entries
    pub hierarchy: HashMap<String, String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            boundary_methods: Vec::new(),
            public_only: false,
            start_method: None,
            std_excludes: true,
            hierarchy: HashMap::new(),
        }
    }
}

/// Validated, compiled settings consumed by the dispatcher and the pipeline
#[derive(Debug, Clone, Default)]
pub struct TraceSettings {
    pub includes: PatternSet,
    pub excludes: PatternSet,
    pub boundary_methods: Vec<String>,
    pub public_only: bool,
    pub start_method: Option<QualifiedMethod>,
    pub hierarchy: SuperclassTable,
}

impl TraceConfig {
    /// Patterns actually excluded, standard ones last
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut excludes = self.exclude.clone();
        if self.std_excludes {
            excludes.extend(STANDARD_EXCLUDES.iter().map(|s| s.to_string()));
        }
        excludes
    }

    /// Check every option and compile patterns
    ///
    /// # Errors
    /// * `ConfigError::UnsupportedPattern` - malformed include/exclude pattern
    /// * `ConfigError::NotQualified` - start or boundary method without owner
    pub fn validate(&self) -> Result<TraceSettings, ConfigError> {
        let includes = PatternSet::parse_all(&self.include)?;
        let excludes = PatternSet::parse_all(&self.effective_excludes())?;

        for boundary in &self.boundary_methods {
            QualifiedMethod::parse(boundary)?;
        }

        let start_method = self
            .start_method
            .as_deref()
            .map(QualifiedMethod::parse)
            .transpose()?;

        let hierarchy = SuperclassTable::from_map(self.hierarchy.clone());
        if hierarchy.is_empty() {
            debug!("No [hierarchy] entries, base constructors will not be suppressed");
        }

        debug!(
            "Validated config: {} includes, {} excludes, {} boundary methods, {} hierarchy entries",
            includes.len(),
            excludes.len(),
            self.boundary_methods.len(),
            hierarchy.len()
        );

        Ok(TraceSettings {
            includes,
            excludes,
            boundary_methods: self.boundary_methods.clone(),
            public_only: self.public_only,
            start_method,
            hierarchy,
        })
    }
}

impl TraceSettings {
    pub fn is_boundary_method(&self, qualified_name: &str) -> bool {
        self.boundary_methods.iter().any(|m| m == qualified_name)
    }
}

/// Load a trace configuration from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - file cannot be read
/// * `ConfigError::ParseFailed` - TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<TraceConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: TraceConfig = toml::from_str(&contents)?;
    Ok(config)
}
