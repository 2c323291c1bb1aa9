//! Wildcard patterns over fully-qualified names.
//!
//! Supported forms:
//! - `prefix*` matches names starting with `prefix`
//! - `*suffix` matches names ending with `suffix`
//! - `*` matches everything
//! - anything else is an exact, case-sensitive comparison

use crate::utils::error::ConfigError;
use std::fmt;

/// A compiled wildcard pattern
///
/// **Public** - used by the dispatcher's class filter and by exclusion filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    Prefix(String),
    Suffix(String),
    Exact(String),
}

impl Pattern {
    /// Compile a pattern. Never fails; a trailing `*` wins over a leading one.
    pub fn compile(pattern: &str) -> Self {
        if pattern == "*" {
            Pattern::Any
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            Pattern::Suffix(suffix.to_string())
        } else {
            Pattern::Exact(pattern.to_string())
        }
    }

    /// Compile a pattern coming from user configuration
    ///
    /// Rejects empty patterns and wildcards in the middle, which would
    /// otherwise quietly degrade to an exact comparison.
    pub fn parse_strict(pattern: &str) -> Result<Self, ConfigError> {
        let interior = pattern
            .char_indices()
            .any(|(i, c)| c == '*' && i != 0 && i != pattern.len() - 1);
        if pattern.is_empty() || interior {
            return Err(ConfigError::UnsupportedPattern(pattern.to_string()));
        }
        Ok(Self::compile(pattern))
    }

    /// Check a fully-qualified name against this pattern
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Pattern::Suffix(suffix) => name.ends_with(suffix.as_str()),
            Pattern::Exact(exact) => name == exact,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "*"),
            Pattern::Prefix(prefix) => write!(f, "{}*", prefix),
            Pattern::Suffix(suffix) => write!(f, "*{}", suffix),
            Pattern::Exact(exact) => write!(f, "{}", exact),
        }
    }
}

/// An ordered list of patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Compile every pattern strictly, failing on the first bad one
    pub fn parse_all<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::parse_strict(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches_any(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
