//! Identity of a called routine and of a fully-qualified method name.

use crate::utils::config::CONSTRUCTOR_NAME;
use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_public() -> bool {
    true
}

/// A called routine: name, argument types, and the flags the tracer cares about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arg_types: Vec<String>,

    #[serde(default = "default_public")]
    pub public: bool,

    /// Generated by the compiler rather than written in source
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl MemberRef {
    /// A public, non-synthetic routine without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg_types: Vec::new(),
            public: true,
            synthetic: false,
        }
    }

    pub fn constructor() -> Self {
        Self::new(CONSTRUCTOR_NAME)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arg_types = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    /// Routine identity: same name and same argument types
    ///
    /// Visibility and synthetic flags are properties of the routine, not
    /// part of its identity.
    pub fn same_routine(&self, other: &MemberRef) -> bool {
        self.name == other.name && self.arg_types == other.arg_types
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A method name of the form `owner.member`, split at the last dot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedMethod {
    pub owner: String,
    pub member: String,
}

impl QualifiedMethod {
    /// Split `a.b.C.m` into owner `a.b.C` and member `m`
    ///
    /// # Errors
    /// * `ConfigError::NotQualified` - no separator, or an empty side
    pub fn parse(qualified: &str) -> Result<Self, ConfigError> {
        match qualified.rsplit_once('.') {
            Some((owner, member)) if !owner.is_empty() && !member.is_empty() => Ok(Self {
                owner: owner.to_string(),
                member: member.to_string(),
            }),
            _ => Err(ConfigError::NotQualified(qualified.to_string())),
        }
    }

    pub fn matches(&self, owner: &str, member: &str) -> bool {
        self.owner == owner && self.member == member
    }
}

impl fmt::Display for QualifiedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qualified_method() {
        let method = QualifiedMethod::parse("Foo.<init>").unwrap();
        assert_eq!(method.owner, "Foo");
        assert_eq!(method.member, "<init>");

        let method = QualifiedMethod::parse("com.acme.Bank.withdraw").unwrap();
        assert_eq!(method.owner, "com.acme.Bank");
        assert_eq!(method.member, "withdraw");
        assert_eq!(method.to_string(), "com.acme.Bank.withdraw");
    }

    #[test]
    fn test_parse_rejects_unqualified() {
        assert!(QualifiedMethod::parse("main").is_err());
        assert!(QualifiedMethod::parse(".main").is_err());
        assert!(QualifiedMethod::parse("Foo.").is_err());
    }

    #[test]
    fn test_same_routine_ignores_flags() {
        let a = MemberRef::new("run").with_args(["int"]);
        let b = MemberRef::new("run").with_args(["int"]).private();
        let c = MemberRef::new("run").with_args(["java.lang.String"]);
        assert!(a.same_routine(&b));
        assert!(!a.same_routine(&c));
    }

    #[test]
    fn test_member_defaults_from_json() {
        let member: MemberRef = serde_json::from_str(r#"{"name":"<init>"}"#).unwrap();
        assert!(member.public);
        assert!(!member.synthetic);
        assert!(member.is_constructor());
    }
}
