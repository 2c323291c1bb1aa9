//! Simple wildcard matching for class and method names.

pub mod matcher;

pub use matcher::{Pattern, PatternSet};
