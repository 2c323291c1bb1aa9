//! Activation tree model and column assignment.
//!
//! This module defines:
//! - `MemberRef` / `QualifiedMethod` - identity of a called routine
//! - `ActivationList` - arena-backed forest of call frames
//! - `ColumnMap` - owner to diagram column mapping

pub mod activation;
pub mod columns;
pub mod member;

pub use activation::{subtrees_equal, Activation, ActivationId, ActivationList, ActivationRef};
pub use columns::{ColumnMap, Participant};
pub use member::{MemberRef, QualifiedMethod};
