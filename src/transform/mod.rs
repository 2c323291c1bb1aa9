//! Tree transformations applied between tracing and rendering.
//!
//! Every operation here takes an [`ActivationList`](crate::model::ActivationList)
//! by reference and returns a new, independent list.

pub mod constructor;
pub mod ops;
pub mod pipeline;
pub mod predicate;

pub use constructor::{AncestorLookup, ConstructorFilter, SuperclassTable, TypeHierarchy};
pub use ops::{collapse_repetitions, filter, find};
pub use pipeline::prepare_for_diagram;
pub use predicate::{ActivationFilter, ActivationPredicate};
