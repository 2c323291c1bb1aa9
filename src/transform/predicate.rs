//! Predicates deciding which activations a transform keeps or lifts.

use super::constructor::ConstructorFilter;
use crate::model::{ActivationRef, QualifiedMethod};
use crate::pattern::Pattern;

/// Anything that can accept or reject an activation
///
/// Implemented for plain closures and for [`ActivationFilter`].
pub trait ActivationPredicate {
    fn accept(&self, activation: ActivationRef<'_>) -> bool;
}

impl<F> ActivationPredicate for F
where
    F: Fn(ActivationRef<'_>) -> bool,
{
    fn accept(&self, activation: ActivationRef<'_>) -> bool {
        self(activation)
    }
}

/// The closed set of filters the pipeline composes
#[derive(Debug, Clone)]
pub enum ActivationFilter {
    /// Reject activations whose `owner.member` matches the pattern
    ExcludePattern(Pattern),
    /// Accept exactly one owner and member name
    Method(QualifiedMethod),
    /// Hide super-constructor chains
    Constructor(ConstructorFilter),
    /// Accept when every inner filter accepts
    AllOf(Vec<ActivationFilter>),
    Not(Box<ActivationFilter>),
}

impl ActivationFilter {
    pub fn exclude(pattern: &str) -> Self {
        ActivationFilter::ExcludePattern(Pattern::compile(pattern))
    }

    pub fn method(method: QualifiedMethod) -> Self {
        ActivationFilter::Method(method)
    }
}

impl ActivationPredicate for ActivationFilter {
    fn accept(&self, activation: ActivationRef<'_>) -> bool {
        match self {
            ActivationFilter::ExcludePattern(pattern) => {
                !pattern.matches(&activation.qualified_name())
            }
            ActivationFilter::Method(method) => {
                method.matches(activation.owner(), &activation.member().name)
            }
            ActivationFilter::Constructor(filter) => filter.accept(activation),
            ActivationFilter::AllOf(filters) => filters.iter().all(|f| f.accept(activation)),
            ActivationFilter::Not(inner) => !inner.accept(activation),
        }
    }
}
