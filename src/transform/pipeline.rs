//! Post-processing that turns a raw trace into a presentable one.

use super::constructor::{ConstructorFilter, TypeHierarchy};
use super::ops::{collapse_repetitions, filter, find};
use super::predicate::ActivationFilter;
use crate::model::ActivationList;
use crate::pattern::Pattern;
use crate::tracer::TraceSettings;
use log::{debug, info};
use std::sync::Arc;

/// Prepare a traced activation list for rendering
///
/// **Public** - main entry point for post-processing
///
/// # Steps
/// 1. Lift calls of the start method to roots (when one is configured)
/// 2. Drop activations whose `owner.member` matches an exclude pattern
/// 3. Hide super-constructor chains
/// 4. Collapse consecutive repetitions
pub fn prepare_for_diagram(
    activations: &ActivationList,
    settings: &TraceSettings,
    hierarchy: Arc<dyn TypeHierarchy + Send + Sync>,
) -> ActivationList {
    info!(
        "Preparing {} root activations ({} nodes) for rendering",
        activations.len(),
        activations.node_count()
    );

    let mut prepared = match &settings.start_method {
        Some(start) => {
            debug!("Lifting calls of {}", start);
            find(activations, &ActivationFilter::method(start.clone()))
        }
        None => activations.copy(),
    };

    for exclusion in exclusion_filters(settings.excludes.iter()) {
        prepared = filter(&prepared, &exclusion);
    }

    prepared = filter(&prepared, &ConstructorFilter::new(hierarchy));
    prepared = collapse_repetitions(&prepared);

    info!(
        "Prepared {} root activations ({} nodes)",
        prepared.len(),
        prepared.node_count()
    );
    prepared
}

/// Exclusion filters for each pattern, in order
pub fn exclusion_filters<'a>(
    patterns: impl IntoIterator<Item = &'a Pattern>,
) -> Vec<ActivationFilter> {
    patterns
        .into_iter()
        .cloned()
        .map(ActivationFilter::ExcludePattern)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberRef;
    use crate::tracer::TraceConfig;
    use crate::transform::SuperclassTable;

    #[test]
    fn test_pipeline_applies_every_stage() {
        let mut list = ActivationList::new();
        let main = list.add_root("App", MemberRef::new("main"));
        let run = list.add_child(main, "App", MemberRef::new("run"));
        let derived = list.add_child(run, "Derived", MemberRef::constructor());
        list.add_child(derived, "Base", MemberRef::constructor());
        for _ in 0..3 {
            list.add_child(run, "java.util.ArrayList", MemberRef::new("add"));
            list.add_child(run, "Derived", MemberRef::new("poll"));
        }
        list.add_child(run, "Derived", MemberRef::new("poll"));

        let config = TraceConfig {
            start_method: Some("App.run".to_string()),
            hierarchy: [("Derived".to_string(), "Base".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let settings = config.validate().unwrap();
        let hierarchy = Arc::new(settings.hierarchy.clone());

        let prepared = prepare_for_diagram(&list, &settings, hierarchy);
        assert_eq!(
            prepared.to_string(),
            "App.run\n    Derived.<init>\n    Derived.poll (x 4)\n"
        );
    }

    #[test]
    fn test_pipeline_without_start_keeps_roots() {
        let mut list = ActivationList::new();
        list.add_root("A", MemberRef::new("a"));
        list.add_root("B", MemberRef::new("b"));
        let settings = TraceConfig::default().validate().unwrap();

        let prepared = prepare_for_diagram(&list, &settings, Arc::new(SuperclassTable::new()));
        assert_eq!(prepared, list);
    }

    #[test]
    fn test_exclusion_filters() {
        let patterns = [Pattern::compile("java.*"), Pattern::compile("*Test")];
        assert_eq!(exclusion_filters(patterns.iter()).len(), 2);
    }
}
