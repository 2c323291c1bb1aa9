//! Copy-on-transform operations over activation lists.
//!
//! None of these functions mutate their input. Predicates are always
//! evaluated against nodes of the input list, so `parent()` refers to the
//! caller as it was traced.

use super::predicate::ActivationPredicate;
use crate::model::{subtrees_equal, ActivationId, ActivationList};
use log::debug;

/// Keep accepted activations; a rejected one is dropped with its whole subtree
///
/// Descendants of a rejected node are never promoted.
pub fn filter<P>(list: &ActivationList, predicate: &P) -> ActivationList
where
    P: ActivationPredicate + ?Sized,
{
    let mut filtered = ActivationList::new();
    let mut stack: Vec<(ActivationId, Option<ActivationId>)> =
        list.root_ids().iter().rev().map(|&id| (id, None)).collect();

    while let Some((id, dest_parent)) = stack.pop() {
        let activation = list.get(id);
        if !predicate.accept(activation) {
            continue;
        }
        let kept = filtered.add(
            dest_parent,
            activation.owner(),
            activation.member().clone(),
            activation.stack_depth(),
        );
        filtered.set_repetitions(kept, activation.repetitions());
        stack.extend(list.children_ids(id).iter().rev().map(|&child| (child, Some(kept))));
    }

    debug!(
        "Filter kept {} of {} activations",
        filtered.node_count(),
        list.node_count()
    );
    filtered
}

/// Lift every accepted activation, with its full subtree, to a new root
///
/// The search continues below rejected nodes but not below accepted ones.
pub fn find<P>(list: &ActivationList, predicate: &P) -> ActivationList
where
    P: ActivationPredicate + ?Sized,
{
    let mut found = ActivationList::new();
    let mut stack: Vec<ActivationId> = list.root_ids().iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if predicate.accept(list.get(id)) {
            list.copy_subtree_into(id, &mut found, None);
        } else {
            stack.extend(list.children_ids(id).iter().rev().copied());
        }
    }

    debug!("Find lifted {} activations to roots", found.len());
    found
}

/// Merge consecutive structurally equal siblings into one node
///
/// Each sibling sequence is collapsed before its members' children are, so
/// two siblings only merge when their uncollapsed subtrees are identical.
pub fn collapse_repetitions(list: &ActivationList) -> ActivationList {
    let mut working = list.copy();

    let roots = working.take_roots();
    let roots = collapse_siblings(&mut working, roots);
    let mut pending: Vec<ActivationId> = roots.clone();
    working.set_roots(roots);

    while let Some(id) = pending.pop() {
        let children = working.take_children(id);
        let children = collapse_siblings(&mut working, children);
        pending.extend(children.iter().copied());
        working.set_children(id, children);
    }

    // Merged-away siblings are still in the arena; copying drops them.
    working.copy()
}

fn collapse_siblings(list: &mut ActivationList, siblings: Vec<ActivationId>) -> Vec<ActivationId> {
    let mut survivors: Vec<ActivationId> = Vec::with_capacity(siblings.len());
    for id in siblings {
        if let Some(&current) = survivors.last() {
            if subtrees_equal(list, current, list, id) {
                let repetitions = list.get(current).repetitions() + 1;
                list.set_repetitions(current, repetitions);
                continue;
            }
        }
        survivors.push(id);
    }
    survivors
}
