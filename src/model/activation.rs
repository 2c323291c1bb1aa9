//! Activation tree: one node per reconstructed call frame.
//!
//! Nodes live in an arena owned by [`ActivationList`]. Parent and child links
//! are [`ActivationId`] indices into that arena, so the parent back-reference
//! never owns anything. Read access goes through the borrowed
//! [`ActivationRef`] view.
//!
//! Every walk in this module uses an explicit work stack; traces of deeply
//! recursive programs must not exhaust the native call stack.

use super::member::MemberRef;
use crate::utils::config::{INDENT_SIZE, UNKNOWN_DEPTH};
use std::fmt;

/// Index of a node inside one [`ActivationList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationId(usize);

impl ActivationId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One call frame
#[derive(Debug, Clone)]
pub struct Activation {
    owner: String,
    member: MemberRef,
    stack_depth: i32,
    repetitions: u32,
    parent: Option<ActivationId>,
    children: Vec<ActivationId>,
}

/// Ordered root activations plus the arena holding every node below them
#[derive(Debug, Clone, Default)]
pub struct ActivationList {
    nodes: Vec<Activation>,
    roots: Vec<ActivationId>,
}

impl ActivationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node under `parent`, or as a new root when `parent` is `None`
    ///
    /// **Public** - the only way nodes are added; keeps the forest invariant
    pub fn add(
        &mut self,
        parent: Option<ActivationId>,
        owner: impl Into<String>,
        member: MemberRef,
        stack_depth: i32,
    ) -> ActivationId {
        let id = ActivationId(self.nodes.len());
        self.nodes.push(Activation {
            owner: owner.into(),
            member,
            stack_depth,
            repetitions: 1,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn add_root(&mut self, owner: impl Into<String>, member: MemberRef) -> ActivationId {
        self.add(None, owner, member, UNKNOWN_DEPTH)
    }

    pub fn add_child(
        &mut self,
        parent: ActivationId,
        owner: impl Into<String>,
        member: MemberRef,
    ) -> ActivationId {
        self.add(Some(parent), owner, member, UNKNOWN_DEPTH)
    }

    /// View of a node
    ///
    /// # Panics
    /// If `id` was not produced by this list.
    pub fn get(&self, id: ActivationId) -> ActivationRef<'_> {
        debug_assert!(id.0 < self.nodes.len());
        ActivationRef { list: self, id }
    }

    /// The `index`-th root, if any
    pub fn root(&self, index: usize) -> Option<ActivationRef<'_>> {
        self.roots.get(index).map(|&id| self.get(id))
    }

    pub fn roots(&self) -> impl Iterator<Item = ActivationRef<'_>> + '_ {
        self.roots.iter().map(move |&id| self.get(id))
    }

    pub fn root_ids(&self) -> &[ActivationId] {
        &self.roots
    }

    /// Number of root activations
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of nodes reachable from the roots
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<ActivationId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
        count
    }

    /// Deep copy, compacting the arena and keeping all node content
    pub fn copy(&self) -> ActivationList {
        let mut copy = ActivationList::new();
        for &root in &self.roots {
            self.copy_subtree_into(root, &mut copy, None);
        }
        copy
    }

    /// Copy the subtree rooted at `source` into `dest` below `dest_parent`
    ///
    /// **Public** - building block of find/filter style transforms
    pub fn copy_subtree_into(
        &self,
        source: ActivationId,
        dest: &mut ActivationList,
        dest_parent: Option<ActivationId>,
    ) -> ActivationId {
        let top = dest.push_copy(dest_parent, &self.nodes[source.0]);
        let mut stack: Vec<(ActivationId, ActivationId)> = vec![(source, top)];
        while let Some((src, dst)) = stack.pop() {
            // Children are created in order before descending, so sibling
            // order is preserved regardless of stack order.
            for &child in &self.nodes[src.0].children {
                let copied = dest.push_copy(Some(dst), &self.nodes[child.0]);
                stack.push((child, copied));
            }
        }
        top
    }

    fn push_copy(&mut self, parent: Option<ActivationId>, node: &Activation) -> ActivationId {
        let id = self.add(parent, node.owner.clone(), node.member.clone(), node.stack_depth);
        self.nodes[id.0].repetitions = node.repetitions;
        id
    }

    /// Structural equality of the two forests
    ///
    /// Owner, member identity and children must match recursively;
    /// stack depth and repetition counts are ignored.
    pub fn structural_eq(&self, other: &ActivationList) -> bool {
        self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(&other.roots)
                .all(|(&a, &b)| subtrees_equal(self, a, other, b))
    }

    // Crate-internal mutation used by the tracer and collapse pass.

    pub(crate) fn parent_id(&self, id: ActivationId) -> Option<ActivationId> {
        self.nodes[id.0].parent
    }

    pub(crate) fn children_ids(&self, id: ActivationId) -> &[ActivationId] {
        &self.nodes[id.0].children
    }

    pub(crate) fn set_repetitions(&mut self, id: ActivationId, repetitions: u32) {
        self.nodes[id.0].repetitions = repetitions.max(1);
    }

    pub(crate) fn take_roots(&mut self) -> Vec<ActivationId> {
        std::mem::take(&mut self.roots)
    }

    pub(crate) fn set_roots(&mut self, roots: Vec<ActivationId>) {
        self.roots = roots;
    }

    pub(crate) fn take_children(&mut self, id: ActivationId) -> Vec<ActivationId> {
        std::mem::take(&mut self.nodes[id.0].children)
    }

    pub(crate) fn set_children(&mut self, id: ActivationId, children: Vec<ActivationId>) {
        self.nodes[id.0].children = children;
    }
}

/// Structural equality of two subtrees, possibly from different lists
pub fn subtrees_equal(
    left: &ActivationList,
    a: ActivationId,
    right: &ActivationList,
    b: ActivationId,
) -> bool {
    let mut stack = vec![(a, b)];
    while let Some((a, b)) = stack.pop() {
        let (na, nb) = (&left.nodes[a.0], &right.nodes[b.0]);
        if na.owner != nb.owner
            || !na.member.same_routine(&nb.member)
            || na.children.len() != nb.children.len()
        {
            return false;
        }
        stack.extend(na.children.iter().copied().zip(nb.children.iter().copied()));
    }
    true
}

impl PartialEq for ActivationList {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl Eq for ActivationList {}

impl fmt::Display for ActivationList {
    /// Indented tree, one call per line, `(x N)` for collapsed repetitions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<(ActivationId, usize)> =
            self.roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, indent)) = stack.pop() {
            let node = &self.nodes[id.0];
            write!(f, "{:indent$}{}.{}", "", node.owner, node.member.name, indent = indent)?;
            if node.repetitions > 1 {
                write!(f, " (x {})", node.repetitions)?;
            }
            writeln!(f)?;
            stack.extend(node.children.iter().rev().map(|&c| (c, indent + INDENT_SIZE)));
        }
        Ok(())
    }
}

/// Borrowed view of one node and its surroundings
#[derive(Clone, Copy)]
pub struct ActivationRef<'a> {
    list: &'a ActivationList,
    id: ActivationId,
}

impl<'a> ActivationRef<'a> {
    fn node(&self) -> &'a Activation {
        &self.list.nodes[self.id.0]
    }

    pub fn id(&self) -> ActivationId {
        self.id
    }

    pub fn list(&self) -> &'a ActivationList {
        self.list
    }

    pub fn owner(&self) -> &'a str {
        &self.node().owner
    }

    pub fn member(&self) -> &'a MemberRef {
        &self.node().member
    }

    pub fn stack_depth(&self) -> i32 {
        self.node().stack_depth
    }

    pub fn repetitions(&self) -> u32 {
        self.node().repetitions
    }

    pub fn parent(&self) -> Option<ActivationRef<'a>> {
        self.node().parent.map(|id| self.list.get(id))
    }

    pub fn children(&self) -> impl Iterator<Item = ActivationRef<'a>> + 'a {
        let list = self.list;
        self.node().children.iter().map(move |&id| list.get(id))
    }

    pub fn child(&self, index: usize) -> Option<ActivationRef<'a>> {
        self.node().children.get(index).map(|&id| self.list.get(id))
    }

    /// Number of direct nested calls
    pub fn num_calls(&self) -> usize {
        self.node().children.len()
    }

    /// `owner.member`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner(), self.member().name)
    }

    /// Structural equality with another node, possibly from another list
    pub fn structurally_equals(&self, other: &ActivationRef<'_>) -> bool {
        subtrees_equal(self.list, self.id, other.list, other.id)
    }

    /// Standalone deep copy of this subtree as a single-root list
    pub fn to_list(&self) -> ActivationList {
        let mut list = ActivationList::new();
        self.list.copy_subtree_into(self.id, &mut list, None);
        list
    }
}

impl fmt::Debug for ActivationRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationRef")
            .field("id", &self.id)
            .field("name", &self.qualified_name())
            .field("repetitions", &self.repetitions())
            .field("num_calls", &self.num_calls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_links_parent_and_child() {
        let mut list = ActivationList::new();
        let parent = list.add_root("class1", MemberRef::new("method1"));
        let child = list.add_child(parent, "class2", MemberRef::new("method2"));

        let parent_ref = list.get(parent);
        assert_eq!(parent_ref.owner(), "class1");
        assert_eq!(parent_ref.member().name, "method1");
        assert!(parent_ref.parent().is_none());
        assert_eq!(parent_ref.num_calls(), 1);

        let child_ref = list.get(child);
        assert_eq!(child_ref.owner(), "class2");
        assert_eq!(child_ref.parent().map(|p| p.id()), Some(parent));
        assert_eq!(child_ref.num_calls(), 0);
        assert_eq!(parent_ref.child(0).map(|c| c.id()), Some(child));
        assert_eq!(list.len(), 1);
        assert_eq!(list.node_count(), 2);
    }

    #[test]
    fn test_copy_keeps_content_and_is_independent() {
        let mut list = ActivationList::new();
        let root = list.add(None, "A", MemberRef::new("run"), 3);
        let child = list.add(Some(root), "B", MemberRef::new("go"), 4);
        list.set_repetitions(child, 7);

        let mut copy = list.copy();
        assert_eq!(copy, list);
        let copied_child = copy.root(0).unwrap().child(0).unwrap();
        assert_eq!(copied_child.repetitions(), 7);
        assert_eq!(copied_child.stack_depth(), 4);

        let copied_root = copy.root_ids()[0];
        copy.add_child(copied_root, "C", MemberRef::new("extra"));
        assert_ne!(copy, list);
        assert_eq!(list.node_count(), 2);
    }

    #[test]
    fn test_equality_ignores_depth_and_repetitions() {
        let mut a = ActivationList::new();
        let ra = a.add(None, "A", MemberRef::new("run"), 1);
        a.set_repetitions(ra, 3);

        let mut b = ActivationList::new();
        b.add(None, "A", MemberRef::new("run"), 9);

        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_respects_argument_types() {
        let mut a = ActivationList::new();
        a.add_root("A", MemberRef::new("run").with_args(["int"]));
        let mut b = ActivationList::new();
        b.add_root("A", MemberRef::new("run").with_args(["long"]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_indents_and_marks_repetitions() {
        let mut list = ActivationList::new();
        let root = list.add_root("Main", MemberRef::new("main"));
        let child = list.add_child(root, "Foo", MemberRef::new("bar"));
        list.set_repetitions(child, 2);

        assert_eq!(list.to_string(), "Main.main\n    Foo.bar (x 2)\n");
    }
}
