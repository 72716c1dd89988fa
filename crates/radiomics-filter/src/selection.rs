//! Checkbox selection over a filter tree
//!
//! The selection is stored as a set of node paths. Checking a node adds the
//! node and its whole subtree; unchecking removes them. Whether a branch shows
//! as checked is derived from its leaves, so a branch stays consistent with its
//! subtree however the set was built.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    path::FeaturePath,
    tree::{FilterNode, FilterTree},
};

/// Displayed state of a node's checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum CheckState {
    #[display("[x]")]
    Checked,
    #[display("[-]")]
    Indeterminate,
    #[display("[ ]")]
    Unchecked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    selected: BTreeSet<FeaturePath>,
}

impl SelectionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, path: &FeaturePath) -> bool {
        self.selected.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeaturePath> {
        self.selected.iter()
    }

    /// Checks or unchecks `node` together with all of its descendants.
    ///
    /// Ancestors are not touched; their displayed state follows from
    /// [`is_checked`](Self::is_checked) and [`is_indeterminate`](Self::is_indeterminate).
    ///
    /// # Examples
    ///
    /// ```
    /// use radiomics_filter::{selection::SelectionSet, tree::FilterTree};
    ///
    /// let tree = FilterTree::from_paths(["A|B".parse()?, "A|C".parse()?]);
    /// let a = tree.find(&"A".parse()?).unwrap();
    /// let b = tree.find(&"A|B".parse()?).unwrap();
    ///
    /// let mut selection = SelectionSet::new();
    /// selection.toggle_node(a, true);
    /// assert!(selection.is_checked(a));
    ///
    /// selection.toggle_node(b, false);
    /// assert!(!selection.is_checked(a));
    /// assert!(selection.is_indeterminate(a));
    /// # Ok::<(), radiomics_filter::PathError>(())
    /// ```
    pub fn toggle_node(&mut self, node: &FilterNode, checked: bool) {
        for path in node.iter().map(|n| &n.path) {
            if checked {
                self.selected.insert(path.clone());
            } else {
                self.selected.remove(path);
            }
        }
    }

    /// Toggles `node` and every corresponding node under the other top-level
    /// nodes (see [`FilterTree::corresponding`]).
    ///
    /// All of them are unchecked if `node` itself is currently selected, and
    /// checked otherwise. Returns whether the nodes are now checked.
    pub fn toggle_everywhere(&mut self, tree: &FilterTree, node: &FilterNode) -> bool {
        let checked = !self.contains(&node.path);
        let mut targets = tree.corresponding(node);
        if !targets.iter().any(|n| n.path == node.path) {
            targets.push(node);
        }
        for target in targets {
            self.toggle_node(target, checked);
        }
        checked
    }

    /// Leaves are checked when selected; branches when all of their leaves are.
    #[must_use]
    pub fn is_checked(&self, node: &FilterNode) -> bool {
        node.leaves().all(|leaf| self.contains(&leaf.path))
    }

    /// Whether some, but not all, leaves below a branch are selected.
    ///
    /// Always `false` for a leaf.
    #[must_use]
    pub fn is_indeterminate(&self, node: &FilterNode) -> bool {
        if node.is_leaf() {
            return false;
        }
        let (selected, total) = node.leaves().fold((0, 0), |(selected, total), leaf| {
            (selected + usize::from(self.contains(&leaf.path)), total + 1)
        });
        selected > 0 && selected < total
    }

    #[must_use]
    pub fn state(&self, node: &FilterNode) -> CheckState {
        if self.is_checked(node) {
            CheckState::Checked
        } else if self.is_indeterminate(node) {
            CheckState::Indeterminate
        } else {
            CheckState::Unchecked
        }
    }

    /// Selected leaves of `tree`, in tree order.
    pub fn covered_leaves<'a>(&'a self, tree: &'a FilterTree) -> impl Iterator<Item = &'a FeaturePath> {
        tree.leaves()
            .map(|leaf| &leaf.path)
            .filter(|path| self.contains(path))
    }

    pub fn select_all(&mut self, tree: &FilterTree) {
        self.selected.extend(tree.iter().map(|node| node.path.clone()));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

impl FromIterator<FeaturePath> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = FeaturePath>>(iter: T) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}
