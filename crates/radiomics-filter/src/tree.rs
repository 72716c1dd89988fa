//! Feature filter trees
//!
//! Extracted features are browsed as a tree, typically
//! modality → ROI → feature. Every node is identified by its [`FeaturePath`].
//! Trees of any depth are supported, and leaves do not need to sit at the same
//! depth.

use serde::Serialize;

use crate::{PathError, path::FeaturePath};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterNode {
    pub path: FeaturePath,
    /// Display label, the last segment of `path`.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterNode>,
}

impl FilterNode {
    fn new(path: FeaturePath) -> Self {
        Self {
            name: path.last().to_owned(),
            path,
            description: None,
            children: vec![],
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This node followed by all of its descendants, in pre-order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Leaves of the subtree rooted at this node.
    ///
    /// A leaf yields only itself.
    pub fn leaves(&self) -> impl Iterator<Item = &FilterNode> {
        self.iter().filter(|node| node.is_leaf())
    }
}

/// Pre-order iterator over filter nodes.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    stack: Vec<&'a FilterNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a FilterNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterTree {
    roots: Vec<FilterNode>,
}

impl FilterTree {
    /// Builds a tree containing every path and all of their ancestors.
    ///
    /// Siblings keep the order in which they were first seen. Repeated paths
    /// are merged.
    ///
    /// # Examples
    ///
    /// ```
    /// use radiomics_filter::tree::FilterTree;
    ///
    /// let tree = FilterTree::from_paths(
    ///     ["CT|shape|volume", "CT|shape|sphericity", "PT|shape|volume"]
    ///         .into_iter()
    ///         .map(str::parse)
    ///         .collect::<Result<Vec<_>, _>>()?,
    /// );
    /// assert_eq!(tree.roots().len(), 2);
    /// assert_eq!(tree.leaves().count(), 3);
    /// # Ok::<(), radiomics_filter::PathError>(())
    /// ```
    #[must_use]
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = FeaturePath>,
    {
        let mut tree = Self::default();
        for path in paths {
            tree.insert(&path);
        }
        tree
    }

    /// Builds a tree from raw segment lists, such as `[modality, roi, feature]`.
    pub fn from_segments<I, P, S>(paths: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths = paths
            .into_iter()
            .map(FeaturePath::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_paths(paths))
    }

    /// Inserts `path` and any missing ancestors.
    pub fn insert(&mut self, path: &FeaturePath) {
        let mut siblings = &mut self.roots;
        for depth in 1..=path.depth() {
            let segment = &path.segments()[depth - 1];
            let index = match siblings.iter().position(|node| node.name == *segment) {
                Some(index) => index,
                None => {
                    siblings.push(FilterNode::new(path.prefix(depth)));
                    siblings.len() - 1
                }
            };
            siblings = &mut siblings[index].children;
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[FilterNode] {
        &self.roots
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FilterNode> {
        self.roots.iter().flat_map(FilterNode::iter)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &FilterNode> {
        self.iter().filter(|node| node.is_leaf())
    }

    #[must_use]
    pub fn find(&self, path: &FeaturePath) -> Option<&FilterNode> {
        let mut siblings = &self.roots;
        let mut found = None;
        for segment in path.segments() {
            let node = siblings.iter().find(|node| node.name == *segment)?;
            siblings = &node.children;
            found = Some(node);
        }
        found
    }

    /// Attaches a description to the node at `path`.
    ///
    /// Returns `false` if there is no such node.
    pub fn set_description(&mut self, path: &FeaturePath, description: impl Into<String>) -> bool {
        let mut siblings = &mut self.roots;
        for (i, segment) in path.segments().iter().enumerate() {
            let Some(node) = siblings.iter_mut().find(|node| node.name == *segment) else {
                return false;
            };
            if i + 1 == path.depth() {
                node.description = Some(description.into());
                return true;
            }
            siblings = &mut node.children;
        }
        false
    }

    /// Nodes that correspond to `node` under every top-level node.
    ///
    /// Two nodes correspond when they are at the same depth and share every
    /// segment below their top-level ancestor, e.g. `CT|shape|volume` and
    /// `PT|shape|volume`. A top-level node corresponds only to itself. The
    /// result always contains `node` itself when it belongs to this tree.
    pub fn corresponding<'a>(&'a self, node: &'a FilterNode) -> Vec<&'a FilterNode> {
        if node.path.depth() == 1 {
            return self
                .roots
                .iter()
                .filter(|root| root.path == node.path)
                .collect();
        }
        self.iter()
            .filter(|other| {
                other.path.depth() == node.path.depth()
                    && other.path.relative() == node.path.relative()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FeaturePath {
        s.parse().unwrap()
    }

    fn tree(paths: &[&str]) -> FilterTree {
        FilterTree::from_paths(paths.iter().map(|p| path(p)))
    }

    fn names<'a>(nodes: impl IntoIterator<Item = &'a FilterNode>) -> Vec<String> {
        nodes.into_iter().map(|n| n.path.to_string()).collect()
    }

    #[test]
    fn test_build_preserves_first_seen_order() {
        let tree = tree(&["PT|b|x", "CT|a|y", "PT|a|z", "PT|b|w", "PT|b|x"]);
        assert_eq!(
            names(tree.iter()),
            ["PT", "PT|b", "PT|b|x", "PT|b|w", "PT|a", "PT|a|z", "CT", "CT|a", "CT|a|y"]
        );
        assert_eq!(tree.leaves().count(), 4);
        let node = tree.find(&path("PT|b")).unwrap();
        assert_eq!(node.name, "b");
        assert!(!node.is_leaf());
    }

    #[test]
    fn test_mixed_depth_leaves() {
        let tree = tree(&["A|B", "A|C|D", "E"]);
        assert_eq!(names(tree.leaves()), ["A|B", "A|C|D", "E"]);
        let a = tree.find(&path("A")).unwrap();
        assert_eq!(names(a.leaves()), ["A|B", "A|C|D"]);
        assert!(tree.find(&path("A|X")).is_none());
        assert!(tree.find(&path("A|B|C")).is_none());
    }

    #[test]
    fn test_from_segments() {
        let tree = FilterTree::from_segments([
            ["CT", "GTV", "original_shape_Volume"],
            ["CT", "GTV", "original_firstorder_Mean"],
        ])
        .unwrap();
        assert_eq!(tree.leaves().count(), 2);
        assert!(FilterTree::from_segments([["CT", ""]]).is_err());
    }

    #[test]
    fn test_set_description() {
        let mut tree = tree(&["CT|shape|volume"]);
        assert!(tree.set_description(&path("CT|shape"), "Shape features"));
        assert!(!tree.set_description(&path("MR|shape"), "missing"));
        assert_eq!(
            tree.find(&path("CT|shape")).unwrap().description.as_deref(),
            Some("Shape features")
        );
    }

    #[test]
    fn test_corresponding_nodes() {
        let tree = tree(&["CT|shape|volume", "CT|glcm|volume", "PT|shape|volume", "PT|shape|mean"]);

        let leaf = tree.find(&path("CT|shape|volume")).unwrap();
        assert_eq!(
            names(tree.corresponding(leaf)),
            ["CT|shape|volume", "PT|shape|volume"]
        );

        let branch = tree.find(&path("PT|shape")).unwrap();
        assert_eq!(names(tree.corresponding(branch)), ["CT|shape", "PT|shape"]);

        let root = tree.find(&path("CT")).unwrap();
        assert_eq!(names(tree.corresponding(root)), ["CT"]);
    }

    #[test]
    fn test_serialize_nested() {
        let tree = tree(&["CT|volume"]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            serde_json::json!([{
                "path": "CT",
                "name": "CT",
                "children": [{"path": "CT|volume", "name": "volume"}],
            }])
        );
    }
}
