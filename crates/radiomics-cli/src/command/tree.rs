//! Feature filter tree command
//!
//! Prints the modality → ROI → feature tree of a feature table with the
//! checkbox state of every node, after applying the requested selection edits.
//! The selection can be kept in a JSON file between runs.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context as _;
use radiomics_filter::{
    path::FeaturePath,
    selection::SelectionSet,
    tree::{FilterNode, FilterTree},
};

use crate::{
    command::dataset,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TreeArg {
    /// Path to the feature table JSON file
    features: PathBuf,
    /// Selection file, read if it exists and written back after the edits
    #[arg(long)]
    selection: Option<PathBuf>,
    /// JSON object mapping node paths to descriptions
    #[arg(long)]
    descriptions: Option<PathBuf>,
    /// Start from an empty selection
    #[arg(long)]
    clear: bool,
    /// Select every node
    #[arg(long)]
    all: bool,
    /// Nodes to select with their subtree (comma-separated, e.g. "CT|GTV")
    #[arg(long, value_delimiter = ',')]
    select: Vec<FeaturePath>,
    /// Nodes to deselect with their subtree (comma-separated)
    #[arg(long, value_delimiter = ',')]
    deselect: Vec<FeaturePath>,
    /// Nodes to toggle under every modality at once (comma-separated)
    #[arg(long, value_delimiter = ',')]
    everywhere: Vec<FeaturePath>,
}

pub(crate) fn run(arg: &TreeArg) -> anyhow::Result<()> {
    let table = util::read_feature_table(&arg.features)?;
    let mut tree = dataset::feature_tree(&table)?;
    if let Some(path) = &arg.descriptions {
        apply_descriptions(&mut tree, util::read_json_file("descriptions", path)?);
    }

    let mut selection = match &arg.selection {
        Some(path) if path.exists() => util::read_json_file("selection", path)?,
        _ => SelectionSet::new(),
    };
    edit_selection(&mut selection, &tree, arg)?;

    for root in tree.roots() {
        print_node(&selection, root, 0);
    }
    let total = tree.leaves().count();
    let covered = selection.covered_leaves(&tree).count();
    println!();
    println!("{covered} of {total} features selected");

    if let Some(path) = &arg.selection {
        Output::save_json(&selection, Some(path.as_path()))?;
        log::info!("Saved selection to {}", path.display());
    }
    Ok(())
}

fn edit_selection(
    selection: &mut SelectionSet,
    tree: &FilterTree,
    arg: &TreeArg,
) -> anyhow::Result<()> {
    if arg.clear {
        selection.clear();
    }
    if arg.all {
        selection.select_all(tree);
    }
    for path in &arg.select {
        selection.toggle_node(find(tree, path)?, true);
    }
    for path in &arg.deselect {
        selection.toggle_node(find(tree, path)?, false);
    }
    for path in &arg.everywhere {
        let checked = selection.toggle_everywhere(tree, find(tree, path)?);
        log::debug!(
            "{} {path} everywhere",
            if checked { "Selected" } else { "Deselected" }
        );
    }
    Ok(())
}

fn find<'a>(tree: &'a FilterTree, path: &FeaturePath) -> anyhow::Result<&'a FilterNode> {
    tree.find(path)
        .with_context(|| format!("No node '{path}' in the feature tree"))
}

fn apply_descriptions(tree: &mut FilterTree, descriptions: BTreeMap<FeaturePath, String>) {
    for (path, description) in descriptions {
        if !tree.set_description(&path, description) {
            log::warn!("Ignoring description of unknown node '{path}'");
        }
    }
}

fn print_node(selection: &SelectionSet, node: &FilterNode, depth: usize) {
    let indent = "    ".repeat(depth);
    match &node.description {
        Some(description) => println!(
            "{indent}{} {}  ({description})",
            selection.state(node),
            node.name
        ),
        None => println!("{indent}{} {}", selection.state(node), node.name),
    }
    for child in &node.children {
        print_node(selection, child, depth + 1);
    }
}
