//! Loading a materialized trace tree from JSON.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::decode::decode_roots;
use crate::error::TraceError;
use crate::expansion::ExpansionState;
use crate::node::kind_census;
use crate::types::{ContextNode, NodeKind};
use crate::walker::{walk_forest, Walker};

/// An immutable set of root nodes with uids unique across all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    roots: Vec<ContextNode>,
}

impl Snapshot {
    /// Build a snapshot, rejecting duplicate uids.
    pub fn new(roots: Vec<ContextNode>) -> Result<Self, TraceError> {
        check_unique_uids(&roots)?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[ContextNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<ContextNode> {
        self.roots
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ContextNode::subtree_len).sum()
    }

    pub fn find(&self, uid: &str) -> Option<&ContextNode> {
        self.roots.iter().find_map(|root| root.find(uid))
    }

    /// Kinds present in the snapshot with node counts, first-seen order.
    pub fn kinds(&self) -> Vec<(NodeKind, usize)> {
        kind_census(&self.roots)
    }

    pub fn walk<'a, 's>(&'a self, state: &'s ExpansionState) -> Walker<'a, 's> {
        walk_forest(&self.roots, state)
    }
}

/// Parse a snapshot: either a single node object or an array of roots.
/// Nesting depth is not limited.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, TraceError> {
    let mut json = serde_json::Deserializer::from_str(text);
    json.disable_recursion_limit();
    // Grows the stack on the heap while the raw document is read.
    let value = serde_json::Value::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    let snapshot = Snapshot::new(decode_roots(value)?)?;
    tracing::debug!(
        roots = snapshot.roots.len(),
        nodes = snapshot.node_count(),
        "parsed trace snapshot"
    );
    Ok(snapshot)
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, TraceError> {
    let text = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "loading trace snapshot");
    parse_snapshot(&text)
}

fn check_unique_uids(roots: &[ContextNode]) -> Result<(), TraceError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&ContextNode> = roots.iter().collect();
    while let Some(node) = stack.pop() {
        if !seen.insert(node.uid.as_str()) {
            return Err(TraceError::DuplicateUid(node.uid.clone()));
        }
        stack.extend(node.children.iter());
    }
    Ok(())
}
