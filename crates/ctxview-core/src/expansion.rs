//! Open/closed state of a viewing session and the commands that change it.

use std::collections::HashSet;

use crate::types::{NodeId, NodeKind};

/// Which nodes are expanded and which kinds are allow-listed.
///
/// Node uids and kind strings live in separate sets, so a uid that happens
/// to equal a kind string never collides with it. [`ExpansionState::has`]
/// still answers for either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded_nodes: HashSet<NodeId>,
    visible_kinds: HashSet<String>,
}

/// A batch of identifiers for [`SetOpen::Open`] / [`SetOpen::Close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Nodes(Vec<NodeId>),
    Kinds(Vec<String>),
}

impl Selection {
    pub fn nodes<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        Selection::Nodes(ids.into_iter().map(Into::into).collect())
    }

    pub fn kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Kinds(kinds.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::Nodes(ids) | Selection::Kinds(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A user intent against the expansion state.
///
/// Toggling only exists for a single node; batches are always an
/// unconditional open or close so one action never leaves a subtree
/// half open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOpen {
    Toggle(NodeId),
    Open(Selection),
    Close(Selection),
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership in either set: an expanded uid or an allow-listed kind.
    pub fn has(&self, id: &str) -> bool {
        self.expanded_nodes.contains(id) || self.visible_kinds.contains(id)
    }

    pub fn is_expanded(&self, uid: &str) -> bool {
        self.expanded_nodes.contains(uid)
    }

    pub fn is_kind_visible(&self, kind: &NodeKind) -> bool {
        self.visible_kinds.contains(kind.as_str())
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded_nodes.len()
    }

    /// Allow-listed kinds, sorted.
    pub fn visible_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.visible_kinds.iter().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Apply one command. Unknown or stale identifiers are no-ops.
    pub fn set_open(&mut self, cmd: SetOpen) {
        match cmd {
            SetOpen::Toggle(uid) => {
                let now_open = if self.expanded_nodes.remove(&uid) {
                    false
                } else {
                    self.expanded_nodes.insert(uid.clone());
                    true
                };
                tracing::debug!(uid = %uid, open = now_open, "toggle node");
            }
            SetOpen::Open(selection) => {
                tracing::debug!(count = selection.len(), "open selection");
                match selection {
                    Selection::Nodes(ids) => self.expanded_nodes.extend(ids),
                    Selection::Kinds(kinds) => self.visible_kinds.extend(kinds),
                }
            }
            SetOpen::Close(selection) => {
                tracing::debug!(count = selection.len(), "close selection");
                match selection {
                    Selection::Nodes(ids) => {
                        for id in &ids {
                            self.expanded_nodes.remove(id);
                        }
                    }
                    Selection::Kinds(kinds) => {
                        for kind in &kinds {
                            self.visible_kinds.remove(kind);
                        }
                    }
                }
            }
        }
    }

    /// Shorthand for [`SetOpen::Toggle`].
    pub fn toggle(&mut self, uid: impl Into<NodeId>) {
        self.set_open(SetOpen::Toggle(uid.into()));
    }
}
