//! Read-only facts derived from a [`ContextNode`] and its subtree.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::types::{ContextNode, NodeId, NodeKind, NodeState};

/// Which part of a node's body a payload comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole<'a> {
    Input(&'a str),
    Result,
    Error,
}

/// A payload handed to the value renderer, keyed by a stable path.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSlot<'a> {
    /// `<uid>/inputs/<property>`, `<uid>/result` or `<uid>/error`.
    pub path: String,
    pub role: SlotRole<'a>,
    pub value: &'a Value,
}

impl ContextNode {
    /// Elapsed time between `start_time` and `end_time`.
    ///
    /// `None` while the node is running, when either timestamp is missing
    /// or unparsable, and when the end precedes the start.
    pub fn duration(&self) -> Option<Duration> {
        if self.state == Some(NodeState::Running) {
            return None;
        }
        let start = parse_timestamp(self.start_time.as_deref()?)?;
        let end = parse_timestamp(self.end_time.as_deref()?)?;
        Duration::try_from(end - start).ok()
    }

    /// Uids of every node strictly below this one, in pre-order.
    ///
    /// The node's own uid is not included, so opening the result expands
    /// the subtree without changing whether this node itself is open.
    pub fn all_descendant_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack: Vec<&ContextNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            ids.push(node.uid.clone());
            stack.extend(node.children.iter().rev());
        }
        ids
    }

    /// Find a node by uid in this subtree (this node included), pre-order.
    pub fn find(&self, uid: &str) -> Option<&ContextNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.uid == uid {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Number of nodes in this subtree, this node included.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Body payloads in display order: inputs, then result, then error.
    /// JSON `null` payloads are skipped.
    pub fn payload_slots(&self) -> Vec<PayloadSlot<'_>> {
        let mut slots = Vec::new();
        if let Some(inputs) = &self.inputs {
            for (property, value) in inputs {
                slots.push(PayloadSlot {
                    path: format!("{}/inputs/{property}", self.uid),
                    role: SlotRole::Input(property),
                    value,
                });
            }
        }
        if let Some(value) = self.result.as_ref().filter(|v| !v.is_null()) {
            slots.push(PayloadSlot {
                path: format!("{}/result", self.uid),
                role: SlotRole::Result,
                value,
            });
        }
        if let Some(value) = self.error.as_ref().filter(|v| !v.is_null()) {
            slots.push(PayloadSlot {
                path: format!("{}/error", self.uid),
                role: SlotRole::Error,
                value,
            });
        }
        slots
    }
}

/// Every kind found in the given trees with its node count, ordered by
/// first pre-order occurrence.
pub fn kind_census<'a, I>(roots: I) -> Vec<(NodeKind, usize)>
where
    I: IntoIterator<Item = &'a ContextNode>,
{
    let mut order: Vec<(NodeKind, usize)> = Vec::new();
    let mut index: HashMap<NodeKind, usize> = HashMap::new();
    for root in roots {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(kind) = &node.kind {
                match index.get(kind) {
                    Some(&i) => order[i].1 += 1,
                    None => {
                        index.insert(kind.clone(), order.len());
                        order.push((kind.clone(), 1));
                    }
                }
            }
            stack.extend(node.children.iter().rev());
        }
    }
    order
}

/// Parse RFC 3339, or ISO 8601 without an offset (taken as UTC).
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let with_fraction =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let whole_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, with_fraction)
        .or_else(|_| PrimitiveDateTime::parse(raw, whole_seconds))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
