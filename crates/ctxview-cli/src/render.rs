//! Plain-text presentation of visible nodes, shared by `show` and the TUI.

use std::time::Duration;

use ctxview_core::node::{PayloadSlot, SlotRole};
use ctxview_core::{ContextNode, NodeKind, NodeState, Visit};

/// One display row: a node header or a payload of an open node.
#[derive(Debug)]
pub enum Row<'a> {
    Node(Visit<'a>),
    Payload { depth: usize, slot: PayloadSlot<'a> },
}

/// Interleave node headers with the payloads of open nodes: inputs right
/// under the header, result and error after the node's visible subtree.
pub fn layout<'a>(visits: impl IntoIterator<Item = Visit<'a>>, payloads: bool) -> Vec<Row<'a>> {
    let mut rows = Vec::new();
    // Result/error slots of open nodes whose subtree is still being emitted.
    let mut trailing: Vec<(usize, Vec<PayloadSlot<'a>>)> = Vec::new();
    for visit in visits {
        flush_trailing(&mut rows, &mut trailing, visit.depth);
        let depth = visit.depth;
        let slots = if payloads && visit.is_open {
            visit.node.payload_slots()
        } else {
            Vec::new()
        };
        rows.push(Row::Node(visit));
        let (inputs, outcome): (Vec<_>, Vec<_>) = slots
            .into_iter()
            .partition(|slot| matches!(slot.role, SlotRole::Input(_)));
        rows.extend(inputs.into_iter().map(|slot| Row::Payload { depth, slot }));
        if !outcome.is_empty() {
            trailing.push((depth, outcome));
        }
    }
    flush_trailing(&mut rows, &mut trailing, 0);
    rows
}

fn flush_trailing<'a>(
    rows: &mut Vec<Row<'a>>,
    trailing: &mut Vec<(usize, Vec<PayloadSlot<'a>>)>,
    depth: usize,
) {
    while trailing.last().is_some_and(|(d, _)| *d >= depth) {
        if let Some((d, slots)) = trailing.pop() {
            rows.extend(slots.into_iter().map(|slot| Row::Payload { depth: d, slot }));
        }
    }
}

/// Expand/collapse marker for a node header.
pub fn open_marker(visit: &Visit<'_>) -> &'static str {
    if visit.is_open {
        "▾"
    } else if has_body(visit.node) {
        "▸"
    } else {
        " "
    }
}

/// Whether opening the node would show anything.
pub fn has_body(node: &ContextNode) -> bool {
    !node.children.is_empty()
        || node.inputs.as_ref().is_some_and(|i| !i.is_empty())
        || node.result.as_ref().is_some_and(|v| !v.is_null())
        || node.error.as_ref().is_some_and(|v| !v.is_null())
}

/// Single-character icon: lifecycle state wins over kind.
pub fn node_icon(node: &ContextNode) -> &'static str {
    match (node.state, &node.kind) {
        (Some(NodeState::Running), _) => "…",
        (Some(NodeState::Event), _) => "•",
        (Some(NodeState::Failed), _) => "✗",
        (None, Some(NodeKind::RepeatOnFailure)) => "↻",
        (None, Some(NodeKind::Query)) => "?",
        (None, Some(NodeKind::Action)) => "→",
        (None, Some(NodeKind::Observation)) => "◦",
        (None, Some(NodeKind::Call)) => "ƒ",
        (None, Some(NodeKind::Other(_)) | None) => "■",
    }
}

/// One header line: `▸ ? name  [kind]  1.2s  #tag`.
pub fn header_line(visit: &Visit<'_>) -> String {
    let node = visit.node;
    let mut line = format!("{} {} {}", open_marker(visit), node_icon(node), node.name);
    if let Some(kind) = &node.kind {
        line.push_str(&format!("  [{kind}]"));
    }
    if let Some(dur) = node.duration().filter(|d| !d.is_zero()) {
        line.push_str(&format!("  {}", human_duration(dur)));
    }
    for tag in &node.tags {
        line.push_str(&format!(" #{}", tag.name()));
    }
    line
}

/// One-line rendering of a body payload.
pub fn payload_line(slot: &PayloadSlot<'_>, max_chars: usize) -> String {
    let label = match slot.role {
        SlotRole::Input(name) => format!("in  {name}"),
        SlotRole::Result => "out".to_string(),
        SlotRole::Error => "err".to_string(),
    };
    let repr = match slot.value {
        serde_json::Value::String(s) => s.replace('\n', " "),
        other => other.to_string(),
    };
    format!("{label}: {}", truncate_str(&repr, max_chars))
}

pub fn human_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else if ms < 3_600_000 {
        let secs = d.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        let secs = d.as_secs();
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub fn truncate_str(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxview_core::{walk, ExpansionState};
    use serde_json::json;

    #[test]
    fn duration_formatting() {
        assert_eq!(human_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(human_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(human_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(human_duration(Duration::from_secs(7_260)), "2h 1m");
    }

    #[test]
    fn state_icon_beats_kind_icon() {
        let failed = ContextNode::new("a", "a")
            .with_kind("query")
            .with_state(NodeState::Failed);
        assert_eq!(node_icon(&failed), "✗");
        assert_eq!(node_icon(&ContextNode::new("b", "b").with_kind("query")), "?");
        assert_eq!(node_icon(&ContextNode::new("c", "c")), "■");
    }

    #[test]
    fn header_shows_kind_duration_and_tags() {
        let mut node = ContextNode::new("a", "ask")
            .with_kind("query")
            .with_times("2024-01-01T00:00:00Z", "2024-01-01T00:00:02Z");
        node.tags = vec![ctxview_core::Tag::Plain("slow".into())];
        let state = ExpansionState::new();
        let visit = walk(&node, &state).next().unwrap();
        assert_eq!(header_line(&visit), "  ? ask  [query]  2.0s #slow");
    }

    #[test]
    fn marker_reflects_body() {
        let leaf = ContextNode::new("a", "a");
        let parent = ContextNode::new("p", "p").with_child(ContextNode::new("c", "c"));
        let mut state = ExpansionState::new();
        assert_eq!(open_marker(&walk(&leaf, &state).next().unwrap()), " ");
        assert_eq!(open_marker(&walk(&parent, &state).next().unwrap()), "▸");
        state.toggle("p");
        assert_eq!(open_marker(&walk(&parent, &state).next().unwrap()), "▾");
    }

    #[test]
    fn payload_lines_are_truncated() {
        let mut node = ContextNode::new("n", "n");
        node.result = Some(json!("a long\nresult text"));
        let slots = node.payload_slots();
        assert_eq!(payload_line(&slots[0], 6), "out: a long...");
    }

    fn row_labels(rows: &[Row<'_>]) -> Vec<String> {
        rows.iter()
            .map(|row| match row {
                Row::Node(visit) => visit.node.uid.clone(),
                Row::Payload { slot, .. } => slot.path.clone(),
            })
            .collect()
    }

    #[test]
    fn result_and_error_follow_the_subtree() {
        let mut inner = ContextNode::new("c", "child");
        inner.result = Some(json!(1));
        let mut root = ContextNode::new("r", "root").with_child(inner);
        let mut inputs = serde_json::Map::new();
        inputs.insert("prompt".into(), json!("hi"));
        root.inputs = Some(inputs);
        root.result = Some(json!("done"));
        root.error = Some(json!("late"));
        let root = root.with_child(ContextNode::new("d", "second"));

        let mut state = ExpansionState::new();
        state.toggle("r");
        state.toggle("c");
        let rows = layout(walk(&root, &state), true);
        assert_eq!(
            row_labels(&rows),
            vec!["r", "r/inputs/prompt", "c", "c/result", "d", "r/result", "r/error"]
        );
        assert!(matches!(rows[5], Row::Payload { depth: 0, .. }));
        assert!(matches!(rows[3], Row::Payload { depth: 1, .. }));

        let bare = layout(walk(&root, &state), false);
        assert_eq!(row_labels(&bare), vec!["r", "c", "d"]);
    }

    #[test]
    fn closed_node_has_no_payload_rows() {
        let mut node = ContextNode::new("n", "n");
        node.result = Some(json!(1));
        let state = ExpansionState::new();
        assert_eq!(row_labels(&layout(walk(&node, &state), true)), vec!["n"]);
    }

    #[test]
    fn truncate_str_unicode_safe() {
        assert_eq!(truncate_str("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_str("short", 10), "short");
    }
}
