use std::path::Path;

use ctxview_core::{load_snapshot, ExpansionState, Selection, SetOpen, Snapshot, Visit};

use crate::config::{self, ViewerConfig};
use crate::render::{self, Row};

pub struct ShowParams<'a> {
    pub file: &'a Path,
    pub config: ViewerConfig,
    pub open: &'a [String],
    pub expand_all: bool,
    pub kinds: &'a [String],
    pub all_kinds: bool,
    pub payloads: bool,
    pub json: bool,
}

pub fn execute(params: &ShowParams<'_>) -> anyhow::Result<()> {
    let snapshot = load_snapshot(params.file)?;
    let state = build_state(&snapshot, params);

    if params.json {
        for visit in snapshot.walk(&state) {
            println!("{}", serde_json::to_string(&visit_json(&visit))?);
        }
        return Ok(());
    }

    for line in text_lines(&snapshot, &state, params.payloads) {
        println!("{line}");
    }
    let hidden = snapshot.node_count() - snapshot.walk(&state).count();
    if hidden > 0 {
        println!("\n({hidden} nodes hidden; use --open, --expand-all or --kind)");
    }
    Ok(())
}

/// Config seed first, then command-line overrides on top.
fn build_state(snapshot: &Snapshot, params: &ShowParams<'_>) -> ExpansionState {
    let mut config = params.config.clone();
    config.all_kinds |= params.all_kinds;
    let mut state = config::initial_state(snapshot, &config);

    if !params.kinds.is_empty() {
        state.set_open(SetOpen::Open(Selection::kinds(params.kinds.iter().cloned())));
    }
    if !params.open.is_empty() {
        state.set_open(SetOpen::Open(Selection::nodes(params.open.iter().cloned())));
    }
    if params.expand_all {
        for root in snapshot.roots() {
            state.set_open(SetOpen::Open(Selection::nodes([root.uid.clone()])));
            state.set_open(SetOpen::Open(Selection::Nodes(root.all_descendant_ids())));
        }
    }
    state
}

fn text_lines(snapshot: &Snapshot, state: &ExpansionState, payloads: bool) -> Vec<String> {
    render::layout(snapshot.walk(state), payloads)
        .iter()
        .map(|row| match row {
            Row::Node(visit) => {
                format!("{}{}", "  ".repeat(visit.depth), render::header_line(visit))
            }
            Row::Payload { depth, slot } => {
                format!("{}    {}", "  ".repeat(*depth), render::payload_line(slot, 80))
            }
        })
        .collect()
}

fn visit_json(visit: &Visit<'_>) -> serde_json::Value {
    let node = visit.node;
    serde_json::json!({
        "uid": node.uid,
        "name": node.name,
        "depth": visit.depth,
        "open": visit.is_open,
        "kind": node.kind,
        "state": node.state,
        "duration_ms": node.duration().and_then(|d| u64::try_from(d.as_millis()).ok()),
        "visible_children": visit.visible_children.len(),
        "children": node.children.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxview_core::parse_snapshot;

    const TRACE: &str = r#"{"uid": "r", "name": "root", "children": [
        {"uid": "q", "name": "ask", "kind": "query", "result": "42"},
        {"uid": "s", "name": "step"}
    ]}"#;

    fn params<'a>(open: &'a [String], kinds: &'a [String]) -> ShowParams<'a> {
        ShowParams {
            file: Path::new("unused.json"),
            config: ViewerConfig::default(),
            open,
            expand_all: false,
            kinds,
            all_kinds: false,
            payloads: true,
            json: false,
        }
    }

    #[test]
    fn closed_root_prints_one_line() {
        let snap = parse_snapshot(TRACE).unwrap();
        let state = build_state(&snap, &params(&[], &[]));
        assert_eq!(text_lines(&snap, &state, true), vec!["▸ ■ root"]);
    }

    #[test]
    fn open_and_kind_flags_apply() {
        let snap = parse_snapshot(TRACE).unwrap();
        let open = vec!["r".to_string(), "q".to_string()];
        let kinds = vec!["query".to_string()];
        let state = build_state(&snap, &params(&open, &kinds));
        let lines = text_lines(&snap, &state, true);
        assert_eq!(
            lines,
            vec!["▾ ■ root", "  ▾ ? ask  [query]", "      out: 42", "    ■ step"]
        );
    }

    #[test]
    fn result_prints_after_children() {
        let text = r#"{"uid": "r", "name": "root", "result": "final", "children": [
            {"uid": "c", "name": "child"}
        ]}"#;
        let snap = parse_snapshot(text).unwrap();
        let open = vec!["r".to_string()];
        let state = build_state(&snap, &params(&open, &[]));
        assert_eq!(
            text_lines(&snap, &state, true),
            vec!["▾ ■ root", "    ■ child", "    out: final"]
        );
    }

    #[test]
    fn duration_ms_is_whole_milliseconds() {
        let text = r#"{"uid": "r", "name": "root",
            "start_time": "2024-01-01T00:00:00Z", "end_time": "2024-01-01T00:00:01.5Z"}"#;
        let snap = parse_snapshot(text).unwrap();
        let state = ExpansionState::new();
        let visit = snap.walk(&state).next().unwrap();
        assert_eq!(visit_json(&visit)["duration_ms"], 1500);
    }

    #[test]
    fn expand_all_opens_roots_and_descendants() {
        let snap = parse_snapshot(TRACE).unwrap();
        let mut p = params(&[], &[]);
        p.expand_all = true;
        p.all_kinds = true;
        let state = build_state(&snap, &p);
        assert!(state.is_expanded("r"));
        assert!(state.is_expanded("q"));
        assert!(state.is_expanded("s"));
        assert_eq!(snap.walk(&state).count(), 3);
    }

    #[test]
    fn json_line_shape() {
        let snap = parse_snapshot(TRACE).unwrap();
        let state = ExpansionState::new();
        let visit = snap.walk(&state).next().unwrap();
        let val = visit_json(&visit);
        assert_eq!(val["uid"], "r");
        assert_eq!(val["open"], false);
        assert_eq!(val["children"], 2);
        assert!(val["kind"].is_null());
        assert!(val["duration_ms"].is_null());
    }
}
