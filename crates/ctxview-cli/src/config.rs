use std::io::Write;
use std::path::{Path, PathBuf};

use ctxview_core::{ExpansionState, Selection, SetOpen, Snapshot};
use serde::{Deserialize, Serialize};

/// Viewer defaults applied when a snapshot is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Kinds allow-listed at start.
    pub visible_kinds: Vec<String>,
    /// Allow-list every kind found in the snapshot.
    pub all_kinds: bool,
    /// Open every node shallower than this depth.
    pub expand_depth: usize,
}

pub const KNOWN_KEYS: &[&str] = &["visible_kinds", "all_kinds", "expand_depth"];

/// Default config location: `<config_dir>/ctxview/config.json`,
/// falling back to `~/.ctxview/config.json`.
pub fn default_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        dir.join("ctxview").join("config.json")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".ctxview").join("config.json")
    } else {
        PathBuf::from(".ctxview-config.json")
    }
}

/// Read the raw config object. Missing file means empty.
pub fn read_map(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Write the raw config object atomically.
pub fn write_map(path: &Path, map: &serde_json::Map<String, serde_json::Value>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(map)?;
    write_atomic(path, json.as_bytes())
}

/// Load typed config. Missing file means defaults.
pub fn load(path: &Path) -> anyhow::Result<ViewerConfig> {
    let map = read_map(path)?;
    let config = serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), ?config, "loaded viewer config");
    Ok(config)
}

/// Atomic write: write to temp file in same dir, then rename.
fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Build the session's starting expansion state from config.
pub fn initial_state(snapshot: &Snapshot, config: &ViewerConfig) -> ExpansionState {
    let mut state = ExpansionState::new();
    if config.all_kinds {
        let kinds = snapshot.kinds();
        state.set_open(SetOpen::Open(Selection::kinds(kinds.iter().map(|(k, _)| k))));
    } else {
        state.set_open(SetOpen::Open(Selection::kinds(config.visible_kinds.iter().cloned())));
    }

    if config.expand_depth > 0 {
        let mut shallow = Vec::new();
        let mut stack: Vec<(&ctxview_core::ContextNode, usize)> =
            snapshot.roots().iter().map(|r| (r, 0)).collect();
        while let Some((node, depth)) = stack.pop() {
            if depth < config.expand_depth {
                shallow.push(node.uid.clone());
                stack.extend(node.children.iter().map(|c| (c, depth + 1)));
            }
        }
        state.set_open(SetOpen::Open(Selection::Nodes(shallow)));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctxview_core::parse_snapshot;

    const TRACE: &str = r#"{"uid": "r", "name": "root", "children": [
        {"uid": "q", "name": "q", "kind": "query", "children": [
            {"uid": "o", "name": "o", "kind": "observation"}
        ]},
        {"uid": "a", "name": "a", "kind": "action"}
    ]}"#;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut map = serde_json::Map::new();
        map.insert("expand_depth".into(), serde_json::json!(2));
        map.insert("visible_kinds".into(), serde_json::json!(["query"]));
        write_map(&path, &map).unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.expand_depth, 2);
        assert_eq!(config.visible_kinds, vec!["query"]);
        assert!(!config.all_kinds);
    }

    #[test]
    fn wrong_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"expand_depth": "deep"}"#).unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn initial_state_from_kind_list_and_depth() {
        let snap = parse_snapshot(TRACE).unwrap();
        let config = ViewerConfig {
            visible_kinds: vec!["query".into()],
            all_kinds: false,
            expand_depth: 1,
        };
        let state = initial_state(&snap, &config);
        assert!(state.is_expanded("r"));
        assert!(!state.is_expanded("q"));
        let uids: Vec<&str> = snap.walk(&state).map(|v| v.node.uid.as_str()).collect();
        assert_eq!(uids, vec!["r", "q"]);
    }

    #[test]
    fn initial_state_all_kinds() {
        let snap = parse_snapshot(TRACE).unwrap();
        let config = ViewerConfig {
            all_kinds: true,
            expand_depth: 5,
            ..Default::default()
        };
        let state = initial_state(&snap, &config);
        assert_eq!(state.visible_kinds(), vec!["action", "observation", "query"]);
        assert_eq!(snap.walk(&state).count(), 4);
    }
}
