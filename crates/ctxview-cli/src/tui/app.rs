use std::path::PathBuf;

use ctxview_core::{load_snapshot, ExpansionState, NodeKind, Selection, SetOpen, Snapshot, Visit};

/// Application state for the TUI.
pub struct App {
    pub path: PathBuf,
    pub should_quit: bool,

    // Data
    pub snapshot: Snapshot,
    pub kinds: Vec<(NodeKind, usize)>,
    pub error: Option<String>,

    // View
    pub state: ExpansionState,
    pub cursor: usize,
    pub show_payloads: bool,
}

impl App {
    pub fn new(path: PathBuf, snapshot: Snapshot, state: ExpansionState) -> Self {
        let kinds = snapshot.kinds();
        Self {
            path,
            should_quit: false,
            snapshot,
            kinds,
            error: None,
            state,
            cursor: 0,
            show_payloads: true,
        }
    }

    /// Visible rows for the current expansion state.
    pub fn rows(&self) -> Vec<Visit<'_>> {
        self.snapshot.walk(&self.state).collect()
    }

    pub fn selected_uid(&self) -> Option<String> {
        self.rows().get(self.cursor).map(|v| v.node.uid.clone())
    }

    /// Re-read the snapshot file. Expansion state survives the swap; uids
    /// that vanished are simply never matched again.
    /// Errors are stored in `self.error` instead of propagating.
    pub fn reload(&mut self) {
        match load_snapshot(&self.path) {
            Ok(snapshot) => {
                self.kinds = snapshot.kinds();
                self.snapshot = snapshot;
                self.error = None;
                self.clamp_cursor();
            }
            Err(e) => {
                tracing::warn!(error = %e, "reload failed");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        use crossterm::event::KeyCode;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('e') => self.expand_selected_subtree(),
            KeyCode::Char('c') => self.collapse_selected_subtree(),
            KeyCode::Char('a') => self.set_all_kinds(true),
            KeyCode::Char('n') => self.set_all_kinds(false),
            KeyCode::Char('p') => self.show_payloads = !self.show_payloads,
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                self.toggle_kind(index);
            }
            _ => {}
        }
    }

    fn toggle_selected(&mut self) {
        if let Some(uid) = self.selected_uid() {
            self.state.set_open(SetOpen::Toggle(uid));
        }
    }

    /// Open the selected node and everything below it.
    fn expand_selected_subtree(&mut self) {
        let Some(uid) = self.selected_uid() else {
            return;
        };
        let Some(node) = self.snapshot.find(&uid) else {
            return;
        };
        let descendants = node.all_descendant_ids();
        self.state.set_open(SetOpen::Open(Selection::nodes([uid])));
        self.state.set_open(SetOpen::Open(Selection::Nodes(descendants)));
    }

    /// Close everything below the selected node, leaving it open.
    fn collapse_selected_subtree(&mut self) {
        let Some(uid) = self.selected_uid() else {
            return;
        };
        if let Some(node) = self.snapshot.find(&uid) {
            let descendants = node.all_descendant_ids();
            self.state.set_open(SetOpen::Close(Selection::Nodes(descendants)));
        }
        self.clamp_cursor();
    }

    fn toggle_kind(&mut self, index: usize) {
        let Some((kind, _)) = self.kinds.get(index) else {
            return;
        };
        let selection = Selection::kinds([kind]);
        if self.state.is_kind_visible(kind) {
            self.state.set_open(SetOpen::Close(selection));
        } else {
            self.state.set_open(SetOpen::Open(selection));
        }
        self.clamp_cursor();
    }

    fn set_all_kinds(&mut self, visible: bool) {
        let selection = Selection::kinds(self.kinds.iter().map(|(k, _)| k));
        if visible {
            self.state.set_open(SetOpen::Open(selection));
        } else {
            self.state.set_open(SetOpen::Close(selection));
        }
        self.clamp_cursor();
    }

    fn move_down(&mut self) {
        let max = self.rows().len();
        if self.cursor < max.saturating_sub(1) {
            self.cursor += 1;
        }
    }

    fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn clamp_cursor(&mut self) {
        let max = self.rows().len();
        self.cursor = self.cursor.min(max.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ctxview_core::parse_snapshot;

    const TRACE: &str = r#"{"uid": "r", "name": "root", "children": [
        {"uid": "q", "name": "ask", "kind": "query", "children": [
            {"uid": "o", "name": "look", "kind": "observation"}
        ]},
        {"uid": "s", "name": "step", "children": [
            {"uid": "s1", "name": "inner"}
        ]}
    ]}"#;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn make_app() -> App {
        let snapshot = parse_snapshot(TRACE).unwrap();
        App::new(PathBuf::from("/tmp/trace.json"), snapshot, ExpansionState::new())
    }

    fn visible(app: &App) -> Vec<String> {
        app.rows().iter().map(|v| v.node.uid.clone()).collect()
    }

    #[test]
    fn new_app_shows_only_root() {
        let app = make_app();
        assert_eq!(visible(&app), vec!["r"]);
        assert_eq!(app.cursor, 0);
        assert!(!app.should_quit);
        assert!(app.error.is_none());
        assert_eq!(app.kinds.len(), 2);
    }

    #[test]
    fn enter_toggles_selected() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(visible(&app), vec!["r", "s"]);
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(visible(&app), vec!["r"]);
    }

    #[test]
    fn number_keys_toggle_kinds() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(visible(&app), vec!["r", "q", "s"]);
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(visible(&app), vec!["r", "s"]);
        // Out of range is ignored.
        app.handle_key(key(KeyCode::Char('9')));
        assert_eq!(visible(&app), vec!["r", "s"]);
    }

    #[test]
    fn expand_and_collapse_subtree() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('e')));
        assert_eq!(visible(&app), vec!["r", "q", "o", "s", "s1"]);

        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(visible(&app), vec!["r", "q", "s"]);
        assert!(app.state.is_expanded("r"));

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(visible(&app), vec!["r", "s"]);
    }

    #[test]
    fn cursor_moves_within_rows() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.cursor, 1);
        assert_eq!(app.selected_uid().as_deref(), Some("s"));
        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn cursor_clamped_when_rows_disappear() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('e')));
        app.cursor = 4;
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.cursor, 2);
    }

    #[test]
    fn quit_on_q() {
        let mut app = make_app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn reload_missing_file_keeps_data() {
        let mut app = make_app();
        app.path = PathBuf::from("/nonexistent/ctxview/trace.json");
        app.reload();
        assert!(app.error.is_some());
        assert_eq!(app.snapshot.node_count(), 5);
    }

    #[test]
    fn reload_replaces_snapshot_and_keeps_state() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"uid": "r", "name": "root v2"}"#).unwrap();
        let mut app = make_app();
        app.path = file.path().to_path_buf();
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.error.is_none());
        assert_eq!(app.snapshot.roots()[0].name, "root v2");
        assert!(app.state.is_expanded("r"));
        assert_eq!(app.cursor, 0);
        assert!(app.kinds.is_empty());
    }
}
