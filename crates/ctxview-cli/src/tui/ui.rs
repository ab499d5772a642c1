use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use ctxview_core::{ContextNode, NodeState};

use super::app::App;
use crate::render::{self, Row};

/// Render the full TUI frame.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // tree
            Constraint::Length(1), // kind filter bar
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    render_tree(f, app, chunks[0]);
    render_kinds(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);
}

fn render_tree(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.rows();
    let title = format!(
        " {} ({}/{} visible) ",
        app.path.display(),
        rows.len(),
        app.snapshot.node_count()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if rows.is_empty() {
        let msg = Paragraph::new("Empty trace")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(msg, area);
        return;
    }

    // Keep the cursor row on screen.
    let height = area.height.saturating_sub(2) as usize;
    let max_payload = area.width.saturating_sub(12) as usize;
    let mut items: Vec<ListItem> = Vec::new();
    let mut cursor_line = 0;
    let mut node_index = 0;
    for row in render::layout(rows, app.show_payloads) {
        match row {
            Row::Node(visit) => {
                let mut style = node_style(visit.node);
                if node_index == app.cursor {
                    cursor_line = items.len();
                    style = style.add_modifier(Modifier::REVERSED);
                }
                node_index += 1;
                let header = format!("{}{}", "  ".repeat(visit.depth), render::header_line(&visit));
                items.push(ListItem::new(Line::from(Span::styled(header, style))));
            }
            Row::Payload { depth, slot } => {
                let line = format!(
                    "{}    {}",
                    "  ".repeat(depth),
                    render::payload_line(&slot, max_payload)
                );
                items.push(ListItem::new(Line::from(Span::styled(
                    line,
                    Style::default().fg(Color::DarkGray),
                ))));
            }
        }
    }

    let offset = cursor_line.saturating_sub(height.saturating_sub(1));
    let items: Vec<ListItem> = items.into_iter().skip(offset).collect();
    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn render_kinds(f: &mut Frame, app: &App, area: Rect) {
    if app.kinds.is_empty() {
        let line = Paragraph::new(" kinds: (none)").style(Style::default().fg(Color::DarkGray));
        f.render_widget(line, area);
        return;
    }
    let mut spans = vec![Span::raw(" kinds: ")];
    for (i, (kind, count)) in app.kinds.iter().enumerate() {
        let visible = app.state.is_kind_visible(kind);
        let style = if visible {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let label = if i < 9 {
            format!("[{}] {kind} ({count})  ", i + 1)
        } else {
            format!("{kind} ({count})  ")
        };
        spans.push(Span::styled(label, style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match &app.error {
        Some(err) => Span::styled(
            format!(" error: {}", render::truncate_str(err, 80)),
            Style::default().fg(Color::Red),
        ),
        None => Span::styled(
            " j/k move  enter toggle  e/c expand/collapse all  1-9 kind  a/n all/no kinds  p payloads  r reload  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(Paragraph::new(Line::from(text)), area);
}

/// Lifecycle color first, then the node's own `meta.color` hint.
fn node_style(node: &ContextNode) -> Style {
    match node.state {
        Some(NodeState::Failed) => return Style::default().fg(Color::Red),
        Some(NodeState::Running) => return Style::default().fg(Color::Yellow),
        Some(NodeState::Event) => return Style::default().fg(Color::Cyan),
        None => {}
    }
    node.meta
        .as_ref()
        .and_then(|m| m.color.as_deref())
        .and_then(parse_hex_color)
        .map(|c| Style::default().fg(c))
        .unwrap_or_default()
}

/// `#rrggbb` or `#rrggbbaa` (alpha ignored).
fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}
