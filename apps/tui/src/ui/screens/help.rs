use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use super::section_title;
use crate::ui::widgets::palette::key_style;
use crate::ui::widgets::popup::open_popup;

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("Tab / →", "Next tab"),
    ("Shift+Tab / ←", "Previous tab"),
    ("r", "Start a data sync"),
    ("R", "Reload the dashboard and current tab"),
    ("? / F1", "Toggle this help"),
    ("q", "Quit"),
];

const SCREEN_KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Overview",
        &[("Enter", "Go to events"), ("c", "Go to customers"), ("o", "Go to overlap")],
    ),
    (
        "Events",
        &[
            ("↑/↓ PgUp/PgDn", "Move"),
            ("Enter", "Select event"),
            ("t / i", "Select and open targeting / intelligence"),
            ("/", "Filter by name, Esc clears"),
        ],
    ),
    (
        "Customers",
        &[
            ("/", "Search, Enter applies"),
            ("g / c / t", "Cycle segment / city / type filter"),
            ("x", "Clear filters"),
            ("1-6", "Sort by column, again to flip"),
            ("[ ] or p n", "Previous / next page"),
            ("Enter", "Customer detail"),
        ],
    ),
    (
        "Targeting",
        &[
            ("a", "Next audience"),
            ("[ ]", "Previous / next event"),
            ("e", "Export audience CSV"),
            ("w", "Export all timing segments"),
            ("1-9", "Export a timing recommendation"),
        ],
    ),
    (
        "Intelligence",
        &[
            ("↑/↓", "Move between sections"),
            ("Enter / Space", "Expand or collapse"),
            ("[ ]", "Previous / next event"),
            ("e / u", "Export section / urgent churn"),
        ],
    ),
    (
        "Overlap",
        &[
            ("m", "Matrix, pairs, network, retention"),
            ("c", "Next city"),
            ("↑/↓ h/l", "Move in the matrix"),
            ("Enter", "Export matrix cell"),
            ("o / a / b", "Export both / only A / only B"),
        ],
    ),
];

fn key_lines(keys: &[(&'static str, &'static str)]) -> Vec<TextLine<'static>> {
    keys.iter()
        .map(|(key, action)| {
            TextLine::from(vec![
                Span::styled(format!("  {key:<16}"), key_style()),
                Span::styled(*action, Style::default().fg(Color::White)),
            ])
        })
        .collect()
}

pub fn render_help(f: &mut Frame<'_>) {
    let area = f.area();
    let inner = open_popup(f, area, (84, 84), "Help");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let mut left = vec![section_title("Everywhere")];
    left.extend(key_lines(GLOBAL_KEYS));
    let mut right = Vec::new();

    for (index, (screen, keys)) in SCREEN_KEYS.iter().enumerate() {
        let column = if index < 2 { &mut left } else { &mut right };
        if !column.is_empty() {
            column.push(TextLine::from(""));
        }
        column.push(section_title(screen));
        column.extend(key_lines(keys));
    }
    left.push(TextLine::from(""));
    left.push(TextLine::from(Span::styled(
        "Esc closes this help",
        Style::default().fg(Color::Gray),
    )));

    f.render_widget(Paragraph::new(Text::from(left)).wrap(Wrap { trim: false }), columns[0]);
    f.render_widget(Paragraph::new(Text::from(right)).wrap(Wrap { trim: false }), columns[1]);
}
