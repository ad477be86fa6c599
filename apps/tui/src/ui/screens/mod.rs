pub mod customers;
pub mod events;
pub mod help;
pub mod intelligence;
pub mod overlap;
pub mod overview;
pub mod targeting;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line as TextLine, Span};

use super::widgets::palette::label_style;

/// `label: value` line used by every detail panel.
pub fn field_line<'a>(label: &'a str, value: impl Into<String>, style: Style) -> TextLine<'a> {
    TextLine::from(vec![
        Span::styled(format!("{label}: "), label_style()),
        Span::styled(value.into(), style),
    ])
}

pub fn section_title(title: &str) -> TextLine<'_> {
    TextLine::from(Span::styled(
        title,
        Style::default()
            .fg(ratatui::style::Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}
