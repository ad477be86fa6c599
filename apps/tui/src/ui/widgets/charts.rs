use craft_pulse::format;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line as TextLine;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

use super::palette::ACCENT;

pub fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
}

pub fn render_empty(f: &mut Frame<'_>, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(message)
        .block(titled_block(title))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

/// One bar per `(label, value, colour)`; value labels abbreviate from
/// one thousand up.
pub fn render_bar_chart(f: &mut Frame<'_>, area: Rect, title: &str, data: &[(String, u64, Color)]) {
    if data.is_empty() {
        render_empty(f, area, title, "No data");
        return;
    }

    let bars: Vec<Bar<'_>> = data
        .iter()
        .map(|(label, value, color)| {
            Bar::default()
                .value(*value)
                .text_value(format::abbreviate(*value as f64))
                .label(TextLine::from(label.as_str()))
                .style(Style::default().fg(*color))
                .value_style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(*color)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let max_value = data.iter().map(|(_, value, _)| *value).max().unwrap_or(0).max(1);
    let inner_width = area.width.saturating_sub(2);
    let count = u16::try_from(data.len()).unwrap_or(u16::MAX).max(1);
    let bar_width = (inner_width / count).saturating_sub(1).clamp(3, 12);

    let chart = BarChart::default()
        .block(titled_block(title))
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(1)
        .bar_width(bar_width);

    f.render_widget(chart, area);
}

/// Percentage gauge; the fill is clamped to `[0, 100]` while the label
/// shows the real value.
pub fn render_pct_gauge(f: &mut Frame<'_>, area: Rect, title: &str, pct: Option<f64>, color: Color) {
    let gauge = Gauge::default()
        .block(titled_block(title))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(format::clamp_pct(pct) / 100.0)
        .label(format::pct(pct));
    f.render_widget(gauge, area);
}

/// Saturating conversion for bar values.
#[allow(clippy::cast_sign_loss)]
pub fn bar_value(value: Option<i64>) -> u64 {
    value.map_or(0, |v| v.max(0) as u64)
}
