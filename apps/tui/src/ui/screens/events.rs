use craft_pulse::api::models::{EventPacing, HistoricalComparison};
use craft_pulse::format;
use craft_pulse::view::ViewKey;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use super::{field_line, section_title};
use crate::app::App;
use crate::ui::widgets::charts::{render_empty, render_pct_gauge, titled_block};
use crate::ui::widgets::palette::{decision_badge, delta_color, key_style, urgency_color, ACCENT};
use crate::ui::widgets::tables::{header_row, row_style, scroll_offset};

pub fn render_events(app: &App, f: &mut Frame<'_>, area: Rect) {
    let events = app.events();
    if events.is_empty() {
        let message = if app.is_loading(ViewKey::Dashboard) {
            "Loading events..."
        } else {
            "No events"
        };
        render_empty(f, area, "Events", message);
        return;
    }

    let visible = app.view.event_filter.apply(events);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(area);

    render_event_list(app, &visible, f, columns[0]);

    let highlighted = visible
        .get(app.view.event_cursor)
        .and_then(|index| events.get(*index));
    match highlighted {
        Some(event) => render_event_detail(event, f, columns[1]),
        None => render_empty(f, columns[1], "Event", "No event matches the filter"),
    }
}

fn render_event_list(app: &App, visible: &[usize], f: &mut Frame<'_>, area: Rect) {
    let events = app.events();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(area);

    let filter = &app.view.event_filter;
    let cursor = if filter.editing && app.animation_counter.sin() > 0.0 {
        "▌"
    } else {
        " "
    };
    let filter_line = if filter.query.is_empty() && !filter.editing {
        TextLine::from(vec![
            Span::styled("/", key_style()),
            Span::styled(" to filter by name", Style::default().fg(Color::Gray)),
        ])
    } else {
        TextLine::from(vec![
            Span::styled("Filter: ", Style::default().fg(Color::Gray)),
            Span::styled(filter.query.as_str(), Style::default().fg(Color::White)),
            Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ])
    };
    f.render_widget(Paragraph::new(filter_line).block(titled_block("Search")), chunks[0]);

    let max_visible_rows = chunks[1].height.saturating_sub(3) as usize;
    let offset = scroll_offset(visible.len(), max_visible_rows, app.view.event_cursor);
    let selected_id = app.view.selected_event.as_deref();

    let rows = visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_visible_rows)
        .filter_map(|(position, index)| events.get(*index).map(|event| (position, event)))
        .map(|(position, event)| {
            let (color, label) = decision_badge(event.decision.as_deref());
            let marker = if selected_id == Some(event.event_id.as_str()) { "●" } else { " " };
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(ACCENT)),
                Cell::from(event.event_name.clone()),
                Cell::from(format::date(event.event_date.as_deref())),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(format::pct(event.sell_through)),
            ])
            .style(row_style(position == app.view.event_cursor, Style::default()))
        });

    let title = format!("Events ({} of {})", visible.len(), events.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Min(14),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(7),
        ],
    )
    .header(header_row(["", "Event", "Date", "Decision", "Sold"]))
    .block(titled_block(&title))
    .column_spacing(1);
    f.render_widget(table, chunks[1]);
}

fn render_event_detail(event: &EventPacing, f: &mut Frame<'_>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(8),
        ])
        .split(area);

    let (color, label) = decision_badge(event.decision.as_deref());
    let summary = event.decision().map_or("", |decision| decision.summary());
    let white = Style::default().fg(Color::White);
    let lines = vec![
        TextLine::from(vec![
            Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(summary, Style::default().fg(color)),
        ]),
        TextLine::from(vec![
            Span::styled("Urgency ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/10", format::count(event.urgency)),
                Style::default().fg(urgency_color(event.urgency)),
            ),
            Span::styled("   Date ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} ({})",
                    format::date(event.event_date.as_deref()),
                    format::days_until(event.days_until)
                ),
                white,
            ),
        ]),
        field_line(
            "Tickets",
            format!(
                "{} / {}",
                format::count(event.tickets_sold),
                format::count(event.capacity)
            ),
            white,
        ),
        field_line(
            "Revenue / spend",
            format!(
                "{} / {}   CAC {}",
                format::money(event.revenue),
                format::money(event.ad_spend),
                format::money_cents(event.cac)
            ),
            white,
        ),
        field_line(
            "Projection",
            format!(
                "{} final ({}), confidence {}",
                format::count(event.projected_final),
                projected_range(event.projected_range),
                format::pct(event.confidence.map(|c| c * 100.0))
            ),
            white,
        ),
        field_line(
            "Pace vs history",
            format::signed_pct(event.pace_vs_historical),
            Style::default().fg(delta_color(event.pace_vs_historical)),
        ),
        field_line(
            "Targets",
            format!(
                "{} high value, {} reactivation",
                format::count(event.high_value_targets),
                format::count(event.reactivation_targets)
            ),
            white,
        ),
    ];
    let header = Paragraph::new(Text::from(lines))
        .block(titled_block(&event.event_name))
        .wrap(Wrap { trim: true });
    f.render_widget(header, chunks[0]);

    render_pct_gauge(f, chunks[1], "Sell-through", event.sell_through, color);
    render_comparisons(event, f, chunks[2]);
    render_rationale(event, f, chunks[3]);
}

fn projected_range(range: Option<(f64, f64)>) -> String {
    #[allow(clippy::cast_possible_truncation)]
    range.map_or_else(
        || format::PLACEHOLDER.to_string(),
        |(low, high)| {
            format!(
                "{}-{}",
                format::group_digits(low.round() as i64),
                format::group_digits(high.round() as i64)
            )
        },
    )
}

/// Current tickets against what a past edition had sold at the same
/// distance from its date.
#[allow(clippy::cast_precision_loss)]
pub fn comparison_delta(event: &EventPacing, comparison: &HistoricalComparison) -> Option<f64> {
    let then = comparison.at_days_out.as_ref()?.tickets?;
    format::yoy_delta(event.tickets_sold.map(|t| t as f64), Some(then as f64))
}

fn render_comparisons(event: &EventPacing, f: &mut Frame<'_>, area: Rect) {
    if event.historical_comparisons.is_empty() {
        render_empty(f, area, "History", "No comparable past editions");
        return;
    }

    let rows = event.historical_comparisons.iter().map(|comparison| {
        let at = comparison.at_days_out.as_ref();
        let delta = comparison_delta(event, comparison);
        Row::new(vec![
            Cell::from(
                comparison
                    .year
                    .map_or_else(|| format::PLACEHOLDER.to_string(), |y| y.to_string()),
            ),
            Cell::from(format::text(comparison.event_name.as_deref()).to_string()),
            Cell::from(format::count(at.and_then(|a| a.tickets))),
            Cell::from(format::signed_pct(delta)).style(Style::default().fg(delta_color(delta))),
            Cell::from(format::count(comparison.final_tickets)),
            Cell::from(format::pct(comparison.final_sell_through)),
            Cell::from(format::money(comparison.final_revenue)),
        ])
    });

    let days = event
        .historical_comparisons
        .iter()
        .find_map(|c| c.at_days_out.as_ref().and_then(|a| a.days));
    let at_title = days.map_or_else(|| "Then".to_string(), |d| format!("@{d}d"));

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(10),
        ],
    )
    .header(header_row(vec![
        "Year".to_string(),
        "Edition".to_string(),
        at_title,
        "YoY".to_string(),
        "Final".to_string(),
        "Sold".to_string(),
        "Revenue".to_string(),
    ]))
    .block(titled_block("History"))
    .column_spacing(1);
    f.render_widget(table, area);
}

fn render_rationale(event: &EventPacing, f: &mut Frame<'_>, area: Rect) {
    let mut lines = vec![TextLine::from(Span::styled(
        format::text(event.rationale.as_deref()).to_string(),
        Style::default().fg(Color::White),
    ))];
    if !event.actions.is_empty() {
        lines.push(TextLine::from(""));
        lines.push(section_title("Actions"));
        lines.extend(event.actions.iter().map(|action| {
            TextLine::from(vec![
                Span::styled("• ", Style::default().fg(ACCENT)),
                Span::raw(action.clone()),
            ])
        }));
    }
    let paragraph = Paragraph::new(Text::from(lines))
        .block(titled_block("Rationale"))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_pulse::api::models::AtDaysOut;

    #[test]
    fn comparison_delta_needs_a_positive_baseline() {
        let event = EventPacing {
            tickets_sold: Some(150),
            ..EventPacing::default()
        };
        let at = |tickets| HistoricalComparison {
            at_days_out: Some(AtDaysOut {
                tickets: Some(tickets),
                ..AtDaysOut::default()
            }),
            ..HistoricalComparison::default()
        };
        assert_eq!(comparison_delta(&event, &at(100)), Some(50.0));
        assert_eq!(comparison_delta(&event, &at(0)), None);
        assert_eq!(comparison_delta(&event, &HistoricalComparison::default()), None);
    }

    #[test]
    fn projected_range_rounds_bounds() {
        assert_eq!(projected_range(Some((799.6, 1250.2))), "800-1,250");
        assert_eq!(projected_range(None), format::PLACEHOLDER);
    }
}
