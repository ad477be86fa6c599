use craft_pulse::api::models::{DashboardSnapshot, EventPacing, Portfolio};
use craft_pulse::domain::{Decision, Segment};
use craft_pulse::format;
use craft_pulse::view::ViewKey;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app::App;
use crate::ui::widgets::charts::{
    bar_value, render_bar_chart, render_empty, render_pct_gauge, titled_block,
};
use crate::ui::widgets::palette::{decision_badge, decision_color, segment_color, segment_label, urgency_color};
use crate::ui::widgets::tables::header_row;

const URGENT_LIMIT: usize = 8;

pub fn render_overview(app: &App, f: &mut Frame<'_>, area: Rect) {
    let Some(snapshot) = app.snapshot.as_deref() else {
        let message = if app.is_loading(ViewKey::Dashboard) {
            "Loading dashboard..."
        } else {
            "No dashboard data. Press R to reload."
        };
        render_empty(f, area, "Overview", message);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(8),
        ])
        .split(area);

    render_cards(&snapshot.portfolio, f, rows[0]);
    render_pct_gauge(
        f,
        rows[1],
        "Portfolio sell-through",
        portfolio_sell_through(&snapshot.portfolio),
        Color::Green,
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(rows[2]);

    let decisions: Vec<(String, u64, Color)> = Decision::ALL
        .iter()
        .map(|decision| {
            (
                decision.label().to_string(),
                bar_value(Some(snapshot.decision_count(*decision))),
                decision_color(Some(*decision)),
            )
        })
        .collect();
    render_bar_chart(f, columns[0], "Decisions", &decisions);

    let segments: Vec<(String, u64, Color)> = snapshot
        .customers
        .segments
        .iter()
        .map(|(key, count)| {
            (
                segment_label(key),
                bar_value(Some(*count)),
                segment_color(Segment::parse(key)),
            )
        })
        .collect();
    let title = format!("Customers ({})", format::count(snapshot.customers.total));
    render_bar_chart(f, columns[1], &title, &segments);

    render_urgent_events(snapshot, f, columns[2]);
}

/// Tickets over capacity as a percentage; undefined without capacity.
#[allow(clippy::cast_precision_loss)]
pub fn portfolio_sell_through(portfolio: &Portfolio) -> Option<f64> {
    match (portfolio.total_tickets, portfolio.total_capacity) {
        (Some(tickets), Some(capacity)) if capacity > 0 => {
            Some(tickets as f64 / capacity as f64 * 100.0)
        }
        _ => None,
    }
}

fn render_cards(portfolio: &Portfolio, f: &mut Frame<'_>, area: Rect) {
    let cards = [
        ("Events", format::count(portfolio.event_count)),
        (
            "Tickets",
            format!(
                "{} / {}",
                format::count(portfolio.total_tickets),
                format::count(portfolio.total_capacity)
            ),
        ),
        ("Revenue", format::money(portfolio.total_revenue)),
        ("Ad spend", format::money(portfolio.total_spend)),
        ("CAC", format::money_cents(portfolio.portfolio_cac)),
    ];

    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(area);

    for ((label, value), slot) in cards.into_iter().zip(slots.iter()) {
        let text = Text::from(vec![TextLine::from(Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))]);
        f.render_widget(Paragraph::new(text).block(titled_block(label)), *slot);
    }
}

/// Events that need action, most urgent first.
pub fn urgent_events(events: &[EventPacing]) -> Vec<&EventPacing> {
    let mut urgent: Vec<&EventPacing> = events
        .iter()
        .filter(|event| matches!(event.decision(), Some(Decision::Pivot | Decision::Push)))
        .collect();
    urgent.sort_by(|a, b| b.urgency.unwrap_or(0).cmp(&a.urgency.unwrap_or(0)));
    urgent.truncate(URGENT_LIMIT);
    urgent
}

fn render_urgent_events(snapshot: &DashboardSnapshot, f: &mut Frame<'_>, area: Rect) {
    let urgent = urgent_events(&snapshot.events);
    if urgent.is_empty() {
        render_empty(f, area, "Needs attention", "Every event is on pace");
        return;
    }

    let rows = urgent.iter().map(|event| {
        let (color, label) = decision_badge(event.decision.as_deref());
        Row::new(vec![
            Cell::from(event.event_name.clone()),
            Cell::from(format::days_until(event.days_until)),
            Cell::from(label).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Cell::from(format::count(event.urgency))
                .style(Style::default().fg(urgency_color(event.urgency))),
            Cell::from(format::pct(event.sell_through)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(8),
        ],
    )
    .header(header_row(["Event", "When", "Decision", "Urgency", "Sold"]))
    .block(titled_block("Needs attention"))
    .column_spacing(1);
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, decision: &str, urgency: i64) -> EventPacing {
        EventPacing {
            event_id: id.to_string(),
            decision: Some(decision.to_string()),
            urgency: Some(urgency),
            ..EventPacing::default()
        }
    }

    #[test]
    fn sell_through_needs_capacity() {
        let mut portfolio = Portfolio {
            total_tickets: Some(50),
            total_capacity: Some(200),
            ..Portfolio::default()
        };
        assert_eq!(portfolio_sell_through(&portfolio), Some(25.0));
        portfolio.total_capacity = Some(0);
        assert_eq!(portfolio_sell_through(&portfolio), None);
    }

    #[test]
    fn urgent_events_skip_healthy_ones_and_sort_by_urgency() {
        let events = vec![
            event("a", "coast", 10),
            event("b", "push", 4),
            event("c", "pivot", 9),
            event("d", "maintain", 7),
        ];
        let ids: Vec<&str> = urgent_events(&events)
            .iter()
            .map(|event| event.event_id.as_str())
            .collect();
        assert_eq!(ids, ["c", "b"]);
    }
}
