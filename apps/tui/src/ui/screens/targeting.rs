use craft_pulse::api::models::{Audience, TargetingReport, TimingRecommendation};
use craft_pulse::domain::{AudienceKey, Segment, TimingSegment};
use craft_pulse::format;
use craft_pulse::view::ViewKey;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use super::{field_line, section_title};
use crate::app::App;
use crate::ui::widgets::charts::{render_empty, titled_block};
use crate::ui::widgets::palette::{
    delta_color, key_style, segment_color, segment_label, selected_style, timing_color,
    timing_label,
};
use crate::ui::widgets::tables::{header_row, row_style, scroll_offset};

pub fn render_targeting(app: &App, f: &mut Frame<'_>, area: Rect) {
    let Some(event) = app.selected_event() else {
        render_empty(f, area, "Targeting", "Select an event on the Events tab");
        return;
    };
    let Some(report) = app.current_targeting() else {
        let message = if app.is_loading(ViewKey::Targeting) {
            format!("Building audiences for {}...", event.event_name)
        } else {
            format!("No targeting data for {}. Press R to reload.", event.event_name)
        };
        render_empty(f, area, "Targeting", &message);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(area);

    render_summary(report, &event.event_name, f, rows[0]);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[1]);
    render_revenue_gap(report, f, cards[0]);
    render_repeat_buyers(report, f, cards[1]);
    render_quick_win(report, f, cards[2]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(rows[2]);
    render_audience_picker(app, report, f, middle[0]);

    match report.audience(app.view.audience) {
        Some(audience) => render_members(app, audience, f, middle[1]),
        None => render_empty(f, middle[1], app.view.audience.label(), "Audience not available"),
    }

    render_timing_recommendations(&report.timing_recommendations, f, rows[3]);
}

fn render_summary(report: &TargetingReport, fallback_name: &str, f: &mut Frame<'_>, area: Rect) {
    let name = report
        .event
        .as_ref()
        .and_then(|event| event.name.as_deref())
        .unwrap_or(fallback_name);
    let gray = Style::default().fg(Color::Gray);
    let white = Style::default().fg(Color::White);
    let line = TextLine::from(vec![
        Span::styled(format!("{name}  "), white.add_modifier(Modifier::BOLD)),
        Span::styled("Buyers ", gray),
        Span::styled(format::count(report.current_buyers), white),
        Span::styled("  Tickets ", gray),
        Span::styled(
            format!(
                "{} / {}",
                format::count(report.current_tickets),
                format::count(report.capacity)
            ),
            white,
        ),
        Span::styled("  Revenue ", gray),
        Span::styled(format::money(report.current_revenue), white),
        Span::styled("  Avg ticket ", gray),
        Span::styled(format::money_cents(report.avg_ticket_price), white),
        Span::styled("  ", gray),
        Span::styled(format::days_until(report.days_until), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(Paragraph::new(line).block(titled_block("Event")), area);
}

fn render_revenue_gap(report: &TargetingReport, f: &mut Frame<'_>, area: Rect) {
    let Some(gap) = report.revenue_gap.as_ref() else {
        render_empty(f, area, "Vs last year", "No prior edition");
        return;
    };
    let white = Style::default().fg(Color::White);
    // A positive gap means tickets still to sell to match last year.
    let behind = gap.tickets_gap.map(|t| if t > 0 { -1.0 } else { 1.0 });
    let lines = vec![
        field_line(
            "Last year",
            format!(
                "{} tickets ({})",
                format::count(gap.last_year_tickets),
                gap.last_year
                    .map_or_else(|| format::PLACEHOLDER.to_string(), |y| y.to_string())
            ),
            white,
        ),
        field_line("Revenue then", format::money(gap.last_year_revenue), white),
        field_line(
            "Progress",
            format::pct(gap.pct_of_last_year),
            Style::default().fg(delta_color(behind)),
        ),
        field_line(
            "Tickets gap",
            format::count(gap.tickets_gap),
            Style::default().fg(delta_color(behind)),
        ),
        field_line("Revenue gap", format::money(gap.revenue_gap), white),
        field_line("At avg price", format::money_cents(gap.avg_ticket_price), white),
    ];
    f.render_widget(Paragraph::new(Text::from(lines)).block(titled_block("Vs last year")), area);
}

fn render_repeat_buyers(report: &TargetingReport, f: &mut Frame<'_>, area: Rect) {
    let Some(repeat) = report.repeat_buyers.as_ref() else {
        render_empty(f, area, "Repeat buyers", "No history");
        return;
    };
    let white = Style::default().fg(Color::White);
    let lines = vec![
        field_line("Repeat buyers", format::count(repeat.count), white),
        field_line("Past buyers", format::count(repeat.total_past_buyers), white),
        field_line("Repeat rate", format::pct(repeat.rate), white),
        field_line("Last year buyers", format::count(repeat.last_year_buyers), white),
        field_line("Rebought", format::count(repeat.rebought_from_last_year), white),
        field_line("Rebuy rate", format::pct(repeat.last_year_rebuy_rate), white),
    ];
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(titled_block("Repeat buyers")),
        area,
    );
}

fn render_quick_win(report: &TargetingReport, f: &mut Frame<'_>, area: Rect) {
    let Some(win) = report.quick_win.as_ref() else {
        render_empty(f, area, "Quick win", "No suggestion");
        return;
    };
    let white = Style::default().fg(Color::White);
    let audience = win
        .audience
        .as_deref()
        .map_or_else(|| format::PLACEHOLDER.to_string(), format::humanize);
    let lines = vec![
        field_line("Audience", audience, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        field_line("Emails", format::count(win.emails_to_send), white),
        field_line("Expected tickets", format::count(win.expected_tickets), white),
        field_line("Expected revenue", format::money(win.expected_revenue), white),
        field_line(
            "Conversion used",
            format::pct(win.conversion_rate_used),
            white,
        ),
    ];
    f.render_widget(Paragraph::new(Text::from(lines)).block(titled_block("Quick win")), area);
}

fn render_audience_picker(app: &App, report: &TargetingReport, f: &mut Frame<'_>, area: Rect) {
    let mut lines: Vec<TextLine<'_>> = AudienceKey::ALL
        .iter()
        .map(|key| {
            let audience = report.audience(*key);
            let label = audience
                .and_then(|a| a.label.clone())
                .unwrap_or_else(|| key.label().to_string());
            let count = format::count(audience.and_then(|a| a.count));
            let style = if *key == app.view.audience {
                selected_style()
            } else {
                Style::default().fg(Color::White)
            };
            TextLine::from(Span::styled(format!(" {label:<22}{count:>8} "), style))
        })
        .collect();

    if let Some(audience) = report.audience(app.view.audience) {
        if let Some(description) = audience.description.as_deref() {
            lines.push(TextLine::from(""));
            lines.push(TextLine::from(Span::styled(
                description.to_string(),
                Style::default().fg(Color::Gray),
            )));
        }
        lines.push(TextLine::from(""));
        lines.push(field_line(
            "Historical value",
            format::money(audience.historical_value),
            Style::default().fg(Color::White),
        ));
        lines.extend(breakdown_lines(audience));
    }
    lines.push(TextLine::from(""));
    lines.push(TextLine::from(vec![
        Span::styled("a", key_style()),
        Span::raw(" next audience  "),
        Span::styled("e", key_style()),
        Span::raw(" export"),
    ]));

    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(titled_block("Audiences"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn breakdown_lines(audience: &Audience) -> Vec<TextLine<'static>> {
    let mut lines = Vec::new();
    if !audience.segment_breakdown.is_empty() {
        lines.push(TextLine::from(""));
        lines.push(section_title("By segment"));
        for (key, count) in &audience.segment_breakdown {
            lines.push(TextLine::from(vec![
                Span::styled(
                    format!(" {:<14}", segment_label(key)),
                    Style::default().fg(segment_color(Segment::parse(key))),
                ),
                Span::raw(format!("{:>7}", format::group_digits(*count))),
            ]));
        }
    }
    if !audience.timing_breakdown.is_empty() {
        lines.push(TextLine::from(""));
        lines.push(section_title("By timing"));
        for (key, bucket) in &audience.timing_breakdown {
            let mut spans = vec![
                Span::styled(
                    format!(" {:<16}", timing_label(key)),
                    Style::default().fg(timing_color(TimingSegment::parse(key))),
                ),
                Span::raw(format!("{:>7}", format::count(bucket.count))),
            ];
            if bucket.overdue {
                spans.push(Span::styled(" overdue", Style::default().fg(Color::Red)));
            }
            lines.push(TextLine::from(spans));
        }
    }
    lines
}

fn render_members(app: &App, audience: &Audience, f: &mut Frame<'_>, area: Rect) {
    let title = format!(
        "{} ({} shown of {})",
        audience
            .label
            .as_deref()
            .unwrap_or_else(|| app.view.audience.label()),
        audience.customers.len(),
        format::count(audience.total_available.or(audience.count))
    );
    if audience.customers.is_empty() {
        render_empty(f, area, &title, "Nobody in this audience");
        return;
    }

    let max_visible_rows = area.height.saturating_sub(3) as usize;
    let offset = scroll_offset(audience.customers.len(), max_visible_rows, app.view.audience_cursor);
    let rows = audience
        .customers
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_visible_rows)
        .map(|(index, customer)| {
            let segment = customer.rfm_segment.as_deref();
            let timing = customer.timing_segment.as_deref();
            Row::new(vec![
                Cell::from(customer.email.clone()),
                Cell::from(segment.map_or_else(|| format::PLACEHOLDER.to_string(), segment_label))
                    .style(Style::default().fg(segment_color(customer.segment()))),
                Cell::from(timing.map_or_else(|| format::PLACEHOLDER.to_string(), timing_label))
                    .style(Style::default().fg(timing_color(customer.timing()))),
                Cell::from(format::money(customer.total_spent)),
                Cell::from(format::count(customer.total_events)),
                Cell::from(format::days_ago(customer.days_since_last)),
            ])
            .style(row_style(index == app.view.audience_cursor, Style::default()))
        });

    let table = Table::new(
        rows,
        [
            Constraint::Min(22),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Length(9),
        ],
    )
    .header(header_row(["Email", "Segment", "Timing", "Spent", "Events", "Last"]))
    .block(titled_block(&title))
    .column_spacing(1);
    f.render_widget(table, area);
}

/// Colour for a recommendation's urgency word.
pub fn recommendation_color(urgency: Option<&str>) -> Color {
    match urgency.map(str::to_lowercase).as_deref() {
        Some("critical" | "now") => Color::Red,
        Some("soon") => Color::Yellow,
        Some(_) => Color::Green,
        None => Color::Gray,
    }
}

fn render_timing_recommendations(recs: &[TimingRecommendation], f: &mut Frame<'_>, area: Rect) {
    if recs.is_empty() {
        render_empty(f, area, "When to send", "No timing recommendations");
        return;
    }

    let rows = recs.iter().take(9).enumerate().map(|(index, rec)| {
        let segments = rec
            .timing_segments
            .iter()
            .map(|segment| timing_label(segment))
            .collect::<Vec<_>>()
            .join(", ");
        let urgency = rec.urgency.as_deref();
        Row::new(vec![
            Cell::from(format!("{}", index + 1)).style(key_style()),
            Cell::from(format::text(urgency).to_uppercase())
                .style(Style::default().fg(recommendation_color(urgency))),
            Cell::from(format::text(rec.action.as_deref()).to_string()),
            Cell::from(format::count(rec.count)),
            Cell::from(segments),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(10),
            Constraint::Min(24),
            Constraint::Length(7),
            Constraint::Length(30),
        ],
    )
    .header(header_row(["#", "Urgency", "Action", "People", "Segments"]))
    .block(titled_block("When to send (1-9 exports, w exports all)"))
    .column_spacing(1);
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_pulse::api::models::TimingBucket;
    use std::collections::BTreeMap;

    #[test]
    fn recommendation_urgency_colors() {
        assert_eq!(recommendation_color(Some("NOW")), Color::Red);
        assert_eq!(recommendation_color(Some("critical")), Color::Red);
        assert_eq!(recommendation_color(Some("soon")), Color::Yellow);
        assert_eq!(recommendation_color(Some("later")), Color::Green);
        assert_eq!(recommendation_color(None), Color::Gray);
    }

    #[test]
    fn breakdowns_flag_overdue_timing_buckets() {
        let audience = Audience {
            segment_breakdown: BTreeMap::from([("champion".to_string(), 1200)]),
            timing_breakdown: BTreeMap::from([(
                "last_minute".to_string(),
                TimingBucket {
                    count: Some(4),
                    overdue: true,
                },
            )]),
            ..Audience::default()
        };
        let rendered: Vec<String> = breakdown_lines(&audience)
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect();
        assert!(rendered.iter().any(|line| line.contains("Champion") && line.contains("1,200")));
        assert!(rendered.iter().any(|line| line.contains("Last minute") && line.ends_with("overdue")));
    }
}
