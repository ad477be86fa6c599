use craft_pulse::api::models::{CrossSell, IntelligenceReport, RevenueProjection, Velocity};
use craft_pulse::format;
use craft_pulse::view::{IntelSection, ViewKey};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use serde_json::Value;

use super::field_line;
use crate::app::input::section_export;
use crate::app::App;
use crate::ui::widgets::charts::{render_empty, titled_block};
use crate::ui::widgets::palette::{key_style, label_style, selected_style, ACCENT};

/// Rows shown for each list inside a generic section.
const LIST_PREVIEW: usize = 8;

pub fn render_intelligence(app: &App, f: &mut Frame<'_>, area: Rect) {
    let Some(event) = app.selected_event() else {
        render_empty(f, area, "Intelligence", "Select an event on the Events tab");
        return;
    };
    let Some(report) = app.current_intelligence() else {
        let message = if app.is_loading(ViewKey::Intelligence) {
            format!("Analysing {}...", event.event_name)
        } else {
            format!("No intelligence for {}. Press R to reload.", event.event_name)
        };
        render_empty(f, area, "Intelligence", &message);
        return;
    };

    let mut lines = Vec::new();
    let mut cursor_line = 0;
    for (index, section) in IntelSection::ALL.iter().enumerate() {
        let open = app.view.intel_sections.is_open(*section);
        let selected = index == app.view.intel_cursor;
        if selected {
            cursor_line = lines.len();
        }
        lines.push(section_header(*section, open, selected));
        if open {
            let body = section_body(report, *section);
            if body.is_empty() {
                lines.push(TextLine::from(Span::styled("    No data", label_style())));
            } else {
                lines.extend(body);
            }
            lines.push(TextLine::from(""));
        }
    }

    let title = format!(
        "{} · {}",
        report
            .event
            .as_ref()
            .and_then(|e| e.name.as_deref())
            .unwrap_or(&event.event_name),
        format::days_until(report.days_until.or(event.days_until))
    );
    let height = area.height.saturating_sub(2) as usize;
    let scroll = u16::try_from(body_scroll(cursor_line, height)).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(titled_block(&title))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

/// Scroll so the highlighted header sits in the top half once the
/// content no longer fits.
pub const fn body_scroll(cursor_line: usize, height: usize) -> usize {
    let anchor = height / 2;
    if cursor_line < anchor {
        0
    } else {
        cursor_line - anchor
    }
}

fn section_header(section: IntelSection, open: bool, selected: bool) -> TextLine<'static> {
    let arrow = if open { "▼" } else { "▶" };
    let style = if selected {
        selected_style()
    } else {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    };
    let mut spans = vec![Span::styled(format!("{arrow} {}", section.title()), style)];
    if selected && section_export(section).is_some() {
        spans.push(Span::styled("  e", key_style()));
        spans.push(Span::styled(" export", label_style()));
        if section == IntelSection::ChurnPrediction {
            spans.push(Span::styled("  u", key_style()));
            spans.push(Span::styled(" export urgent", label_style()));
        }
    }
    TextLine::from(spans)
}

fn section_body(report: &IntelligenceReport, section: IntelSection) -> Vec<TextLine<'static>> {
    let raw = match section {
        IntelSection::Velocity => return report.velocity.as_ref().map(velocity_lines).unwrap_or_default(),
        IntelSection::RevenueProjection => {
            return report
                .revenue_projection
                .as_ref()
                .map(projection_lines)
                .unwrap_or_default();
        }
        IntelSection::CrossSell => return report.cross_sell.as_ref().map(cross_sell_lines).unwrap_or_default(),
        IntelSection::PurchaseTiming => report.purchase_timing.as_ref(),
        IntelSection::PromoIntelligence => report.promo_intelligence.as_ref(),
        IntelSection::SuperSpreaders => report.super_spreaders.as_ref(),
        IntelSection::TicketTiers => report.ticket_tiers.as_ref(),
        IntelSection::ChurnPrediction => report.churn_prediction.as_ref(),
        IntelSection::Vips => report.vips.as_ref(),
        IntelSection::Competitors => report.competitors.as_ref(),
        IntelSection::Cannibalization => report.cannibalization.as_ref(),
    };
    raw.map(|value| {
        json_lines(value)
            .into_iter()
            .map(JsonLine::into_text)
            .collect()
    })
    .unwrap_or_default()
}

fn indent(line: TextLine<'static>) -> TextLine<'static> {
    let mut spans = vec![Span::raw("    ")];
    spans.extend(line.spans);
    TextLine::from(spans)
}

fn velocity_lines(velocity: &Velocity) -> Vec<TextLine<'static>> {
    let white = Style::default().fg(Color::White);
    let unit = velocity.velocity_unit.as_deref().unwrap_or("tickets/day");
    let outcome = match velocity.will_sell_out {
        Some(true) => ("Will sell out at this pace".to_string(), Color::Green),
        Some(false) => (
            format!("{} unsold at this pace", format::count(velocity.projected_unsold)),
            Color::Red,
        ),
        None => (format::PLACEHOLDER.to_string(), Color::Gray),
    };
    let mut lines = vec![
        field_line("Current pace", format!("{} {unit}", format::decimal(velocity.current_velocity, 1)), white),
        field_line("Tickets remaining", format::count(velocity.tickets_remaining), white),
        field_line(
            "Days to sell out",
            format::decimal(velocity.days_at_current_pace, 0),
            white,
        ),
        field_line("Outlook", outcome.0, Style::default().fg(outcome.1).add_modifier(Modifier::BOLD)),
    ];
    if !velocity.gap_closing_plan.is_empty() {
        lines.push(field_line(
            "Gap-closing plan",
            format!("{} recoverable", format::count(velocity.total_recoverable)),
            white,
        ));
        let mut plan: Vec<_> = velocity.gap_closing_plan.iter().collect();
        plan.sort_by_key(|step| step.priority.unwrap_or(i64::MAX));
        for step in plan {
            lines.push(TextLine::from(vec![
                Span::styled("  • ", Style::default().fg(ACCENT)),
                Span::raw(format::text(step.action.as_deref()).to_string()),
                Span::styled(
                    format!(
                        "  ({}, ~{} tickets)",
                        step.audience
                            .as_deref()
                            .map_or_else(|| format::PLACEHOLDER.to_string(), format::humanize),
                        format::count(step.expected_tickets)
                    ),
                    label_style(),
                ),
            ]));
        }
    }
    lines.into_iter().map(indent).collect()
}

fn money_range(range: Option<(f64, f64)>) -> String {
    range.map_or_else(
        || format::PLACEHOLDER.to_string(),
        |(low, high)| format!("{} - {}", format::money(Some(low)), format::money(Some(high))),
    )
}

#[allow(clippy::cast_possible_truncation)]
fn ticket_range(range: Option<(f64, f64)>) -> String {
    range.map_or_else(
        || format::PLACEHOLDER.to_string(),
        |(low, high)| {
            format!(
                "{} - {}",
                format::group_digits(low.round() as i64),
                format::group_digits(high.round() as i64)
            )
        },
    )
}

fn projection_lines(projection: &RevenueProjection) -> Vec<TextLine<'static>> {
    let white = Style::default().fg(Color::White);
    vec![
        field_line(
            "Now",
            format!(
                "{} tickets, {} ({} of {})",
                format::count(projection.current_tickets),
                format::money(projection.current_revenue),
                format::pct(projection.sell_through_pct),
                format::count(projection.capacity)
            ),
            white,
        ),
        field_line(
            "Projected tickets",
            format!(
                "{} (range {})",
                format::count(projection.projected_final_tickets),
                ticket_range(projection.projected_range)
            ),
            white,
        ),
        field_line(
            "Projected revenue",
            format!(
                "{} (range {})",
                format::money(projection.projected_revenue),
                money_range(projection.projected_revenue_range)
            ),
            Style::default().fg(Color::Green),
        ),
        field_line(
            "Confidence",
            format::pct(projection.confidence.map(|c| c * 100.0)),
            white,
        ),
        field_line("Avg ticket", format::money_cents(projection.avg_ticket_price), white),
    ]
    .into_iter()
    .map(indent)
    .collect()
}

fn cross_sell_lines(cross_sell: &CrossSell) -> Vec<TextLine<'static>> {
    let white = Style::default().fg(Color::White);
    let mut lines = vec![field_line("Candidates", format::count(cross_sell.candidates), white)];
    if !cross_sell.by_source_type.is_empty() {
        let sources = cross_sell
            .by_source_type
            .iter()
            .map(|(kind, count)| format!("{kind} {}", format::group_digits(*count)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(field_line("From", sources, white));
    }
    for candidate in cross_sell.top_candidates.iter().take(LIST_PREVIEW) {
        lines.push(TextLine::from(vec![
            Span::styled("  • ", Style::default().fg(ACCENT)),
            Span::raw(candidate.email.clone()),
            Span::styled(
                format!(
                    "  {} spent, LTV {}, attends {}",
                    format::money(candidate.total_spent),
                    format::decimal(candidate.ltv_score, 1),
                    candidate.attended_types.join("/")
                ),
                label_style(),
            ),
        ]));
    }
    if let Some(recommendation) = cross_sell.recommendation.as_deref() {
        lines.push(TextLine::from(Span::styled(
            recommendation.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.into_iter().map(indent).collect()
}

/// One rendered line of an untyped section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLine {
    pub depth: usize,
    pub key: Option<String>,
    pub value: String,
}

impl JsonLine {
    fn into_text(self) -> TextLine<'static> {
        let mut spans = vec![Span::raw("    ".repeat(self.depth + 1))];
        if let Some(key) = self.key {
            spans.push(Span::styled(format!("{key}: "), label_style()));
        }
        spans.push(Span::styled(self.value, Style::default().fg(Color::White)));
        TextLine::from(spans)
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(format::PLACEHOLDER.to_string()),
        Value::Bool(flag) => Some(if *flag { "yes" } else { "no" }.to_string()),
        Value::Number(number) => Some(number.as_i64().map_or_else(
            || format::decimal(number.as_f64(), 1),
            format::group_digits,
        )),
        Value::String(text) => Some(text.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// `a=1, b=2` summary of an object's scalar fields.
fn inline_object(map: &serde_json::Map<String, Value>) -> String {
    map.iter()
        .filter_map(|(key, value)| scalar(value).map(|v| format!("{}: {v}", format::humanize(key))))
        .take(5)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Flatten an arbitrary JSON section into labelled lines. Lists of
/// objects show one summary line per entry, capped at a short preview.
pub fn json_lines(value: &Value) -> Vec<JsonLine> {
    let mut out = Vec::new();
    push_json(&mut out, 0, None, value);
    out
}

fn push_json(out: &mut Vec<JsonLine>, depth: usize, key: Option<String>, value: &Value) {
    if let Some(text) = scalar(value) {
        out.push(JsonLine { depth, key, value: text });
        return;
    }
    match value {
        Value::Object(map) => {
            let child_depth = if key.is_some() {
                out.push(JsonLine { depth, key, value: String::new() });
                depth + 1
            } else {
                depth
            };
            for (child, value) in map {
                push_json(out, child_depth, Some(format::humanize(child)), value);
            }
        }
        Value::Array(items) => {
            if items.iter().all(|item| scalar(item).is_some()) {
                let joined = items.iter().filter_map(scalar).collect::<Vec<_>>().join(", ");
                out.push(JsonLine { depth, key, value: joined });
                return;
            }
            out.push(JsonLine {
                depth,
                key,
                value: format!("{} entries", items.len()),
            });
            for item in items.iter().take(LIST_PREVIEW) {
                let line = match item {
                    Value::Object(map) => inline_object(map),
                    other => scalar(other).unwrap_or_else(|| format!("{} items", other.as_array().map_or(0, Vec::len))),
                };
                out.push(JsonLine {
                    depth: depth + 1,
                    key: None,
                    value: format!("• {line}"),
                });
            }
            if items.len() > LIST_PREVIEW {
                out.push(JsonLine {
                    depth: depth + 1,
                    key: None,
                    value: format!("… {} more", items.len() - LIST_PREVIEW),
                });
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_sections_flatten_to_labelled_lines() {
        let value = json!({
            "total_vips": 1234,
            "vip_total_value": 5000.4,
            "recommendation": "Reach out",
            "top_vips": [{"email": "a@b.co", "total_spent": 900}],
            "tiers": {"ga": 10}
        });
        let lines = json_lines(&value);

        let find = |key: &str| lines.iter().find(|l| l.key.as_deref() == Some(key)).cloned();
        assert_eq!(find("Total vips").unwrap().value, "1,234");
        assert_eq!(find("Vip total value").unwrap().value, "5000.4");
        assert_eq!(find("Top vips").unwrap().value, "1 entries");
        assert_eq!(find("Ga").unwrap().depth, 1);
        assert!(lines
            .iter()
            .any(|l| l.value == "• Email: a@b.co, Total spent: 900"));
    }

    #[test]
    fn long_lists_are_capped() {
        let items: Vec<Value> = (0..20).map(|i| json!({"n": i})).collect();
        let lines = json_lines(&json!({ "rows": items }));
        assert_eq!(lines.len(), 1 + LIST_PREVIEW + 1);
        assert_eq!(lines.last().unwrap().value, "… 12 more");
    }

    #[test]
    fn scroll_keeps_cursor_in_view() {
        assert_eq!(body_scroll(3, 20), 0);
        assert_eq!(body_scroll(30, 20), 20);
    }

    #[test]
    fn missing_sections_render_nothing() {
        let report = IntelligenceReport::default();
        for section in IntelSection::ALL {
            assert!(section_body(&report, section).is_empty());
        }
    }
}
