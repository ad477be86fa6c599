use craft_pulse::domain::{Decision, Segment, TimingSegment};
use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Cyan;
pub const MUTED: Color = Color::DarkGray;
pub const FALLBACK: Color = Color::Gray;
pub const HIGHLIGHT_BG: Color = Color::Rgb(0, 0, 238);

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT_BG)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn key_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn label_style() -> Style {
    Style::default().fg(Color::Gray)
}

pub const fn decision_color(decision: Option<Decision>) -> Color {
    match decision {
        Some(Decision::Pivot) => Color::Red,
        Some(Decision::Push) => Color::Rgb(255, 140, 0),
        Some(Decision::Maintain) => Color::Yellow,
        Some(Decision::Coast) => Color::Green,
        Some(Decision::NotStarted) => Color::Blue,
        None => FALLBACK,
    }
}

/// Colour and display label for a raw decision string from the API.
pub fn decision_badge(raw: Option<&str>) -> (Color, String) {
    let decision = raw.and_then(Decision::parse);
    let label = match (decision, raw) {
        (Some(decision), _) => decision.label().to_uppercase(),
        (None, Some(raw)) if !raw.trim().is_empty() => raw.trim().to_uppercase(),
        _ => "UNKNOWN".to_string(),
    };
    (decision_color(decision), label)
}

pub const fn segment_color(segment: Option<Segment>) -> Color {
    match segment {
        Some(Segment::Champion) => Color::Magenta,
        Some(Segment::Loyal) => Color::Green,
        Some(Segment::Potential) => Color::Cyan,
        Some(Segment::AtRisk) => Color::Rgb(255, 140, 0),
        Some(Segment::Hibernating) => Color::Blue,
        Some(Segment::Other) | None => FALLBACK,
    }
}

pub const fn timing_color(timing: Option<TimingSegment>) -> Color {
    match timing {
        Some(TimingSegment::SuperEarlyBird) => Color::Magenta,
        Some(TimingSegment::EarlyBird) => Color::Blue,
        Some(TimingSegment::Planner) => Color::Cyan,
        Some(TimingSegment::Spontaneous) => Color::Yellow,
        Some(TimingSegment::LastMinute) => Color::Red,
        None => FALLBACK,
    }
}

/// Label for a segment key, falling back to the raw key.
pub fn segment_label(raw: &str) -> String {
    Segment::parse(raw).map_or_else(|| craft_pulse::format::humanize(raw), |s| s.label().to_string())
}

pub fn timing_label(raw: &str) -> String {
    TimingSegment::parse(raw)
        .map_or_else(|| craft_pulse::format::humanize(raw), |t| t.label().to_string())
}

/// Sign of a delta drives its colour; no delta is neutral.
pub fn delta_color(delta: Option<f64>) -> Color {
    match delta {
        Some(d) if d > 0.0 => Color::Green,
        Some(d) if d < 0.0 => Color::Red,
        _ => FALLBACK,
    }
}

/// Background for a heat-map cell at `ratio` in `[0, 1]`.
pub fn heat_color(ratio: f64) -> Color {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let level = (ratio * 180.0).round() as u8;
    Color::Rgb(20, 20u8.saturating_add(level / 3), 40u8.saturating_add(level))
}

/// Urgency on the decision engine's 0-10 scale.
pub const fn urgency_color(urgency: Option<i64>) -> Color {
    match urgency {
        Some(u) if u >= 8 => Color::Red,
        Some(u) if u >= 5 => Color::Yellow,
        Some(_) => Color::Green,
        None => FALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_fall_back() {
        let (color, label) = decision_badge(Some("panic"));
        assert_eq!(color, FALLBACK);
        assert_eq!(label, "PANIC");

        let (color, label) = decision_badge(None);
        assert_eq!(color, FALLBACK);
        assert_eq!(label, "UNKNOWN");

        assert_eq!(segment_color(Segment::parse("whale")), FALLBACK);
        assert_eq!(timing_color(TimingSegment::parse("sometime")), FALLBACK);
        assert_eq!(segment_label("big_spender"), "Big spender");
    }

    #[test]
    fn known_labels_map_to_distinct_colors() {
        let (push, label) = decision_badge(Some("push"));
        assert_eq!(label, "PUSH");
        assert_ne!(push, FALLBACK);
        assert_ne!(decision_color(Some(Decision::Pivot)), decision_color(Some(Decision::Coast)));
        assert_eq!(timing_label("last_minute"), "Last minute");
    }

    #[test]
    fn delta_sign_drives_color() {
        assert_eq!(delta_color(Some(12.0)), Color::Green);
        assert_eq!(delta_color(Some(-0.5)), Color::Red);
        assert_eq!(delta_color(Some(0.0)), FALLBACK);
        assert_eq!(delta_color(None), FALLBACK);
    }

    #[test]
    fn heat_color_tolerates_bad_ratios() {
        assert_eq!(heat_color(f64::NAN), heat_color(0.0));
        assert_eq!(heat_color(3.0), heat_color(1.0));
    }
}
