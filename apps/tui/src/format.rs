//! Display helpers shared by every screen.
//!
//! All inputs are optional because payload fields may be missing; a
//! missing value always renders as [`PLACEHOLDER`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const PLACEHOLDER: &str = "-";

/// Clamp a percentage to the drawable range `[0, 100]`.
pub fn clamp_pct(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Percentage change from `previous` to `current`; only defined when
/// there is a positive baseline.
pub fn yoy_delta(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(current), Some(previous)) if previous > 0.0 && current.is_finite() => {
            Some((current - previous) / previous * 100.0)
        }
        _ => None,
    }
}

/// `value / max` in `[0, 1]`; zero when there is no positive maximum.
pub fn ratio(value: f64, max: f64) -> f64 {
    if max <= 0.0 || !max.is_finite() || !value.is_finite() {
        return 0.0;
    }
    (value / max).clamp(0.0, 1.0)
}

/// Map `value` linearly from `[0, max]` onto `[low, high]`.
pub fn scale(value: f64, max: f64, low: f64, high: f64) -> f64 {
    ratio(value, max).mul_add(high - low, low)
}

/// Compact count for chart labels: `1.2k` from one thousand up.
pub fn abbreviate(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let whole = value.round();
    if whole.abs() >= 1000.0 {
        format!("{:.1}k", value / 1000.0)
    } else {
        format!("{whole:.0}")
    }
}

/// Group digits with commas: `1234567` → `1,234,567`.
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Full integer for table cells.
pub fn count(value: Option<i64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), group_digits)
}

#[allow(clippy::cast_possible_truncation)]
fn rounded(value: f64) -> i64 {
    value.round() as i64
}

/// Whole-dollar amount.
pub fn money(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v < -0.5 { "-" } else { "" };
            format!("{sign}${}", group_digits(rounded(v.abs())))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Dollar amount with cents, for per-unit figures like CAC.
pub fn money_cents(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v < 0.0 { "-" } else { "" };
            let cents = rounded(v.abs() * 100.0);
            format!("{sign}${}.{:02}", group_digits(cents / 100), cents % 100)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Signed percentage for deltas: `+12.5%`, `-3.0%`.
pub fn signed_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:+.1}%"),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn decimal(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.places$}"),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn text(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(PLACEHOLDER)
}

/// Recency label from a day count.
pub fn days_ago(days: Option<i64>) -> String {
    match days {
        Some(d) if d <= 0 => "today".to_string(),
        Some(1) => "yesterday".to_string(),
        Some(d) if d < 60 => format!("{d}d ago"),
        Some(d) if d < 730 => format!("{}mo ago", d / 30),
        Some(d) => format!("{}y ago", d / 365),
        None => PLACEHOLDER.to_string(),
    }
}

/// Countdown label for an event date.
pub fn days_until(days: Option<i64>) -> String {
    match days {
        Some(d) if d < 0 => format!("{}d ago", d.unsigned_abs()),
        Some(0) => "today".to_string(),
        Some(d) => format!("in {d}d"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Render an ISO-8601 timestamp or date as `YYYY-MM-DD HH:MM`
/// (or `YYYY-MM-DD` for bare dates). Unparseable input is shown as-is.
pub fn timestamp(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return PLACEHOLDER.to_string();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, pattern) {
            return parsed.format("%Y-%m-%d %H:%M").to_string();
        }
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// Date part of a timestamp.
pub fn date(value: Option<&str>) -> String {
    let formatted = timestamp(value);
    formatted
        .split_whitespace()
        .next()
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

/// Text bar of `width` cells filled to `pct` percent.
pub fn bar(pct: Option<f64>, width: usize) -> String {
    let filled = filled_cells(pct, width);
    let mut out = "█".repeat(filled);
    out.push_str(&"░".repeat(width - filled));
    out
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn filled_cells(pct: Option<f64>, width: usize) -> usize {
    let fraction = clamp_pct(pct) / 100.0;
    ((fraction * width as f64).round() as usize).min(width)
}

/// Replace underscores and capitalise: `super_early_bird` → `Super early bird`.
pub fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_width_is_clamped() {
        for (input, expected) in [
            (Some(-20.0), 0.0),
            (Some(0.0), 0.0),
            (Some(45.5), 45.5),
            (Some(100.0), 100.0),
            (Some(137.0), 100.0),
            (Some(f64::NAN), 0.0),
            (Some(f64::INFINITY), 0.0),
            (None, 0.0),
        ] {
            let width = clamp_pct(input);
            assert!((0.0..=100.0).contains(&width));
            assert!((width - expected).abs() < f64::EPSILON, "{input:?}");
        }
        assert_eq!(filled_cells(Some(250.0), 10), 10);
        assert_eq!(filled_cells(Some(-5.0), 10), 0);
        assert_eq!(bar(Some(50.0), 4), "██░░");
    }

    #[test]
    fn yoy_delta_requires_positive_baseline() {
        assert_eq!(yoy_delta(Some(150.0), Some(100.0)), Some(50.0));
        assert_eq!(yoy_delta(Some(50.0), Some(100.0)), Some(-50.0));
        assert_eq!(yoy_delta(Some(10.0), Some(0.0)), None);
        assert_eq!(yoy_delta(Some(10.0), Some(-4.0)), None);
        assert_eq!(yoy_delta(None, Some(10.0)), None);
    }

    #[test]
    fn abbreviates_chart_labels_only_from_one_thousand() {
        assert_eq!(abbreviate(999.0), "999");
        assert_eq!(abbreviate(1000.0), "1.0k");
        assert_eq!(abbreviate(999.95), "1.0k");
        assert_eq!(abbreviate(999.4), "999");
        assert_eq!(abbreviate(12_345.0), "12.3k");
    }

    #[test]
    fn table_numbers_are_full_and_grouped() {
        assert_eq!(count(Some(1_234_567)), "1,234,567");
        assert_eq!(count(Some(999)), "999");
        assert_eq!(count(Some(-4200)), "-4,200");
        assert_eq!(count(None), PLACEHOLDER);
    }

    #[test]
    fn missing_money_renders_placeholder() {
        assert_eq!(money(None), PLACEHOLDER);
        assert_eq!(money(Some(f64::NAN)), PLACEHOLDER);
        assert_eq!(money(Some(1234.6)), "$1,235");
        assert_eq!(money_cents(Some(12.346)), "$12.35");
        assert_eq!(money_cents(Some(-3.5)), "-$3.50");
        assert!(!money(None).contains("NaN"));
    }

    #[test]
    fn ratio_and_scale_guard_against_empty_maxima() {
        assert!(ratio(5.0, 0.0).abs() < f64::EPSILON);
        assert!((ratio(5.0, 10.0) - 0.5).abs() < f64::EPSILON);
        assert!((ratio(20.0, 10.0) - 1.0).abs() < f64::EPSILON);
        assert!((scale(5.0, 10.0, 2.0, 4.0) - 3.0).abs() < f64::EPSILON);
        assert!((scale(5.0, 0.0, 2.0, 4.0) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn timestamps_render_in_a_single_shape() {
        assert_eq!(
            timestamp(Some("2025-03-01T14:05:09.123456")),
            "2025-03-01 14:05"
        );
        assert_eq!(timestamp(Some("2025-03-01T14:05:09Z")), "2025-03-01 14:05");
        assert_eq!(timestamp(Some("2025-03-01")), "2025-03-01");
        assert_eq!(timestamp(Some("soon")), "soon");
        assert_eq!(timestamp(None), PLACEHOLDER);
        assert_eq!(date(Some("2025-03-01T14:05:09")), "2025-03-01");
    }

    #[test]
    fn relative_day_labels() {
        assert_eq!(days_ago(Some(0)), "today");
        assert_eq!(days_ago(Some(12)), "12d ago");
        assert_eq!(days_ago(Some(90)), "3mo ago");
        assert_eq!(days_until(Some(5)), "in 5d");
        assert_eq!(days_until(None), PLACEHOLDER);
        assert_eq!(days_until(Some(-3)), "3d ago");
        assert_eq!(days_until(Some(i64::MIN)), "9223372036854775808d ago");
        assert_eq!(humanize("super_early_bird"), "Super early bird");
    }
}
