//! CSV export links.
//!
//! Exports are downloads handed to the browser, never fetched by the
//! dashboard itself. The server signs them with an optional export token
//! it hands out alongside the targeting and intelligence reports.

use reqwest::Url;

use crate::domain::{AudienceKey, IntelligenceAudience, OverlapAudience, TimingSegment};

/// Which timing-segment slice of past attendees to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimingFilter {
    All,
    Segments(Vec<TimingSegment>),
}

impl TimingFilter {
    pub fn to_param(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Segments(segments) => segments
                .iter()
                .map(|segment| segment.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Target of a `/api/export/csv` download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudienceExport {
    Audience(AudienceKey),
    Timing(TimingFilter),
}

#[derive(Debug, Clone)]
pub struct ExportLinks {
    base_url: Url,
}

impl ExportLinks {
    pub const fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn audience_csv(&self, event_id: &str, export: &AudienceExport, token: Option<&str>) -> Url {
        let mut params = vec![("event_id", event_id.to_string())];
        match export {
            AudienceExport::Audience(key) => params.push(("audience", key.as_str().to_string())),
            AudienceExport::Timing(filter) => {
                params.push(("audience", "timing".to_string()));
                params.push(("timing", filter.to_param()));
            }
        }
        push_token(&mut params, token);
        self.build(&["api", "export", "csv"], &params)
    }

    pub fn intelligence_csv(
        &self,
        event_id: &str,
        audience: IntelligenceAudience,
        token: Option<&str>,
    ) -> Url {
        let mut params = vec![
            ("event_id", event_id.to_string()),
            ("audience", audience.as_str().to_string()),
        ];
        push_token(&mut params, token);
        self.build(&["api", "export", "intelligence-csv"], &params)
    }

    pub fn overlap_pair_csv(&self, pair_id: &str, audience: OverlapAudience) -> Url {
        let params = [
            ("pair_id", pair_id.to_string()),
            ("audience", audience.as_str().to_string()),
        ];
        self.build(&["api", "export", "overlap-csv"], &params)
    }

    /// Matrix cell export: attendees of the row event who never attended
    /// the column event (or all attendees on the diagonal).
    pub fn overlap_cell_csv(&self, city: &str, row: usize, col: usize) -> Url {
        let params = [
            ("city", city.to_string()),
            ("row", row.to_string()),
            ("col", col.to_string()),
        ];
        self.build(&["api", "export", "overlap-csv"], &params)
    }

    fn build(&self, segments: &[&str], params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}

fn push_token(params: &mut Vec<(&'static str, String)>, token: Option<&str>) {
    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        params.push(("key", token.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> ExportLinks {
        ExportLinks::new(Url::parse("https://craft.example.com/").unwrap())
    }

    fn param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    #[test]
    fn concurrent_audience_exports_get_distinct_urls() {
        let links = links();
        let past = links.audience_csv(
            "evt_9",
            &AudienceExport::Audience(AudienceKey::PastAttendees),
            Some("s3cret"),
        );
        let risk = links.audience_csv(
            "evt_9",
            &AudienceExport::Audience(AudienceKey::AtRisk),
            Some("s3cret"),
        );

        assert_ne!(past, risk);
        assert_eq!(past.path(), "/api/export/csv");
        assert_eq!(param(&past, "audience").as_deref(), Some("past_attendees"));
        assert_eq!(param(&risk, "audience").as_deref(), Some("at_risk"));
        assert_eq!(param(&risk, "event_id").as_deref(), Some("evt_9"));
        assert_eq!(param(&risk, "key").as_deref(), Some("s3cret"));
    }

    #[test]
    fn blank_or_missing_tokens_are_not_sent() {
        let links = links();
        let unsigned = links.intelligence_csv("evt_1", IntelligenceAudience::Vips, None);
        let blank = links.intelligence_csv("evt_1", IntelligenceAudience::Vips, Some("  "));
        assert_eq!(param(&unsigned, "key"), None);
        assert_eq!(param(&blank, "key"), None);
        assert_eq!(unsigned.path(), "/api/export/intelligence-csv");
        assert_eq!(param(&unsigned, "audience").as_deref(), Some("vips"));
    }

    #[test]
    fn timing_exports_carry_segment_list() {
        let url = links().audience_csv(
            "evt_2",
            &AudienceExport::Timing(TimingFilter::Segments(vec![
                TimingSegment::LastMinute,
                TimingSegment::Spontaneous,
            ])),
            None,
        );
        assert_eq!(param(&url, "audience").as_deref(), Some("timing"));
        assert_eq!(
            param(&url, "timing").as_deref(),
            Some("last_minute,spontaneous")
        );

        let all = links().audience_csv("evt_2", &AudienceExport::Timing(TimingFilter::All), None);
        assert_eq!(param(&all, "timing").as_deref(), Some("all"));
    }

    #[test]
    fn overlap_exports_use_pair_or_cell_parameters() {
        let links = links();
        let pair = links.overlap_pair_csv("Philly_0_3", OverlapAudience::OnlyB);
        assert_eq!(param(&pair, "pair_id").as_deref(), Some("Philly_0_3"));
        assert_eq!(param(&pair, "audience").as_deref(), Some("only_b"));

        let cell = links.overlap_cell_csv("Washington DC", 2, 0);
        assert_eq!(param(&cell, "city").as_deref(), Some("Washington DC"));
        assert_eq!(param(&cell, "row").as_deref(), Some("2"));
        assert_eq!(param(&cell, "col").as_deref(), Some("0"));
        assert_eq!(param(&cell, "audience"), None);
    }
}
