//! Partial views of the analytics API payloads.
//!
//! Every field is optional or defaulted: the server omits fields freely
//! and the dashboard has to render whatever subset arrives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AudienceKey, Decision, Segment, TimingSegment};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardSnapshot {
    pub portfolio: Portfolio,
    pub decisions: BTreeMap<String, i64>,
    pub events: Vec<EventPacing>,
    pub customers: CustomerSummary,
    pub updated_at: Option<String>,
    pub sync: SyncFlags,
}

impl DashboardSnapshot {
    pub fn event(&self, event_id: &str) -> Option<&EventPacing> {
        self.events.iter().find(|event| event.event_id == event_id)
    }

    pub fn decision_count(&self, decision: Decision) -> i64 {
        self.decisions
            .get(decision.as_str())
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Portfolio {
    pub total_tickets: Option<i64>,
    pub total_capacity: Option<i64>,
    pub total_revenue: Option<f64>,
    pub total_spend: Option<f64>,
    pub portfolio_cac: Option<f64>,
    pub event_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomerSummary {
    pub total: Option<i64>,
    pub segments: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncFlags {
    pub done: bool,
    pub running: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EventPacing {
    pub event_id: String,
    pub event_name: String,
    pub event_date: Option<String>,
    pub days_until: Option<i64>,
    pub tickets_sold: Option<i64>,
    pub capacity: Option<i64>,
    pub revenue: Option<f64>,
    pub ad_spend: Option<f64>,
    pub sell_through: Option<f64>,
    pub cac: Option<f64>,
    pub historical_median_at_point: Option<f64>,
    pub pace_vs_historical: Option<f64>,
    pub projected_final: Option<i64>,
    pub projected_range: Option<(f64, f64)>,
    pub confidence: Option<f64>,
    pub decision: Option<String>,
    pub urgency: Option<i64>,
    pub rationale: Option<String>,
    pub actions: Vec<String>,
    pub high_value_targets: Option<i64>,
    pub reactivation_targets: Option<i64>,
    pub comparison_events: Vec<String>,
    pub comparison_years: Vec<i64>,
    pub historical_comparisons: Vec<HistoricalComparison>,
}

impl EventPacing {
    pub fn decision(&self) -> Option<Decision> {
        self.decision.as_deref().and_then(Decision::parse)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoricalComparison {
    pub event_name: Option<String>,
    pub event_date: Option<String>,
    pub year: Option<i64>,
    pub final_tickets: Option<i64>,
    pub final_revenue: Option<f64>,
    pub capacity: Option<i64>,
    pub final_sell_through: Option<f64>,
    pub ad_spend_total: Option<f64>,
    pub at_days_out: Option<AtDaysOut>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AtDaysOut {
    pub days: Option<i64>,
    pub tickets: Option<i64>,
    pub revenue: Option<f64>,
    pub sell_through: Option<f64>,
    pub ad_spend: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Customer {
    pub email: String,
    pub rfm_segment: Option<String>,
    pub favorite_city: Option<String>,
    pub favorite_event_type: Option<String>,
    pub total_orders: Option<i64>,
    pub total_tickets: Option<i64>,
    pub total_spent: Option<f64>,
    #[serde(alias = "total_events_attended")]
    pub total_events: Option<i64>,
    pub avg_order_value: Option<f64>,
    pub ltv_score: Option<f64>,
    pub ltv_projected: Option<f64>,
    pub timing_segment: Option<String>,
    #[serde(alias = "days_since_last_order")]
    pub days_since_last: Option<i64>,
    pub first_order_date: Option<String>,
    pub last_order_date: Option<String>,
}

impl Customer {
    pub fn segment(&self) -> Option<Segment> {
        self.rfm_segment.as_deref().and_then(Segment::parse)
    }

    pub fn timing(&self) -> Option<TimingSegment> {
        self.timing_segment.as_deref().and_then(TimingSegment::parse)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub total: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CustomerDetail {
    pub customer: Option<Customer>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Order {
    pub order_id: Option<String>,
    pub event_name: Option<String>,
    pub event_type: Option<String>,
    pub city: Option<String>,
    pub order_timestamp: Option<String>,
    pub gross_amount: Option<f64>,
    pub ticket_count: Option<i64>,
    pub ticket_type: Option<String>,
    pub promo_code: Option<String>,
}

/// Event header echoed back by the targeting and intelligence endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetEvent {
    pub event_id: Option<String>,
    pub name: Option<String>,
    pub event_date: Option<String>,
    pub capacity: Option<i64>,
    pub city: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetingReport {
    pub event: Option<TargetEvent>,
    pub export_token: Option<String>,
    pub current_buyers: Option<i64>,
    pub current_tickets: Option<i64>,
    pub current_revenue: Option<f64>,
    pub capacity: Option<i64>,
    pub days_until: Option<i64>,
    pub avg_ticket_price: Option<f64>,
    pub revenue_gap: Option<RevenueGap>,
    pub repeat_buyers: Option<RepeatBuyers>,
    pub quick_win: Option<QuickWin>,
    pub timing_recommendations: Vec<TimingRecommendation>,
    pub audiences: BTreeMap<String, Audience>,
}

impl TargetingReport {
    pub fn audience(&self, key: AudienceKey) -> Option<&Audience> {
        self.audiences.get(key.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RevenueGap {
    pub last_year: Option<i64>,
    pub last_year_tickets: Option<i64>,
    pub last_year_revenue: Option<f64>,
    pub last_year_capacity: Option<i64>,
    pub tickets_gap: Option<i64>,
    pub revenue_gap: Option<f64>,
    pub avg_ticket_price: Option<f64>,
    pub pct_of_last_year: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepeatBuyers {
    pub count: Option<i64>,
    pub total_past_buyers: Option<i64>,
    pub rate: Option<f64>,
    pub last_year_buyers: Option<i64>,
    pub rebought_from_last_year: Option<i64>,
    pub last_year_rebuy_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuickWin {
    pub audience: Option<String>,
    pub emails_to_send: Option<i64>,
    pub expected_tickets: Option<i64>,
    pub expected_revenue: Option<f64>,
    pub conversion_rate_used: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingRecommendation {
    pub urgency: Option<String>,
    pub action: Option<String>,
    pub count: Option<i64>,
    pub timing_segments: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Audience {
    pub label: Option<String>,
    pub description: Option<String>,
    pub count: Option<i64>,
    pub historical_value: Option<f64>,
    pub customers: Vec<Customer>,
    pub total_available: Option<i64>,
    pub segment_breakdown: BTreeMap<String, i64>,
    pub timing_breakdown: BTreeMap<String, TimingBucket>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingBucket {
    pub count: Option<i64>,
    pub overdue: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IntelligenceReport {
    pub event: Option<TargetEvent>,
    pub days_until: Option<i64>,
    pub velocity: Option<Velocity>,
    pub revenue_projection: Option<RevenueProjection>,
    pub cross_sell: Option<CrossSell>,
    pub purchase_timing: Option<serde_json::Value>,
    pub promo_intelligence: Option<serde_json::Value>,
    pub super_spreaders: Option<serde_json::Value>,
    pub ticket_tiers: Option<serde_json::Value>,
    pub churn_prediction: Option<serde_json::Value>,
    pub vips: Option<serde_json::Value>,
    pub competitors: Option<serde_json::Value>,
    pub cannibalization: Option<serde_json::Value>,
    pub export_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Velocity {
    pub current_velocity: Option<f64>,
    pub velocity_unit: Option<String>,
    pub tickets_remaining: Option<i64>,
    pub days_at_current_pace: Option<f64>,
    pub will_sell_out: Option<bool>,
    pub projected_unsold: Option<i64>,
    pub gap_closing_plan: Vec<GapStep>,
    pub total_recoverable: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GapStep {
    pub action: Option<String>,
    pub audience: Option<String>,
    pub expected_tickets: Option<i64>,
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RevenueProjection {
    pub current_tickets: Option<i64>,
    pub current_revenue: Option<f64>,
    pub capacity: Option<i64>,
    pub sell_through_pct: Option<f64>,
    pub projected_final_tickets: Option<i64>,
    pub projected_range: Option<(f64, f64)>,
    pub projected_revenue: Option<f64>,
    pub projected_revenue_range: Option<(f64, f64)>,
    pub confidence: Option<f64>,
    pub avg_ticket_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossSell {
    pub candidates: Option<i64>,
    pub by_source_type: BTreeMap<String, i64>,
    pub top_candidates: Vec<CrossSellCandidate>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossSellCandidate {
    pub email: String,
    pub attended_types: Vec<String>,
    pub ltv_score: Option<f64>,
    pub total_spent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlapReport {
    pub cities: Vec<String>,
    pub pairs_by_city: BTreeMap<String, Vec<OverlapPair>>,
    pub top_pairs: Vec<OverlapPair>,
    pub top_cross_type: Vec<OverlapPair>,
    pub matrices: BTreeMap<String, CityMatrix>,
    pub retention: Vec<RetentionRow>,
    pub summary: Option<OverlapSummary>,
}

impl OverlapReport {
    pub fn pairs_for(&self, city: &str) -> &[OverlapPair] {
        self.pairs_by_city.get(city).map_or(&[], Vec::as_slice)
    }

    pub fn retention_for<'a>(&'a self, city: &'a str) -> impl Iterator<Item = &'a RetentionRow> {
        self.retention
            .iter()
            .filter(move |row| row.city.as_deref() == Some(city))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlapPair {
    pub pair_id: Option<String>,
    pub event_a: Option<String>,
    pub event_a_type: Option<String>,
    pub event_a_count: Option<i64>,
    pub event_b: Option<String>,
    pub event_b_type: Option<String>,
    pub event_b_count: Option<i64>,
    pub overlap_count: Option<i64>,
    pub only_a_count: Option<i64>,
    pub only_b_count: Option<i64>,
    pub pct_of_a: Option<f64>,
    pub pct_of_b: Option<f64>,
    pub city: Option<String>,
    pub same_event: bool,
    pub action: Option<String>,
    pub action_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CityMatrix {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<i64>>,
    pub gap_matrix: Vec<Vec<i64>>,
    pub counts: Vec<i64>,
    pub types: Vec<Option<String>>,
}

impl CityMatrix {
    pub fn cell(&self, row: usize, col: usize) -> Option<i64> {
        self.matrix.get(row).and_then(|cells| cells.get(col)).copied()
    }

    pub fn gap(&self, row: usize, col: usize) -> Option<i64> {
        self.gap_matrix
            .get(row)
            .and_then(|cells| cells.get(col))
            .copied()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionRow {
    pub event: Option<String>,
    pub city: Option<String>,
    pub prev_year: Option<String>,
    pub curr_year: Option<String>,
    pub prev_count: Option<i64>,
    pub curr_count: Option<i64>,
    pub retained: Option<i64>,
    pub churned: Option<i64>,
    pub new_attendees: Option<i64>,
    pub retention_pct: Option<f64>,
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlapSummary {
    pub total_events: Option<i64>,
    pub total_pairs: Option<i64>,
    pub cross_type_pairs: Option<i64>,
    pub retention_pairs: Option<i64>,
    pub cities_analyzed: Option<i64>,
    pub total_cross_sell_opportunities: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncStatus {
    pub done: bool,
    pub running: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncTrigger {
    pub status: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_objects_decode_to_defaults() {
        let snapshot: DashboardSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.events.is_empty());
        assert!(snapshot.portfolio.total_revenue.is_none());
        assert!(!snapshot.sync.running);

        let report: TargetingReport = serde_json::from_str(r#"{"revenue_gap": {}}"#).unwrap();
        assert!(report.revenue_gap.unwrap().tickets_gap.is_none());
    }

    #[test]
    fn snapshot_decodes_nested_event_fields() {
        let json = r#"{
            "portfolio": {"total_tickets": 1200, "total_revenue": 54000.5},
            "decisions": {"push": 2, "coast": 1},
            "events": [{
                "event_id": "e1",
                "event_name": "Philly Cocktail Fest",
                "sell_through": 112.4,
                "projected_range": [800, 950],
                "decision": "push",
                "historical_comparisons": [{"year": 2024, "final_tickets": 900, "at_days_out": null}],
                "unknown_field": {"ignored": true}
            }],
            "sync": {"done": false, "running": true, "error": null}
        }"#;
        let snapshot: DashboardSnapshot = serde_json::from_str(json).unwrap();
        let event = snapshot.event("e1").unwrap();
        assert_eq!(event.decision(), Some(Decision::Push));
        assert_eq!(event.projected_range, Some((800.0, 950.0)));
        assert_eq!(event.historical_comparisons[0].year, Some(2024));
        assert_eq!(snapshot.decision_count(Decision::Push), 2);
        assert_eq!(snapshot.decision_count(Decision::Pivot), 0);
        assert!(snapshot.sync.running);
    }

    #[test]
    fn customer_detail_accepts_dataclass_field_names() {
        let json = r#"{
            "customer": {"email": "a@b.co", "total_events_attended": 4, "days_since_last_order": 12},
            "orders": [{"event_name": "Wine Walk", "gross_amount": 85.0, "ticket_count": 2}]
        }"#;
        let detail: CustomerDetail = serde_json::from_str(json).unwrap();
        let customer = detail.customer.unwrap();
        assert_eq!(customer.total_events, Some(4));
        assert_eq!(customer.days_since_last, Some(12));
        assert!(customer.total_spent.is_none());
        assert_eq!(detail.orders[0].ticket_count, Some(2));
    }

    #[test]
    fn overlap_matrix_lookups_tolerate_ragged_rows() {
        let matrix = CityMatrix {
            labels: vec!["A".into(), "B".into()],
            matrix: vec![vec![10, 4], vec![4]],
            gap_matrix: vec![vec![0, 6]],
            ..CityMatrix::default()
        };
        assert_eq!(matrix.cell(0, 1), Some(4));
        assert_eq!(matrix.cell(1, 1), None);
        assert_eq!(matrix.gap(1, 0), None);
    }
}
