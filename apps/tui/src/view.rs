//! Session-scoped UI state: tabs, selections, list filters and the
//! request tracker that keeps late responses from overwriting newer ones.

use std::collections::HashMap;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::api::client::CustomerQuery;
use crate::api::models::EventPacing;
use crate::domain::{AudienceKey, SortField, SortOrder};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Overview,
    Events,
    Customers,
    Targeting,
    Intelligence,
    Overlap,
}

impl Tab {
    pub const ALL: [Self; 6] = [
        Self::Overview,
        Self::Events,
        Self::Customers,
        Self::Targeting,
        Self::Intelligence,
        Self::Overlap,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Events => "Events",
            Self::Customers => "Customers",
            Self::Targeting => "Targeting",
            Self::Intelligence => "Intelligence",
            Self::Overlap => "Overlap",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Identifies a slot of fetched data. At most one response per key is
/// current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Dashboard,
    Customers,
    CustomerDetail,
    Cities,
    EventTypes,
    Targeting,
    Intelligence,
    Overlap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub key: ViewKey,
    pub id: u64,
}

/// Issues monotonically increasing request ids per [`ViewKey`]; only the
/// most recently issued ticket for a key is accepted.
#[derive(Debug, Default)]
pub struct RequestTracker {
    counter: u64,
    latest: HashMap<ViewKey, u64>,
}

impl RequestTracker {
    pub fn begin(&mut self, key: ViewKey) -> RequestTicket {
        self.counter += 1;
        self.latest.insert(key, self.counter);
        RequestTicket {
            key,
            id: self.counter,
        }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.id)
    }

    /// Accept a response for `ticket`. Stale tickets are rejected and
    /// logged.
    pub fn accept(&self, ticket: RequestTicket) -> bool {
        let current = self.is_current(ticket);
        if !current {
            tracing::debug!(key = ?ticket.key, id = ticket.id, "discarding stale response");
        }
        current
    }

    pub fn in_flight(&self, key: ViewKey) -> Option<u64> {
        self.latest.get(&key).copied()
    }
}

/// Filters, sort and pagination for the customer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerListState {
    pub search: String,
    pub segment: Option<String>,
    pub city: Option<String>,
    pub event_type: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub offset: u32,
    pub page_size: u32,
}

impl Default for CustomerListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl CustomerListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            segment: None,
            city: None,
            event_type: None,
            sort: SortField::LtvScore,
            order: SortOrder::Desc,
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.offset = 0;
    }

    pub fn set_segment(&mut self, segment: Option<String>) {
        self.segment = segment;
        self.offset = 0;
    }

    pub fn set_city(&mut self, city: Option<String>) {
        self.city = city;
        self.offset = 0;
    }

    pub fn set_event_type(&mut self, event_type: Option<String>) {
        self.event_type = event_type;
        self.offset = 0;
    }

    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.segment = None;
        self.city = None;
        self.event_type = None;
        self.offset = 0;
    }

    pub fn has_filters(&self) -> bool {
        !self.search.trim().is_empty()
            || self.segment.is_some()
            || self.city.is_some()
            || self.event_type.is_some()
    }

    /// Same field flips the order; a new field starts descending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort == field {
            self.order = self.order.toggled();
        } else {
            self.sort = field;
            self.order = SortOrder::Desc;
        }
        self.offset = 0;
    }

    /// Advance one page if `total` says there is one. Returns whether the
    /// offset changed.
    pub fn next_page(&mut self, total: Option<i64>) -> bool {
        let next = self.offset.saturating_add(self.page_size);
        let has_more = total.is_some_and(|total| i64::from(next) < total);
        if has_more {
            self.offset = next;
        }
        has_more
    }

    pub fn prev_page(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.page_size);
        true
    }

    /// One-based page number.
    pub const fn page(&self) -> u32 {
        self.offset / self.page_size + 1
    }

    pub fn page_count(&self, total: Option<i64>) -> u32 {
        let total = total.unwrap_or(0).max(0);
        let pages = (total + i64::from(self.page_size) - 1) / i64::from(self.page_size);
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn query(&self) -> CustomerQuery {
        CustomerQuery {
            limit: self.page_size,
            offset: self.offset,
            sort: self.sort,
            order: self.order,
            search: Some(self.search.clone()).filter(|s| !s.trim().is_empty()),
            segment: self.segment.clone(),
            city: self.city.clone(),
            event_type: self.event_type.clone(),
        }
    }
}

/// Step through `None, options[0], options[1], ..., None`.
pub fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(value) => options
            .iter()
            .position(|option| option == value)
            .and_then(|index| options.get(index + 1))
            .cloned(),
    }
}

/// Collapsible sections of the intelligence report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntelSection {
    Velocity,
    RevenueProjection,
    CrossSell,
    PurchaseTiming,
    PromoIntelligence,
    SuperSpreaders,
    TicketTiers,
    ChurnPrediction,
    Vips,
    Competitors,
    Cannibalization,
}

impl IntelSection {
    pub const ALL: [Self; 11] = [
        Self::Velocity,
        Self::RevenueProjection,
        Self::CrossSell,
        Self::PurchaseTiming,
        Self::PromoIntelligence,
        Self::SuperSpreaders,
        Self::TicketTiers,
        Self::ChurnPrediction,
        Self::Vips,
        Self::Competitors,
        Self::Cannibalization,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Velocity => "Sales Velocity",
            Self::RevenueProjection => "Revenue Projection",
            Self::CrossSell => "Cross-Sell Candidates",
            Self::PurchaseTiming => "Purchase Timing",
            Self::PromoIntelligence => "Promo Codes",
            Self::SuperSpreaders => "Super Spreaders",
            Self::TicketTiers => "Ticket Tiers",
            Self::ChurnPrediction => "Churn Prediction",
            Self::Vips => "VIPs",
            Self::Competitors => "Competing Events",
            Self::Cannibalization => "Cannibalization",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntelSections {
    open: [bool; IntelSection::ALL.len()],
}

impl Default for IntelSections {
    fn default() -> Self {
        let mut open = [false; IntelSection::ALL.len()];
        open[0] = true;
        open[1] = true;
        Self { open }
    }
}

impl IntelSections {
    fn slot(section: IntelSection) -> usize {
        IntelSection::ALL
            .iter()
            .position(|s| *s == section)
            .unwrap_or(0)
    }

    pub fn is_open(&self, section: IntelSection) -> bool {
        self.open[Self::slot(section)]
    }

    pub fn toggle(&mut self, section: IntelSection) {
        let slot = Self::slot(section);
        self.open[slot] = !self.open[slot];
    }
}

/// Client-side narrowing of the event list by name.
#[derive(Default)]
pub struct EventFilter {
    pub query: String,
    pub editing: bool,
    matcher: SkimMatcherV2,
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFilter")
            .field("query", &self.query)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

impl EventFilter {
    /// Indices into `events` that match the query, best match first. An
    /// empty query keeps every event in its original order.
    pub fn apply(&self, events: &[EventPacing]) -> Vec<usize> {
        let query = self.query.trim();
        if query.is_empty() {
            return (0..events.len()).collect();
        }

        let mut scored: Vec<(i64, usize)> = events
            .iter()
            .enumerate()
            .filter_map(|(index, event)| {
                self.matcher
                    .fuzzy_match(&event.event_name, query)
                    .map(|score| (score, index))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, index)| index).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapMode {
    Matrix,
    Pairs,
    Network,
    Retention,
}

impl OverlapMode {
    pub const ALL: [Self; 4] = [Self::Matrix, Self::Pairs, Self::Network, Self::Retention];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Matrix => "Matrix",
            Self::Pairs => "Pairs",
            Self::Network => "Network",
            Self::Retention => "Retention",
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::Matrix => Self::Pairs,
            Self::Pairs => Self::Network,
            Self::Network => Self::Retention,
            Self::Retention => Self::Matrix,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverlapSelection {
    pub mode: OverlapMode,
    pub city: Option<String>,
    pub pair_index: usize,
    pub row: usize,
    pub col: usize,
}

impl Default for OverlapSelection {
    fn default() -> Self {
        Self {
            mode: OverlapMode::Matrix,
            city: None,
            pair_index: 0,
            row: 0,
            col: 0,
        }
    }
}

impl OverlapSelection {
    /// Switching city resets every position that indexes into the
    /// city's data.
    pub fn select_city(&mut self, city: Option<String>) {
        self.city = city;
        self.pair_index = 0;
        self.row = 0;
        self.col = 0;
    }
}

/// Everything the user has selected or typed during the session.
#[derive(Debug)]
pub struct ViewState {
    pub tab: Tab,
    pub selected_event: Option<String>,
    pub event_cursor: usize,
    pub event_filter: EventFilter,
    pub customers: CustomerListState,
    pub customer_cursor: usize,
    pub search_editing: bool,
    pub detail_email: Option<String>,
    pub audience: AudienceKey,
    pub audience_cursor: usize,
    pub intel_sections: IntelSections,
    pub intel_cursor: usize,
    pub overlap: OverlapSelection,
    pub requests: RequestTracker,
}

impl ViewState {
    pub fn new(page_size: u32) -> Self {
        Self {
            tab: Tab::Overview,
            selected_event: None,
            event_cursor: 0,
            event_filter: EventFilter::default(),
            customers: CustomerListState::new(page_size),
            customer_cursor: 0,
            search_editing: false,
            detail_email: None,
            audience: AudienceKey::PastAttendees,
            audience_cursor: 0,
            intel_sections: IntelSections::default(),
            intel_cursor: 0,
            overlap: OverlapSelection::default(),
            requests: RequestTracker::default(),
        }
    }

    /// Select an event for the event-scoped tabs. Returns whether the
    /// selection changed.
    pub fn select_event(&mut self, event_id: &str) -> bool {
        if self.selected_event.as_deref() == Some(event_id) {
            return false;
        }
        self.selected_event = Some(event_id.to_string());
        self.audience_cursor = 0;
        self.intel_cursor = 0;
        true
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> EventPacing {
        EventPacing {
            event_name: name.to_string(),
            ..EventPacing::default()
        }
    }

    #[test]
    fn sorting_same_field_toggles_and_new_field_starts_descending() {
        let mut list = CustomerListState::default();
        assert_eq!(list.sort, SortField::LtvScore);
        assert_eq!(list.order, SortOrder::Desc);

        list.sort_by(SortField::LtvScore);
        assert_eq!(list.order, SortOrder::Asc);
        list.sort_by(SortField::LtvScore);
        assert_eq!(list.order, SortOrder::Desc);

        list.sort_by(SortField::LtvScore);
        list.sort_by(SortField::TotalSpent);
        assert_eq!(list.sort, SortField::TotalSpent);
        assert_eq!(list.order, SortOrder::Desc);
    }

    #[test]
    fn every_filter_change_resets_the_page() {
        let total = Some(500);
        let changes: [fn(&mut CustomerListState); 5] = [
            |l| l.set_search("ana"),
            |l| l.set_segment(Some("champion".to_string())),
            |l| l.set_city(Some("Philadelphia".to_string())),
            |l| l.set_event_type(Some("wine".to_string())),
            CustomerListState::clear_filters,
        ];
        for change in changes {
            let mut list = CustomerListState::new(50);
            assert!(list.next_page(total));
            assert!(list.next_page(total));
            assert_eq!(list.offset, 100);
            change(&mut list);
            assert_eq!(list.offset, 0);
            assert_eq!(list.page(), 1);
        }
    }

    #[test]
    fn pagination_stops_at_the_ends() {
        let mut list = CustomerListState::new(50);
        assert!(!list.prev_page());
        assert!(list.next_page(Some(120)));
        assert!(list.next_page(Some(120)));
        assert!(!list.next_page(Some(120)));
        assert_eq!(list.offset, 100);
        assert_eq!(list.page_count(Some(120)), 3);
        assert!(!list.next_page(None));
        assert!(list.prev_page());
        assert_eq!(list.offset, 50);
        assert_eq!(list.page_count(None), 1);
    }

    #[test]
    fn query_carries_filters_and_drops_blank_search() {
        let mut list = CustomerListState::new(25);
        list.set_search("   ");
        list.set_city(Some("DC".to_string()));
        list.sort_by(SortField::DaysSinceLast);
        let query = list.query();
        assert_eq!(query.limit, 25);
        assert_eq!(query.search, None);
        assert_eq!(query.city.as_deref(), Some("DC"));
        assert_eq!(query.sort, SortField::DaysSinceLast);
        assert_eq!(query.order, SortOrder::Desc);
    }

    #[test]
    fn stale_tickets_are_rejected() {
        let mut tracker = RequestTracker::default();
        let first = tracker.begin(ViewKey::CustomerDetail);
        let other = tracker.begin(ViewKey::Targeting);
        let second = tracker.begin(ViewKey::CustomerDetail);

        assert!(!tracker.accept(first));
        assert!(tracker.accept(second));
        assert!(tracker.accept(other));
        assert!(second.id > first.id);
        assert_eq!(tracker.in_flight(ViewKey::CustomerDetail), Some(second.id));
        assert_eq!(tracker.in_flight(ViewKey::Overlap), None);
    }

    #[test]
    fn cycling_filter_options_wraps_through_none() {
        let options = vec!["DC".to_string(), "Philadelphia".to_string()];
        let first = cycle_option(None, &options);
        assert_eq!(first.as_deref(), Some("DC"));
        let second = cycle_option(first.as_deref(), &options);
        assert_eq!(second.as_deref(), Some("Philadelphia"));
        assert_eq!(cycle_option(second.as_deref(), &options), None);
        assert_eq!(cycle_option(Some("Gone"), &options), None);
        assert_eq!(cycle_option(None, &[]), None);
    }

    #[test]
    fn intelligence_sections_toggle_independently() {
        let mut sections = IntelSections::default();
        assert!(sections.is_open(IntelSection::Velocity));
        assert!(!sections.is_open(IntelSection::Vips));
        sections.toggle(IntelSection::Vips);
        sections.toggle(IntelSection::Velocity);
        assert!(sections.is_open(IntelSection::Vips));
        assert!(!sections.is_open(IntelSection::Velocity));
        assert!(sections.is_open(IntelSection::RevenueProjection));
    }

    #[test]
    fn event_filter_narrows_by_name() {
        let events = vec![
            event("Philly Cocktail Fest"),
            event("DC Wine Walk"),
            event("Philly Wine Walk"),
        ];
        let mut filter = EventFilter::default();
        assert_eq!(filter.apply(&events), [0, 1, 2]);

        filter.query = "wine".to_string();
        let matched = filter.apply(&events);
        assert_eq!(matched.len(), 2);
        assert!(!matched.contains(&0));

        filter.query = "zzz".to_string();
        assert!(filter.apply(&events).is_empty());
    }

    #[test]
    fn tabs_wrap_in_both_directions() {
        assert_eq!(Tab::Overview.prev(), Tab::Overlap);
        assert_eq!(Tab::Overlap.next(), Tab::Overview);
        assert_eq!(Tab::Customers.index(), 2);
    }

    #[test]
    fn switching_overlap_city_resets_positions() {
        let mut overlap = OverlapSelection {
            pair_index: 4,
            row: 2,
            col: 3,
            ..OverlapSelection::default()
        };
        overlap.select_city(Some("DC".to_string()));
        assert_eq!((overlap.pair_index, overlap.row, overlap.col), (0, 0, 0));
        assert_eq!(overlap.mode.next(), OverlapMode::Pairs);
    }

    #[test]
    fn selecting_the_same_event_twice_reports_no_change() {
        let mut view = ViewState::new(50);
        assert!(view.select_event("e1"));
        assert!(!view.select_event("e1"));
    }
}
