use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use craft_pulse::api::models::{
    CustomerDetail, CustomerPage, DashboardSnapshot, EventPacing, IntelligenceReport,
    OverlapReport, TargetingReport,
};
use craft_pulse::api::AudienceExport;
use craft_pulse::config::AppConfig;
use craft_pulse::domain::{IntelligenceAudience, OverlapAudience};
use craft_pulse::sync::{SyncController, SyncEffect, SyncEvent, SyncState};
use craft_pulse::view::{Tab, ViewKey, ViewState};
use reqwest::Url;
use throbber_widgets_tui::ThrobberState;

use super::actions::{open_in_browser, AppActions, AppMessage};

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub status_message: String,
    pub view: ViewState,
    pub sync: SyncController,
    pub actions: AppActions,
    pub throbber: ThrobberState,
    pub animation_counter: f64,
    pub last_frame: Instant,
    pub loading: HashSet<ViewKey>,
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    pub customers: CustomerPage,
    pub customer_detail: Option<CustomerDetail>,
    pub cities: Vec<String>,
    pub event_types: Vec<String>,
    pub targeting: Option<(String, TargetingReport)>,
    pub intelligence: Option<(String, IntelligenceReport)>,
    pub overlap: Option<Arc<OverlapReport>>,
}

impl App {
    pub fn new(config: &AppConfig, actions: AppActions) -> Self {
        Self {
            running: true,
            show_help: false,
            status_message: String::new(),
            view: ViewState::new(config.page_size),
            sync: SyncController::new(config.sync),
            actions,
            throbber: ThrobberState::default(),
            animation_counter: 0.0,
            last_frame: Instant::now(),
            loading: HashSet::new(),
            snapshot: None,
            customers: CustomerPage::default(),
            customer_detail: None,
            cities: Vec::new(),
            event_types: Vec::new(),
            targeting: None,
            intelligence: None,
            overlap: None,
        }
    }

    /// Initial fetches.
    pub fn start(&mut self) {
        self.request_dashboard();
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        self.animation_counter += delta.as_secs_f64() * 2.0;
        if self.animation_counter > 2.0 * std::f64::consts::PI {
            self.animation_counter -= 2.0 * std::f64::consts::PI;
        }

        if self.sync.is_syncing() {
            self.throbber.calc_next();
        }
    }

    pub fn is_loading(&self, key: ViewKey) -> bool {
        self.loading.contains(&key)
    }

    /// Events from the current snapshot, or none before the first load.
    pub fn events(&self) -> &[EventPacing] {
        self.snapshot
            .as_deref()
            .map(|snapshot| snapshot.events.as_slice())
            .unwrap_or_default()
    }

    pub fn selected_event(&self) -> Option<&EventPacing> {
        let id = self.view.selected_event.as_deref()?;
        self.events().iter().find(|event| event.event_id == id)
    }

    /// Targeting report for the selected event, if it has arrived.
    pub fn current_targeting(&self) -> Option<&TargetingReport> {
        let selected = self.view.selected_event.as_deref()?;
        self.targeting
            .as_ref()
            .filter(|(id, _)| id == selected)
            .map(|(_, report)| report)
    }

    pub fn current_intelligence(&self) -> Option<&IntelligenceReport> {
        let selected = self.view.selected_event.as_deref()?;
        self.intelligence
            .as_ref()
            .filter(|(id, _)| id == selected)
            .map(|(_, report)| report)
    }

    pub fn request_dashboard(&mut self) {
        let ticket = self.view.requests.begin(ViewKey::Dashboard);
        self.loading.insert(ViewKey::Dashboard);
        self.actions.fetch_dashboard(ticket);
    }

    pub fn request_customers(&mut self) {
        let ticket = self.view.requests.begin(ViewKey::Customers);
        self.loading.insert(ViewKey::Customers);
        self.actions
            .fetch_customers(ticket, self.view.customers.query());
    }

    pub fn request_customer_detail(&mut self, email: &str) {
        self.view.detail_email = Some(email.to_string());
        self.customer_detail = None;
        let ticket = self.view.requests.begin(ViewKey::CustomerDetail);
        self.loading.insert(ViewKey::CustomerDetail);
        self.actions.fetch_customer(ticket, email.to_string());
    }

    pub fn close_customer_detail(&mut self) {
        self.view.detail_email = None;
        self.customer_detail = None;
        // A late response for the closed popup must not reopen it.
        self.view.requests.begin(ViewKey::CustomerDetail);
        self.loading.remove(&ViewKey::CustomerDetail);
    }

    /// Filter option lists are fetched once per session.
    pub fn request_filter_options(&mut self) {
        if self.cities.is_empty() && !self.is_loading(ViewKey::Cities) {
            let ticket = self.view.requests.begin(ViewKey::Cities);
            self.loading.insert(ViewKey::Cities);
            self.actions.fetch_cities(ticket);
        }
        if self.event_types.is_empty() && !self.is_loading(ViewKey::EventTypes) {
            let ticket = self.view.requests.begin(ViewKey::EventTypes);
            self.loading.insert(ViewKey::EventTypes);
            self.actions.fetch_event_types(ticket);
        }
    }

    pub fn request_targeting(&mut self) {
        let Some(event_id) = self.view.selected_event.clone() else {
            return;
        };
        let ticket = self.view.requests.begin(ViewKey::Targeting);
        self.loading.insert(ViewKey::Targeting);
        self.actions.fetch_targeting(ticket, event_id);
    }

    pub fn request_intelligence(&mut self) {
        let Some(event_id) = self.view.selected_event.clone() else {
            return;
        };
        let ticket = self.view.requests.begin(ViewKey::Intelligence);
        self.loading.insert(ViewKey::Intelligence);
        self.actions.fetch_intelligence(ticket, event_id);
    }

    /// The overlap report is loaded once and kept for the session.
    pub fn request_overlap(&mut self, force: bool) {
        if (self.overlap.is_some() && !force) || self.is_loading(ViewKey::Overlap) {
            return;
        }
        let ticket = self.view.requests.begin(ViewKey::Overlap);
        self.loading.insert(ViewKey::Overlap);
        self.actions.fetch_overlap(ticket);
    }

    /// Switch tab and fetch whatever the new tab shows.
    pub fn set_tab(&mut self, tab: Tab) {
        if self.view.tab != tab {
            tracing::debug!(from = self.view.tab.title(), to = tab.title(), "switching tab");
        }
        self.view.tab = tab;
        self.view.search_editing = false;
        self.view.event_filter.editing = false;
        self.refresh_active_tab(false);
    }

    /// Fetch data for the active tab. Event-scoped reports are only
    /// re-requested when missing or stale for the selected event, unless
    /// `force` is set.
    pub fn refresh_active_tab(&mut self, force: bool) {
        match self.view.tab {
            Tab::Overview | Tab::Events => {}
            Tab::Customers => {
                self.request_filter_options();
                self.request_customers();
            }
            Tab::Targeting => {
                if force || self.current_targeting().is_none() {
                    self.request_targeting();
                }
            }
            Tab::Intelligence => {
                if force || self.current_intelligence().is_none() {
                    self.request_intelligence();
                }
            }
            Tab::Overlap => self.request_overlap(force),
        }
    }

    pub fn select_event(&mut self, event_id: &str) {
        if self.view.select_event(event_id) {
            tracing::debug!(event_id, "event selected");
            if matches!(self.view.tab, Tab::Targeting | Tab::Intelligence) {
                self.refresh_active_tab(false);
            }
        }
    }

    pub fn trigger_sync(&mut self) {
        if self.sync.is_syncing() {
            self.status_message = "Sync already running".to_string();
        }
        self.process_sync(SyncEvent::Trigger);
    }

    pub fn export_audience(&mut self, export: &AudienceExport) {
        let Some(event_id) = self.view.selected_event.clone() else {
            self.status_message = "Select an event first".to_string();
            return;
        };
        let token = self
            .current_targeting()
            .and_then(|report| report.export_token.clone());
        let url = self
            .actions
            .links()
            .audience_csv(&event_id, export, token.as_deref());
        self.open_export(&url);
    }

    pub fn export_intelligence(&mut self, audience: IntelligenceAudience) {
        let Some(event_id) = self.view.selected_event.clone() else {
            self.status_message = "Select an event first".to_string();
            return;
        };
        let token = self
            .current_intelligence()
            .and_then(|report| report.export_token.clone());
        let url = self
            .actions
            .links()
            .intelligence_csv(&event_id, audience, token.as_deref());
        self.open_export(&url);
    }

    pub fn export_overlap_pair(&mut self, pair_id: &str, audience: OverlapAudience) {
        let url = self.actions.links().overlap_pair_csv(pair_id, audience);
        self.open_export(&url);
    }

    pub fn export_overlap_cell(&mut self, city: &str, row: usize, col: usize) {
        let url = self.actions.links().overlap_cell_csv(city, row, col);
        self.open_export(&url);
    }

    fn open_export(&mut self, url: &Url) {
        self.status_message = match open_in_browser(url) {
            Ok(()) => format!("Export opened: {url}"),
            Err(e) => {
                tracing::warn!(%url, error = %e, "could not open export URL");
                format!("Could not open browser ({e}); export URL: {url}")
            }
        };
    }

    pub fn apply(&mut self, message: AppMessage) {
        match message {
            AppMessage::Dashboard(ticket, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot),
                    Err(e) => {
                        tracing::warn!(error = %e, "dashboard fetch failed, keeping previous data");
                        self.status_message = format!("Dashboard unavailable: {e}");
                        self.process_sync(SyncEvent::RefetchFailed(e.to_string()));
                    }
                }
            }
            AppMessage::Customers(ticket, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(page) => {
                        let rows = page.customers.len();
                        self.customers = page;
                        if self.view.customer_cursor >= rows {
                            self.view.customer_cursor = rows.saturating_sub(1);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "customer list fetch failed");
                        self.status_message = format!("Customers unavailable: {e}");
                    }
                }
            }
            AppMessage::CustomerDetail(ticket, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(detail) => self.customer_detail = Some(detail),
                    Err(e) => {
                        tracing::warn!(error = %e, "customer detail fetch failed");
                        self.status_message = format!("Customer unavailable: {e}");
                        self.customer_detail = Some(CustomerDetail::default());
                    }
                }
            }
            AppMessage::Cities(ticket, result) => {
                if self.settle(ticket) {
                    self.cities = lookup_or_empty(result, "cities");
                }
            }
            AppMessage::EventTypes(ticket, result) => {
                if self.settle(ticket) {
                    self.event_types = lookup_or_empty(result, "event types");
                }
            }
            AppMessage::Targeting(ticket, event_id, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(report) => {
                        self.view.audience_cursor = 0;
                        self.targeting = Some((event_id, report));
                    }
                    Err(e) => {
                        tracing::warn!(event_id = %event_id, error = %e, "targeting fetch failed");
                        self.status_message = format!("Targeting unavailable: {e}");
                    }
                }
            }
            AppMessage::Intelligence(ticket, event_id, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(report) => self.intelligence = Some((event_id, report)),
                    Err(e) => {
                        tracing::warn!(event_id = %event_id, error = %e, "intelligence fetch failed");
                        self.status_message = format!("Intelligence unavailable: {e}");
                    }
                }
            }
            AppMessage::Overlap(ticket, result) => {
                if !self.settle(ticket) {
                    return;
                }
                match result {
                    Ok(report) => {
                        if self.view.overlap.city.is_none() {
                            self.view.overlap.select_city(report.cities.first().cloned());
                        }
                        self.overlap = Some(Arc::new(report));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "overlap fetch failed");
                        self.status_message = format!("Overlap report unavailable: {e}");
                    }
                }
            }
            AppMessage::Sync(event) => self.process_sync(event),
        }
    }

    /// Clear the loading flag and report whether the response is current.
    fn settle(&mut self, ticket: craft_pulse::view::RequestTicket) -> bool {
        if !self.view.requests.accept(ticket) {
            return false;
        }
        self.loading.remove(&ticket.key);
        true
    }

    fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        let running = snapshot.sync.running;
        let error = snapshot.sync.error.clone();

        if self.view.selected_event.is_none() {
            if let Some(first) = snapshot.events.first() {
                self.view.selected_event = Some(first.event_id.clone());
            }
        }
        tracing::debug!(events = snapshot.events.len(), running, "dashboard snapshot loaded");
        self.snapshot = Some(Arc::new(snapshot));

        self.process_sync(SyncEvent::SnapshotLoaded { running, error });
    }

    fn process_sync(&mut self, event: SyncEvent) {
        let before = self.sync.state();
        match self.sync.process(event) {
            Ok(effects) => {
                for effect in effects {
                    self.run_sync_effect(effect);
                }
            }
            Err(e) => tracing::warn!(error = %e, "ignoring sync event"),
        }
        if before != self.sync.state() {
            self.status_message = match self.sync.state() {
                SyncState::Syncing => "Sync in progress...".to_string(),
                SyncState::Idle => "Sync complete".to_string(),
                SyncState::Error => "Sync failed".to_string(),
            };
        }
    }

    fn run_sync_effect(&mut self, effect: SyncEffect) {
        match effect {
            SyncEffect::StartSync => self.actions.start_sync(),
            SyncEffect::ScheduleStatusPoll(delay) => self.actions.poll_sync_status(delay),
            SyncEffect::ScheduleDashboardRefetch(delay) => self.actions.schedule_refetch(delay),
            SyncEffect::FetchDashboardNow => self.request_dashboard(),
            SyncEffect::InvalidateReports => {
                tracing::debug!("sync finished, dropping cached reports");
                self.overlap = None;
                self.targeting = None;
                self.intelligence = None;
                self.refresh_active_tab(true);
            }
        }
    }
}

fn lookup_or_empty(
    result: Result<Vec<String>, craft_pulse::api::ApiError>,
    what: &str,
) -> Vec<String> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load {what}");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_pulse::api::models::{Customer, SyncFlags, SyncStatus, SyncTrigger};
    use craft_pulse::api::ApiClient;
    use craft_pulse::format::{money, PLACEHOLDER};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|key| {
            (key == "CRAFT_API_BASE").then(|| "http://127.0.0.1:9/".to_string())
        })
        .unwrap()
    }

    fn app_with(config: &AppConfig) -> (App, mpsc::UnboundedReceiver<AppMessage>) {
        let client = ApiClient::new(config.api_base.clone(), Duration::from_millis(200)).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(config, AppActions::new(client, tx)), rx)
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppMessage>) {
        app_with(&test_config())
    }

    fn snapshot(running: bool) -> DashboardSnapshot {
        DashboardSnapshot {
            events: vec![EventPacing {
                event_id: "e1".to_string(),
                event_name: "Wine Walk".to_string(),
                ..EventPacing::default()
            }],
            sync: SyncFlags {
                running,
                ..SyncFlags::default()
            },
            ..DashboardSnapshot::default()
        }
    }

    #[tokio::test]
    async fn stale_customer_page_does_not_overwrite_newer_one() {
        let (mut app, _rx) = test_app();
        let old = app.view.requests.begin(ViewKey::Customers);
        let new = app.view.requests.begin(ViewKey::Customers);

        let page = |email: &str| CustomerPage {
            customers: vec![Customer {
                email: email.to_string(),
                ..Customer::default()
            }],
            ..CustomerPage::default()
        };
        app.apply(AppMessage::Customers(new, Ok(page("new@x.com"))));
        app.apply(AppMessage::Customers(old, Ok(page("old@x.com"))));
        assert_eq!(app.customers.customers[0].email, "new@x.com");
    }

    #[tokio::test]
    async fn running_snapshot_enters_syncing_without_user_action() {
        let (mut app, _rx) = test_app();
        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(true))));
        assert_eq!(app.sync.state(), SyncState::Syncing);
        assert_eq!(app.view.selected_event.as_deref(), Some("e1"));
        assert_eq!(app.selected_event().map(|e| e.event_name.as_str()), Some("Wine Walk"));
    }

    #[tokio::test]
    async fn failed_dashboard_fetch_keeps_previous_snapshot() {
        let (mut app, _rx) = test_app();
        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(false))));

        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        let err = craft_pulse::api::ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        };
        app.apply(AppMessage::Dashboard(ticket, Err(err)));
        assert_eq!(app.events().len(), 1);
        assert!(app.status_message.contains("bad gateway"));
        assert!(!app.is_loading(ViewKey::Dashboard));
    }

    #[tokio::test]
    async fn sync_completion_returns_to_idle_and_clears_banner() {
        let (mut app, _rx) = test_app();
        app.trigger_sync();
        assert_eq!(app.sync.state(), SyncState::Syncing);
        app.apply(AppMessage::Sync(SyncEvent::TriggerAcknowledged(SyncTrigger {
            status: Some("started".to_string()),
            ..SyncTrigger::default()
        })));
        app.apply(AppMessage::Sync(SyncEvent::StatusReceived(SyncStatus {
            done: true,
            ..SyncStatus::default()
        })));
        assert_eq!(app.sync.state(), SyncState::Idle);
        assert!(app.sync.banner_error().is_none());
        assert!(app.is_loading(ViewKey::Dashboard));
    }

    #[tokio::test]
    async fn failed_refetch_keeps_a_detected_sync_polling() {
        let mut config = test_config();
        config.sync.dashboard_refetch = Duration::from_millis(5);
        let (mut app, mut rx) = app_with(&config);
        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(true))));

        // The API base points at a closed port, so every re-fetch fails.
        let mut refetches = 0;
        let mut failures = 0;
        while refetches < 2 {
            let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("re-fetch loop stalled")
                .unwrap();
            match &message {
                AppMessage::Sync(SyncEvent::RefetchDue) => refetches += 1,
                AppMessage::Dashboard(_, Err(_)) => failures += 1,
                _ => {}
            }
            app.apply(message);
        }
        assert!(failures >= 1);
        assert_eq!(app.sync.state(), SyncState::Syncing);
    }

    #[tokio::test]
    async fn detected_sync_end_drops_cached_reports() {
        let (mut app, _rx) = test_app();
        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(true))));
        app.overlap = Some(Arc::new(OverlapReport::default()));
        app.targeting = Some(("e1".to_string(), TargetingReport::default()));
        app.intelligence = Some(("e1".to_string(), IntelligenceReport::default()));

        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(false))));
        assert_eq!(app.sync.state(), SyncState::Idle);
        assert!(app.overlap.is_none());
        assert!(app.targeting.is_none());
        assert!(app.intelligence.is_none());

        // Routine idle snapshots keep whatever was loaded since.
        app.overlap = Some(Arc::new(OverlapReport::default()));
        let ticket = app.view.requests.begin(ViewKey::Dashboard);
        app.apply(AppMessage::Dashboard(ticket, Ok(snapshot(false))));
        assert!(app.overlap.is_some());
    }

    #[tokio::test]
    async fn customer_filters_survive_tab_switches() {
        let (mut app, _rx) = test_app();
        app.set_tab(Tab::Customers);
        app.view.customers.set_search("ada");
        app.view.customers.set_segment(Some("champions".to_string()));
        assert!(app.view.customers.next_page(Some(500)));
        let before = app.view.customers.query();

        app.set_tab(Tab::Overview);
        app.set_tab(Tab::Customers);
        assert_eq!(app.view.customers.query(), before);
        assert_eq!(app.view.customers.page(), 2);
        assert!(app.is_loading(ViewKey::Customers));
    }

    #[tokio::test]
    async fn closed_detail_popup_ignores_late_response() {
        let (mut app, _rx) = test_app();
        app.request_customer_detail("a@b.co");
        let stale = craft_pulse::view::RequestTicket {
            key: ViewKey::CustomerDetail,
            id: app.view.requests.in_flight(ViewKey::CustomerDetail).unwrap(),
        };
        app.close_customer_detail();
        app.apply(AppMessage::CustomerDetail(stale, Ok(CustomerDetail::default())));
        assert!(app.customer_detail.is_none());
        assert!(app.view.detail_email.is_none());
    }

    #[tokio::test]
    async fn failed_lookup_lists_fall_back_to_empty() {
        let (mut app, _rx) = test_app();
        app.cities = vec!["stale".to_string()];
        let ticket = app.view.requests.begin(ViewKey::Cities);
        let err = craft_pulse::api::ApiError::Url("x".to_string());
        app.apply(AppMessage::Cities(ticket, Err(err)));
        assert!(app.cities.is_empty());
    }

    #[test]
    fn missing_spend_renders_placeholder() {
        let customer = Customer::default();
        assert_eq!(money(customer.total_spent), PLACEHOLDER);
    }
}
