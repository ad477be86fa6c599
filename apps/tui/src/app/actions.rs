use std::future::Future;
use std::process::Command;
use std::time::Duration;

use craft_pulse::api::models::{
    CustomerDetail, CustomerPage, DashboardSnapshot, IntelligenceReport, OverlapReport,
    TargetingReport,
};
use craft_pulse::api::{ApiClient, ApiError, CustomerQuery, ExportLinks};
use craft_pulse::sync::SyncEvent;
use craft_pulse::view::RequestTicket;
use reqwest::Url;
use tokio::sync::mpsc::UnboundedSender;

/// Completed background work, delivered to the UI loop.
#[derive(Debug)]
pub enum AppMessage {
    Dashboard(RequestTicket, Result<DashboardSnapshot, ApiError>),
    Customers(RequestTicket, Result<CustomerPage, ApiError>),
    CustomerDetail(RequestTicket, Result<CustomerDetail, ApiError>),
    Cities(RequestTicket, Result<Vec<String>, ApiError>),
    EventTypes(RequestTicket, Result<Vec<String>, ApiError>),
    Targeting(RequestTicket, String, Result<TargetingReport, ApiError>),
    Intelligence(RequestTicket, String, Result<IntelligenceReport, ApiError>),
    Overlap(RequestTicket, Result<OverlapReport, ApiError>),
    Sync(SyncEvent),
}

/// Spawns fetches and timers on the runtime. Every task reports back
/// through the channel; nothing here touches UI state.
#[derive(Debug, Clone)]
pub struct AppActions {
    client: ApiClient,
    links: ExportLinks,
    tx: UnboundedSender<AppMessage>,
}

impl AppActions {
    pub fn new(client: ApiClient, tx: UnboundedSender<AppMessage>) -> Self {
        let links = ExportLinks::new(client.base_url().clone());
        Self { client, links, tx }
    }

    pub const fn links(&self) -> &ExportLinks {
        &self.links
    }

    fn spawn<T, Fut, W>(&self, work: Fut, wrap: W)
    where
        T: Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        W: FnOnce(T) -> AppMessage + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let output = work.await;
            if tx.send(wrap(output)).is_err() {
                tracing::debug!("UI loop has exited, dropping result");
            }
        });
    }

    pub fn fetch_dashboard(&self, ticket: RequestTicket) {
        let client = self.client.clone();
        self.spawn(async move { client.dashboard().await }, move |result| {
            AppMessage::Dashboard(ticket, result)
        });
    }

    pub fn fetch_customers(&self, ticket: RequestTicket, query: CustomerQuery) {
        let client = self.client.clone();
        self.spawn(
            async move { client.customers(&query).await },
            move |result| AppMessage::Customers(ticket, result),
        );
    }

    pub fn fetch_customer(&self, ticket: RequestTicket, email: String) {
        let client = self.client.clone();
        self.spawn(
            async move { client.customer(&email).await },
            move |result| AppMessage::CustomerDetail(ticket, result),
        );
    }

    pub fn fetch_cities(&self, ticket: RequestTicket) {
        let client = self.client.clone();
        self.spawn(async move { client.cities().await }, move |result| {
            AppMessage::Cities(ticket, result)
        });
    }

    pub fn fetch_event_types(&self, ticket: RequestTicket) {
        let client = self.client.clone();
        self.spawn(async move { client.event_types().await }, move |result| {
            AppMessage::EventTypes(ticket, result)
        });
    }

    pub fn fetch_targeting(&self, ticket: RequestTicket, event_id: String) {
        let client = self.client.clone();
        let id = event_id.clone();
        self.spawn(
            async move { client.targeting(&id).await },
            move |result| AppMessage::Targeting(ticket, event_id, result),
        );
    }

    pub fn fetch_intelligence(&self, ticket: RequestTicket, event_id: String) {
        let client = self.client.clone();
        let id = event_id.clone();
        self.spawn(
            async move { client.intelligence(&id).await },
            move |result| AppMessage::Intelligence(ticket, event_id, result),
        );
    }

    pub fn fetch_overlap(&self, ticket: RequestTicket) {
        let client = self.client.clone();
        self.spawn(async move { client.overlap().await }, move |result| {
            AppMessage::Overlap(ticket, result)
        });
    }

    pub fn start_sync(&self) {
        let client = self.client.clone();
        self.spawn(async move { client.trigger_sync().await }, |result| {
            AppMessage::Sync(match result {
                Ok(ack) => SyncEvent::TriggerAcknowledged(ack),
                Err(e) => SyncEvent::TriggerFailed(e.to_string()),
            })
        });
    }

    pub fn poll_sync_status(&self, delay: Duration) {
        let client = self.client.clone();
        self.spawn(
            async move {
                tokio::time::sleep(delay).await;
                client.sync_status().await
            },
            |result| {
                AppMessage::Sync(match result {
                    Ok(status) => SyncEvent::StatusReceived(status),
                    Err(e) => SyncEvent::StatusUnavailable(e.to_string()),
                })
            },
        );
    }

    pub fn schedule_refetch(&self, delay: Duration) {
        self.spawn(tokio::time::sleep(delay), |()| {
            AppMessage::Sync(SyncEvent::RefetchDue)
        });
    }
}

/// Hand `url` to the platform opener without waiting for it.
pub fn open_in_browser(url: &Url) -> std::io::Result<()> {
    tracing::info!(%url, "opening export");
    let mut command = if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url.as_str());
        command
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", url.as_str()]);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url.as_str());
        command
    };
    command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_| ())
}
