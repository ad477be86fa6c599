use std::collections::BTreeMap;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use craft_pulse::api::models::{DashboardSnapshot, Portfolio};
use craft_pulse::config::AppConfig;
use craft_pulse::format;
use craft_pulse::sync::{SyncController, SyncEffect, SyncEvent, SyncState};
use craft_pulse::ApiClient;

/// Run without a UI: optionally follow a sync to completion, then print
/// the portfolio summary.
pub async fn run_headless(
    client: &ApiClient,
    config: &AppConfig,
    json: bool,
    sync: bool,
) -> Result<()> {
    if sync {
        follow_sync(client, config).await?;
    }

    let snapshot = client.dashboard().await?;
    let stats = HeadlessStats::from_snapshot(client, &snapshot);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        render_headless_stats(&stats);
    }
    Ok(())
}

/// Drive the sync controller directly, executing its effects inline.
async fn follow_sync(client: &ApiClient, config: &AppConfig) -> Result<()> {
    let mut controller = SyncController::new(config.sync);
    let mut pending = controller.process(SyncEvent::Trigger)?;
    eprintln!("Sync started");

    while let Some(effect) = pending.pop() {
        let event = match effect {
            SyncEffect::StartSync => match client.trigger_sync().await {
                Ok(ack) => SyncEvent::TriggerAcknowledged(ack),
                Err(e) => SyncEvent::TriggerFailed(e.to_string()),
            },
            SyncEffect::ScheduleStatusPoll(delay) => {
                tokio::time::sleep(delay).await;
                match client.sync_status().await {
                    Ok(status) => SyncEvent::StatusReceived(status),
                    Err(e) => SyncEvent::StatusUnavailable(e.to_string()),
                }
            }
            // Snapshots are not fed back here; the summary fetch below is
            // the final refresh and there are no cached reports.
            SyncEffect::ScheduleDashboardRefetch(_)
            | SyncEffect::FetchDashboardNow
            | SyncEffect::InvalidateReports => continue,
        };
        pending.extend(controller.process(event)?);
        if controller.is_syncing() {
            eprint!(".");
        }
    }
    eprintln!();

    sync_outcome(&controller)?;
    eprintln!("Sync complete");
    Ok(())
}

/// Final verdict once no effects remain. Only `Idle` is a success.
fn sync_outcome(controller: &SyncController) -> Result<()> {
    match controller.state() {
        SyncState::Idle => Ok(()),
        SyncState::Error => Err(eyre!(
            "sync failed: {}",
            controller.banner_error().unwrap_or("unknown error")
        )),
        SyncState::Syncing => Err(eyre!("sync did not finish")),
    }
}

fn render_headless_stats(stats: &HeadlessStats) {
    println!("\nCraft Pulse");
    println!("===========");
    println!("API: {}", stats.api_base);
    println!("Updated: {}", format::timestamp(stats.updated_at.as_deref()));
    if stats.sync_running {
        println!("Sync in progress");
    }
    if let Some(error) = &stats.sync_error {
        println!("Last sync error: {error}");
    }

    let portfolio = &stats.portfolio;
    println!("\nPortfolio:");
    println!("- Events: {}", format::count(portfolio.event_count));
    println!(
        "- Tickets: {} / {}",
        format::count(portfolio.total_tickets),
        format::count(portfolio.total_capacity)
    );
    println!("- Revenue: {}", format::money(portfolio.total_revenue));
    println!("- Ad spend: {}", format::money(portfolio.total_spend));
    println!("- CAC: {}", format::money_cents(portfolio.portfolio_cac));

    println!("\nDecisions:");
    for (decision, count) in &stats.decisions {
        println!("- {decision}: {count}");
    }

    println!("\nCustomers: {}", format::count(stats.customers_total));
    for (segment, count) in &stats.segments {
        println!("- {segment}: {}", format::group_digits(*count));
    }

    println!("\nEvents:");
    for event in &stats.events {
        println!(
            "- {} | {} | {} | {} sold | {}",
            event.name,
            format::date(event.date.as_deref()),
            event.decision.as_deref().unwrap_or(format::PLACEHOLDER),
            format::count(event.tickets_sold),
            format::pct(event.sell_through)
        );
    }
}

#[derive(Debug, serde::Serialize)]
struct HeadlessStats {
    api_base: String,
    updated_at: Option<String>,
    sync_running: bool,
    sync_error: Option<String>,
    portfolio: Portfolio,
    decisions: BTreeMap<String, i64>,
    customers_total: Option<i64>,
    segments: BTreeMap<String, i64>,
    events: Vec<HeadlessEvent>,
}

#[derive(Debug, serde::Serialize)]
struct HeadlessEvent {
    id: String,
    name: String,
    date: Option<String>,
    decision: Option<String>,
    tickets_sold: Option<i64>,
    capacity: Option<i64>,
    sell_through: Option<f64>,
}

impl HeadlessStats {
    fn from_snapshot(client: &ApiClient, snapshot: &DashboardSnapshot) -> Self {
        Self {
            api_base: client.base_url().to_string(),
            updated_at: snapshot.updated_at.clone(),
            sync_running: snapshot.sync.running,
            sync_error: snapshot.sync.error.clone(),
            portfolio: snapshot.portfolio.clone(),
            decisions: snapshot.decisions.clone(),
            customers_total: snapshot.customers.total,
            segments: snapshot.customers.segments.clone(),
            events: snapshot
                .events
                .iter()
                .map(|event| HeadlessEvent {
                    id: event.event_id.clone(),
                    name: event.event_name.clone(),
                    date: event.event_date.clone(),
                    decision: event.decision.clone(),
                    tickets_sold: event.tickets_sold,
                    capacity: event.capacity,
                    sell_through: event.sell_through,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;
    use std::time::Duration;

    #[test]
    fn stats_mirror_the_snapshot() {
        let client = ApiClient::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        let snapshot: DashboardSnapshot = serde_json::from_str(
            r#"{"portfolio": {"total_tickets": 10}, "events": [{"event_id": "e1", "event_name": "Fest", "decision": "coast"}]}"#,
        )
        .unwrap();
        let stats = HeadlessStats::from_snapshot(&client, &snapshot);
        assert_eq!(stats.portfolio.total_tickets, Some(10));
        assert_eq!(stats.events[0].decision.as_deref(), Some("coast"));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["events"][0]["name"], "Fest");
        assert!(json["customers_total"].is_null());
    }

    #[tokio::test]
    async fn unreachable_sync_endpoint_fails_the_run() {
        let config = AppConfig::from_lookup(|key| {
            (key == "CRAFT_API_BASE").then(|| "http://127.0.0.1:9/".to_string())
        })
        .unwrap();
        let client = ApiClient::new(config.api_base.clone(), Duration::from_secs(1)).unwrap();
        let err = follow_sync(&client, &config).await.unwrap_err();
        assert!(err.to_string().contains("sync failed"));
    }

    #[test]
    fn only_idle_counts_as_a_finished_sync() {
        let mut controller = SyncController::default();
        assert!(sync_outcome(&controller).is_ok());

        controller.process(SyncEvent::Trigger).unwrap();
        let err = sync_outcome(&controller).unwrap_err();
        assert_eq!(err.to_string(), "sync did not finish");

        controller
            .process(SyncEvent::TriggerFailed("refused".to_string()))
            .unwrap();
        let err = sync_outcome(&controller).unwrap_err();
        assert!(err.to_string().contains("refused"));
    }
}
