//! Sync lifecycle: trigger a remote sync, follow it to completion and
//! refresh the dashboard.
//!
//! The controller is a plain state machine. It never sleeps or performs
//! I/O; each processed [`SyncEvent`] yields the [`SyncEffect`]s the
//! runtime must carry out (start a request, arm a timer). Because a new
//! poll is only requested when the previous response is processed, polls
//! never overlap.

use std::fmt;
use std::time::Duration;

use crate::api::models::{SyncStatus, SyncTrigger};

pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DASHBOARD_REFETCH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_STATUS_POLLS: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
    Error,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Syncing => write!(f, "Syncing"),
            Self::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The user asked for a refresh.
    Trigger,
    /// `/api/sync` answered.
    TriggerAcknowledged(SyncTrigger),
    /// `/api/sync` could not be reached.
    TriggerFailed(String),
    /// `/api/sync-status` answered.
    StatusReceived(SyncStatus),
    /// `/api/sync-status` could not be reached.
    StatusUnavailable(String),
    /// A dashboard snapshot arrived carrying these sync flags.
    SnapshotLoaded {
        running: bool,
        error: Option<String>,
    },
    /// The delayed dashboard re-fetch timer fired.
    RefetchDue,
    /// A dashboard fetch failed.
    RefetchFailed(String),
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger => write!(f, "Trigger"),
            Self::TriggerAcknowledged(_) => write!(f, "TriggerAcknowledged"),
            Self::TriggerFailed(msg) => write!(f, "TriggerFailed({msg})"),
            Self::StatusReceived(status) => write!(f, "StatusReceived(done={})", status.done),
            Self::StatusUnavailable(msg) => write!(f, "StatusUnavailable({msg})"),
            Self::SnapshotLoaded { running, .. } => write!(f, "SnapshotLoaded(running={running})"),
            Self::RefetchDue => write!(f, "RefetchDue"),
            Self::RefetchFailed(msg) => write!(f, "RefetchFailed({msg})"),
        }
    }
}

/// Work the runtime must perform on behalf of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEffect {
    StartSync,
    ScheduleStatusPoll(Duration),
    ScheduleDashboardRefetch(Duration),
    FetchDashboardNow,
    /// A sync ended; reports derived from the old data are stale.
    InvalidateReports,
}

#[derive(Debug, thiserror::Error)]
#[error("sync event {event} is not valid in state {from}")]
pub struct SyncTransitionError {
    pub from: SyncState,
    pub event: String,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncTiming {
    pub status_poll: Duration,
    pub dashboard_refetch: Duration,
    /// Consecutive unfinished status polls tolerated before giving up.
    /// `None` polls forever.
    pub max_status_polls: Option<u32>,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            status_poll: STATUS_POLL_INTERVAL,
            dashboard_refetch: DASHBOARD_REFETCH_INTERVAL,
            max_status_polls: Some(DEFAULT_MAX_STATUS_POLLS),
        }
    }
}

#[derive(Debug)]
pub struct SyncController {
    state: SyncState,
    timing: SyncTiming,
    last_error: Option<String>,
    /// A status poll chain started by our own trigger is in flight.
    following_status: bool,
    unfinished_polls: u32,
    refetch_scheduled: bool,
}

impl SyncController {
    pub const fn new(timing: SyncTiming) -> Self {
        Self {
            state: SyncState::Idle,
            timing,
            last_error: None,
            following_status: false,
            unfinished_polls: 0,
            refetch_scheduled: false,
        }
    }

    pub const fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_syncing(&self) -> bool {
        self.state == SyncState::Syncing
    }

    /// Message for the persistent error banner.
    pub fn banner_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub const fn unfinished_polls(&self) -> u32 {
        self.unfinished_polls
    }

    pub fn process(&mut self, event: SyncEvent) -> Result<Vec<SyncEffect>, SyncTransitionError> {
        let from = self.state;
        let effects = match event {
            SyncEvent::Trigger => self.on_trigger(),
            SyncEvent::TriggerAcknowledged(ack) => self.on_trigger_ack(ack, from)?,
            SyncEvent::TriggerFailed(message) => {
                self.require_following(from, "TriggerFailed")?;
                self.fail(format!("Could not start sync: {message}"));
                Vec::new()
            }
            SyncEvent::StatusReceived(status) => self.on_status(status, from)?,
            SyncEvent::StatusUnavailable(message) => {
                self.require_following(from, "StatusUnavailable")?;
                tracing::warn!(error = %message, "sync status unavailable, polling again");
                self.on_unfinished_poll()
            }
            SyncEvent::SnapshotLoaded { running, error } => self.on_snapshot(running, error),
            SyncEvent::RefetchDue => {
                self.refetch_scheduled = false;
                vec![SyncEffect::FetchDashboardNow]
            }
            SyncEvent::RefetchFailed(message) => self.on_refetch_failed(&message),
        };

        if from != self.state {
            tracing::info!(from = %from, to = %self.state, "sync state changed");
        }
        Ok(effects)
    }

    fn on_trigger(&mut self) -> Vec<SyncEffect> {
        if self.state == SyncState::Syncing {
            tracing::debug!("sync already in progress, ignoring trigger");
            return Vec::new();
        }
        self.state = SyncState::Syncing;
        self.following_status = true;
        self.unfinished_polls = 0;
        vec![SyncEffect::StartSync]
    }

    fn on_trigger_ack(
        &mut self,
        ack: SyncTrigger,
        from: SyncState,
    ) -> Result<Vec<SyncEffect>, SyncTransitionError> {
        self.require_following(from, "TriggerAcknowledged")?;
        if let Some(error) = ack.error.filter(|e| !e.trim().is_empty()) {
            self.fail(error);
            return Ok(Vec::new());
        }
        tracing::info!(
            status = ack.status.as_deref().unwrap_or("unknown"),
            "sync started upstream"
        );
        Ok(vec![SyncEffect::ScheduleStatusPoll(self.timing.status_poll)])
    }

    fn on_status(
        &mut self,
        status: SyncStatus,
        from: SyncState,
    ) -> Result<Vec<SyncEffect>, SyncTransitionError> {
        self.require_following(from, "StatusReceived")?;
        if !status.done {
            return Ok(self.on_unfinished_poll());
        }

        self.following_status = false;
        self.unfinished_polls = 0;
        match status.error.filter(|e| !e.trim().is_empty()) {
            Some(error) => {
                self.state = SyncState::Error;
                self.last_error = Some(error);
            }
            None => {
                self.state = SyncState::Idle;
                self.last_error = None;
            }
        }
        Ok(vec![SyncEffect::InvalidateReports, SyncEffect::FetchDashboardNow])
    }

    fn on_unfinished_poll(&mut self) -> Vec<SyncEffect> {
        self.unfinished_polls += 1;
        if let Some(limit) = self.timing.max_status_polls {
            if self.unfinished_polls >= limit {
                let waited = self.timing.status_poll * self.unfinished_polls;
                self.fail(format!(
                    "Sync did not finish after {} status checks ({}s)",
                    self.unfinished_polls,
                    waited.as_secs()
                ));
                return vec![SyncEffect::InvalidateReports, SyncEffect::FetchDashboardNow];
            }
        }
        vec![SyncEffect::ScheduleStatusPoll(self.timing.status_poll)]
    }

    fn on_snapshot(&mut self, running: bool, error: Option<String>) -> Vec<SyncEffect> {
        if running {
            self.state = SyncState::Syncing;
            if self.refetch_scheduled {
                return Vec::new();
            }
            self.refetch_scheduled = true;
            return vec![SyncEffect::ScheduleDashboardRefetch(
                self.timing.dashboard_refetch,
            )];
        }

        // Our own status chain decides when a triggered sync is over.
        if self.state == SyncState::Syncing && !self.following_status {
            match error.filter(|e| !e.trim().is_empty()) {
                Some(error) => {
                    self.state = SyncState::Error;
                    self.last_error = Some(error);
                }
                None => {
                    self.state = SyncState::Idle;
                    self.last_error = None;
                }
            }
            return vec![SyncEffect::InvalidateReports];
        }
        Vec::new()
    }

    /// Keep the snapshot re-fetch loop alive when one of its fetches fails.
    /// Outside a snapshot-detected sync a failed fetch changes nothing.
    fn on_refetch_failed(&mut self, message: &str) -> Vec<SyncEffect> {
        if self.state != SyncState::Syncing || self.following_status || self.refetch_scheduled {
            return Vec::new();
        }
        tracing::warn!(error = %message, "dashboard re-fetch failed during sync, retrying");
        self.refetch_scheduled = true;
        vec![SyncEffect::ScheduleDashboardRefetch(
            self.timing.dashboard_refetch,
        )]
    }

    fn fail(&mut self, message: String) {
        tracing::error!(error = %message, "sync failed");
        self.state = SyncState::Error;
        self.last_error = Some(message);
        self.following_status = false;
        self.unfinished_polls = 0;
    }

    fn require_following(&self, from: SyncState, event: &str) -> Result<(), SyncTransitionError> {
        if self.following_status && from == SyncState::Syncing {
            Ok(())
        } else {
            Err(SyncTransitionError {
                from,
                event: event.to_string(),
            })
        }
    }
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new(SyncTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(done: bool, error: Option<&str>) -> SyncStatus {
        SyncStatus {
            done,
            running: !done,
            result: None,
            error: error.map(str::to_string),
        }
    }

    fn started() -> SyncTrigger {
        SyncTrigger {
            status: Some("started".to_string()),
            ..SyncTrigger::default()
        }
    }

    fn triggered_controller() -> SyncController {
        let mut sync = SyncController::default();
        sync.process(SyncEvent::Trigger).unwrap();
        sync.process(SyncEvent::TriggerAcknowledged(started()))
            .unwrap();
        sync
    }

    #[test]
    fn trigger_moves_to_syncing_immediately() {
        let mut sync = SyncController::default();
        let effects = sync.process(SyncEvent::Trigger).unwrap();
        assert_eq!(sync.state(), SyncState::Syncing);
        assert_eq!(effects, [SyncEffect::StartSync]);

        let effects = sync
            .process(SyncEvent::TriggerAcknowledged(started()))
            .unwrap();
        assert_eq!(effects, [SyncEffect::ScheduleStatusPoll(STATUS_POLL_INTERVAL)]);
    }

    #[test]
    fn retrigger_while_syncing_is_a_no_op() {
        let mut sync = triggered_controller();
        let effects = sync.process(SyncEvent::Trigger).unwrap();
        assert!(effects.is_empty());
        assert_eq!(sync.state(), SyncState::Syncing);
    }

    #[test]
    fn unfinished_status_schedules_exactly_one_more_poll() {
        let mut sync = triggered_controller();
        let effects = sync
            .process(SyncEvent::StatusReceived(status(false, None)))
            .unwrap();
        assert_eq!(effects, [SyncEffect::ScheduleStatusPoll(STATUS_POLL_INTERVAL)]);
        assert_eq!(sync.state(), SyncState::Syncing);

        let effects = sync
            .process(SyncEvent::StatusUnavailable("timeout".to_string()))
            .unwrap();
        assert_eq!(effects, [SyncEffect::ScheduleStatusPoll(STATUS_POLL_INTERVAL)]);
    }

    #[test]
    fn clean_completion_returns_to_idle_and_refreshes() {
        let mut sync = triggered_controller();
        let effects = sync
            .process(SyncEvent::StatusReceived(status(true, None)))
            .unwrap();
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(
            effects,
            [SyncEffect::InvalidateReports, SyncEffect::FetchDashboardNow]
        );
        assert!(sync.banner_error().is_none());
    }

    #[test]
    fn failed_sync_keeps_banner_until_a_clean_run() {
        let mut sync = triggered_controller();
        let effects = sync
            .process(SyncEvent::StatusReceived(status(true, Some("Eventbrite 401"))))
            .unwrap();
        assert_eq!(
            effects,
            [SyncEffect::InvalidateReports, SyncEffect::FetchDashboardNow]
        );
        assert_eq!(sync.state(), SyncState::Error);
        assert_eq!(sync.banner_error(), Some("Eventbrite 401"));

        // A new trigger is allowed and the banner stays up meanwhile.
        assert_eq!(
            sync.process(SyncEvent::Trigger).unwrap(),
            [SyncEffect::StartSync]
        );
        assert_eq!(sync.banner_error(), Some("Eventbrite 401"));

        sync.process(SyncEvent::TriggerAcknowledged(started()))
            .unwrap();
        sync.process(SyncEvent::StatusReceived(status(true, None)))
            .unwrap();
        assert_eq!(sync.banner_error(), None);
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn trigger_rejected_by_server_is_an_error() {
        let mut sync = SyncController::default();
        sync.process(SyncEvent::Trigger).unwrap();
        let effects = sync
            .process(SyncEvent::TriggerAcknowledged(SyncTrigger {
                error: Some("EVENTBRITE_API_KEY not set".to_string()),
                ..SyncTrigger::default()
            }))
            .unwrap();
        assert!(effects.is_empty());
        assert_eq!(sync.state(), SyncState::Error);
        assert_eq!(sync.banner_error(), Some("EVENTBRITE_API_KEY not set"));
    }

    #[test]
    fn running_snapshot_starts_refetch_loop_without_user_action() {
        let mut sync = SyncController::default();
        let effects = sync
            .process(SyncEvent::SnapshotLoaded {
                running: true,
                error: None,
            })
            .unwrap();
        assert_eq!(sync.state(), SyncState::Syncing);
        assert_eq!(
            effects,
            [SyncEffect::ScheduleDashboardRefetch(DASHBOARD_REFETCH_INTERVAL)]
        );

        // A second snapshot before the timer fires does not stack timers.
        let effects = sync
            .process(SyncEvent::SnapshotLoaded {
                running: true,
                error: None,
            })
            .unwrap();
        assert!(effects.is_empty());

        assert_eq!(
            sync.process(SyncEvent::RefetchDue).unwrap(),
            [SyncEffect::FetchDashboardNow]
        );
        let effects = sync
            .process(SyncEvent::SnapshotLoaded {
                running: false,
                error: None,
            })
            .unwrap();
        assert_eq!(effects, [SyncEffect::InvalidateReports]);
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn failed_refetch_rearms_the_snapshot_loop() {
        let mut sync = SyncController::default();
        sync.process(SyncEvent::SnapshotLoaded {
            running: true,
            error: None,
        })
        .unwrap();
        sync.process(SyncEvent::RefetchDue).unwrap();

        let effects = sync
            .process(SyncEvent::RefetchFailed("502 bad gateway".to_string()))
            .unwrap();
        assert_eq!(
            effects,
            [SyncEffect::ScheduleDashboardRefetch(DASHBOARD_REFETCH_INTERVAL)]
        );
        assert_eq!(sync.state(), SyncState::Syncing);

        // Only one timer at a time.
        let effects = sync
            .process(SyncEvent::RefetchFailed("502 bad gateway".to_string()))
            .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn failed_refetch_outside_a_detected_sync_does_nothing() {
        let mut idle = SyncController::default();
        assert!(idle
            .process(SyncEvent::RefetchFailed("down".to_string()))
            .unwrap()
            .is_empty());
        assert_eq!(idle.state(), SyncState::Idle);

        let mut followed = triggered_controller();
        assert!(followed
            .process(SyncEvent::RefetchFailed("down".to_string()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn detected_sync_ending_in_error_invalidates_reports() {
        let mut sync = SyncController::default();
        sync.process(SyncEvent::SnapshotLoaded {
            running: true,
            error: None,
        })
        .unwrap();
        let effects = sync
            .process(SyncEvent::SnapshotLoaded {
                running: false,
                error: Some("Eventbrite 500".to_string()),
            })
            .unwrap();
        assert_eq!(effects, [SyncEffect::InvalidateReports]);
        assert_eq!(sync.state(), SyncState::Error);
        assert_eq!(sync.banner_error(), Some("Eventbrite 500"));

        // Later idle snapshots leave the caches alone.
        let effects = sync
            .process(SyncEvent::SnapshotLoaded {
                running: false,
                error: None,
            })
            .unwrap();
        assert!(effects.is_empty());
    }

    #[test]
    fn snapshot_does_not_end_a_followed_sync() {
        let mut sync = triggered_controller();
        sync.process(SyncEvent::SnapshotLoaded {
            running: false,
            error: None,
        })
        .unwrap();
        assert_eq!(sync.state(), SyncState::Syncing);
    }

    #[test]
    fn stale_status_while_idle_is_rejected() {
        let mut sync = SyncController::default();
        let err = sync
            .process(SyncEvent::StatusReceived(status(true, None)))
            .unwrap_err();
        assert_eq!(err.from, SyncState::Idle);
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn polling_gives_up_after_the_cap() {
        let mut sync = SyncController::new(SyncTiming {
            max_status_polls: Some(3),
            ..SyncTiming::default()
        });
        sync.process(SyncEvent::Trigger).unwrap();
        sync.process(SyncEvent::TriggerAcknowledged(started()))
            .unwrap();

        for _ in 0..2 {
            let effects = sync
                .process(SyncEvent::StatusReceived(status(false, None)))
                .unwrap();
            assert!(matches!(effects[..], [SyncEffect::ScheduleStatusPoll(_)]));
        }
        let effects = sync
            .process(SyncEvent::StatusReceived(status(false, None)))
            .unwrap();
        assert_eq!(
            effects,
            [SyncEffect::InvalidateReports, SyncEffect::FetchDashboardNow]
        );
        assert_eq!(sync.state(), SyncState::Error);
        assert!(sync.banner_error().unwrap().contains("3 status checks"));
    }

    #[test]
    fn uncapped_polling_never_gives_up() {
        let mut sync = SyncController::new(SyncTiming {
            max_status_polls: None,
            ..SyncTiming::default()
        });
        sync.process(SyncEvent::Trigger).unwrap();
        sync.process(SyncEvent::TriggerAcknowledged(started()))
            .unwrap();
        for _ in 0..1000 {
            sync.process(SyncEvent::StatusReceived(status(false, None)))
                .unwrap();
        }
        assert_eq!(sync.state(), SyncState::Syncing);
        assert_eq!(sync.unfinished_polls(), 1000);
    }
}
