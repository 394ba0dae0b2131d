//! System metrics poller.
//!
//! One logical timer whose interval depends on whether the metrics detail
//! view is open. The poller never performs I/O itself: the owner asks it
//! which ticks are due, fetches stats (inline or through a [`PollWorker`])
//! and hands each completion back together with its [`TickTicket`]. Tickets
//! from an earlier mount are rejected by [`MetricsPoller::is_current`].

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::api::{ApiError, Backend, SystemStats};
use crate::config::schema::ClientConfig;

pub const SUMMARY_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DETAIL_INTERVAL: Duration = Duration::from_millis(2_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Constructed but never mounted.
    Idle,
    Polling { interval: Duration },
    /// Unmounted. Nothing is ever due again until the next mount.
    Stopped,
}

/// Identifies one issued tick. `epoch` changes on every mount and unmount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    pub epoch: u64,
    pub seq: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsPoller {
    state: PollerState,
    summary: Duration,
    detail: Duration,
    detail_open: bool,
    epoch: u64,
    seq: u64,
    next_due: Option<Instant>,
}

impl Default for MetricsPoller {
    fn default() -> Self {
        Self::new(SUMMARY_INTERVAL, DETAIL_INTERVAL)
    }
}

impl MetricsPoller {
    pub fn new(summary: Duration, detail: Duration) -> Self {
        Self {
            state: PollerState::Idle,
            summary,
            detail,
            detail_open: false,
            epoch: 0,
            seq: 0,
            next_due: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            Duration::from_millis(config.summary_poll_ms.max(1)),
            Duration::from_millis(config.detail_poll_ms.max(1)),
        )
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn interval(&self) -> Option<Duration> {
        match self.state {
            PollerState::Polling { interval } => Some(interval),
            _ => None,
        }
    }

    /// Start polling. The first tick is due immediately.
    pub fn mount(&mut self, now: Instant) {
        self.epoch += 1;
        self.detail_open = false;
        self.state = PollerState::Polling {
            interval: self.summary,
        };
        self.next_due = Some(now);
    }

    /// Switch to the detail interval and poll right away.
    pub fn open_detail(&mut self, now: Instant) {
        self.detail_open = true;
        if let PollerState::Polling { .. } = self.state {
            self.state = PollerState::Polling {
                interval: self.detail,
            };
            self.next_due = Some(now);
        }
    }

    /// Back to the summary interval, counted from `now`.
    pub fn close_detail(&mut self, now: Instant) {
        self.detail_open = false;
        if let PollerState::Polling { .. } = self.state {
            self.state = PollerState::Polling {
                interval: self.summary,
            };
            self.next_due = Some(now + self.summary);
        }
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail_open
    }

    /// Clear the timer. In-flight ticks become stale.
    pub fn unmount(&mut self) {
        if self.state == PollerState::Stopped {
            return;
        }
        self.epoch += 1;
        self.detail_open = false;
        self.state = PollerState::Stopped;
        self.next_due = None;
    }

    /// Issue the tick due at `now`, if any, and schedule the next one.
    ///
    /// Missed deadlines collapse into a single tick.
    pub fn due(&mut self, now: Instant) -> Option<TickTicket> {
        let PollerState::Polling { interval } = self.state else {
            return None;
        };
        let next = self.next_due?;
        if now < next {
            return None;
        }
        self.next_due = Some(now + interval);
        self.seq += 1;
        Some(TickTicket {
            epoch: self.epoch,
            seq: self.seq,
        })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// Whether a completion for `ticket` should still be applied.
    pub fn is_current(&self, ticket: &TickTicket) -> bool {
        matches!(self.state, PollerState::Polling { .. }) && ticket.epoch == self.epoch
    }
}

// ---------------------------------------------------------------------------
// Background fetches
// ---------------------------------------------------------------------------

/// Outcome of one stats fetch.
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: TickTicket,
    pub result: Result<SystemStats, ApiError>,
}

/// Runs stats fetches on short-lived threads and queues their completions
/// for the owning thread.
pub struct PollWorker<B> {
    backend: Arc<B>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl<B> PollWorker<B>
where
    B: Backend + Send + Sync + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { backend, tx, rx }
    }

    /// Fetch stats for `ticket` in the background.
    pub fn dispatch(&self, ticket: TickTicket) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = backend.system_stats();
            // The receiver is gone once the dashboard is dropped.
            let _ = tx.send(Completion { ticket, result });
        });
    }

    /// Completions that have already arrived.
    pub fn try_completions(&self) -> Vec<Completion> {
        self.rx.try_iter().collect()
    }

    /// Block up to `timeout` for the next completion.
    pub fn wait_completion(&self, timeout: Duration) -> Option<Completion> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn mount_polls_immediately_then_every_summary_interval() {
        let start = Instant::now();
        let mut poller = MetricsPoller::default();
        assert_eq!(poller.state(), PollerState::Idle);
        assert!(poller.due(start).is_none());

        poller.mount(start);
        assert_eq!(poller.interval(), Some(SUMMARY_INTERVAL));
        assert!(poller.due(start).is_some());
        assert!(poller.due(start + ms(4_999)).is_none());
        assert!(poller.due(start + ms(5_000)).is_some());
    }

    #[test]
    fn detail_view_switches_interval_both_ways() {
        let start = Instant::now();
        let mut poller = MetricsPoller::default();
        poller.mount(start);
        poller.due(start);

        poller.open_detail(start + ms(100));
        assert_eq!(poller.interval(), Some(DETAIL_INTERVAL));
        assert!(poller.due(start + ms(100)).is_some());
        assert!(poller.due(start + ms(2_100)).is_some());

        poller.close_detail(start + ms(2_200));
        assert_eq!(poller.interval(), Some(SUMMARY_INTERVAL));
        assert!(poller.due(start + ms(4_100)).is_none());
        assert!(poller.due(start + ms(7_200)).is_some());
    }

    #[test]
    fn missed_deadlines_collapse_into_one_tick() {
        let start = Instant::now();
        let mut poller = MetricsPoller::default();
        poller.mount(start);
        poller.due(start);
        let late = start + ms(60_000);
        assert!(poller.due(late).is_some());
        assert!(poller.due(late).is_none());
    }

    #[test]
    fn unmount_stops_and_invalidates_in_flight_ticks() {
        let start = Instant::now();
        let mut poller = MetricsPoller::default();
        poller.mount(start);
        let ticket = poller.due(start).unwrap();
        assert!(poller.is_current(&ticket));

        poller.unmount();
        assert_eq!(poller.state(), PollerState::Stopped);
        assert!(!poller.is_current(&ticket));
        assert!(poller.due(start + ms(60_000)).is_none());
        assert!(poller.next_deadline().is_none());

        // Unmounting twice is harmless.
        poller.unmount();
        assert_eq!(poller.state(), PollerState::Stopped);
    }

    #[test]
    fn remount_rejects_tickets_from_previous_mount() {
        let start = Instant::now();
        let mut poller = MetricsPoller::default();
        poller.mount(start);
        let old = poller.due(start).unwrap();
        poller.unmount();
        poller.mount(start);
        let new = poller.due(start).unwrap();
        assert!(!poller.is_current(&old));
        assert!(poller.is_current(&new));
    }

    #[test]
    fn detail_toggle_before_mount_does_not_start_polling() {
        let mut poller = MetricsPoller::default();
        poller.open_detail(Instant::now());
        assert_eq!(poller.state(), PollerState::Idle);
        assert!(poller.is_detail_open());
    }
}
