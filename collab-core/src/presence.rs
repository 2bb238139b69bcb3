use std::time::{Duration, Instant};

use collab_types::PresenceStatus;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default idle window before a user is classified as away.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Input kinds that count as user activity. Observed passively by the host
/// UI and reported into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::PointerDown => "pointer_down",
            ActivityKind::KeyDown => "key_down",
            ActivityKind::Scroll => "scroll",
            ActivityKind::TouchStart => "touch_start",
        }
    }
}

/// Idle-detection state machine, independent of network connectivity.
///
/// `Active --(no activity for idle_timeout)--> Away --(any activity)-->
/// Active`. Entering `Active` re-arms the idle window; `Away` is a one-shot
/// transition with no further timing until activity resumes.
#[derive(Debug)]
pub struct IdleMonitor {
    status: PresenceStatus,
    last_activity: Instant,
    idle_timeout: Duration,
}

impl IdleMonitor {
    pub fn new(idle_timeout: Duration, now: Instant) -> Self {
        Self {
            status: PresenceStatus::Active,
            last_activity: now,
            idle_timeout,
        }
    }

    pub fn status(&self) -> PresenceStatus {
        self.status
    }

    /// Record qualifying input. Returns the new status if this caused a
    /// transition (away -> active); re-arming while active is silent.
    pub fn record_activity(&mut self, now: Instant) -> Option<PresenceStatus> {
        self.last_activity = now;
        if self.status == PresenceStatus::Away {
            self.status = PresenceStatus::Active;
            Some(PresenceStatus::Active)
        } else {
            None
        }
    }

    /// Check the idle deadline. Returns the new status if the user just
    /// went away; while already away there is nothing left to time.
    pub fn check_idle(&mut self, now: Instant) -> Option<PresenceStatus> {
        if self.status == PresenceStatus::Active
            && now.duration_since(self.last_activity) >= self.idle_timeout
        {
            self.status = PresenceStatus::Away;
            Some(PresenceStatus::Away)
        } else {
            None
        }
    }

    /// Time left until the idle deadline, zero if already due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.idle_timeout
            .saturating_sub(now.duration_since(self.last_activity))
    }
}

/// Background presence tracker.
///
/// The UI reports qualifying input via `report`; every status transition
/// invokes the supplied callback, which updates the collaboration store and
/// best-effort echoes a presence frame. The callback is infallible by
/// construction, so a dead transport can never break presence tracking.
pub struct PresenceTracker {
    activity_tx: mpsc::UnboundedSender<ActivityKind>,
    task: JoinHandle<()>,
}

impl PresenceTracker {
    pub fn spawn<F>(idle_timeout: Duration, mut on_change: F) -> Self
    where
        F: FnMut(PresenceStatus, Option<&'static str>) + Send + 'static,
    {
        let (activity_tx, mut activity_rx) = mpsc::unbounded_channel::<ActivityKind>();

        let task = tokio::spawn(async move {
            let mut monitor = IdleMonitor::new(idle_timeout, Instant::now());
            // Initial state is online.
            on_change(PresenceStatus::Active, None);

            loop {
                if monitor.status() == PresenceStatus::Away {
                    // One-shot: nothing to time until input arrives.
                    match activity_rx.recv().await {
                        Some(kind) => {
                            if let Some(status) = monitor.record_activity(Instant::now()) {
                                on_change(status, Some(kind.label()));
                            }
                        }
                        None => break,
                    }
                } else {
                    let sleep = tokio::time::sleep(monitor.remaining(Instant::now()));
                    tokio::pin!(sleep);

                    tokio::select! {
                        report = activity_rx.recv() => match report {
                            Some(_) => {
                                // Re-arm the idle window.
                                monitor.record_activity(Instant::now());
                            }
                            None => break,
                        },
                        _ = &mut sleep => {
                            if let Some(status) = monitor.check_idle(Instant::now()) {
                                on_change(status, None);
                            }
                        }
                    }
                }
            }

            tracing::debug!("presence tracker stopped");
        });

        Self { activity_tx, task }
    }

    /// Report qualifying user input. Never fails; reports after shutdown
    /// are dropped.
    pub fn report(&self, kind: ActivityKind) {
        let _ = self.activity_tx.send(kind);
    }

    /// Stop timing and release the background task.
    pub fn shutdown(self) {
        drop(self.activity_tx.clone());
        self.task.abort();
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_monitor_starts_active() {
        let monitor = IdleMonitor::new(Duration::from_secs(300), Instant::now());
        assert_eq!(monitor.status(), PresenceStatus::Active);
    }

    #[test]
    fn test_monitor_goes_away_after_timeout() {
        let start = Instant::now();
        let mut monitor = IdleMonitor::new(Duration::from_secs(300), start);

        // Just under the window: still active.
        assert_eq!(monitor.check_idle(start + Duration::from_secs(299)), None);
        assert_eq!(monitor.status(), PresenceStatus::Active);

        // At the window: away.
        assert_eq!(
            monitor.check_idle(start + Duration::from_secs(300)),
            Some(PresenceStatus::Away)
        );
        assert_eq!(monitor.status(), PresenceStatus::Away);

        // Away is one-shot; checking again does nothing.
        assert_eq!(monitor.check_idle(start + Duration::from_secs(600)), None);
    }

    #[test]
    fn test_activity_while_away_returns_active_immediately() {
        let start = Instant::now();
        let mut monitor = IdleMonitor::new(Duration::from_secs(300), start);
        monitor.check_idle(start + Duration::from_secs(300));
        assert_eq!(monitor.status(), PresenceStatus::Away);

        let back = monitor.record_activity(start + Duration::from_secs(301));
        assert_eq!(back, Some(PresenceStatus::Active));
        assert_eq!(monitor.status(), PresenceStatus::Active);
    }

    #[test]
    fn test_activity_while_active_rearms_silently() {
        let start = Instant::now();
        let mut monitor = IdleMonitor::new(Duration::from_secs(300), start);

        assert_eq!(monitor.record_activity(start + Duration::from_secs(200)), None);
        // The window restarts from the activity, not from the start.
        assert_eq!(monitor.check_idle(start + Duration::from_secs(400)), None);
        assert_eq!(
            monitor.check_idle(start + Duration::from_secs(500)),
            Some(PresenceStatus::Away)
        );
    }

    #[tokio::test]
    async fn test_tracker_reports_transitions() {
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let transitions_clone = transitions.clone();

        let tracker = PresenceTracker::spawn(Duration::from_millis(20), move |status, _| {
            transitions_clone.lock().unwrap().push(status);
        });

        // Initial online, then idle out.
        tokio::time::sleep(Duration::from_millis(60)).await;
        tracker.report(ActivityKind::KeyDown);
        tokio::time::sleep(Duration::from_millis(10)).await;

        tracker.shutdown();

        let seen = transitions.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                PresenceStatus::Active,
                PresenceStatus::Away,
                PresenceStatus::Active
            ]
        );
    }
}
