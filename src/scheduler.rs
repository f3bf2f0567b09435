//! Refresh scheduling
//!
//! One background task owns both refresh triggers: a fixed interval and
//! "focus" signals sent when the SPA regains window focus or after a write.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub trait RefreshListener: Send + Sync + 'static {
    fn on_tick(&self) -> impl Future<Output = ()> + Send;
    fn on_focus(&self) -> impl Future<Output = ()> + Send;
}

pub struct RefreshScheduler {
    interval: Duration,
    focus: Arc<Notify>,
}

/// Cloneable trigger for focus refreshes
#[derive(Debug, Clone)]
pub struct FocusHandle {
    focus: Arc<Notify>,
}

impl FocusHandle {
    /// Request a refresh. Signals arriving while one is running coalesce
    /// into a single follow-up refresh.
    pub fn signal(&self) {
        self.focus.notify_one();
    }
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> (Self, FocusHandle) {
        let focus = Arc::new(Notify::new());
        (
            Self {
                interval,
                focus: focus.clone(),
            },
            FocusHandle { focus },
        )
    }

    /// Start the loop with its single listener. The first tick fires
    /// immediately, which performs the initial load.
    pub fn spawn<L: RefreshListener>(self, listener: L) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => listener.on_tick().await,
                    _ = self.focus.notified() => {
                        listener.on_focus().await;
                        ticker.reset();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct Recorder {
        events: mpsc::UnboundedSender<&'static str>,
    }

    impl RefreshListener for Recorder {
        async fn on_tick(&self) {
            let _ = self.events.send("tick");
        }

        async fn on_focus(&self) {
            let _ = self.events.send("focus");
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<&'static str>) -> &'static str {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("listener event")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (scheduler, _focus) = RefreshScheduler::new(Duration::from_secs(3600));
        let handle = scheduler.spawn(Recorder { events: tx });

        assert_eq!(next(&mut rx).await, "tick");
        handle.abort();
    }

    #[tokio::test]
    async fn test_focus_signal_reaches_listener() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (scheduler, focus) = RefreshScheduler::new(Duration::from_secs(3600));
        let handle = scheduler.spawn(Recorder { events: tx });

        assert_eq!(next(&mut rx).await, "tick");
        focus.signal();
        assert_eq!(next(&mut rx).await, "focus");
        handle.abort();
    }

    #[tokio::test]
    async fn test_interval_keeps_ticking() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (scheduler, _focus) = RefreshScheduler::new(Duration::from_millis(10));
        let handle = scheduler.spawn(Recorder { events: tx });

        for _ in 0..3 {
            assert_eq!(next(&mut rx).await, "tick");
        }
        handle.abort();
    }

    /// Holds each focus refresh open until the test releases it.
    struct GatedRecorder {
        events: mpsc::UnboundedSender<&'static str>,
        gate: Arc<Notify>,
    }

    impl RefreshListener for GatedRecorder {
        async fn on_tick(&self) {
            let _ = self.events.send("tick");
        }

        async fn on_focus(&self) {
            let _ = self.events.send("focus");
            self.gate.notified().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_signals_during_refresh_coalesce() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Notify::new());
        let (scheduler, focus) = RefreshScheduler::new(Duration::from_secs(3600));
        let handle = scheduler.spawn(GatedRecorder {
            events: tx,
            gate: gate.clone(),
        });

        assert_eq!(next(&mut rx).await, "tick");
        focus.signal();
        assert_eq!(next(&mut rx).await, "focus");

        // The listener is still inside the first focus refresh.
        for _ in 0..5 {
            focus.signal();
        }
        gate.notify_one();
        assert_eq!(next(&mut rx).await, "focus");
        gate.notify_one();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_refresh_resets_interval() {
        let start = tokio::time::Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (scheduler, focus) = RefreshScheduler::new(Duration::from_secs(10));
        let handle = scheduler.spawn(Recorder { events: tx });

        assert_eq!(next(&mut rx).await, "tick");
        tokio::time::sleep(Duration::from_secs(6)).await;
        focus.signal();
        assert_eq!(next(&mut rx).await, "focus");

        // No tick at the original 10s mark.
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(rx.try_recv().is_err());

        assert_eq!(next(&mut rx).await, "tick");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(16), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(17), "{:?}", elapsed);
        handle.abort();
    }
}
