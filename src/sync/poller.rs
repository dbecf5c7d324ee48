//! Interval poller for live surfaces
//!
//! Each surface (open conversation, notification badge, connections list)
//! owns one `PollHandle`. The handle drives a timer task that starts a
//! fetch per tick and hands results to the surface's apply function.
//!
//! Rules:
//! - A cycle is skipped if the previous one started or landed less than the
//!   guard window ago (a manual refresh colliding with a tick is one fetch).
//! - Results apply in completion order. A cycle that lands after a newer
//!   cycle's result was applied is stale and dropped.
//! - In-flight requests are never cancelled; after stop they finish and
//!   their result is discarded.
//! - Bound to a session: no fetch while the check runs, stop on sign-out.
//! - Dropping the handle stops the timer.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::network::ApiError;
use crate::types::AuthState;

/// Cycle bookkeeping for one surface
#[derive(Debug, Default)]
struct CycleClock {
    next_seq: u64,
    newest_applied: Option<u64>,
    last_started: Option<Instant>,
    last_fetched_at: Option<Instant>,
}

impl CycleClock {
    /// Sequence number for a new cycle, or None if inside the guard window
    fn begin(&mut self, now: Instant, guard: Duration) -> Option<u64> {
        let latest = self.last_started.max(self.last_fetched_at);
        if let Some(latest) = latest {
            if now.saturating_duration_since(latest) < guard {
                return None;
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.last_started = Some(now);
        Some(seq)
    }

    /// Record an arrival - true if a successful result should be applied
    fn land(&mut self, seq: u64, now: Instant, succeeded: bool) -> bool {
        self.last_fetched_at = Some(now);
        if !succeeded {
            return false;
        }
        match self.newest_applied {
            Some(newest) if seq < newest => false,
            _ => {
                self.newest_applied = Some(seq);
                true
            }
        }
    }
}

struct PollShared {
    surface: &'static str,
    stopped: AtomicBool,
    clock: Mutex<CycleClock>,
}

impl PollShared {
    fn begin(&self, guard: Duration) -> Option<u64> {
        if self.is_stopped() {
            return None;
        }
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        clock.begin(Instant::now(), guard)
    }

    fn land<T>(&self, seq: u64, result: Result<T, ApiError>, apply: &(dyn Fn(T) + Send + Sync)) {
        // Held through apply: results reach the surface one at a time, in order
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_stopped() {
            log::debug!("Poll[{}]: cycle {} landed after stop, discarded", self.surface, seq);
            return;
        }
        match result {
            Ok(value) => {
                if clock.land(seq, Instant::now(), true) {
                    apply(value);
                } else {
                    log::debug!("Poll[{}]: cycle {} superseded, dropped", self.surface, seq);
                }
            }
            Err(e) => {
                clock.land(seq, Instant::now(), false);
                if e.is_transient() {
                    log::warn!(
                        "Poll[{}]: cycle {} failed, waiting for next tick: {}",
                        self.surface,
                        seq,
                        e
                    );
                } else {
                    log::warn!("Poll[{}]: cycle {} rejected by server: {}", self.surface, seq, e);
                }
            }
        }
    }

    fn stop(&self) {
        let _clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Poller configuration (builder)
pub struct Poller {
    surface: &'static str,
    interval: Duration,
    guard: Duration,
    session: Option<watch::Receiver<AuthState>>,
}

impl Poller {
    pub fn new(surface: &'static str, interval: Duration) -> Self {
        Self {
            surface,
            interval,
            guard: Duration::from_millis(crate::POLL_GUARD_WINDOW_MS).min(interval),
            session: None,
        }
    }

    pub fn guard_window(mut self, guard: Duration) -> Self {
        self.guard = guard;
        self
    }

    /// Only fetch while signed in; stop for good on sign-out
    pub fn bind_session(mut self, session: watch::Receiver<AuthState>) -> Self {
        self.session = Some(session);
        self
    }

    /// Start ticking; the first tick fires immediately
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start<T, F, Fut, A>(self, fetch: F, apply: A) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        A: Fn(T) + Send + Sync + 'static,
    {
        let shared = Arc::new(PollShared {
            surface: self.surface,
            stopped: AtomicBool::new(false),
            clock: Mutex::new(CycleClock::default()),
        });
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        log::info!(
            "Poll[{}]: every {} ms (guard {} ms)",
            self.surface,
            self.interval.as_millis(),
            self.guard.as_millis()
        );

        let task = tokio::spawn(drive(
            shared.clone(),
            self.interval,
            self.guard,
            self.session,
            refresh_rx,
            Arc::new(fetch),
            Arc::new(apply),
        ));

        PollHandle {
            shared,
            refresh: refresh_tx,
            task: Some(task),
        }
    }
}

/// Resolves when the session changes; false if the gate is gone
async fn session_changed(session: &mut Option<watch::Receiver<AuthState>>) -> bool {
    match session {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

async fn drive<T, F, Fut, A>(
    shared: Arc<PollShared>,
    interval: Duration,
    guard: Duration,
    mut session: Option<watch::Receiver<AuthState>>,
    mut refresh_rx: mpsc::UnboundedReceiver<()>,
    fetch: Arc<F>,
    apply: Arc<A>,
) where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    A: Fn(T) + Send + Sync + 'static,
{
    let surface = shared.surface;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let reason = tokio::select! {
            _ = ticker.tick() => "tick",
            request = refresh_rx.recv() => {
                if request.is_none() {
                    break;
                }
                "refresh"
            }
            alive = session_changed(&mut session) => {
                if !alive {
                    break;
                }
                "session"
            }
        };

        let state = session.as_ref().map(|rx| rx.borrow().clone());
        match state {
            Some(AuthState::Anonymous) => {
                log::info!("Poll[{}]: signed out, stopping", surface);
                break;
            }
            Some(AuthState::Checking) => continue,
            _ => {}
        }

        let Some(seq) = shared.begin(guard) else {
            log::debug!("Poll[{}]: {} inside guard window, skipped", surface, reason);
            continue;
        };

        #[cfg(feature = "verbose-network")]
        log::info!("Poll[{}]: cycle {} ({})", surface, seq, reason);

        let fetch = fetch.clone();
        let apply = apply.clone();
        let shared = shared.clone();
        tokio::spawn(async move {
            let result = (*fetch)().await;
            shared.land(seq, result, &*apply);
        });
    }

    shared.stop();
}

/// Owner's handle on a running poller - stops on drop
pub struct PollHandle {
    shared: Arc<PollShared>,
    refresh: mpsc::UnboundedSender<()>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Manual refresh (still subject to the guard window)
    pub fn refresh(&self) {
        let _ = self.refresh.send(());
    }

    pub fn stop(&mut self) {
        self.shared.stop();
        if let Some(task) = self.task.take() {
            task.abort();
            log::debug!("Poll[{}]: stopped", self.shared.surface);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.shared.is_stopped() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
