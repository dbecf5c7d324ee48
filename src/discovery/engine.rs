//! Discovery engine (the feed screen minus pixels)
//!
//! Flow: session gate resolves → one initial feed fetch fills the queue →
//! a drag past the threshold or a button tap commits a verdict → the
//! submitter records the decision → the queue advances. Everything from
//! reading the current candidate to advancing runs synchronously inside
//! one call; the only awaits are the feed fetches.

use std::sync::Arc;

use thiserror::Error;

use super::gesture::{CardPose, GestureTracker, Offset, Point, Release};
use super::queue::CandidateQueue;
use super::submitter::IntentSink;
use crate::network::{ApiError, Backend};
use crate::session::SessionGate;
use crate::types::{AuthState, Candidate, Decision, Verdict};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Session check has not resolved yet")]
    SessionUnresolved,

    #[error("Not signed in")]
    SignedOut,

    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] ApiError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Feed fetched; number of candidates kept after dedup
    Loaded(usize),
    /// Initial fetch already happened; use `refill()` to fetch again
    AlreadyLoaded,
}

/// What the feed screen should show
#[derive(Debug, PartialEq)]
pub enum FeedView<'a> {
    /// Identity check running: neutral loading state, no redirect
    CheckingSession,
    /// Consumers redirect away from the feed
    SignedOut,
    /// Signed in, first fetch not done yet
    Loading,
    Card {
        candidate: &'a Candidate,
        pose: CardPose,
        remaining: usize,
    },
    /// "No more profiles" - only `refill()` leaves this state
    Exhausted,
}

pub struct DiscoveryEngine {
    gate: SessionGate,
    backend: Arc<dyn Backend>,
    submitter: Arc<dyn IntentSink>,
    queue: CandidateQueue,
    gesture: GestureTracker,
    loaded: bool,
}

impl DiscoveryEngine {
    pub fn new(
        gate: SessionGate,
        backend: Arc<dyn Backend>,
        submitter: Arc<dyn IntentSink>,
        threshold: f32,
    ) -> Self {
        Self {
            gate,
            backend,
            submitter,
            queue: CandidateQueue::new(),
            gesture: GestureTracker::new(threshold),
            loaded: false,
        }
    }

    fn ensure_authenticated(&self) -> Result<(), DiscoveryError> {
        match self.gate.state() {
            AuthState::Checking => Err(DiscoveryError::SessionUnresolved),
            AuthState::Anonymous => Err(DiscoveryError::SignedOut),
            AuthState::Authenticated(_) => Ok(()),
        }
    }

    /// Initial feed fetch - rejected while the session is unresolved
    pub async fn fetch_initial(&mut self) -> Result<LoadOutcome, DiscoveryError> {
        self.ensure_authenticated()?;
        if self.loaded {
            return Ok(LoadOutcome::AlreadyLoaded);
        }
        let kept = self.load().await?;
        Ok(LoadOutcome::Loaded(kept))
    }

    /// Wait for the session check, then do the initial fetch
    pub async fn when_ready(&mut self) -> Result<LoadOutcome, DiscoveryError> {
        match self.gate.resolved().await {
            AuthState::Anonymous => Err(DiscoveryError::SignedOut),
            _ => self.fetch_initial().await,
        }
    }

    /// Explicit user refresh: replace the whole queue, cursor back to 0
    ///
    /// On failure the current queue (usually exhausted) is left as is.
    pub async fn refill(&mut self) -> Result<usize, DiscoveryError> {
        self.ensure_authenticated()?;
        self.load().await
    }

    async fn load(&mut self) -> Result<usize, DiscoveryError> {
        let fetched = match self.backend.feed().await {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!("Discovery: feed fetch failed: {}", e);
                return Err(e.into());
            }
        };
        self.reset_gesture();
        let kept = self.queue.replace(fetched);
        self.loaded = true;
        log::info!("Discovery: {} candidates in queue", kept);
        Ok(kept)
    }

    pub fn view(&self) -> FeedView<'_> {
        match self.gate.state() {
            AuthState::Checking => FeedView::CheckingSession,
            AuthState::Anonymous => FeedView::SignedOut,
            AuthState::Authenticated(_) if !self.loaded => FeedView::Loading,
            AuthState::Authenticated(_) => match self.queue.current() {
                Some(candidate) => FeedView::Card {
                    candidate,
                    pose: self.gesture.pose(),
                    remaining: self.queue.remaining(),
                },
                None => FeedView::Exhausted,
            },
        }
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.queue.current()
    }

    pub fn position(&self) -> usize {
        self.queue.position()
    }

    pub fn is_exhausted(&self) -> bool {
        self.queue.is_exhausted()
    }

    pub fn pointer_down(&mut self, point: Point) {
        if self.queue.current().is_some() {
            self.gesture.on_start(point);
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> Offset {
        self.gesture.on_move(point)
    }

    /// Returns the decision if the release crossed the threshold
    pub fn pointer_up(&mut self) -> Option<Decision> {
        match self.gesture.on_release() {
            Release::Committed(direction) => self.commit(direction.verdict()),
            Release::Reset => None,
        }
    }

    /// Button path ("connect" / "pass"): same commit as a swipe
    pub fn tap(&mut self, verdict: Verdict) -> Option<Decision> {
        self.commit(verdict)
    }

    // Synchronous from read to advance: no await may be added here
    fn commit(&mut self, verdict: Verdict) -> Option<Decision> {
        let candidate_id = self.queue.current()?.id().clone();
        let decision = self.submitter.submit(&candidate_id, verdict);
        self.reset_gesture();
        self.queue.advance();
        Some(decision)
    }

    // Fresh tracker per card so nothing carries over to the next one
    fn reset_gesture(&mut self) {
        self.gesture = GestureTracker::new(self.gesture.threshold());
    }
}
