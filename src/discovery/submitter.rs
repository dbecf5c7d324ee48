//! Intent submission
//!
//! A committed decision becomes exactly one `POST /request/send/...`.
//! `submit` records the decision and spawns the request; it never waits on
//! the network, so the queue can advance immediately. Outcomes:
//! - 2xx: `Sent`
//! - anything else: `Failed`, logged, and abandoned (no retry, no re-queue)
//!
//! The policy sits behind `IntentSink` so a queue-and-retry submitter can
//! replace this one without touching the gesture tracker or the queue.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use crate::network::Backend;
use crate::types::{CandidateId, Decision, SubmissionStatus, Verdict};

/// Settled decisions are broadcast to subscribers; slow ones lag, never block
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

pub trait IntentSink: Send + Sync {
    /// Record a decision and start delivering it
    ///
    /// Must return without waiting on the network. At most one submission
    /// per candidate: repeated calls return the existing decision.
    fn submit(&self, candidate: &CandidateId, verdict: Verdict) -> Decision;

    fn status(&self, candidate: &CandidateId) -> Option<SubmissionStatus>;
}

/// Fire-and-forget submitter (one attempt per decision)
///
/// Must be used from inside a tokio runtime.
pub struct IntentSubmitter {
    backend: Arc<dyn Backend>,
    decisions: Arc<Mutex<HashMap<CandidateId, Decision>>>,
    outcomes: broadcast::Sender<Decision>,
}

impl IntentSubmitter {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (outcomes, _rx) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        Self {
            backend,
            decisions: Arc::new(Mutex::new(HashMap::new())),
            outcomes,
        }
    }

    /// Receive every decision as it reaches `Sent` or `Failed`
    pub fn subscribe(&self) -> broadcast::Receiver<Decision> {
        self.outcomes.subscribe()
    }

    pub fn decision(&self, candidate: &CandidateId) -> Option<Decision> {
        self.decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(candidate)
            .cloned()
    }

    /// Decisions still waiting on the network
    pub fn pending(&self) -> usize {
        self.decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|d| !d.status.is_terminal())
            .count()
    }
}

impl IntentSink for IntentSubmitter {
    fn submit(&self, candidate: &CandidateId, verdict: Verdict) -> Decision {
        let decision = {
            let mut decisions = self.decisions.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = decisions.get(candidate) {
                log::debug!(
                    "Intent: {} already submitted ({:?}), ignoring repeat",
                    candidate,
                    existing.status
                );
                return existing.clone();
            }
            let decision = Decision::new(candidate.clone(), verdict);
            decisions.insert(candidate.clone(), decision.clone());
            decision
        };

        #[cfg(feature = "verbose-network")]
        log::info!("Intent: sending {} for {}", verdict, candidate);

        let backend = self.backend.clone();
        let decisions = self.decisions.clone();
        let outcomes = self.outcomes.clone();
        let candidate = candidate.clone();
        tokio::spawn(async move {
            let status = match backend.send_intent(verdict, &candidate).await {
                Ok(()) => {
                    log::debug!("Intent: {} recorded for {}", verdict, candidate);
                    SubmissionStatus::Sent
                }
                Err(e) if e.is_transient() => {
                    log::warn!("Intent: {} for {} abandoned (network): {}", verdict, candidate, e);
                    SubmissionStatus::Failed
                }
                Err(e) => {
                    log::warn!("Intent: {} for {} rejected: {}", verdict, candidate, e);
                    SubmissionStatus::Failed
                }
            };

            let settled = {
                let mut decisions = decisions.lock().unwrap_or_else(PoisonError::into_inner);
                decisions.get_mut(&candidate).map(|decision| {
                    decision.status = status;
                    decision.clone()
                })
            };
            if let Some(decision) = settled {
                // No subscribers is fine
                let _ = outcomes.send(decision);
            }
        });

        decision
    }

    fn status(&self, candidate: &CandidateId) -> Option<SubmissionStatus> {
        self.decision(candidate).map(|d| d.status)
    }
}
