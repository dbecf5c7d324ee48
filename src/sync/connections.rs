//! Connections and incoming requests
//!
//! Both lists are fetched together on the notification interval. A request
//! being reviewed is hidden from the pending list straight away; a poll
//! that lands mid-review (or that started before the review finished)
//! cannot bring it back. A failed review puts the request back. An accepted
//! requester stays in the connections list until a fetch lists them as a
//! connection; a rejected one is remembered until the server stops listing
//! the request. The two lists come from separate requests, so a fetch can
//! miss an accept in both.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::poller::{PollHandle, Poller};
use crate::network::{ApiError, Backend};
use crate::types::{PendingRequest, Profile, ReviewStatus, UserId};

#[derive(Clone, Debug, PartialEq)]
enum Review {
    InFlight,
    Done { status: ReviewStatus, from: Profile },
}

#[derive(Debug, Default)]
pub struct ConnectionsState {
    connections: Vec<Profile>,
    pending: Vec<PendingRequest>,
    reviews: HashMap<UserId, Review>,
    loaded: bool,
}

impl ConnectionsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_fetch(&mut self, connections: Vec<Profile>, pending: Vec<PendingRequest>) {
        // A finished review is forgotten once the server reflects it
        self.reviews.retain(|requester, review| match review {
            Review::InFlight => true,
            Review::Done {
                status: ReviewStatus::Accepted,
                ..
            } => !connections.iter().any(|p| &p.id == requester),
            Review::Done {
                status: ReviewStatus::Rejected,
                ..
            } => pending.iter().any(|r| r.requester() == requester),
        });

        self.connections = connections;
        for review in self.reviews.values() {
            if let Review::Done {
                status: ReviewStatus::Accepted,
                from,
            } = review
            {
                if !self.connections.iter().any(|p| p.id == from.id) {
                    self.connections.push(from.clone());
                }
            }
        }

        self.pending = pending
            .into_iter()
            .filter(|r| !self.reviews.contains_key(r.requester()))
            .collect();
        self.loaded = true;
    }

    /// Hide the request and mark it in flight; None if unknown or already under review
    pub fn begin_review(&mut self, requester: &UserId) -> Option<PendingRequest> {
        if self.reviews.contains_key(requester) {
            return None;
        }
        let pos = self.pending.iter().position(|r| r.requester() == requester)?;
        self.reviews.insert(requester.clone(), Review::InFlight);
        Some(self.pending.remove(pos))
    }

    pub fn finish_review(&mut self, request: PendingRequest, status: ReviewStatus) {
        if status == ReviewStatus::Accepted
            && !self.connections.iter().any(|p| p.id == request.from.id)
        {
            self.connections.push(request.from.clone());
        }
        self.reviews.insert(
            request.requester().clone(),
            Review::Done {
                status,
                from: request.from,
            },
        );
    }

    pub fn release_review(&mut self, request: PendingRequest) {
        self.reviews.remove(request.requester());
        if !self.pending.iter().any(|r| r.requester() == request.requester()) {
            self.pending.push(request);
        }
    }

    pub fn connections(&self) -> &[Profile] {
        &self.connections
    }

    pub fn pending(&self) -> &[PendingRequest] {
        &self.pending
    }

    pub fn is_reviewing(&self, requester: &UserId) -> bool {
        matches!(self.reviews.get(requester), Some(Review::InFlight))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

pub struct ConnectionsSync {
    state: Arc<Mutex<ConnectionsState>>,
    backend: Arc<dyn Backend>,
    poll: PollHandle,
}

impl ConnectionsSync {
    pub fn open(backend: Arc<dyn Backend>, poller: Poller) -> Self {
        let state = Arc::new(Mutex::new(ConnectionsState::new()));
        let fetch_backend = backend.clone();
        let sink = state.clone();
        let poll = poller.start(
            move || {
                let backend = fetch_backend.clone();
                async move {
                    futures::future::try_join(backend.connections(), backend.received_requests())
                        .await
                }
            },
            move |(connections, pending): (Vec<Profile>, Vec<PendingRequest>)| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply_fetch(connections, pending);
            },
        );
        Self {
            state,
            backend,
            poll,
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&ConnectionsState) -> R) -> R {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn connections(&self) -> Vec<Profile> {
        self.with(|s| s.connections().to_vec())
    }

    pub fn pending(&self) -> Vec<PendingRequest> {
        self.with(|s| s.pending().to_vec())
    }

    /// Accept or reject a request; `Ok(false)` if it was not pending
    pub async fn review(&self, requester: &UserId, status: ReviewStatus) -> Result<bool, ApiError> {
        let request = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match state.begin_review(requester) {
                Some(request) => request,
                None => return Ok(false),
            }
        };

        let result = self.backend.review_request(status, requester).await;

        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &result {
                Ok(()) => state.finish_review(request, status),
                Err(e) => {
                    log::warn!("Connections: {} review of {} failed: {}", status, requester, e);
                    state.release_review(request);
                }
            }
        }

        result?;
        log::info!("Connections: request from {} {}", requester, status);
        self.poll.refresh();
        Ok(true)
    }

    pub fn refresh(&self) {
        self.poll.refresh();
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }
}
