//! Scripted in-memory backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::watch;

use bitbond::network::error::Result;
use bitbond::{
    ApiError, Backend, Candidate, CandidateId, ChatMessage, MessageId, PendingRequest, Profile,
    ReviewStatus, UserId, Verdict,
};

pub fn profile(id: &str) -> Profile {
    Profile::new(id, id, "")
}

pub fn candidates(ids: &[&str]) -> Vec<Candidate> {
    ids.iter().map(|id| Candidate::new(profile(id))).collect()
}

pub fn request(from: &str) -> PendingRequest {
    PendingRequest {
        id: format!("req-{}", from),
        from: profile(from),
    }
}

pub fn message(id: &str, sender: &str, text: &str, secs: i64) -> ChatMessage {
    ChatMessage {
        id: MessageId::new(id),
        sender_id: UserId::new(sender),
        text: text.to_string(),
        created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        body: "scripted failure".to_string(),
    }
}

#[derive(Default)]
pub struct Calls {
    pub profile: AtomicUsize,
    pub feed: AtomicUsize,
    pub conversation: AtomicUsize,
    pub unread: AtomicUsize,
    pub connections: AtomicUsize,
    pub logout: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct FakeBackend {
    pub calls: Calls,
    pub user: Mutex<Option<Profile>>,
    pub profile_delay: Mutex<Duration>,
    /// Popped per feed call; `None` entries fail, an empty script serves an empty feed
    pub feeds: Mutex<VecDeque<Option<Vec<Candidate>>>>,
    pub failing_intents: Mutex<HashSet<String>>,
    pub intents: Mutex<Vec<(Verdict, CandidateId)>>,
    intent_release: watch::Sender<bool>,
    pub messages: Mutex<Vec<ChatMessage>>,
    pub send_delay: Mutex<Duration>,
    pub fail_sends: Mutex<bool>,
    sent: AtomicUsize,
    pub unread: AtomicU64,
    pub connection_list: Mutex<Vec<Profile>>,
    /// Connections are snapshotted at call time and returned after this delay
    pub connections_delay: Mutex<Duration>,
    pub pending: Mutex<Vec<PendingRequest>>,
    pub reviews: Mutex<Vec<(ReviewStatus, UserId)>>,
    pub fail_reviews: Mutex<bool>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let (intent_release, _rx) = watch::channel(true);
        Self {
            calls: Calls::default(),
            user: Mutex::new(None),
            profile_delay: Mutex::new(Duration::ZERO),
            feeds: Mutex::new(VecDeque::new()),
            failing_intents: Mutex::new(HashSet::new()),
            intents: Mutex::new(Vec::new()),
            intent_release,
            messages: Mutex::new(Vec::new()),
            send_delay: Mutex::new(Duration::ZERO),
            fail_sends: Mutex::new(false),
            sent: AtomicUsize::new(0),
            unread: AtomicU64::new(0),
            connection_list: Mutex::new(Vec::new()),
            connections_delay: Mutex::new(Duration::ZERO),
            pending: Mutex::new(Vec::new()),
            reviews: Mutex::new(Vec::new()),
            fail_reviews: Mutex::new(false),
        }
    }

    pub fn signed_in(user: &str) -> Self {
        let backend = Self::new();
        *backend.user.lock().unwrap() = Some(profile(user));
        backend
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn script_feed(&self, feed: Option<Vec<Candidate>>) {
        self.feeds.lock().unwrap().push_back(feed);
    }

    pub fn fail_intent_for(&self, id: &str) {
        self.failing_intents.lock().unwrap().insert(id.to_string());
    }

    /// Park intent submissions until `release_intents`
    pub fn hold_intents(&self) {
        self.intent_release.send_replace(false);
    }

    pub fn release_intents(&self) {
        self.intent_release.send_replace(true);
    }

    pub fn intent_count(&self) -> usize {
        self.intents.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn current_user(&self) -> Result<Option<Profile>> {
        self.calls.profile.fetch_add(1, Ordering::SeqCst);
        let delay = *self.profile_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.user.lock().unwrap().clone())
    }

    async fn feed(&self) -> Result<Vec<Candidate>> {
        self.calls.feed.fetch_add(1, Ordering::SeqCst);
        match self.feeds.lock().unwrap().pop_front() {
            Some(Some(feed)) => Ok(feed),
            Some(None) => Err(unavailable()),
            None => Ok(Vec::new()),
        }
    }

    async fn send_intent(&self, verdict: Verdict, candidate: &CandidateId) -> Result<()> {
        self.intents.lock().unwrap().push((verdict, candidate.clone()));
        let mut released = self.intent_release.subscribe();
        let _ = released.wait_for(|open| *open).await;
        if self.failing_intents.lock().unwrap().contains(candidate.as_str()) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn connections(&self) -> Result<Vec<Profile>> {
        self.calls.connections.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.connection_list.lock().unwrap().clone();
        let delay = *self.connections_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn received_requests(&self) -> Result<Vec<PendingRequest>> {
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn review_request(&self, status: ReviewStatus, requester: &UserId) -> Result<()> {
        self.reviews.lock().unwrap().push((status, requester.clone()));
        if *self.fail_reviews.lock().unwrap() {
            return Err(unavailable());
        }
        let reviewed = {
            let mut pending = self.pending.lock().unwrap();
            let pos = pending.iter().position(|r| r.requester() == requester);
            pos.map(|pos| pending.remove(pos))
        };
        if let (Some(request), ReviewStatus::Accepted) = (reviewed, status) {
            self.connection_list.lock().unwrap().push(request.from);
        }
        Ok(())
    }

    async fn conversation(&self, _peer: &UserId) -> Result<Vec<ChatMessage>> {
        self.calls.conversation.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn send_message(&self, _peer: &UserId, text: &str) -> Result<ChatMessage> {
        let delay = *self.send_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_sends.lock().unwrap() {
            return Err(unavailable());
        }
        let n = self.sent.fetch_add(1, Ordering::SeqCst);
        let sender = self
            .user
            .lock()
            .unwrap()
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_else(|| UserId::new("nobody"));
        let message = ChatMessage {
            id: MessageId::new(format!("sent-{}", n)),
            sender_id: sender,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn unread_notifications(&self) -> Result<u64> {
        self.calls.unread.fetch_add(1, Ordering::SeqCst);
        Ok(self.unread.load(Ordering::SeqCst))
    }

    async fn logout(&self) -> Result<()> {
        self.calls.logout.fetch_add(1, Ordering::SeqCst);
        *self.user.lock().unwrap() = None;
        Ok(())
    }
}
