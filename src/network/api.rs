//! Backend contract consumed by the client core
//!
//! One method per route. Credentials travel implicitly (cookie jar), so no
//! method takes a token. `HttpBackend` implements this against the real
//! REST API; tests substitute scripted fakes.

use async_trait::async_trait;

use super::error::Result;
use crate::types::{
    Candidate, CandidateId, ChatMessage, PendingRequest, Profile, ReviewStatus, UserId, Verdict,
};

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /profile` - `Ok(None)` when the session is not signed in
    async fn current_user(&self) -> Result<Option<Profile>>;

    /// `GET /user/feed`
    async fn feed(&self) -> Result<Vec<Candidate>>;

    /// `POST /request/send/{verdict}/{candidateId}`
    async fn send_intent(&self, verdict: Verdict, candidate: &CandidateId) -> Result<()>;

    /// `GET /user/requests/connections`
    async fn connections(&self) -> Result<Vec<Profile>>;

    /// `GET /user/requests/received`
    async fn received_requests(&self) -> Result<Vec<PendingRequest>>;

    /// `POST /review/send/{status}/{requesterId}`
    async fn review_request(&self, status: ReviewStatus, requester: &UserId) -> Result<()>;

    /// `GET /messages/conversation/{id}`
    async fn conversation(&self, peer: &UserId) -> Result<Vec<ChatMessage>>;

    /// `POST /messages/send/{id}` - returns the stored message
    async fn send_message(&self, peer: &UserId, text: &str) -> Result<ChatMessage>;

    /// `GET /notifications/unread-count`
    async fn unread_notifications(&self) -> Result<u64>;

    /// `POST /auth/logout`
    async fn logout(&self) -> Result<()>;
}
