//! REST backend over reqwest
//!
//! Session credentials are cookies: the client keeps a jar for the whole
//! process, so every route below carries the session without passing a
//! token. An externally obtained session cookie can be seeded into the jar.
//!
//! Response envelopes as served by the backend:
//! - lists: `{"data": [...]}` (missing `data` = empty list)
//! - received requests: `{"pending requests": [...]}`
//! - single records: `{"data": {...}}` or the bare record

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::api::Backend;
use super::error::{ApiError, Result};
use crate::types::{
    Candidate, CandidateId, ChatMessage, PendingRequest, Profile, ReviewStatus, UserId, Verdict,
};

/// Connect timeout only - requests themselves have no deadline
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ListEnvelope<T> {
    data: Option<Vec<T>>,
}

#[derive(Deserialize)]
struct ReceivedEnvelope {
    #[serde(rename = "pending requests", default)]
    pending: Vec<PendingRequest>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordBody<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> RecordBody<T> {
    fn into_inner(self) -> T {
        match self {
            RecordBody::Wrapped { data } => data,
            RecordBody::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
struct UnreadCount {
    #[serde(alias = "unreadCount")]
    count: u64,
}

pub(crate) fn parse_list<T: DeserializeOwned>(bytes: &[u8]) -> Result<Vec<T>> {
    let envelope: ListEnvelope<T> = serde_json::from_slice(bytes)?;
    Ok(envelope.data.unwrap_or_default())
}

pub(crate) fn parse_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let body: RecordBody<T> = serde_json::from_slice(bytes)?;
    Ok(body.into_inner())
}

pub(crate) fn parse_received(bytes: &[u8]) -> Result<Vec<PendingRequest>> {
    let envelope: ReceivedEnvelope = serde_json::from_slice(bytes)?;
    Ok(envelope.pending)
}

pub(crate) fn parse_unread(bytes: &[u8]) -> Result<u64> {
    let body: UnreadCount = parse_record(bytes)?;
    Ok(body.count)
}

/// Backend client for the bitBond REST API
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        // Validate once so every later format!() produces a usable URL
        Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            jar,
        })
    }

    /// Seed the jar with a `name=value` session cookie obtained elsewhere
    pub fn with_session_cookie(self, cookie: &str) -> Result<Self> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;
        self.jar.add_cookie_str(cookie, &url);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", path);
        let response = self.client.get(self.url(path)).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn post_bytes(&self, path: &str, body: Option<serde_json::Value>) -> Result<Vec<u8>> {
        log::debug!("POST {}", path);
        // Empty JSON object when there is nothing to send (the routes expect a JSON body)
        let body = body.unwrap_or_else(|| serde_json::json!({}));
        let response = self.client.post(self.url(path)).json(&body).send().await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::Unauthorized)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn current_user(&self) -> Result<Option<Profile>> {
        match self.get_bytes("/profile").await {
            Ok(bytes) => Ok(Some(parse_record(&bytes)?)),
            Err(ApiError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn feed(&self) -> Result<Vec<Candidate>> {
        let bytes = self.get_bytes("/user/feed").await?;
        parse_list(&bytes)
    }

    async fn send_intent(&self, verdict: Verdict, candidate: &CandidateId) -> Result<()> {
        let path = format!("/request/send/{}/{}", verdict.as_str(), candidate);
        self.post_bytes(&path, None).await?;
        Ok(())
    }

    async fn connections(&self) -> Result<Vec<Profile>> {
        let bytes = self.get_bytes("/user/requests/connections").await?;
        parse_list(&bytes)
    }

    async fn received_requests(&self) -> Result<Vec<PendingRequest>> {
        let bytes = self.get_bytes("/user/requests/received").await?;
        parse_received(&bytes)
    }

    async fn review_request(&self, status: ReviewStatus, requester: &UserId) -> Result<()> {
        let path = format!("/review/send/{}/{}", status.as_str(), requester);
        self.post_bytes(&path, None).await?;
        Ok(())
    }

    async fn conversation(&self, peer: &UserId) -> Result<Vec<ChatMessage>> {
        let bytes = self.get_bytes(&format!("/messages/conversation/{}", peer)).await?;
        parse_list(&bytes)
    }

    async fn send_message(&self, peer: &UserId, text: &str) -> Result<ChatMessage> {
        let body = serde_json::json!({ "text": text });
        let bytes = self
            .post_bytes(&format!("/messages/send/{}", peer), Some(body))
            .await?;
        if bytes.is_empty() {
            return Err(ApiError::MissingData("sent message"));
        }
        parse_record(&bytes)
    }

    async fn unread_notifications(&self) -> Result<u64> {
        let bytes = self.get_bytes("/notifications/unread-count").await?;
        parse_unread(&bytes)
    }

    async fn logout(&self) -> Result<()> {
        self.post_bytes("/auth/logout", None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_envelope_missing_data_is_empty() {
        let feed: Vec<Candidate> = parse_list(br#"{"message": "ok"}"#).unwrap();
        assert!(feed.is_empty());

        let feed: Vec<Candidate> =
            parse_list(br#"{"data": [{"_id": "a", "firstName": "Ann"}, {"_id": "b"}]}"#).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].display_name(), "Ann");
    }

    #[test]
    fn test_received_requests_envelope() {
        let body = br#"{
            "message": "Data fetched successfully",
            "pending requests": [
                {"_id": "req1", "status": "interested", "fromUserId": {"_id": "u7", "firstName": "Grace"}}
            ]
        }"#;
        let pending = parse_received(body).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "req1");
        assert_eq!(pending[0].requester().as_str(), "u7");
    }

    #[test]
    fn test_record_wrapped_or_bare() {
        let wrapped: Profile = parse_record(br#"{"data": {"_id": "me", "firstName": "Lin"}}"#).unwrap();
        let bare: Profile = parse_record(br#"{"_id": "me", "firstName": "Lin"}"#).unwrap();
        assert_eq!(wrapped, bare);
    }

    #[test]
    fn test_unread_count_shapes() {
        assert_eq!(parse_unread(br#"{"count": 4}"#).unwrap(), 4);
        assert_eq!(parse_unread(br#"{"unreadCount": 2}"#).unwrap(), 2);
        assert_eq!(parse_unread(br#"{"data": {"count": 9}}"#).unwrap(), 9);
        assert!(parse_unread(br#"{"total": 1}"#).is_err());
    }

    #[test]
    fn test_message_record() {
        let msg: ChatMessage = parse_record(
            br#"{"data": {"_id": "m1", "senderId": "u1", "text": "hi", "createdAt": "2026-01-02T03:04:05Z"}}"#,
        )
        .unwrap();
        assert_eq!(msg.id.as_str(), "m1");
        assert!(msg.is_from(&UserId::new("u1")));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpBackend::new("not a url"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        let backend = HttpBackend::new("http://localhost:3000/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:3000");
        assert_eq!(backend.url("/user/feed"), "http://localhost:3000/user/feed");
    }
}
