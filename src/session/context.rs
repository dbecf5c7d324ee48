//! Shared application state
//!
//! Everything the surfaces need (config, backend, session gate) lives here
//! and is handed to constructors explicitly. Cloning is cheap.

use std::sync::Arc;
use std::time::Duration;

use super::gate::SessionGate;
use crate::config::Config;
use crate::discovery::{DiscoveryEngine, IntentSubmitter};
use crate::network::{ApiError, Backend, HttpBackend};
use crate::sync::{ConnectionsSync, ConversationSync, NotificationBadge, Poller};
use crate::types::{AuthState, UserId};

#[derive(Clone)]
pub struct AppContext {
    config: Arc<Config>,
    backend: Arc<dyn Backend>,
    gate: SessionGate,
}

impl AppContext {
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            gate: SessionGate::new(),
        }
    }

    /// Context backed by the real REST API
    pub fn http(config: Config) -> Result<Self, ApiError> {
        let mut backend = HttpBackend::new(&config.api_base_url)?;
        if let Some(cookie) = config.session_cookie.as_deref() {
            backend = backend.with_session_cookie(cookie)?;
        }
        log::info!("Context: API at {}", backend.base_url());
        Ok(Self::new(config, Arc::new(backend)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    /// Run the one-shot identity check
    pub async fn resolve_session(&self) -> AuthState {
        self.gate.resolve(self.backend.as_ref()).await
    }

    /// Log out server side, then drop to `Anonymous` regardless of the outcome
    ///
    /// Every poller bound to this context's session stops.
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let result = self.backend.logout().await;
        if let Err(e) = &result {
            log::warn!("Context: logout request failed: {}", e);
        }
        self.gate.sign_out();
        result
    }

    /// Discovery engine with a fresh fire-and-forget submitter
    ///
    /// The submitter is returned too so callers can subscribe to outcomes.
    pub fn discovery_engine(&self) -> (DiscoveryEngine, Arc<IntentSubmitter>) {
        let submitter = Arc::new(IntentSubmitter::new(self.backend.clone()));
        let engine = DiscoveryEngine::new(
            self.gate.clone(),
            self.backend.clone(),
            submitter.clone(),
            self.config.swipe_threshold,
        );
        (engine, submitter)
    }

    /// Open a polled conversation; None unless signed in
    pub fn open_conversation(&self, peer: UserId) -> Option<ConversationSync> {
        let me = self.gate.state().user()?.id.clone();
        let poller = self.poller("messages", self.config.message_poll_interval);
        Some(ConversationSync::open(self.backend.clone(), poller, me, peer))
    }

    pub fn notifications(&self) -> NotificationBadge {
        let poller = self.poller("notifications", self.config.notification_poll_interval);
        NotificationBadge::open(self.backend.clone(), poller)
    }

    pub fn connections(&self) -> ConnectionsSync {
        let poller = self.poller("connections", self.config.notification_poll_interval);
        ConnectionsSync::open(self.backend.clone(), poller)
    }

    // Every surface stops when the session ends
    fn poller(&self, surface: &'static str, interval: Duration) -> Poller {
        Poller::new(surface, interval)
            .guard_window(self.config.poll_guard_window)
            .bind_session(self.gate.subscribe())
    }
}
