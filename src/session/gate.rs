//! Session gate
//!
//! Holds the process-wide `AuthState`. Starts in `Checking`, moves exactly
//! once to `Authenticated` or `Anonymous` per gate instance; only the layer
//! above (explicit sign-in/sign-out) changes it again. Consumers watch the
//! state and decide for themselves what a resolution means (fetch, redirect,
//! stop polling) - the gate never acts on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::network::Backend;
use crate::types::{AuthState, Profile};

/// What a protected screen should do right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    /// Identity check still running: show a neutral loading state, no redirect
    Wait,
    Allow,
    RedirectToLogin,
}

#[derive(Clone)]
pub struct SessionGate {
    state: Arc<watch::Sender<AuthState>>,
    // Set by the first resolve() so concurrent callers don't issue a second check
    check_started: Arc<AtomicBool>,
}

impl SessionGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Checking);
        Self {
            state: Arc::new(tx),
            check_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Gate for a user already known from this session (e.g. just signed in)
    ///
    /// Resolves immediately; `resolve()` will not hit the network.
    pub fn with_known_user(user: Profile) -> Self {
        let gate = Self::new();
        gate.check_started.store(true, Ordering::SeqCst);
        gate.state.send_replace(AuthState::Authenticated(user));
        gate
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn route_guard(&self) -> RouteGuard {
        match &*self.state.borrow() {
            AuthState::Checking => RouteGuard::Wait,
            AuthState::Authenticated(_) => RouteGuard::Allow,
            AuthState::Anonymous => RouteGuard::RedirectToLogin,
        }
    }

    /// Run the identity check (`GET /profile`) unless it already ran
    ///
    /// Any failure resolves to `Anonymous`: not being signed in is a valid
    /// outcome, not an error.
    pub async fn resolve(&self, backend: &dyn Backend) -> AuthState {
        if self.check_started.swap(true, Ordering::SeqCst) {
            return self.resolved().await;
        }

        let resolved = match backend.current_user().await {
            Ok(Some(user)) => {
                log::info!("Session: signed in as {}", user.display_name());
                AuthState::Authenticated(user)
            }
            Ok(None) => {
                log::info!("Session: not signed in");
                AuthState::Anonymous
            }
            Err(e) => {
                log::warn!("Session: identity check failed, treating as signed out: {}", e);
                AuthState::Anonymous
            }
        };

        // A sign-in/out that raced the check wins over the check result
        self.state.send_if_modified(|state| {
            if state.is_checking() {
                *state = resolved;
                true
            } else {
                false
            }
        });
        self.state()
    }

    /// Wait until the state is no longer `Checking`
    pub async fn resolved(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        // The sender lives in self, so wait_for can only fail if it is dropped
        let state = match rx.wait_for(|state| !state.is_checking()).await {
            Ok(state) => state.clone(),
            Err(_) => AuthState::Anonymous,
        };
        state
    }

    /// Higher-layer transition after an explicit sign-in
    pub fn sign_in(&self, user: Profile) {
        self.check_started.store(true, Ordering::SeqCst);
        self.state.send_replace(AuthState::Authenticated(user));
    }

    /// Higher-layer transition after an explicit sign-out
    pub fn sign_out(&self) {
        self.check_started.store(true, Ordering::SeqCst);
        self.state.send_replace(AuthState::Anonymous);
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checking_is_not_anonymous() {
        let gate = SessionGate::new();
        assert!(gate.state().is_checking());
        assert!(!gate.state().is_anonymous());
        assert_eq!(gate.route_guard(), RouteGuard::Wait);
    }

    #[test]
    fn test_known_user_resolves_immediately() {
        let gate = SessionGate::with_known_user(Profile::new("me", "Lin", "Park"));
        assert!(gate.state().is_authenticated());
        assert_eq!(gate.route_guard(), RouteGuard::Allow);
    }

    #[tokio::test]
    async fn test_resolved_waits_for_sign_in() {
        let gate = SessionGate::new();
        let (state, ()) = tokio::join!(gate.resolved(), async {
            tokio::task::yield_now().await;
            gate.sign_in(Profile::new("me", "Lin", "Park"));
        });
        assert!(state.is_authenticated());
    }

    #[test]
    fn test_sign_out_redirects() {
        let gate = SessionGate::with_known_user(Profile::new("me", "Lin", "Park"));
        let rx = gate.subscribe();
        gate.sign_out();
        assert_eq!(gate.route_guard(), RouteGuard::RedirectToLogin);
        assert!(rx.borrow().is_anonymous());
    }
}
