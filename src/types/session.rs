use super::Profile;

/// Result of the session identity check
///
/// `Checking` is its own state: it must never be read as "signed out".
#[derive(Clone, Debug, PartialEq)]
pub enum AuthState {
    Checking,
    Authenticated(Profile),
    Anonymous,
}

impl AuthState {
    pub fn is_checking(&self) -> bool {
        matches!(self, AuthState::Checking)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthState::Anonymous)
    }

    pub fn user(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}
