use serde::{Deserialize, Serialize};

use super::{Profile, UserId};

/// Answer to an incoming connection request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Accepted,
    Rejected,
}

impl ReviewStatus {
    /// Path segment used by `POST /review/send/{status}/{id}`
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incoming connection request waiting for review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "fromUserId")]
    pub from: Profile,
}

impl PendingRequest {
    /// Reviews are addressed by the requesting user's id
    pub fn requester(&self) -> &UserId {
        &self.from.id
    }
}
