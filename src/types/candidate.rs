use serde::{Deserialize, Serialize};

use super::{Profile, UserId};

/// Candidates are identified by the id of the user they show
pub type CandidateId = UserId;

/// A profile presented in discovery for a connect/ignore decision
///
/// Identity is the profile id; a queue holds each id at most once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate {
    pub profile: Profile,
}

impl Candidate {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn id(&self) -> &CandidateId {
        &self.profile.id
    }

    pub fn display_name(&self) -> String {
        self.profile.display_name()
    }

    /// Short one-line summary for list and card subtitles
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(title) = self.profile.title.as_deref().filter(|t| !t.is_empty()) {
            parts.push(title.to_string());
        }
        if let Some(location) = self.profile.location.as_deref().filter(|l| !l.is_empty()) {
            parts.push(location.to_string());
        }
        if !self.profile.skills.is_empty() {
            let shown: Vec<&str> = self.profile.skills.iter().take(3).map(String::as_str).collect();
            parts.push(shown.join(", "));
        }
        parts.join(" · ")
    }
}

impl From<Profile> for Candidate {
    fn from(profile: Profile) -> Self {
        Candidate::new(profile)
    }
}
