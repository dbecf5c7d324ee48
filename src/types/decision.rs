use chrono::{DateTime, Utc};

use super::CandidateId;

/// Outcome of a discovery decision
///
/// Closed set: the backend route only knows these two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Interested,
    Ignored,
}

impl Verdict {
    /// Path segment used by `POST /request/send/{verdict}/{id}`
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Interested => "interested",
            Verdict::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network state of a submitted decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Request in flight (may stay here forever if the request hangs)
    Pending,
    /// Backend answered 2xx
    Sent,
    /// Request failed; abandoned, never retried
    Failed,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

/// One candidate turned into one verdict
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub candidate_id: CandidateId,
    pub verdict: Verdict,
    pub status: SubmissionStatus,
    pub committed_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(candidate_id: CandidateId, verdict: Verdict) -> Self {
        Self {
            candidate_id,
            verdict,
            status: SubmissionStatus::Pending,
            committed_at: Utc::now(),
        }
    }
}
