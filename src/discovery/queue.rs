//! Candidate queue
//!
//! Ordered candidates plus a cursor. The cursor only moves forward; when it
//! reaches the end the queue is exhausted and stays that way until the
//! whole queue is replaced. Every candidate the cursor moves past counts as
//! decided for the rest of the session, and replacements never bring a
//! decided candidate back.

use std::collections::HashSet;

use crate::types::{Candidate, CandidateId};

#[derive(Debug, Default)]
pub struct CandidateQueue {
    candidates: Vec<Candidate>,
    cursor: usize,
    decided: HashSet<CandidateId>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue with a fresh fetch and rewind the cursor
    ///
    /// Drops duplicates within the batch and anything already decided.
    /// Returns how many candidates were kept.
    pub fn replace(&mut self, fetched: Vec<Candidate>) -> usize {
        let mut seen: HashSet<CandidateId> = HashSet::with_capacity(fetched.len());
        let fetched_len = fetched.len();
        self.candidates = fetched
            .into_iter()
            .filter(|c| !self.decided.contains(c.id()) && seen.insert(c.id().clone()))
            .collect();
        self.cursor = 0;

        let dropped = fetched_len - self.candidates.len();
        if dropped > 0 {
            log::debug!("Queue: dropped {} duplicate or already decided candidates", dropped);
        }
        self.candidates.len()
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.cursor)
    }

    /// Move past the current candidate and return it
    ///
    /// Panics when exhausted: callers must check `current()` first.
    pub fn advance(&mut self) -> Candidate {
        assert!(
            !self.is_exhausted(),
            "advance() on an exhausted candidate queue (cursor {} of {})",
            self.cursor,
            self.candidates.len()
        );
        let candidate = self.candidates[self.cursor].clone();
        self.decided.insert(candidate.id().clone());
        self.cursor += 1;
        candidate
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.candidates.len()
    }

    /// Cursor position (index of the current candidate)
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len() - self.cursor
    }

    pub fn has_decided(&self, id: &CandidateId) -> bool {
        self.decided.contains(id)
    }
}
