//! Open conversation: polled history plus optimistic sends
//!
//! Poll results are merged by message id and only ever add messages. The
//! user's draft and messages still in flight are local state the poller
//! never overwrites; a pending send disappears only when the server
//! confirms it (POST response or an echo in a poll result).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::TimeDelta;

use super::poller::{PollHandle, Poller};
use crate::network::{ApiError, Backend};
use crate::types::{
    ChatMessage, DeliveryState, LocalMessageId, MessageId, OutgoingMessage, UserId,
};

/// Server clocks may run this far behind ours and still count as an echo
const ECHO_CLOCK_SKEW: TimeDelta = TimeDelta::seconds(5);

/// One row of the rendered conversation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimelineEntry<'a> {
    Confirmed(&'a ChatMessage),
    Outgoing(&'a OutgoingMessage),
}

#[derive(Debug)]
pub struct Conversation {
    me: UserId,
    peer: UserId,
    // Sorted by created_at
    messages: Vec<ChatMessage>,
    known: HashSet<MessageId>,
    outgoing: Vec<OutgoingMessage>,
    next_local_id: LocalMessageId,
    draft: String,
}

impl Conversation {
    pub fn new(me: UserId, peer: UserId) -> Self {
        Self {
            me,
            peer,
            messages: Vec::new(),
            known: HashSet::new(),
            outgoing: Vec::new(),
            next_local_id: 0,
            draft: String::new(),
        }
    }

    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    /// Merge a fetched page; returns how many messages were new
    pub fn merge_remote(&mut self, fetched: Vec<ChatMessage>) -> usize {
        let mut added = 0;
        for message in fetched {
            if self.known.contains(&message.id) {
                continue;
            }
            if message.is_from(&self.me) {
                self.reconcile_echo(&message);
            }
            self.insert_confirmed(message);
            added += 1;
        }
        added
    }

    // Server echo of something we sent: drop the oldest matching in-flight copy.
    // Older history with the same text is not an echo.
    fn reconcile_echo(&mut self, message: &ChatMessage) {
        if let Some(pos) = self.outgoing.iter().position(|o| {
            o.state == DeliveryState::Sending
                && o.text == message.text
                && message.created_at >= o.created_at - ECHO_CLOCK_SKEW
        }) {
            self.outgoing.remove(pos);
        }
    }

    fn insert_confirmed(&mut self, message: ChatMessage) {
        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.known.insert(message.id.clone());
        self.messages.insert(at, message);
    }

    pub fn begin_send(&mut self, text: &str) -> LocalMessageId {
        let local_id = self.next_local_id;
        self.next_local_id += 1;
        self.outgoing.push(OutgoingMessage::new(local_id, text.to_string()));
        local_id
    }

    pub fn confirm_send(&mut self, local_id: LocalMessageId, message: ChatMessage) {
        self.outgoing.retain(|o| o.local_id != local_id);
        if !self.known.contains(&message.id) {
            self.insert_confirmed(message);
        }
    }

    /// Leave the message visible as failed (no automatic resend)
    pub fn fail_send(&mut self, local_id: LocalMessageId) {
        if let Some(outgoing) = self.outgoing.iter_mut().find(|o| o.local_id == local_id) {
            outgoing.state = DeliveryState::Failed;
        }
    }

    pub fn dismiss_failed(&mut self, local_id: LocalMessageId) {
        self.outgoing
            .retain(|o| !(o.local_id == local_id && o.state == DeliveryState::Failed));
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn outgoing(&self) -> &[OutgoingMessage] {
        &self.outgoing
    }

    /// Confirmed history, then everything still local
    pub fn timeline(&self) -> Vec<TimelineEntry<'_>> {
        self.messages
            .iter()
            .map(TimelineEntry::Confirmed)
            .chain(self.outgoing.iter().map(TimelineEntry::Outgoing))
            .collect()
    }
}

/// A conversation kept current by its own poller
pub struct ConversationSync {
    state: Arc<Mutex<Conversation>>,
    backend: Arc<dyn Backend>,
    poll: PollHandle,
}

impl ConversationSync {
    /// Start polling `peer`'s conversation with a configured poller
    pub fn open(backend: Arc<dyn Backend>, poller: Poller, me: UserId, peer: UserId) -> Self {
        let state = Arc::new(Mutex::new(Conversation::new(me, peer.clone())));

        let fetch_backend = backend.clone();
        let sink = state.clone();
        let poll = poller.start(
            move || {
                let backend = fetch_backend.clone();
                let peer = peer.clone();
                async move { backend.conversation(&peer).await }
            },
            move |fetched: Vec<ChatMessage>| {
                let mut conversation = sink.lock().unwrap_or_else(PoisonError::into_inner);
                let added = conversation.merge_remote(fetched);
                if added > 0 {
                    log::debug!("Messages: {} new from {}", added, conversation.peer());
                }
            },
        );

        Self {
            state,
            backend,
            poll,
        }
    }

    /// Read the conversation under its lock
    pub fn with<R>(&self, f: impl FnOnce(&Conversation) -> R) -> R {
        let conversation = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conversation)
    }

    pub fn set_draft(&self, text: &str) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_draft(text);
    }

    /// Send text optimistically; empty text is ignored
    pub async fn send(&self, text: &str) -> Result<(), ApiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let (local_id, peer) = {
            let mut conversation = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (conversation.begin_send(text), conversation.peer().clone())
        };

        let result = self.backend.send_message(&peer, text).await;

        let mut conversation = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(message) => {
                conversation.confirm_send(local_id, message);
                Ok(())
            }
            Err(e) => {
                log::warn!("Messages: send to {} failed: {}", peer, e);
                conversation.fail_send(local_id);
                Err(e)
            }
        }
    }

    /// Send whatever is in the draft, clearing it
    pub async fn send_draft(&self) -> Result<(), ApiError> {
        let draft = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_draft();
        self.send(&draft).await
    }

    pub fn refresh(&self) {
        self.poll.refresh();
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }

    /// Stop polling (also happens on drop)
    pub fn close(mut self) {
        self.poll.stop();
    }
}
