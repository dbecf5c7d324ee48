//! Unread notification badge

use std::sync::{Arc, Mutex, PoisonError};

use super::poller::{PollHandle, Poller};
use crate::network::Backend;

pub struct NotificationBadge {
    // None until the first successful poll
    unread: Arc<Mutex<Option<u64>>>,
    poll: PollHandle,
}

impl NotificationBadge {
    pub fn open(backend: Arc<dyn Backend>, poller: Poller) -> Self {
        let unread = Arc::new(Mutex::new(None));
        let sink = unread.clone();
        let poll = poller.start(
            move || {
                let backend = backend.clone();
                async move { backend.unread_notifications().await }
            },
            move |count: u64| {
                let mut unread = sink.lock().unwrap_or_else(PoisonError::into_inner);
                if *unread != Some(count) {
                    log::debug!("Notifications: {} unread", count);
                }
                *unread = Some(count);
            },
        );
        Self { unread, poll }
    }

    pub fn unread(&self) -> Option<u64> {
        *self.unread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Text for the badge; empty when there is nothing to show
    pub fn label(&self) -> String {
        match self.unread() {
            None | Some(0) => String::new(),
            Some(n) if n > 99 => "99+".to_string(),
            Some(n) => n.to_string(),
        }
    }

    pub fn refresh(&self) {
        self.poll.refresh();
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }
}
