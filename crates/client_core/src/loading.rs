//! Busy indicator shared by every long-running operation of one controller.
//!
//! Operations hold a [`LoadingGuard`] for their duration. Nested operations push
//! their own message on top; `busy` stays set until the last guard is dropped,
//! so the indicator never flickers between a save and its follow-up refresh.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use tokio::sync::broadcast;
use tracing::debug;

use crate::{events::ListEvent, lock};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub busy: bool,
    pub message: String,
}

pub struct LoadingCoordinator {
    active: Mutex<Vec<(u64, String)>>,
    next_ticket: AtomicU64,
    events: broadcast::Sender<ListEvent>,
}

impl LoadingCoordinator {
    pub fn new(events: broadcast::Sender<ListEvent>) -> Self {
        Self {
            active: Mutex::new(Vec::new()),
            next_ticket: AtomicU64::new(1),
            events,
        }
    }

    pub fn begin(&self, message: impl Into<String>) -> LoadingGuard<'_> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let message = message.into();
        debug!(ticket, %message, "loading: begin");
        let snapshot = {
            let mut active = lock(&self.active);
            active.push((ticket, message));
            snapshot_of(&active)
        };
        let _ = self.events.send(ListEvent::Loading(snapshot));
        LoadingGuard {
            coordinator: self,
            ticket,
        }
    }

    pub fn state(&self) -> LoadingState {
        snapshot_of(&lock(&self.active))
    }

    fn end(&self, ticket: u64) {
        let snapshot = {
            let mut active = lock(&self.active);
            active.retain(|(held, _)| *held != ticket);
            snapshot_of(&active)
        };
        debug!(ticket, busy = snapshot.busy, "loading: end");
        let _ = self.events.send(ListEvent::Loading(snapshot));
    }
}

fn snapshot_of(active: &[(u64, String)]) -> LoadingState {
    match active.last() {
        Some((_, message)) => LoadingState {
            busy: true,
            message: message.clone(),
        },
        None => LoadingState::default(),
    }
}

#[must_use = "the operation ends as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
    coordinator: &'a LoadingCoordinator,
    ticket: u64,
}

impl LoadingGuard<'_> {
    /// Replaces this operation's message without releasing the indicator.
    pub fn update(&self, message: impl Into<String>) {
        let message = message.into();
        let snapshot = {
            let mut active = lock(&self.coordinator.active);
            if let Some(entry) = active.iter_mut().find(|(held, _)| *held == self.ticket) {
                entry.1 = message;
            }
            snapshot_of(&active)
        };
        let _ = self.coordinator.events.send(ListEvent::Loading(snapshot));
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.end(self.ticket);
    }
}

#[cfg(test)]
#[path = "tests/loading_tests.rs"]
mod tests;
