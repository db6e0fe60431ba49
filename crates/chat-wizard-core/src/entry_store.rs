//! Broadcast + history store of rendered entries.

use std::sync::{PoisonError, RwLock};

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    entry::{Entry, SurfaceEvent},
    traits::{OptionKind, PENDING_ENTRY_ID, Role, SelectOption, Surface},
};

/// Live channel capacity.
const CHANNEL_CAPACITY: usize = 1024;

/// Surface that records entries and broadcasts each change.
///
/// Front-ends subscribe to it; tests read the history back.
pub struct EntryStore {
    history: RwLock<Vec<Entry>>,
    sender: broadcast::Sender<SurfaceEvent>,
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: RwLock::new(Vec::with_capacity(32)),
            sender,
        }
    }

    fn publish(&self, event: SurfaceEvent) {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        let _ = self.sender.send(event.clone()); // live listeners
        event.apply_to(&mut history);
    }

    /// Get a receiver for live updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.sender.subscribe()
    }

    /// Snapshot of the rendered entries.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages only, as `(role, text)` pairs.
    #[must_use]
    pub fn messages(&self) -> Vec<(Role, String)> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Entry::Message { role, text } => Some((role, text)),
                _ => None,
            })
            .collect()
    }

    /// The most recent option set, if any.
    #[must_use]
    pub fn latest_options(&self) -> Option<(OptionKind, Vec<SelectOption>)> {
        self.entries().into_iter().rev().find_map(|e| match e {
            Entry::Options { kind, options, .. } => Some((kind, options)),
            _ => None,
        })
    }

    /// Whether the pending placeholder is currently shown.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(Entry::is_pending)
    }

    /// Stream that yields the history as appends, then live updates.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, SurfaceEvent> {
        // Hold the read lock while subscribing so no event falls between
        // the snapshot and the live receiver.
        let (history, rx) = {
            let guard = self.history.read().unwrap_or_else(PoisonError::into_inner);
            (guard.clone(), self.sender.subscribe())
        };

        let hist = futures::stream::iter(history.into_iter().map(SurfaceEvent::Appended));
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}

impl Surface for EntryStore {
    fn append_message(&self, role: Role, text: &str) {
        self.publish(SurfaceEvent::Appended(Entry::Message {
            role,
            text: text.to_string(),
        }));
    }

    fn append_options(&self, prompt: &str, options: &[SelectOption], kind: OptionKind) {
        self.publish(SurfaceEvent::Appended(Entry::Options {
            prompt: prompt.to_string(),
            kind,
            options: options.to_vec(),
        }));
    }

    fn show_pending(&self) {
        if self.is_pending() {
            return;
        }
        self.publish(SurfaceEvent::Appended(Entry::Pending {
            id: PENDING_ENTRY_ID.to_string(),
        }));
    }

    fn clear_pending(&self) {
        if !self.is_pending() {
            return;
        }
        self.publish(SurfaceEvent::Removed {
            id: PENDING_ENTRY_ID.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_single_and_removable() {
        let store = EntryStore::new();
        store.append_message(Role::User, "hi");
        store.show_pending();
        store.show_pending();
        assert_eq!(store.entries().iter().filter(|e| e.is_pending()).count(), 1);

        store.clear_pending();
        assert!(!store.is_pending());
        assert_eq!(store.entries().len(), 1);

        // Clearing twice is harmless.
        store.clear_pending();
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn test_latest_options_picks_last_set() {
        let store = EntryStore::new();
        store.append_options("dates", &[SelectOption::plain("2024-06-01")], OptionKind::Date);
        store.append_options(
            "times",
            &[SelectOption::plain("09:00"), SelectOption::plain("10:00")],
            OptionKind::Time,
        );

        let (kind, options) = store.latest_options().unwrap();
        assert_eq!(kind, OptionKind::Time);
        assert_eq!(options.len(), 2);
    }

    #[tokio::test]
    async fn test_history_plus_stream_replays_then_follows() {
        let store = EntryStore::new();
        store.append_message(Role::Bot, "welcome");
        store.show_pending();

        let mut stream = store.history_plus_stream();
        store.clear_pending();
        store.append_message(Role::Bot, "reply");

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(stream.next().await.unwrap());
        }

        let mut replayed = Vec::new();
        for event in seen {
            event.apply_to(&mut replayed);
        }
        assert_eq!(replayed, store.entries());
    }

    #[tokio::test]
    async fn test_subscriber_sees_removal() {
        let store = EntryStore::new();
        let mut rx = store.subscribe();
        store.show_pending();
        store.clear_pending();

        assert!(matches!(
            rx.recv().await.unwrap(),
            SurfaceEvent::Appended(Entry::Pending { .. })
        ));
        assert_eq!(
            rx.recv().await.unwrap(),
            SurfaceEvent::Removed {
                id: PENDING_ENTRY_ID.to_string()
            }
        );
    }
}
