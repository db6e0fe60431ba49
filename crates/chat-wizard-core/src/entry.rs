//! Typed transcript entries produced by a surface.

use serde::{Deserialize, Serialize};

use crate::traits::{OptionKind, Role, SelectOption};

/// A rendered transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    /// A user or bot message.
    Message { role: Role, text: String },
    /// A prompt with selectable options.
    Options {
        prompt: String,
        kind: OptionKind,
        options: Vec<SelectOption>,
    },
    /// The "typing" placeholder.
    Pending { id: String },
}

impl Entry {
    /// Whether this is the pending placeholder.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Change to the rendered transcript, as seen by live listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// An entry was appended.
    Appended(Entry),
    /// The entry with this identifier was removed.
    Removed { id: String },
}

impl SurfaceEvent {
    /// Apply this event to a local copy of the transcript.
    pub fn apply_to(self, entries: &mut Vec<Entry>) {
        match self {
            Self::Appended(entry) => entries.push(entry),
            Self::Removed { id } => {
                entries.retain(|e| !matches!(e, Entry::Pending { id: pid } if *pid == id));
            }
        }
    }
}
