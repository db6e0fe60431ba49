//! Dialogue-mode controller for a chat front-end with an appointment wizard.
//!
//! This crate provides the fundamental building blocks:
//! - `DialogueController` - Routes submissions to chat or the wizard
//! - `WizardState` - Server-driven appointment wizard state machine
//! - `EntryStore` - Broadcast + history surface for front-ends
//! - `format_reply` - Bot reply text to layout blocks
//! - Transport and Surface traits

pub mod controller;
pub mod entry;
pub mod entry_store;
pub mod format;
pub mod protocol;
pub mod relay;
pub mod traits;
pub mod wizard;

pub use controller::{AvailabilityScope, DialogueController, SessionId, SubmitOutcome};
pub use entry::{Entry, SurfaceEvent};
pub use entry_store::EntryStore;
pub use format::{Block, format_reply};
pub use relay::Selection;
pub use traits::{OptionKind, Role, SelectOption, Surface, Transport, TransportError};
pub use wizard::{Step, WizardState};
