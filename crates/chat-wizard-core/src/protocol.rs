//! Wire types for the chat, appointment-step and availability endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields collected by the appointment wizard, as held by the server.
///
/// Values are round-tripped verbatim; the client never inspects them except
/// to read back an accepted `date`.
pub type AppointmentInfo = Map<String, Value>;

/// Availability keyed by date (`YYYY-MM-DD`), each with ordered slot labels.
pub type AvailabilitySet = BTreeMap<String, Vec<String>>;

/// Conversation history as returned by the server.
///
/// Opaque to the client: it is sent back unchanged with every request and
/// replaced wholesale by every successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Value>);

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of exchanges held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no exchange has happened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw entries in server order.
    #[must_use]
    pub fn entries(&self) -> &[Value] {
        &self.0
    }
}

impl From<Vec<Value>> for Transcript {
    fn from(entries: Vec<Value>) -> Self {
        Self(entries)
    }
}

/// Request body for the free chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Transcript,
}

/// Status marker on a chat response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    /// The server detected a booking request; the wizard should start.
    AppointmentIntent,
    /// Ordinary reply (`ok`, `normal_chat` or anything else).
    #[serde(other)]
    Ok,
}

/// Response body from the free chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub conversation_history: Transcript,
    pub status: ChatStatus,
}

/// Request body for the appointment-step endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    pub step: String,
    pub user_input: String,
    pub appointment_info: AppointmentInfo,
    pub conversation_history: Transcript,
}

/// Status marker on a step response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Complete,
    InProgress,
}

/// Response body from the appointment-step endpoint.
///
/// `next_step` stays a raw string here; the controller validates it so a
/// `complete` response carrying an odd step value still decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub reply: String,
    pub conversation_history: Transcript,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default)]
    pub appointment_info: AppointmentInfo,
}

/// Response body from the availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub status: String,
    #[serde(default)]
    pub available_slots: AvailabilitySet,
}

impl AvailabilityResponse {
    /// Status value the server uses for a usable answer.
    pub const SUCCESS: &'static str = "success";

    /// Whether the server reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}
