//! Seams between the controller and its collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{
    AvailabilityResponse, ChatRequest, ChatResponse, StepRequest, StepResponse,
};

/// Transport failure.
///
/// Every variant is handled the same way by the controller; the split only
/// exists for logging.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server returned status {status}")]
    Status { status: u16 },
    #[error("Invalid response body: {0}")]
    Decode(String),
    #[error("Availability query answered with status '{0}'")]
    Rejected(String),
}

/// Trait for the remote operations the controller calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a free chat message.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;

    /// Send one appointment wizard step.
    async fn appointment_step(&self, request: &StepRequest)
    -> Result<StepResponse, TransportError>;

    /// Query open appointment slots.
    async fn availability(&self) -> Result<AvailabilityResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        (**self).chat(request).await
    }

    async fn appointment_step(
        &self,
        request: &StepRequest,
    ) -> Result<StepResponse, TransportError> {
        (**self).appointment_step(request).await
    }

    async fn availability(&self) -> Result<AvailabilityResponse, TransportError> {
        (**self).availability().await
    }
}

/// Author of a rendered transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// What a selectable option stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Date,
    Time,
}

/// One selectable option: `value` is submitted, `label` is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    /// Option whose label is its value.
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Identifier of the single "typing" placeholder entry.
pub const PENDING_ENTRY_ID: &str = "typing-indicator";

/// Trait for presentation surfaces.
///
/// A surface is a sink: the controller never reads rendered entries back.
pub trait Surface: Send + Sync {
    /// Append a transcript entry. Bot text is raw; formatting is the
    /// surface's job (see [`crate::format::format_reply`]).
    fn append_message(&self, role: Role, text: &str);

    /// Append a prompt followed by selectable options.
    fn append_options(&self, prompt: &str, options: &[SelectOption], kind: OptionKind);

    /// Insert the pending placeholder. A second call while one is shown is a
    /// no-op.
    fn show_pending(&self);

    /// Remove the pending placeholder if present.
    fn clear_pending(&self);
}

impl<S: Surface + ?Sized> Surface for Arc<S> {
    fn append_message(&self, role: Role, text: &str) {
        (**self).append_message(role, text);
    }

    fn append_options(&self, prompt: &str, options: &[SelectOption], kind: OptionKind) {
        (**self).append_options(prompt, options, kind);
    }

    fn show_pending(&self) {
        (**self).show_pending();
    }

    fn clear_pending(&self) {
        (**self).clear_pending();
    }
}
