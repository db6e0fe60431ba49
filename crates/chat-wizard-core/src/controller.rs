//! Dialogue-mode controller.
//!
//! Routes each submission to free chat or to the appointment wizard and
//! folds the server's answer into the next mode. One controller per
//! session; `&mut self` on [`DialogueController::submit`] keeps state
//! changes to a single call site.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    protocol::{ChatRequest, ChatStatus, StepRequest, StepStatus, Transcript},
    relay::Selection,
    traits::{OptionKind, Role, SelectOption, Surface, Transport, TransportError},
    wizard::{Step, WizardEvent, WizardState},
};

/// Session identifier, recorded on every log line.
pub type SessionId = Uuid;

/// Rendered when a chat request fails.
pub const CHAT_APOLOGY: &str =
    "I'm sorry, there was an error processing your request. Please try again.";

/// Rendered when a wizard step fails and the wizard is abandoned.
pub const WIZARD_APOLOGY: &str =
    "I'm sorry, there was an error with the appointment booking. Please try again.";

const DATE_PROMPT: &str = "Please select a date for your appointment:";
const TIME_PROMPT: &str = "Please select one of these available time slots:";

/// What an availability fetch should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityScope {
    /// Every open date, as date options.
    AllDates,
    /// The slots of one date, as time options.
    Date(String),
}

/// Result of one submission, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing was sent or rendered.
    Ignored,
    /// Free chat reply rendered.
    Replied,
    /// Chat reply carried appointment intent.
    WizardStarted,
    /// Wizard moved (or stayed) at this step.
    WizardAdvanced(Step),
    /// Wizard finished.
    WizardCompleted,
    /// Chat request failed.
    ChatFailed,
    /// Wizard step failed or named an unknown step.
    WizardAborted,
}

/// Dialogue-mode controller.
pub struct DialogueController<T, S> {
    session_id: SessionId,
    transport: T,
    surface: S,
    transcript: Transcript,
    wizard: WizardState,
}

impl<T, S> DialogueController<T, S>
where
    T: Transport,
    S: Surface,
{
    /// Create a controller with an empty transcript and inactive wizard.
    #[must_use]
    pub fn new(transport: T, surface: S) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            transport,
            surface,
            transcript: Transcript::new(),
            wizard: WizardState::Inactive,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current wizard state.
    #[must_use]
    pub const fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    /// Last transcript the server returned.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The presentation surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one user submission.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(session = %self.session_id, "ignoring blank submission");
            return SubmitOutcome::Ignored;
        }

        self.surface.append_message(Role::User, text);
        self.surface.show_pending();

        match self.wizard.current_step() {
            None => self.send_chat(text).await,
            Some(step) => self.send_step(step, text).await,
        }
    }

    /// Relay a picked option as if its value had been typed.
    pub async fn select(&mut self, selection: Selection) -> SubmitOutcome {
        tracing::debug!(
            session = %self.session_id,
            kind = ?selection.kind,
            value = %selection.value,
            "option selected"
        );
        self.submit(&selection.into_submission()).await
    }

    async fn send_chat(&mut self, text: &str) -> SubmitOutcome {
        let request = ChatRequest {
            message: text.to_string(),
            conversation_history: self.transcript.clone(),
        };
        tracing::debug!(session = %self.session_id, "sending chat message");

        let result = self.transport.chat(&request).await;
        self.surface.clear_pending();

        match result {
            Ok(response) => {
                self.transcript = response.conversation_history;
                self.surface.append_message(Role::Bot, &response.reply);

                if response.status == ChatStatus::AppointmentIntent {
                    self.transition(WizardEvent::IntentDetected);
                    tracing::info!(session = %self.session_id, "appointment wizard started");
                    SubmitOutcome::WizardStarted
                } else {
                    SubmitOutcome::Replied
                }
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "chat request failed");
                self.surface.append_message(Role::Bot, CHAT_APOLOGY);
                SubmitOutcome::ChatFailed
            }
        }
    }

    async fn send_step(&mut self, step: Step, text: &str) -> SubmitOutcome {
        let request = StepRequest {
            step: step.as_str().to_string(),
            user_input: text.to_string(),
            appointment_info: self.wizard.collected_fields().cloned().unwrap_or_default(),
            conversation_history: self.transcript.clone(),
        };
        tracing::debug!(session = %self.session_id, %step, "sending appointment step");

        let result = self.transport.appointment_step(&request).await;
        self.surface.clear_pending();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    session = %self.session_id,
                    %step,
                    error = %e,
                    "appointment step failed, abandoning wizard"
                );
                self.transition(WizardEvent::Failed);
                self.surface.append_message(Role::Bot, WIZARD_APOLOGY);
                return SubmitOutcome::WizardAborted;
            }
        };

        self.transcript = response.conversation_history;
        self.surface.append_message(Role::Bot, &response.reply);

        // Decided before the status is applied: a `complete` response that
        // names the date step still lists dates.
        let lists_dates = response.next_step.as_deref() == Some(Step::Date.as_str());

        let outcome = match response.status {
            StepStatus::Complete => {
                self.transition(WizardEvent::Completed);
                tracing::info!(session = %self.session_id, "appointment wizard completed");
                SubmitOutcome::WizardCompleted
            }
            StepStatus::InProgress => {
                let event = WizardEvent::Advanced {
                    next_step: response.next_step.as_deref(),
                    fields: response.appointment_info,
                };
                if self.transition(event) {
                    match self.wizard.current_step() {
                        Some(next) => SubmitOutcome::WizardAdvanced(next),
                        None => SubmitOutcome::WizardAborted,
                    }
                } else {
                    self.surface.append_message(Role::Bot, WIZARD_APOLOGY);
                    SubmitOutcome::WizardAborted
                }
            }
        };

        if let Some(scope) = self.follow_up_scope(lists_dates) {
            self.fetch_availability(scope).await;
        }

        outcome
    }

    /// Availability to show after a step response, if any.
    ///
    /// A response naming the date step lists every date. Entering the time
    /// step with an accepted date lists that date's slots.
    fn follow_up_scope(&self, lists_dates: bool) -> Option<AvailabilityScope> {
        if lists_dates {
            return Some(AvailabilityScope::AllDates);
        }
        match &self.wizard {
            WizardState::Active {
                step: Step::Time,
                fields,
            } => fields
                .get("date")
                .and_then(serde_json::Value::as_str)
                .map(|date| AvailabilityScope::Date(date.to_string())),
            _ => None,
        }
    }

    /// Apply a wizard event, logging rejected transitions.
    ///
    /// Returns false if the event was rejected (the wizard is then inactive).
    fn transition(&mut self, event: WizardEvent<'_>) -> bool {
        let from = self.wizard.current_step();
        match self.wizard.apply(event) {
            Ok(()) => {
                tracing::info!(
                    session = %self.session_id,
                    from = ?from,
                    to = ?self.wizard.current_step(),
                    "wizard transition"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.session_id,
                    from = ?from,
                    error = %e,
                    "rejected wizard transition, abandoning wizard"
                );
                false
            }
        }
    }

    /// Query availability and render it as selectable options.
    ///
    /// Failures render nothing and leave the wizard untouched. Returns the
    /// number of options rendered.
    pub async fn fetch_availability(&self, scope: AvailabilityScope) -> usize {
        let slots = match self.transport.availability().await {
            Ok(response) if response.is_success() => response.available_slots,
            Ok(response) => {
                let e = TransportError::Rejected(response.status);
                tracing::warn!(session = %self.session_id, error = %e, "availability unavailable");
                return 0;
            }
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "availability fetch failed");
                return 0;
            }
        };

        let (prompt, kind, options) = match scope {
            AvailabilityScope::AllDates => {
                // Keys arrive sorted; ISO dates sort chronologically.
                let options: Vec<SelectOption> = slots
                    .into_keys()
                    .map(|date| SelectOption {
                        label: date_label(&date),
                        value: date,
                    })
                    .collect();
                (DATE_PROMPT, OptionKind::Date, options)
            }
            AvailabilityScope::Date(date) => {
                let options: Vec<SelectOption> = slots
                    .get(&date)
                    .map(|times| times.iter().map(SelectOption::plain).collect())
                    .unwrap_or_default();
                (TIME_PROMPT, OptionKind::Time, options)
            }
        };

        if options.is_empty() {
            tracing::debug!(session = %self.session_id, ?kind, "no options to render");
            return 0;
        }

        self.surface.append_options(prompt, &options, kind);
        options.len()
    }
}

/// Human-readable label for an ISO date key, e.g. `Mon, Jun 3`.
fn date_label(key: &str) -> String {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .map_or_else(|_| key.to_string(), |d| d.format("%a, %b %-d").to_string())
}
