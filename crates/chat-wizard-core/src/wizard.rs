//! Appointment wizard state machine.
//!
//! The server is the only authority on progression: the client moves
//! between steps solely by applying events derived from server responses.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::AppointmentInfo;

/// A recognized wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Name,
    Email,
    Date,
    Time,
}

impl Step {
    /// Wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Date => "date",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            other => Err(WizardError::UnknownStep(other.to_string())),
        }
    }
}

/// Wizard error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Unknown wizard step: {0:?}")]
    UnknownStep(String),
    #[error("Step response carried no next step")]
    MissingStep,
    #[error("Step response received while the wizard is inactive")]
    NotActive,
}

/// Client-held wizard state.
///
/// `Inactive` carries nothing, so an inactive wizard can never hold a step
/// or collected fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum WizardState {
    #[default]
    Inactive,
    Active {
        step: Step,
        fields: AppointmentInfo,
    },
}

/// Input to [`WizardState::apply`].
#[derive(Debug, Clone)]
pub enum WizardEvent<'a> {
    /// A chat response flagged appointment intent.
    IntentDetected,
    /// A step response reported `in_progress`.
    Advanced {
        next_step: Option<&'a str>,
        fields: AppointmentInfo,
    },
    /// A step response reported `complete`.
    Completed,
    /// A step request failed in transport.
    Failed,
}

impl WizardState {
    /// Whether wizard mode intercepts submissions.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Current step, if active.
    #[must_use]
    pub const fn current_step(&self) -> Option<Step> {
        match self {
            Self::Inactive => None,
            Self::Active { step, .. } => Some(*step),
        }
    }

    /// Fields collected so far, if active.
    #[must_use]
    pub const fn collected_fields(&self) -> Option<&AppointmentInfo> {
        match self {
            Self::Inactive => None,
            Self::Active { fields, .. } => Some(fields),
        }
    }

    /// Apply an event.
    ///
    /// On error the state has already been reset to `Inactive`.
    ///
    /// # Errors
    /// Returns an error if an `Advanced` event names no step or an unknown
    /// one, or arrives while the wizard is inactive.
    pub fn apply(&mut self, event: WizardEvent<'_>) -> Result<(), WizardError> {
        let next = match event {
            WizardEvent::IntentDetected => Ok(Self::Active {
                step: Step::Name,
                fields: AppointmentInfo::new(),
            }),
            WizardEvent::Completed | WizardEvent::Failed => Ok(Self::Inactive),
            WizardEvent::Advanced { next_step, fields } => {
                if self.is_active() {
                    next_step
                        .ok_or(WizardError::MissingStep)
                        .and_then(str::parse::<Step>)
                        .map(|step| Self::Active { step, fields })
                } else {
                    Err(WizardError::NotActive)
                }
            }
        };

        match next {
            Ok(state) => {
                *self = state;
                Ok(())
            }
            Err(e) => {
                *self = Self::Inactive;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::assert_ok;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> AppointmentInfo {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect()
    }

    fn assert_invariant(state: &WizardState) {
        assert_eq!(state.is_active(), state.current_step().is_some());
        assert_eq!(state.is_active(), state.collected_fields().is_some());
    }

    #[test]
    fn test_intent_starts_at_name_with_no_fields() {
        let mut state = WizardState::Active {
            step: Step::Time,
            fields: fields(&[("name", "Ada")]),
        };
        assert_ok!(state.apply(WizardEvent::IntentDetected));
        assert_eq!(state.current_step(), Some(Step::Name));
        assert!(state.collected_fields().unwrap().is_empty());
        assert_invariant(&state);
    }

    #[test]
    fn test_advance_takes_server_values_verbatim() {
        let mut state = WizardState::default();
        assert_ok!(state.apply(WizardEvent::IntentDetected));

        let info = fields(&[("name", "Ada Lovelace"), ("email", "ada@example.com")]);
        state
            .apply(WizardEvent::Advanced {
                next_step: Some("date"),
                fields: info.clone(),
            })
            .unwrap();

        assert_eq!(
            state,
            WizardState::Active {
                step: Step::Date,
                fields: info
            }
        );
        assert_invariant(&state);
    }

    #[test]
    fn test_server_may_repeat_a_step() {
        let mut state = WizardState::Active {
            step: Step::Email,
            fields: fields(&[("name", "Ada")]),
        };
        state
            .apply(WizardEvent::Advanced {
                next_step: Some("email"),
                fields: fields(&[("name", "Ada")]),
            })
            .unwrap();
        assert_eq!(state.current_step(), Some(Step::Email));
    }

    #[test]
    fn test_complete_and_failure_reset() {
        for event in [WizardEvent::Completed, WizardEvent::Failed] {
            let mut state = WizardState::Active {
                step: Step::Time,
                fields: fields(&[("date", "2024-06-01")]),
            };
            assert_ok!(state.apply(event));
            assert_eq!(state, WizardState::Inactive);
            assert_invariant(&state);
        }
    }

    #[test]
    fn test_unknown_step_resets() {
        let mut state = WizardState::Active {
            step: Step::Name,
            fields: AppointmentInfo::new(),
        };
        let err = state
            .apply(WizardEvent::Advanced {
                next_step: Some("payment"),
                fields: fields(&[("name", "Ada")]),
            })
            .unwrap_err();
        assert_eq!(err, WizardError::UnknownStep("payment".into()));
        assert_eq!(state, WizardState::Inactive);
    }

    #[test]
    fn test_missing_step_resets() {
        let mut state = WizardState::Active {
            step: Step::Name,
            fields: AppointmentInfo::new(),
        };
        let err = state
            .apply(WizardEvent::Advanced {
                next_step: None,
                fields: AppointmentInfo::new(),
            })
            .unwrap_err();
        assert_eq!(err, WizardError::MissingStep);
        assert!(!state.is_active());
    }

    #[test]
    fn test_advance_requires_active_wizard() {
        let mut state = WizardState::Inactive;
        let err = state
            .apply(WizardEvent::Advanced {
                next_step: Some("email"),
                fields: AppointmentInfo::new(),
            })
            .unwrap_err();
        assert_eq!(err, WizardError::NotActive);
        assert_eq!(state, WizardState::Inactive);
    }

    #[test]
    fn test_step_identifiers_roundtrip() {
        for step in [Step::Name, Step::Email, Step::Date, Step::Time] {
            assert_eq!(step.as_str().parse::<Step>().unwrap(), step);
        }
        assert!("Date".parse::<Step>().is_err());
    }
}
