//! Selection relay: a picked option becomes an ordinary submission.

use serde::{Deserialize, Serialize};

use crate::traits::{OptionKind, SelectOption};

/// A user's pick from a rendered option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: OptionKind,
    pub value: String,
}

impl Selection {
    /// Pick `option` from a set of `kind` options.
    #[must_use]
    pub fn new(kind: OptionKind, option: &SelectOption) -> Self {
        Self {
            kind,
            value: option.value.clone(),
        }
    }

    /// Text to submit: the option's underlying value, never its label.
    #[must_use]
    pub fn into_submission(self) -> String {
        self.value
    }
}
