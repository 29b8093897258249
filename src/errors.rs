use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ConversationState, FormField};

/// Field-scoped validation messages from a rejected form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(pub BTreeMap<FormField, String>);

impl FormErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {msg}", field.as_str()))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("{0} is in the past")]
    Past(NaiveDate),

    #[error("blood banks are closed on Sundays")]
    Sunday,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error("ignored: expected state {expected}, conversation is in {actual}")]
    StaleCompletion {
        expected: ConversationState,
        actual: ConversationState,
    },

    #[error("nothing to cancel in the home state")]
    NothingToCancel,

    #[error("invalid request form: {0}")]
    Validation(FormErrors),

    #[error("invalid appointment date: {0}")]
    AppointmentDate(#[from] DateError),

    #[error("an appointment date must be chosen first")]
    AppointmentRequired,

    #[error("the questionnaire has already finished")]
    QuestionnaireFinished,

    #[error("the questionnaire is still in progress")]
    QuestionnaireInProgress,

    #[error("no earlier question to go back to")]
    NoPreviousQuestion,

    #[error("unknown blood bank: {0}")]
    UnknownBank(String),

    #[error("ignored: message {0} no longer anchors the active sub-flow")]
    StaleAnchor(uuid::Uuid),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("session runtime has stopped")]
    Closed,

    #[error(transparent)]
    Flow(#[from] FlowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::default();
        errors.insert(FormField::Units, "Valid number of units is required");
        errors.insert(FormField::BloodType, "Blood type is required");
        assert_eq!(
            errors.to_string(),
            "bloodType: Blood type is required; units: Valid number of units is required"
        );
    }

    #[test]
    fn test_stale_completion_display() {
        let err = FlowError::StaleCompletion {
            expected: ConversationState::RequestForm,
            actual: ConversationState::Home,
        };
        assert_eq!(
            err.to_string(),
            "ignored: expected state request_form, conversation is in home"
        );
    }

    #[test]
    fn test_date_error_converts() {
        let err: FlowError = DateError::Sunday.into();
        assert!(matches!(err, FlowError::AppointmentDate(DateError::Sunday)));
    }
}
