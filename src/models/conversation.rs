use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BloodBank, EmergencyView};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    Home,
    BloodSearch,
    RequestForm,
    RequestConfirmation,
    DonorEligibility,
    Emergency,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Home => "home",
            ConversationState::BloodSearch => "blood_search",
            ConversationState::RequestForm => "request_form",
            ConversationState::RequestConfirmation => "request_confirmation",
            ConversationState::DonorEligibility => "donor_eligibility",
            ConversationState::Emergency => "emergency",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "blood_search" => ConversationState::BloodSearch,
            "request_form" => ConversationState::RequestForm,
            "request_confirmation" => ConversationState::RequestConfirmation,
            "donor_eligibility" => ConversationState::DonorEligibility,
            "emergency" => ConversationState::Emergency,
            _ => ConversationState::Home,
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Bot,
    User,
}

/// Structured content anchored to a message. Anything other than `None`
/// marks the message as the anchor of the sub-flow it carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowPayload {
    #[default]
    None,
    BankResults { banks: Vec<BloodBank> },
    RequestForm,
    EligibilityFlow,
    EmergencyView { view: EmergencyView },
    RequestConfirmation { reference_id: String },
}

impl FlowPayload {
    pub fn is_none(&self) -> bool {
        matches!(self, FlowPayload::None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "FlowPayload::is_none")]
    pub flow: FlowPayload,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.author == Author::Bot
    }

    /// Clock time as shown next to the bubble, e.g. `02:05 PM`, in the
    /// user's local time zone.
    pub fn display_time(&self) -> String {
        self.display_time_in(&Local)
    }

    pub fn display_time_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        self.timestamp.with_timezone(tz).format("%I:%M %p").to_string()
    }
}

/// Append-only, insertion-ordered message log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns a reference to the stored copy.
    /// Timestamps never go backwards: an earlier one is raised to the
    /// previous message's timestamp.
    pub fn append(
        &mut self,
        author: Author,
        text: impl Into<String>,
        flow: FlowPayload,
        timestamp: DateTime<Utc>,
    ) -> &Message {
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > timestamp => last.timestamp,
            _ => timestamp,
        };

        self.messages.push(Message {
            id: Uuid::new_v4(),
            author,
            text: text.into(),
            timestamp,
            flow,
        });

        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}
