use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => Some(Answer::Yes),
            "no" | "n" => Some(Answer::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    pub disqualify_on: Answer,
}

impl EligibilityQuestion {
    pub fn disqualifies(&self, answer: Answer) -> bool {
        self.disqualify_on == answer
    }
}

pub const ELIGIBILITY_QUESTIONS: [EligibilityQuestion; 7] = [
    EligibilityQuestion {
        id: "age",
        prompt: "Are you between 18-60 years of age?",
        disqualify_on: Answer::No,
    },
    EligibilityQuestion {
        id: "weight",
        prompt: "Do you weigh at least 50 kg (110 lbs)?",
        disqualify_on: Answer::No,
    },
    EligibilityQuestion {
        id: "health",
        prompt: "Are you in good general health?",
        disqualify_on: Answer::No,
    },
    EligibilityQuestion {
        id: "illness",
        prompt: "Have you had any illness or infection in the past 2 weeks?",
        disqualify_on: Answer::Yes,
    },
    EligibilityQuestion {
        id: "surgery",
        prompt: "Have you had any surgery in the past 6 months?",
        disqualify_on: Answer::Yes,
    },
    EligibilityQuestion {
        id: "medication",
        prompt: "Are you currently taking antibiotics or other medications?",
        disqualify_on: Answer::Yes,
    },
    EligibilityQuestion {
        id: "recentDonation",
        prompt: "Have you donated blood in the past 3 months?",
        disqualify_on: Answer::Yes,
    },
];

/// What the questionnaire hands back to the conversation when it ends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EligibilityOutcome {
    pub eligible: bool,
    pub appointment_date: Option<NaiveDate>,
}
