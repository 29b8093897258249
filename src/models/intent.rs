use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FindNearest,
    CheckAvailability,
    RequestBlood,
    BecomeDonor,
    Emergency,
    Unknown,
}

impl Intent {
    /// The menu button that produces this intent. `Unknown` has none.
    pub fn quick_action(&self) -> Option<&'static QuickAction> {
        QUICK_ACTIONS.iter().find(|a| a.intent == *self)
    }
}

/// One of the menu buttons shown above the composer in the home state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub id: &'static str,
    pub label: &'static str,
    /// Text of the user bubble appended when the button is tapped.
    pub echo: &'static str,
    pub intent: Intent,
    pub emergency: bool,
}

pub const QUICK_ACTIONS: [QuickAction; 5] = [
    QuickAction {
        id: "find-nearest",
        label: "Find nearest blood bank",
        echo: "Find nearest blood bank",
        intent: Intent::FindNearest,
        emergency: false,
    },
    QuickAction {
        id: "check-availability",
        label: "Check blood availability",
        echo: "Check blood availability",
        intent: Intent::CheckAvailability,
        emergency: false,
    },
    QuickAction {
        id: "request-blood",
        label: "Request blood",
        echo: "Request blood",
        intent: Intent::RequestBlood,
        emergency: false,
    },
    QuickAction {
        id: "become-donor",
        label: "Become a donor",
        echo: "I want to become a donor",
        intent: Intent::BecomeDonor,
        emergency: false,
    },
    QuickAction {
        id: "emergency",
        label: "Emergency",
        echo: "Emergency - need blood urgently",
        intent: Intent::Emergency,
        emergency: true,
    },
];

impl QuickAction {
    pub fn from_id(id: &str) -> Option<&'static QuickAction> {
        QUICK_ACTIONS.iter().find(|a| a.id == id)
    }
}
