use crate::models::{Intent, QuickAction};

/// Ordered keyword rules; the first rule with any matching keyword wins.
const RULES: &[(&[&str], Intent)] = &[
    (&["nearest", "find"], Intent::FindNearest),
    (&["request"], Intent::RequestBlood),
    (&["donor", "donate"], Intent::BecomeDonor),
    (&["emergency"], Intent::Emergency),
];

/// Classifies free text by case-insensitive substring match.
pub fn classify_text(text: &str) -> Intent {
    let lowered = text.to_lowercase();

    let intent = RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::Unknown);

    tracing::debug!(intent = ?intent, "classified free text");
    intent
}

/// Maps a quick-action button id to its intent.
pub fn classify_action(action_id: &str) -> Intent {
    QuickAction::from_id(action_id)
        .map(|a| a.intent)
        .unwrap_or(Intent::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_find() {
        assert_eq!(classify_text("please request some"), Intent::RequestBlood);
    }

    #[test]
    fn test_find_wins_over_later_rules() {
        assert_eq!(classify_text("find nearest O-"), Intent::FindNearest);
        assert_eq!(classify_text("find a donor"), Intent::FindNearest);
        assert_eq!(classify_text("emergency, find blood"), Intent::FindNearest);
    }

    #[test]
    fn test_request_wins_over_donor_and_emergency() {
        assert_eq!(classify_text("emergency request"), Intent::RequestBlood);
        assert_eq!(classify_text("Request from a donor"), Intent::RequestBlood);
    }

    #[test]
    fn test_donor_keywords() {
        assert_eq!(classify_text("I want to DONATE"), Intent::BecomeDonor);
        assert_eq!(classify_text("become a donor"), Intent::BecomeDonor);
        assert_eq!(classify_text("donor emergency"), Intent::BecomeDonor);
    }

    #[test]
    fn test_emergency() {
        assert_eq!(classify_text("EMERGENCY!!"), Intent::Emergency);
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(classify_text("hello there"), Intent::Unknown);
        assert_eq!(classify_text(""), Intent::Unknown);
    }

    #[test]
    fn test_substring_matching_is_literal() {
        // "refinder" still contains "find"
        assert_eq!(classify_text("refinder"), Intent::FindNearest);
    }

    #[test]
    fn test_classify_action() {
        assert_eq!(classify_action("check-availability"), Intent::CheckAvailability);
        assert_eq!(classify_action("emergency"), Intent::Emergency);
        assert_eq!(classify_action("bogus"), Intent::Unknown);
    }
}
