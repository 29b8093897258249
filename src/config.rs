use std::env;
use std::time::Duration;

use crate::models::BloodType;

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Typing delay before an ordinary bot reply.
    pub reply_delay: Duration,
    pub emergency_delay: Duration,
    pub welcome_delay: Duration,
    /// Gap between the location prompt and the search results.
    pub search_followup: Duration,
    pub urgent_blood_type: Option<BloodType>,
    pub nearby_limit: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(1000),
            emergency_delay: Duration::from_millis(500),
            welcome_delay: Duration::from_millis(500),
            search_followup: Duration::from_millis(2000),
            urgent_blood_type: Some(BloodType::ONeg),
            nearby_limit: 3,
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reply_delay: millis_var("TALASH_REPLY_DELAY_MS").unwrap_or(defaults.reply_delay),
            emergency_delay: millis_var("TALASH_EMERGENCY_DELAY_MS")
                .unwrap_or(defaults.emergency_delay),
            welcome_delay: millis_var("TALASH_WELCOME_DELAY_MS").unwrap_or(defaults.welcome_delay),
            search_followup: millis_var("TALASH_SEARCH_FOLLOWUP_MS")
                .unwrap_or(defaults.search_followup),
            urgent_blood_type: match env::var("TALASH_URGENT_BLOOD_TYPE") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => BloodType::parse(&v).or(defaults.urgent_blood_type),
                Err(_) => defaults.urgent_blood_type,
            },
            nearby_limit: env::var("TALASH_NEARBY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.nearby_limit),
        }
    }

    /// Zero delays everywhere; handy for scripted hosts.
    pub fn instant() -> Self {
        Self {
            reply_delay: Duration::ZERO,
            emergency_delay: Duration::ZERO,
            welcome_delay: Duration::ZERO,
            search_followup: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn millis_var(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
