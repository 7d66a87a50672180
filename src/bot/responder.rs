use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use std::time::Duration;

use crate::bot::pattern_matching::normalize;

/// Canned responses to trigger words, rate limited by one global cooldown.
///
/// The cooldown is shared by every channel the bot watches: once a response
/// fires, no trigger fires anywhere until `response_delay` has elapsed.
pub struct TriggerResponder {
    response_delay: chrono::Duration,
    last_response_time: Option<DateTime<Utc>>,
}

impl TriggerResponder {
    pub fn new(response_delay: Duration) -> Self {
        Self {
            response_delay: chrono::Duration::from_std(response_delay)
                .unwrap_or(chrono::Duration::MAX),
            last_response_time: None,
        }
    }

    pub fn last_response_time(&self) -> Option<DateTime<Utc>> {
        self.last_response_time
    }

    /// Whether a response fired less than `response_delay` before `now`
    pub fn is_cooling_down(&self, now: DateTime<Utc>) -> bool {
        match self.last_response_time {
            Some(last) => now.signed_duration_since(last) < self.response_delay,
            None => false,
        }
    }

    /// Response for the first trigger (in map order) that appears as a whole
    /// word in the message.
    ///
    /// The cooldown is checked before the message is looked at. The cooldown
    /// clock only restarts when a response is returned.
    pub fn try_respond(
        &mut self,
        triggers: &IndexMap<String, String>,
        message: &str,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if self.is_cooling_down(now) {
            debug!("Trigger responses cooling down, skipping message");
            return None;
        }

        let cleaned = normalize(message);
        let words: Vec<&str> = cleaned.tokens().collect();

        for (trigger_word, response) in triggers {
            let cleaned_trigger = normalize(trigger_word);
            if words.contains(&cleaned_trigger.as_str()) {
                debug!("Trigger '{}' matched", trigger_word);
                self.last_response_time = Some(now);
                return Some(response.clone());
            }
        }

        None
    }
}
