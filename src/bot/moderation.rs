// src/bot/moderation.rs - Spam pattern detection and enforcement

use log::{debug, error, info};

use crate::bot::pattern_matching::normalize;
use crate::error::ModerationActionError;
use crate::platforms::ChatActions;
use crate::types::{ChatMessage, ModerationAction, ModerationDecision, PrivilegeContext};

/// Timeout applied to authors of spam messages
pub const SPAM_TIMEOUT_SECONDS: u64 = 3;

/// Matches messages against the configured spam patterns.
///
/// Both sides are normalized and compared as plain substrings, so the
/// pattern "free" also matches "freedom".
pub struct SpamClassifier<'a> {
    patterns: &'a [String],
}

impl<'a> SpamClassifier<'a> {
    pub fn new(patterns: &'a [String]) -> Self {
        Self { patterns }
    }

    pub fn is_spam(&self, message: &str) -> bool {
        self.matching_pattern(message).is_some()
    }

    /// First configured pattern found in the message, if any
    pub fn matching_pattern(&self, message: &str) -> Option<&'a str> {
        let cleaned = normalize(message);

        self.patterns
            .iter()
            .find(|pattern| {
                let cleaned_pattern = normalize(pattern);
                // an empty pattern would match every message
                !cleaned_pattern.is_empty() && cleaned.contains(cleaned_pattern.as_str())
            })
            .map(String::as_str)
    }
}

/// Decide what happens to a spam message given who wrote it
pub fn decide(author: &PrivilegeContext) -> ModerationDecision {
    if author.is_privileged() {
        ModerationDecision::Allow
    } else {
        ModerationDecision::Suppress
    }
}

/// Actions carried out for a suppressed message, in order
pub fn suppression_actions() -> [ModerationAction; 2] {
    [
        ModerationAction::TimeoutUser {
            duration_seconds: SPAM_TIMEOUT_SECONDS,
        },
        ModerationAction::DeleteMessage,
    ]
}

/// Apply one moderation action against the platform
pub async fn handle_moderation_action<A: ChatActions + ?Sized>(
    action: &ModerationAction,
    message: &ChatMessage,
    actions: &A,
) -> Result<(), ModerationActionError> {
    let failed = |action: &'static str, error: anyhow::Error| ModerationActionError {
        action,
        username: message.username.clone(),
        channel: message.channel.clone(),
        error,
    };

    match action {
        ModerationAction::TimeoutUser { duration_seconds } => {
            actions
                .timeout_user(&message.channel, &message.username, *duration_seconds)
                .await
                .map_err(|e| failed("timeout user", e))?;
            info!(
                "Timeout user {} for spam ({}s) in #{}",
                message.username, duration_seconds, message.channel
            );
        }
        ModerationAction::DeleteMessage => {
            let message_id = message
                .message_id
                .as_deref()
                .ok_or_else(|| failed("delete message", anyhow::anyhow!("message has no id")))?;

            actions
                .delete_message(&message.channel, message_id)
                .await
                .map_err(|e| failed("delete message", e))?;
            debug!("Deleted spam message {} in #{}", message_id, message.channel);
        }
    }

    Ok(())
}

/// Carry out every suppression action, logging failures without retrying.
///
/// Returns the number of actions that failed.
pub async fn enforce_suppression<A: ChatActions + ?Sized>(
    message: &ChatMessage,
    actions: &A,
) -> usize {
    let mut failures = 0;

    for action in suppression_actions() {
        if let Err(e) = handle_moderation_action(&action, message, actions).await {
            error!("{}", e);
            failures += 1;
        }
    }

    failures
}
