// src/bot/pipeline.rs - Per-message decision pipeline

use log::{debug, error, info, warn};

use crate::bot::commands::{split_command, AdminCommand, COMMAND_PREFIX};
use crate::bot::moderation::{self, SpamClassifier};
use crate::bot::responder::TriggerResponder;
use crate::config::ConfigStore;
use crate::platforms::ChatActions;
use crate::types::{ChatMessage, ModerationDecision};

/// What the pipeline did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The bot's own message
    Echo,
    /// Consumed by the command stage, whether or not anything ran
    Command,
    /// Spam from a regular user; `failed_actions` counts timeout/delete failures
    SpamSuppressed { pattern: String, failed_actions: usize },
    /// Spam from a moderator or the broadcaster, left alone
    SpamAllowed { pattern: String },
    /// A trigger word fired and its response was sent
    Responded(String),
    NoAction,
}

/// Runs every inbound message through three guarded stages, in order:
/// commands, then spam, then trigger words. Each stage that applies ends
/// processing of the message.
///
/// Owns the config store and the global response cooldown, so it must be
/// driven by a single task.
pub struct MessagePipeline {
    store: ConfigStore,
    responder: TriggerResponder,
}

impl MessagePipeline {
    pub fn new(store: ConfigStore) -> Self {
        let responder = TriggerResponder::new(store.config().response_delay());

        Self { store, responder }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn responder(&self) -> &TriggerResponder {
        &self.responder
    }

    /// Process one inbound message. The message timestamp is used as the
    /// current time for the response cooldown.
    pub async fn process_message<A: ChatActions + ?Sized>(
        &mut self,
        message: &ChatMessage,
        actions: &A,
    ) -> PipelineOutcome {
        if message.is_echo {
            return PipelineOutcome::Echo;
        }

        if let Some((command_name, args)) = split_command(&message.content, COMMAND_PREFIX) {
            self.handle_admin_command(&command_name, args, message, actions).await;
            return PipelineOutcome::Command;
        } else if message.content.starts_with(COMMAND_PREFIX) {
            return PipelineOutcome::Command;
        }

        let matched_pattern = SpamClassifier::new(self.store.spam_patterns())
            .matching_pattern(&message.content)
            .map(str::to_string);

        if let Some(pattern) = matched_pattern {
            return match moderation::decide(&message.privilege()) {
                ModerationDecision::Allow => {
                    info!("Skipping timeout for privileged user {}", message.username);
                    PipelineOutcome::SpamAllowed { pattern }
                }
                ModerationDecision::Suppress => {
                    warn!(
                        "Message from {} in #{} matched spam pattern '{}'",
                        message.username, message.channel, pattern
                    );
                    let failed_actions = moderation::enforce_suppression(message, actions).await;
                    PipelineOutcome::SpamSuppressed { pattern, failed_actions }
                }
            };
        }

        let response = self
            .responder
            .try_respond(self.store.word_responses(), &message.content, message.timestamp);

        match response {
            Some(response) => {
                if let Err(e) = actions.send_message(&message.channel, &response).await {
                    error!("Failed to send response to #{}: {}", message.channel, e);
                } else {
                    info!("Sent response to #{}: {}", message.channel, response);
                }
                PipelineOutcome::Responded(response)
            }
            None => PipelineOutcome::NoAction,
        }
    }

    /// Run an administrative command and send its reply, if any.
    ///
    /// Authors who are neither moderator nor broadcaster are ignored without
    /// a reply. Returns true when `name` is an admin command.
    pub async fn handle_admin_command<A: ChatActions + ?Sized>(
        &mut self,
        name: &str,
        args: &str,
        message: &ChatMessage,
        actions: &A,
    ) -> bool {
        let ctx = message.privilege();

        let command = match AdminCommand::parse(name, args) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!("Unknown command: {}", name);
                return false;
            }
            Err(usage) => {
                if ctx.is_privileged() {
                    send_reply(actions, message, usage.0).await;
                }
                return true;
            }
        };

        debug!(
            "Processing command '{}' from user '{}' in #{}",
            name, message.username, message.channel
        );

        if let Some(reply) = command.execute(&mut self.store, &ctx).await {
            send_reply(actions, message, &reply).await;
        }

        true
    }
}

async fn send_reply<A: ChatActions + ?Sized>(actions: &A, message: &ChatMessage, reply: &str) {
    if let Err(e) = actions.send_message(&message.channel, reply).await {
        warn!("Failed to send command reply to #{}: {}", message.channel, e);
    }
}
