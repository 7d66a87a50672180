// src/types/mod.rs - Message and moderation types shared across the bot

/// Core message type that flows from the platform into the pipeline
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub platform: String,
    pub channel: String,
    pub username: String,
    pub display_name: Option<String>,
    /// Platform message id, needed to delete the message
    pub message_id: Option<String>,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub is_mod: bool,
    /// Set for messages the bot itself sent
    pub is_echo: bool,
}

impl ChatMessage {
    /// Broadcaster is the user whose login matches the channel name
    pub fn is_broadcaster(&self) -> bool {
        self.username.eq_ignore_ascii_case(&self.channel)
    }

    pub fn privilege(&self) -> PrivilegeContext {
        PrivilegeContext {
            is_moderator: self.is_mod,
            is_broadcaster: self.is_broadcaster(),
        }
    }
}

/// Author privileges, derived fresh for every message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivilegeContext {
    pub is_moderator: bool,
    pub is_broadcaster: bool,
}

impl PrivilegeContext {
    pub fn is_privileged(&self) -> bool {
        self.is_moderator || self.is_broadcaster
    }
}

/// What to do with a message that matched a spam pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationDecision {
    Allow,
    Suppress,
}

/// Enforcement actions, in the order they are attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationAction {
    TimeoutUser { duration_seconds: u64 },
    DeleteMessage,
}
