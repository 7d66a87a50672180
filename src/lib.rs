//! # WordWatch
//!
//! A Twitch chat bot that answers trigger words with canned responses and
//! removes spam, with moderators managing both lists from chat.
//!
//! ## Features
//!
//! - **Trigger Responses**: Whole-word matching with a global cooldown
//! - **Spam Removal**: Pattern matching that sees through repeated letters,
//!   punctuation and accents
//! - **Chat Administration**: `!addresponse`, `!addspam` and friends, saved
//!   straight back to the YAML config
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wordwatch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BotConfig::load(DEFAULT_CONFIG_PATH).await?;
//!     let twitch_config = TwitchConfig::from_env(config.channels.clone())?;
//!
//!     let pipeline = MessagePipeline::new(ConfigStore::new(config, DEFAULT_CONFIG_PATH));
//!     let connection = TwitchConnection::new(twitch_config);
//!
//!     ChatBot::new(Box::new(connection), pipeline).run().await
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod platforms;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::{ChatBot, MessagePipeline, PipelineOutcome};
    pub use crate::config::{BotConfig, ConfigStore, DEFAULT_CONFIG_PATH};
    pub use crate::platforms::{
        twitch::{TwitchConfig, TwitchConnection},
        ChatActions, PlatformConnection,
    };
    pub use crate::types::{ChatMessage, ModerationAction, ModerationDecision, PrivilegeContext};
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
