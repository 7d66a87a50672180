use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::sync::broadcast;

use crate::platforms::PlatformConnection;

pub mod commands;
pub mod moderation;
pub mod pattern_matching;
pub mod pipeline;
pub mod responder;

pub use pipeline::{MessagePipeline, PipelineOutcome};

/// Chat bot that watches one platform connection and feeds every message
/// through the pipeline, one at a time.
pub struct ChatBot {
    connection: Box<dyn PlatformConnection>,
    pipeline: MessagePipeline,
}

impl ChatBot {
    pub fn new(connection: Box<dyn PlatformConnection>, pipeline: MessagePipeline) -> Self {
        Self { connection, pipeline }
    }

    /// Connect and process messages until Ctrl+C or the connection closes
    pub async fn run(mut self) -> Result<()> {
        info!("Starting chat bot...");

        let platform_name = self.connection.platform_name().to_string();
        self.connection
            .connect()
            .await
            .with_context(|| format!("Failed to connect to {}", platform_name))?;

        let mut receiver = self
            .connection
            .get_message_receiver()
            .with_context(|| format!("{} connection has no message receiver", platform_name))?;

        let store = self.pipeline.store();
        info!("Bot is ready on {}", platform_name);
        info!("Watching channels: {}", self.connection.get_channels().join(", "));
        info!(
            "Trigger words: {}",
            store.word_responses().keys().cloned().collect::<Vec<_>>().join(", ")
        );
        info!("Spam patterns: {}", store.spam_patterns().join(", "));
        info!("Response delay: {}s", store.config().response_delay);

        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Ok(message) => {
                        let outcome = self
                            .pipeline
                            .process_message(&message, self.connection.as_ref())
                            .await;
                        debug!(
                            "Message from {} in #{}: {:?}",
                            message.username, message.channel, outcome
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Message receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Message receiver closed");
                        break;
                    }
                },
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("Received Ctrl+C signal, shutting down..."),
                        Err(e) => error!("Failed to listen for Ctrl+C signal: {}", e),
                    }
                    break;
                }
            }
        }

        if let Err(e) = self.connection.disconnect().await {
            error!("Failed to disconnect from {}: {}", platform_name, e);
        }

        info!("Chat bot stopped");
        Ok(())
    }
}
