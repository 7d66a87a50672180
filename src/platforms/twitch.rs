use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::env;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::platforms::{ChatActions, PlatformConnection};
use crate::types::ChatMessage;

const TWITCH_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

type TwitchStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WebSocketWriter = Arc<RwLock<SplitSink<TwitchStream, Message>>>;

/// Configuration for Twitch connection
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    pub username: String,
    pub oauth_token: String, // oauth:your_token_here
    pub channels: Vec<String>,
}

impl TwitchConfig {
    /// Load credentials from the environment. Channels come from the bot
    /// configuration file.
    pub fn from_env(channels: Vec<String>) -> Result<Self> {
        let username = env::var("TWITCH_USERNAME")
            .context("TWITCH_USERNAME environment variable not set")?;

        let oauth_token = env::var("TWITCH_OAUTH_TOKEN")
            .context("TWITCH_OAUTH_TOKEN environment variable not set")?;

        Self::new(username, oauth_token, channels)
    }

    pub fn new(username: String, oauth_token: String, channels: Vec<String>) -> Result<Self> {
        let channels: Vec<String> = channels
            .iter()
            .map(|c| c.trim().trim_start_matches('#').to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        if channels.is_empty() {
            return Err(anyhow::anyhow!("No channels configured"));
        }

        // Validate OAuth token format
        if !oauth_token.starts_with("oauth:") {
            return Err(anyhow::anyhow!(
                "TWITCH_OAUTH_TOKEN must start with 'oauth:' - got: {}...",
                oauth_token.chars().take(10).collect::<String>()
            ));
        }

        info!(
            "Loaded Twitch config for user '{}' with {} channels",
            username,
            channels.len()
        );
        debug!("Channels: {:?}", channels);

        Ok(Self {
            username: username.to_lowercase(),
            oauth_token,
            channels,
        })
    }
}

/// Twitch IRC connection implementation
pub struct TwitchConnection {
    config: TwitchConfig,
    message_sender: Option<broadcast::Sender<ChatMessage>>,
    websocket_writer: Option<WebSocketWriter>,
    is_connected: Arc<RwLock<bool>>,
}

impl TwitchConnection {
    pub fn new(config: TwitchConfig) -> Self {
        Self {
            config,
            message_sender: None,
            websocket_writer: None,
            is_connected: Arc::new(RwLock::new(false)),
        }
    }

    async fn send_raw(&self, line: String) -> Result<()> {
        let writer_arc = self
            .websocket_writer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Not connected to Twitch"))?;

        writer_arc
            .write()
            .await
            .send(Message::Text(line))
            .await
            .context("Failed to write to Twitch WebSocket")
    }
}

/// A line of a websocket frame that the connection acts on
#[derive(Debug)]
pub enum IrcEvent {
    /// Server keepalive; holds the PONG line to send back
    Ping(String),
    Chat(ChatMessage),
}

/// Parse every line of a websocket frame. A frame may batch several IRC
/// lines, so PINGs and PRIVMSGs are picked out wherever they appear.
/// Messages written by `bot_login` are flagged as echoes.
pub fn parse_irc_frame(raw_message: &str, bot_login: &str) -> Vec<IrcEvent> {
    raw_message
        .split('\n')
        .map(str::trim)
        .filter_map(|line| {
            if let Some(payload) = line
                .strip_prefix("PING")
                .filter(|rest| rest.is_empty() || rest.starts_with(' '))
            {
                Some(IrcEvent::Ping(format!("PONG{}\r\n", payload)))
            } else if line.starts_with('@') && line.contains(" PRIVMSG ") {
                parse_privmsg(line, bot_login).map(IrcEvent::Chat)
            } else {
                None
            }
        })
        .collect()
}

/// Build a PRIVMSG line. Line breaks in `text` become spaces so the text
/// cannot start a second IRC command.
fn privmsg_line(channel: &str, text: &str) -> String {
    let text: String = text
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect();
    format!("PRIVMSG #{} :{}\r\n", channel, text)
}

fn parse_privmsg(line: &str, bot_login: &str) -> Option<ChatMessage> {
    // Format:
    // @id=...;display-name=...;mod=... :user!user@user.tmi.twitch.tv PRIVMSG #channel :message
    let (tags, remaining) = line.strip_prefix('@')?.split_once(" :")?;

    let mut display_name = None;
    let mut message_id = None;
    let mut is_mod = false;

    for tag in tags.split(';') {
        if let Some((key, value)) = tag.split_once('=') {
            match key {
                "display-name" if !value.is_empty() => {
                    display_name = Some(value.to_string())
                }
                "id" if !value.is_empty() => message_id = Some(value.to_string()),
                "mod" => is_mod = value == "1",
                _ => {}
            }
        }
    }

    // "user!user@user.tmi.twitch.tv PRIVMSG #channel :actual message"
    let Some((prefix, channel_and_message)) = remaining.split_once(" PRIVMSG ") else {
        debug!("Could not parse PRIVMSG command: {}", remaining);
        return None;
    };

    let username = prefix.split('!').next().unwrap_or(prefix).to_lowercase();

    let Some((channel, content)) = channel_and_message.split_once(" :") else {
        debug!("Could not parse channel and message: {}", channel_and_message);
        return None;
    };

    let is_echo = username.eq_ignore_ascii_case(bot_login);

    Some(ChatMessage {
        platform: "twitch".to_string(),
        channel: channel.trim_start_matches('#').to_string(),
        username,
        display_name,
        message_id,
        content: content.to_string(),
        timestamp: chrono::Utc::now(),
        is_mod,
        is_echo,
    })
}

#[async_trait]
impl ChatActions for TwitchConnection {
    async fn send_message(&self, channel: &str, message: &str) -> Result<()> {
        match self.send_raw(privmsg_line(channel, message)).await {
            Ok(()) => {
                debug!("Sent message to #{}: {}", channel, message);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send message to #{}: {:#}", channel, e);
                Err(e)
            }
        }
    }

    async fn timeout_user(
        &self,
        channel: &str,
        username: &str,
        duration_seconds: u64,
    ) -> Result<()> {
        let command = format!("/timeout {} {}", username, duration_seconds);
        self.send_raw(privmsg_line(channel, &command))
            .await
            .with_context(|| format!("Failed to time out {} in #{}", username, channel))
    }

    async fn delete_message(&self, channel: &str, message_id: &str) -> Result<()> {
        let command = format!("/delete {}", message_id);
        self.send_raw(privmsg_line(channel, &command))
            .await
            .with_context(|| format!("Failed to delete message {} in #{}", message_id, channel))
    }
}

#[async_trait]
impl PlatformConnection for TwitchConnection {
    async fn connect(&mut self) -> Result<()> {
        info!("Connecting to Twitch IRC...");

        let url = Url::parse(TWITCH_IRC_URL)
            .context("Failed to parse Twitch WebSocket URL")?;

        let (ws_stream, _) = connect_async(url)
            .await
            .context("Failed to connect to Twitch WebSocket")?;

        let (write, read) = ws_stream.split();

        let writer_arc = Arc::new(RwLock::new(write));
        let writer_for_pong = Arc::clone(&writer_arc);
        self.websocket_writer = Some(writer_arc);

        // Authenticate with Twitch
        self.send_raw(format!("PASS {}\r\n", self.config.oauth_token))
            .await
            .context("Failed to send PASS command")?;
        self.send_raw(format!("NICK {}\r\n", self.config.username))
            .await
            .context("Failed to send NICK command")?;

        // Tags carry message ids and the mod flag
        self.send_raw("CAP REQ :twitch.tv/tags twitch.tv/commands\r\n".to_string())
            .await
            .context("Failed to request capabilities")?;

        for channel in &self.config.channels {
            self.send_raw(format!("JOIN #{}\r\n", channel))
                .await
                .with_context(|| format!("Failed to join channel: {}", channel))?;
            info!("Joined channel: #{}", channel);
        }

        let (tx, _) = broadcast::channel(1000);
        self.message_sender = Some(tx.clone());

        *self.is_connected.write().await = true;

        let message_sender = tx;
        let is_connected = Arc::clone(&self.is_connected);
        let bot_login = self.config.username.clone();

        tokio::spawn(async move {
            let mut read = read;
            info!("Twitch message reader started");

            loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received: {}", text);

                        for event in parse_irc_frame(&text, &bot_login) {
                            match event {
                                // Keep the connection alive
                                IrcEvent::Ping(pong_msg) => {
                                    debug!("Responding to PING");
                                    let mut writer = writer_for_pong.write().await;
                                    if let Err(e) = writer.send(Message::Text(pong_msg)).await {
                                        error!("Failed to send PONG: {}", e);
                                    }
                                }
                                IrcEvent::Chat(chat_msg) => {
                                    debug!(
                                        "Parsed message from {}: {}",
                                        chat_msg.username, chat_msg.content
                                    );
                                    if let Err(e) = message_sender.send(chat_msg) {
                                        warn!("Failed to broadcast message: {}", e);
                                    }
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        debug!("Received ping, sending pong");
                        let mut writer = writer_for_pong.write().await;
                        if let Err(e) = writer.send(Message::Pong(payload)).await {
                            error!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(close_frame))) => {
                        info!("WebSocket connection closed: {:?}", close_frame);
                        break;
                    }
                    Some(Ok(_)) => {
                        debug!("Received non-text frame (ignoring)");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        warn!("WebSocket stream ended");
                        break;
                    }
                }
            }

            *is_connected.write().await = false;
            warn!("Twitch connection handler exited");
        });

        info!("Successfully connected to Twitch IRC");
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "twitch"
    }

    async fn is_connected(&self) -> bool {
        *self.is_connected.read().await
    }

    fn get_message_receiver(&self) -> Option<broadcast::Receiver<ChatMessage>> {
        self.message_sender.as_ref().map(|sender| sender.subscribe())
    }

    fn get_channels(&self) -> Vec<String> {
        self.config.channels.clone()
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(writer_arc) = self.websocket_writer.take() {
            if let Err(e) = writer_arc.write().await.close().await {
                debug!("Error closing Twitch WebSocket: {}", e);
            }
        }
        *self.is_connected.write().await = false;
        self.message_sender = None;
        info!("Disconnected from Twitch");
        Ok(())
    }
}
