use anyhow::Result;
use log::{error, info};
use std::env;

use wordwatch::prelude::*;

/// Environment variable overriding the config file location
const CONFIG_PATH_ENV: &str = "WORDWATCH_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables and initialize logging
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting WordWatch v{}", wordwatch::VERSION);

    let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match BotConfig::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Loaded configuration from {}", config_path);

    let twitch_config = match TwitchConfig::from_env(config.channels.clone()) {
        Ok(twitch_config) => twitch_config,
        Err(e) => {
            error!("Failed to load Twitch credentials: {:#}", e);
            return Err(e);
        }
    };

    let pipeline = MessagePipeline::new(ConfigStore::new(config, &config_path));
    let connection = TwitchConnection::new(twitch_config);

    ChatBot::new(Box::new(connection), pipeline).run().await?;

    info!("WordWatch shutdown complete");
    Ok(())
}
