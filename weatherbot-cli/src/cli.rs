use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use tokio::io::BufReader;
use tracing::info;
use weatherbot_core::{Bot, Config, provider_from_config};

use crate::{console, liveness, telegram};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Weather chat bot")]
pub struct Cli {
    /// Verbose logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the bot token and the WeatherAPI.com key in the config file.
    Configure,

    /// Connect to Telegram and answer commands until interrupted.
    Serve {
        /// Do not start the keep-alive HTTP listener.
        #[arg(long)]
        no_liveness: bool,
    },

    /// Read commands from stdin and print replies, without a chat platform.
    Console,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Serve { no_liveness } => serve(no_liveness).await,
            Command::Console => run_console().await,
        }
    }
}

fn prompt_secret(message: &str) -> Result<String> {
    Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .with_context(|| format!("Failed to read {message}"))
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let replace = |present: bool, what: &str| -> Result<bool> {
        if !present {
            return Ok(true);
        }
        Confirm::new(&format!("A {what} is already configured. Replace it?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")
    };

    if replace(config.bot_token.is_some(), "bot token")? {
        config.bot_token = Some(prompt_secret("Telegram bot token:")?);
    }
    if replace(config.provider.api_key.is_some(), "WeatherAPI.com key")? {
        config.provider.api_key = Some(prompt_secret("WeatherAPI.com API key:")?);
    }

    config.save_to(&path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn serve(no_liveness: bool) -> Result<()> {
    let config = Config::load()?;
    let token = config.require_token()?;
    let bot = Arc::new(Bot::new(provider_from_config(&config)?));
    let client = telegram::TelegramClient::new(token)?;

    if config.liveness.enabled && !no_liveness {
        liveness::spawn(&config.liveness.bind).await?;
    }

    tokio::select! {
        res = telegram::run(client, bot) => res,
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for shutdown signal")?;
            info!("shutting down");
            Ok(())
        }
    }
}

async fn run_console() -> Result<()> {
    let config = Config::load()?;
    let bot = Bot::new(provider_from_config(&config)?);

    println!("Type a command such as /weather London or /help. Ctrl-D to exit.");
    console::run(&bot, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    Ok(())
}
