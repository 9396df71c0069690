//! Binary crate for the `weatherbot` chat bot.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Chat transports (Telegram, console) and the keep-alive listener

use clap::Parser;

mod cli;
mod console;
mod liveness;
mod logger;
mod telegram;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    logger::init(cmd.debug)?;
    cmd.run().await
}
