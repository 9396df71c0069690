//! Local transport: command lines on stdin, replies on stdout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use weatherbot_core::{Bot, Reply, ReplySink, WeatherProvider};

fn render(reply: &Reply) -> String {
    match reply {
        Reply::Text(text) => text.clone(),
        Reply::Payload(payload) => {
            let mut out = format!("[{}] {payload}", payload.color);
            if let Some(thumbnail) = &payload.thumbnail {
                out.push_str(&format!("\n({thumbnail})"));
            }
            out
        }
    }
}

struct ConsoleSink<W> {
    out: Mutex<W>,
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ReplySink for ConsoleSink<W> {
    async fn send(&self, reply: Reply) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(format!("{}\n\n", render(&reply)).as_bytes())
            .await
            .context("Failed to write reply")?;
        out.flush().await.context("Failed to flush output")?;
        Ok(())
    }
}

/// Handle every line of `input` until EOF. Returns the output writer.
pub async fn run<P, R, W>(bot: &Bot<P>, input: R, output: W) -> Result<W>
where
    P: WeatherProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let sink = ConsoleSink { out: Mutex::new(output) };
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        if line.trim().is_empty() {
            continue;
        }
        bot.handle(&line, &sink).await?;
    }

    Ok(sink.out.into_inner())
}
