use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::Reply;

/// Where the router delivers replies for one conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: Reply) -> anyhow::Result<()>;
}

/// Sink that keeps every reply in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    replies: Mutex<Vec<Reply>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, reply: Reply) -> anyhow::Result<()> {
        self.replies
            .lock()
            .map_err(|_| anyhow::anyhow!("reply buffer poisoned"))?
            .push(reply);
        Ok(())
    }
}
