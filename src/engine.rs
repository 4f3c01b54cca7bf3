// WHY: one message-passing interface over both execution modes so the dispatcher never branches on where conversion runs
// Both engines answer on the same reply channel with the same JSON shape.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, warn};

use crate::converter::ConversionService;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Dedicated conversion thread reached only through channels
    #[default]
    Worker,
    /// Conversion runs on the caller's thread during `post`
    Inline,
}

pub trait Engine: Send {
    /// Hand one request message to the engine; the reply arrives on the shared reply channel
    fn post(&self, message: Value) -> Result<()>;

    fn mode(&self) -> ExecutionMode;
}

pub struct InlineEngine {
    service: Arc<ConversionService>,
    replies: UnboundedSender<Value>,
}

impl InlineEngine {
    pub fn new(service: Arc<ConversionService>, replies: UnboundedSender<Value>) -> Self {
        Self { service, replies }
    }
}

impl Engine for InlineEngine {
    fn post(&self, message: Value) -> Result<()> {
        if let Some(reply) = self.service.handle_message(&message) {
            self.replies
                .send(reply)
                .map_err(|_| anyhow!("Reply channel closed"))?;
        }
        Ok(())
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Inline
    }
}

pub struct WorkerEngine {
    requests: Option<UnboundedSender<Value>>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerEngine {
    pub fn spawn(service: Arc<ConversionService>, replies: UnboundedSender<Value>) -> Result<Self> {
        let (requests, mut inbox) = mpsc::unbounded_channel::<Value>();

        let handle = thread::Builder::new()
            .name("zawgyi-engine".to_string())
            .spawn(move || {
                while let Some(message) = inbox.blocking_recv() {
                    let Some(reply) = service.handle_message(&message) else {
                        continue;
                    };
                    if replies.send(reply).is_err() {
                        break;
                    }
                }
                debug!("Conversion worker exiting");
            })
            .context("Failed to spawn conversion worker thread")?;

        Ok(Self {
            requests: Some(requests),
            handle: Some(handle),
        })
    }
}

impl Engine for WorkerEngine {
    fn post(&self, message: Value) -> Result<()> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| anyhow!("Conversion worker already shut down"))?;
        requests
            .send(message)
            .map_err(|_| anyhow!("Conversion worker has stopped"))
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Worker
    }
}

impl Drop for WorkerEngine {
    fn drop(&mut self) {
        // closing the inbox ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Conversion worker panicked");
            }
        }
    }
}

/// Build the engine for `mode`; a worker that cannot start degrades to inline for good
pub fn start_engine(
    mode: ExecutionMode,
    service: Arc<ConversionService>,
    replies: UnboundedSender<Value>,
) -> Box<dyn Engine> {
    match mode {
        ExecutionMode::Inline => Box::new(InlineEngine::new(service, replies)),
        ExecutionMode::Worker => match WorkerEngine::spawn(service.clone(), replies.clone()) {
            Ok(worker) => Box::new(worker),
            Err(e) => {
                warn!("Conversion worker unavailable ({:#}), converting inline", e);
                Box::new(InlineEngine::new(service, replies))
            }
        },
    }
}
