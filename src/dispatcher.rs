// WHY: ship batches across the engine boundary and match replies back to the units that produced them
// Replies for unknown ids or for units that have since left the tree are dropped quietly.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::converter::{ConversionRequest, ConversionResponse, ConversionResult, ConversionService};
use crate::engine::{start_engine, Engine, ExecutionMode, InlineEngine};
use crate::tree::{HostTree, NodeId};

/// A reply matched to its request
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Results for tree units still alive, paired by position
    Units {
        id: u64,
        units: Vec<NodeId>,
        results: Vec<ConversionResult>,
    },
    /// Results for free-standing strings
    Texts { id: u64, results: Vec<ConversionResult> },
}

impl Completion {
    pub fn id(&self) -> u64 {
        match self {
            Completion::Units { id, .. } | Completion::Texts { id, .. } => *id,
        }
    }
}

struct InFlight {
    units: Option<Vec<NodeId>>,
    message: Value,
}

pub struct Dispatcher {
    service: Arc<ConversionService>,
    engine: Box<dyn Engine>,
    reply_tx: UnboundedSender<Value>,
    replies: UnboundedReceiver<Value>,
    in_flight: HashMap<u64, InFlight>,
    next_id: u64,
    convert: bool,
    fell_back: bool,
}

impl Dispatcher {
    pub fn new(service: Arc<ConversionService>, mode: ExecutionMode, convert: bool) -> Self {
        Self::with_engine(service, convert, |service, replies| start_engine(mode, service, replies))
    }

    /// Build around a caller-supplied engine; `make` receives the shared reply sender
    pub fn with_engine<F>(service: Arc<ConversionService>, convert: bool, make: F) -> Self
    where
        F: FnOnce(Arc<ConversionService>, UnboundedSender<Value>) -> Box<dyn Engine>,
    {
        let (reply_tx, replies) = mpsc::unbounded_channel();
        let engine = make(service.clone(), reply_tx.clone());
        Self {
            service,
            engine,
            reply_tx,
            replies,
            in_flight: HashMap::new(),
            next_id: 1,
            convert,
            fell_back: false,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.engine.mode()
    }

    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn convert(&self) -> bool {
        self.convert
    }

    /// Send the live units of `units` as one request; `None` if nothing was left to send
    pub fn submit<T: HostTree + ?Sized>(&mut self, tree: &T, units: &[NodeId]) -> Option<u64> {
        let mut live = Vec::with_capacity(units.len());
        let mut inputs = Vec::with_capacity(units.len());
        for &unit in units {
            if let Some(text) = tree.text(unit) {
                live.push(unit);
                inputs.push(text.to_string());
            }
        }
        if live.is_empty() {
            return None;
        }
        debug!("Submitting batch of {} units", live.len());
        self.send(Some(live), inputs)
    }

    /// One-off request for strings that are not tree units (the document title)
    pub fn submit_texts(&mut self, inputs: Vec<String>) -> Option<u64> {
        self.send(None, inputs)
    }

    fn send(&mut self, units: Option<Vec<NodeId>>, inputs: Vec<String>) -> Option<u64> {
        let id = self.next_id;
        self.next_id += 1;

        let message = ConversionRequest::detect_and_convert(id, inputs, self.convert).to_message();
        self.in_flight.insert(
            id,
            InFlight {
                units,
                message: message.clone(),
            },
        );

        if let Err(e) = self.engine.post(message) {
            if !self.fall_back(&e) {
                self.in_flight.remove(&id);
                warn!("Dropping request {}: {:#}", id, e);
                return None;
            }
        }
        Some(id)
    }

    /// Switch to inline for good and replay everything still unanswered
    fn fall_back(&mut self, error: &anyhow::Error) -> bool {
        if self.engine.mode() == ExecutionMode::Inline {
            return false;
        }
        warn!("Conversion engine unavailable ({:#}), falling back to inline conversion", error);
        self.engine = Box::new(InlineEngine::new(self.service.clone(), self.reply_tx.clone()));
        self.fell_back = true;

        let mut ids: Vec<u64> = self.in_flight.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some(message) = self.in_flight.get(&id).map(|f| f.message.clone()) else {
                continue;
            };
            if let Err(e) = self.engine.post(message) {
                warn!("Inline replay of request {} failed: {:#}", id, e);
                self.in_flight.remove(&id);
            }
        }
        true
    }

    /// Wait for the next reply that matches an outstanding request; `None` once nothing is outstanding
    pub async fn next_completion<T: HostTree + ?Sized>(&mut self, tree: &T) -> Option<Completion> {
        while !self.in_flight.is_empty() {
            let message = self.replies.recv().await?;
            if let Some(completion) = self.accept(tree, &message) {
                return Some(completion);
            }
        }
        None
    }

    /// Like `next_completion` but only looks at replies already delivered
    pub fn try_next_completion<T: HostTree + ?Sized>(&mut self, tree: &T) -> Option<Completion> {
        loop {
            match self.replies.try_recv() {
                Ok(message) => {
                    if let Some(completion) = self.accept(tree, &message) {
                        return Some(completion);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    fn accept<T: HostTree + ?Sized>(&mut self, tree: &T, message: &Value) -> Option<Completion> {
        let Some(response) = ConversionResponse::from_message(message) else {
            debug!("Ignoring malformed reply");
            return None;
        };
        let Some(request) = self.in_flight.remove(&response.id) else {
            debug!("Ignoring reply for unknown request {}", response.id);
            return None;
        };

        let Some(units) = request.units else {
            return Some(Completion::Texts {
                id: response.id,
                results: response.results,
            });
        };

        if units.len() != response.results.len() {
            debug!(
                "Reply {} carries {} results for {} units",
                response.id,
                response.results.len(),
                units.len()
            );
        }
        let (units, results): (Vec<NodeId>, Vec<ConversionResult>) = units
            .into_iter()
            .zip(response.results)
            .filter(|(unit, _)| tree.is_alive(*unit))
            .unzip();

        Some(Completion::Units {
            id: response.id,
            units,
            results,
        })
    }
}
