// WHY: turn a stream of tree-change records for one root into deduplicated, debounced batches
// One coalescing window per burst: the first accepted unit arms the timer and later ones ride along,
// so a continuous mutation storm still flushes on schedule instead of starving.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::scanner::{scan, ScanPolicy};
use crate::tree::{HostTree, MutationRecord, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Pending { deadline: Instant },
}

#[derive(Debug)]
pub struct MutationTracker {
    root: NodeId,
    debounce: Duration,
    batch_cap: usize,
    state: TrackerState,
    pending: Vec<NodeId>,
    seen: HashSet<NodeId>,
    /// Units whose next content-change record was caused by our own write
    suppressed: HashSet<NodeId>,
}

impl MutationTracker {
    pub fn new(root: NodeId, debounce: Duration, batch_cap: usize) -> Self {
        Self {
            root,
            debounce,
            batch_cap: batch_cap.max(1),
            state: TrackerState::Idle,
            pending: Vec::new(),
            seen: HashSet::new(),
            suppressed: HashSet::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            TrackerState::Idle => None,
            TrackerState::Pending { deadline } => Some(deadline),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn suppressed_len(&self) -> usize {
        self.suppressed.len()
    }

    /// Ignore the content-change record produced by writing `node` ourselves
    pub fn suppress(&mut self, node: NodeId) {
        self.suppressed.insert(node);
    }

    /// Fold records into the pending set; returns how many new units were queued
    pub fn observe<T: HostTree + ?Sized>(
        &mut self,
        tree: &T,
        records: &[MutationRecord],
        policy: &ScanPolicy,
        now: Instant,
    ) -> usize {
        let before = self.pending.len();

        for record in records {
            match record {
                MutationRecord::CharacterData { target } => {
                    if self.suppressed.remove(target) {
                        continue;
                    }
                    if policy.accepts(tree, *target) {
                        self.enqueue(*target);
                    }
                }
                MutationRecord::ChildList { added, removed, .. } => {
                    for node in removed {
                        self.suppressed.remove(node);
                    }
                    let delivered: HashSet<NodeId> = added.iter().copied().collect();
                    for &node in added {
                        if nested_in(tree, node, &delivered) {
                            continue;
                        }
                        let found: Vec<NodeId> = scan(tree, node, policy).collect();
                        for unit in found {
                            self.enqueue(unit);
                        }
                    }
                }
            }
        }

        let queued = self.pending.len() - before;
        if queued > 0 && self.state == TrackerState::Idle {
            self.state = TrackerState::Pending {
                deadline: now + self.debounce,
            };
        }
        queued
    }

    fn enqueue(&mut self, node: NodeId) {
        if self.seen.insert(node) {
            self.pending.push(node);
        }
    }

    /// Batches ready at `now`: full chunks once the cap is reached, everything once the timer expires
    pub fn poll_flush<T: HostTree + ?Sized>(&mut self, tree: &T, now: Instant) -> Vec<Vec<NodeId>> {
        // a unit detached under a removed ancestor never sends the record that would consume its entry
        self.suppressed.retain(|&node| tree.is_alive(node));

        let expired = matches!(self.state, TrackerState::Pending { deadline } if now >= deadline);

        let take = if expired {
            self.pending.len()
        } else {
            self.pending.len() - self.pending.len() % self.batch_cap
        };
        if take == 0 {
            if expired {
                self.state = TrackerState::Idle;
            }
            return Vec::new();
        }

        let drained: Vec<NodeId> = self.pending.drain(..take).collect();
        for node in &drained {
            self.seen.remove(node);
        }
        if self.pending.is_empty() {
            self.state = TrackerState::Idle;
        }

        let live: Vec<NodeId> = drained.into_iter().filter(|&n| tree.is_alive(n)).collect();
        let batches: Vec<Vec<NodeId>> = live.chunks(self.batch_cap).map(<[NodeId]>::to_vec).collect();
        debug!(
            "Flushed {} units in {} batches ({})",
            live.len(),
            batches.len(),
            if expired { "debounce elapsed" } else { "batch cap reached" }
        );
        batches
    }
}

/// `node` sits inside another node delivered by the same record
fn nested_in<T: HostTree + ?Sized>(tree: &T, node: NodeId, delivered: &HashSet<NodeId>) -> bool {
    let mut current = tree.parent(node);
    while let Some(id) = current {
        if delivered.contains(&id) {
            return true;
        }
        current = tree.parent(id);
    }
    false
}
