// WHY: single context object created at bootstrap and threaded through every stage
// Scanner/MutationTracker feed the Dispatcher, completions go to the Updater; settings changes re-bootstrap
// everything except the snapshot table so a later revert still restores the true originals.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::converter::{ConversionService, Detector};
use crate::dispatcher::{Completion, Dispatcher};
use crate::engine::ExecutionMode;
use crate::mutation_tracker::MutationTracker;
use crate::scanner::{scan, ScanPolicy};
use crate::settings::Settings;
use crate::tree::{HostTree, MutationRecord, NodeId};
use crate::updater::Updater;

/// Everything the stages need, resolved once from settings
#[derive(Debug, Clone)]
pub struct PipelineContext {
    service: Arc<ConversionService>,
    policy: ScanPolicy,
    debounce: Duration,
    batch_size: usize,
    convert: bool,
    execution: ExecutionMode,
}

impl PipelineContext {
    pub fn from_settings(settings: &Settings) -> Self {
        let detector = Detector::resolve(settings.model_path.as_deref(), settings.detection_threshold);
        Self::with_service(settings, Arc::new(ConversionService::with_detector(detector)))
    }

    /// Reuse an already-resolved service instead of loading the model again
    pub fn with_service(settings: &Settings, service: Arc<ConversionService>) -> Self {
        Self {
            service,
            policy: settings.scan_policy(),
            debounce: settings.debounce(),
            batch_size: settings.batch_size(),
            convert: settings.convert_to_unicode,
            execution: settings.execution,
        }
    }

    pub fn service(&self) -> &Arc<ConversionService> {
        &self.service
    }

    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub units_scanned: u64,
    pub batches_submitted: u64,
    pub units_detected: u64,
    pub units_converted: u64,
}

pub struct Pipeline {
    context: PipelineContext,
    host: Option<String>,
    trackers: Vec<MutationTracker>,
    dispatcher: Dispatcher,
    updater: Updater,
    active: bool,
    stats: PipelineStats,
}

impl Pipeline {
    /// Start on `roots` (the document root plus any isolated sub-roots the caller found).
    /// `None` when the settings disable conversion for this host.
    pub fn bootstrap<T: HostTree + ?Sized>(
        settings: &Settings,
        tree: &T,
        roots: &[NodeId],
        host: Option<&str>,
    ) -> Option<Self> {
        if !settings.should_run_on(host) {
            info!("Conversion disabled for {}", host.unwrap_or("local document"));
            return None;
        }
        let context = PipelineContext::from_settings(settings);
        Some(Self::start(context, tree, roots, host))
    }

    pub fn start<T: HostTree + ?Sized>(
        context: PipelineContext,
        tree: &T,
        roots: &[NodeId],
        host: Option<&str>,
    ) -> Self {
        let dispatcher = Dispatcher::new(context.service.clone(), context.execution, context.convert);
        let mut pipeline = Self {
            context,
            host: host.map(str::to_string),
            trackers: Vec::new(),
            dispatcher,
            updater: Updater::new(),
            active: true,
            stats: PipelineStats::default(),
        };
        pipeline.attach(tree, roots);
        pipeline
    }

    fn attach<T: HostTree + ?Sized>(&mut self, tree: &T, roots: &[NodeId]) {
        for &root in roots {
            if !tree.is_alive(root) || self.trackers.iter().any(|t| t.root() == root) {
                continue;
            }
            self.trackers.push(MutationTracker::new(
                root,
                self.context.debounce,
                self.context.batch_size,
            ));

            let units: Vec<NodeId> = scan(tree, root, &self.context.policy).collect();
            self.stats.units_scanned += units.len() as u64;
            for batch in units.chunks(self.context.batch_size) {
                self.submit(tree, batch);
            }
        }
        info!(
            "Pipeline started on {} roots ({} units, {:?} engine, detector {}, convert={})",
            self.trackers.len(),
            self.stats.units_scanned,
            self.dispatcher.mode(),
            self.context.service.detector().model_name(),
            self.context.convert
        );
    }

    fn submit<T: HostTree + ?Sized>(&mut self, tree: &T, batch: &[NodeId]) {
        if self.dispatcher.submit(tree, batch).is_some() {
            self.stats.batches_submitted += 1;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    fn tracker_for<T: HostTree + ?Sized>(&mut self, tree: &T, node: NodeId) -> Option<&mut MutationTracker> {
        self.trackers.iter_mut().find(|t| tree.contains(t.root(), node))
    }

    /// Route change records to the tracker of the root they happened under, then flush anything over the cap
    pub fn on_mutations<T: HostTree + ?Sized>(&mut self, tree: &T, records: &[MutationRecord], now: Instant) {
        if !self.active || records.is_empty() {
            return;
        }

        let removed_any = records
            .iter()
            .any(|r| matches!(r, MutationRecord::ChildList { removed, .. } if !removed.is_empty()));
        if removed_any {
            let pruned = self.updater.prune_detached(tree);
            if pruned > 0 {
                debug!("Forgot {} snapshots of detached units", pruned);
            }
        }

        let mut routed: Vec<Vec<MutationRecord>> = vec![Vec::new(); self.trackers.len()];
        for record in records {
            let target = record.target();
            if let Some(index) = self.trackers.iter().position(|t| tree.contains(t.root(), target)) {
                routed[index].push(record.clone());
            }
        }

        let mut queued = 0;
        for (tracker, records) in self.trackers.iter_mut().zip(&routed) {
            if !records.is_empty() {
                queued += tracker.observe(tree, records, &self.context.policy, now);
            }
        }
        if queued > 0 {
            debug!("Queued {} changed units", queued);
        }
        self.flush_due(tree, now);
    }

    /// Submit every batch whose tracker is over the cap or past its debounce deadline
    pub fn flush_due<T: HostTree + ?Sized>(&mut self, tree: &T, now: Instant) -> usize {
        let batches: Vec<Vec<NodeId>> = self
            .trackers
            .iter_mut()
            .flat_map(|t| t.poll_flush(tree, now))
            .collect();
        for batch in &batches {
            self.stats.units_scanned += batch.len() as u64;
            self.submit(tree, batch);
        }
        batches.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.trackers.iter().filter_map(MutationTracker::deadline).min()
    }

    pub async fn next_completion<T: HostTree + ?Sized>(&mut self, tree: &T) -> Option<Completion> {
        self.dispatcher.next_completion(tree).await
    }

    /// Commit one completion; returns how many units were rewritten
    pub fn apply_completion<T: HostTree + ?Sized>(&mut self, tree: &mut T, completion: Completion) -> usize {
        let Completion::Units { units, results, .. } = completion else {
            return 0;
        };
        self.stats.units_detected += results.iter().filter(|r| r.is_zawgyi_encoded).count() as u64;
        if !self.context.convert {
            return 0;
        }

        // only units actually written are suppressed; a skipped unit's own change record must still queue it
        let written = self.updater.apply(tree, &units, &results);
        for &unit in &written {
            if let Some(tracker) = self.tracker_for(&*tree, unit) {
                tracker.suppress(unit);
            }
        }
        self.stats.units_converted += written.len() as u64;
        written.len()
    }

    /// One-off conversion of the document title; `Some` only when it was Zawgyi and got rewritten
    pub async fn convert_title<T: HostTree + ?Sized>(&mut self, tree: &mut T, title: &str) -> Option<String> {
        if !self.active || title.trim().is_empty() {
            return None;
        }
        let id = self.dispatcher.submit_texts(vec![title.to_string()])?;
        loop {
            let completion = self.dispatcher.next_completion(&*tree).await?;
            if completion.id() != id {
                self.apply_completion(tree, completion);
                continue;
            }
            let Completion::Texts { results, .. } = completion else {
                return None;
            };
            return results
                .into_iter()
                .next()
                .filter(|r| r.is_zawgyi_encoded)
                .and_then(|r| r.converted_text)
                .filter(|converted| converted != title);
        }
    }

    /// Run until no timer is armed, no reply is outstanding and the tree has nothing queued
    pub async fn settle<T: HostTree + ?Sized>(&mut self, tree: &mut T) {
        loop {
            let records = tree.take_records();
            if !records.is_empty() {
                self.on_mutations(&*tree, &records, Instant::now());
            }
            self.flush_due(&*tree, Instant::now());

            if self.dispatcher.in_flight() > 0 {
                if let Some(completion) = self.dispatcher.next_completion(&*tree).await {
                    self.apply_completion(tree, completion);
                    continue;
                }
            }

            match self.next_deadline() {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => break,
            }
        }
    }

    /// Restore every rewritten unit; the restoring writes are not picked up as new changes
    pub fn revert_all<T: HostTree + ?Sized>(&mut self, tree: &mut T) -> usize {
        let restored = self.updater.revert_all(tree);
        for &unit in &restored {
            if let Some(tracker) = self.tracker_for(&*tree, unit) {
                tracker.suppress(unit);
            }
        }
        info!("Reverted {} units", restored.len());
        restored.len()
    }

    /// Re-bootstrap under new settings. In-flight batches are abandoned; snapshots are kept.
    /// Returns whether the pipeline is running afterwards.
    pub fn reconfigure<T: HostTree + ?Sized>(&mut self, settings: &Settings, tree: &T, roots: &[NodeId]) -> bool {
        let context = PipelineContext::from_settings(settings);
        self.reconfigure_with(settings, context, tree, roots)
    }

    pub fn reconfigure_with<T: HostTree + ?Sized>(
        &mut self,
        settings: &Settings,
        context: PipelineContext,
        tree: &T,
        roots: &[NodeId],
    ) -> bool {
        self.dispatcher = Dispatcher::new(context.service.clone(), context.execution, context.convert);
        self.context = context;
        self.trackers.clear();
        self.stats = PipelineStats::default();

        self.active = settings.should_run_on(self.host.as_deref());
        if !self.active {
            info!("Pipeline stopped by settings change");
            return false;
        }
        self.attach(tree, roots);
        true
    }
}
