pub mod converter;
pub mod discovery;
pub mod dispatcher;
pub mod engine;
pub mod mutation_tracker;
pub mod pipeline;
pub mod processing;
pub mod reader;
pub mod scanner;
pub mod settings;
pub mod stats;
pub mod tree;
pub mod updater;

// Re-export main types for convenient access
pub use converter::{
    convert, ConversionRequest, ConversionResponse, ConversionResult, ConversionService, Detector, ScoreModel,
    TrainedModel, Transliterator,
};
pub use dispatcher::{Completion, Dispatcher};
pub use engine::{Engine, ExecutionMode};
pub use mutation_tracker::{MutationTracker, TrackerState};
pub use pipeline::{Pipeline, PipelineContext, PipelineStats};
pub use scanner::{scan, ScanPolicy, Scanner};
pub use settings::{Settings, SiteRule};
pub use tree::{Document, HostTree, MutationRecord, NodeId};
pub use updater::Updater;
