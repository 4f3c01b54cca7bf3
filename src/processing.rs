// WHY: run the full pipeline over text files for the CLI, one document per file
// Each line becomes one paragraph so detection and rewriting stay per line, as in a page.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::converter::ConversionService;
use crate::pipeline::{Pipeline, PipelineContext};
use crate::reader::{write_file_lines, AsyncFileReader, ReaderConfig};
use crate::settings::Settings;
use crate::stats::FileStats;
use crate::tree::{Document, HostTree};

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Rewrite files whose content changed instead of only returning the converted lines
    pub in_place: bool,
    pub fail_fast: bool,
    pub reader: ReaderConfig,
}

/// Converted lines plus the stats for one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub lines: Vec<String>,
    pub stats: FileStats,
}

/// Push `lines` through scan, dispatch and update; returns the resulting lines and pipeline stats
pub async fn convert_lines(
    settings: &Settings,
    service: Arc<ConversionService>,
    lines: &[String],
) -> (Vec<String>, crate::pipeline::PipelineStats) {
    let (mut document, text_nodes) = Document::from_lines(lines);
    let root = document.root();
    let context = PipelineContext::with_service(settings, service);
    let mut pipeline = Pipeline::start(context, &document, &[root], None);
    pipeline.settle(&mut document).await;

    let converted = text_nodes
        .iter()
        .zip(lines)
        .map(|(&node, original)| document.text(node).unwrap_or(original).to_string())
        .collect();
    (converted, pipeline.stats())
}

pub async fn process_file(
    path: &Path,
    settings: &Settings,
    service: Arc<ConversionService>,
    options: &ProcessOptions,
) -> Result<FileOutcome> {
    let start = Instant::now();
    let reader = AsyncFileReader::new(ReaderConfig {
        fail_fast: options.fail_fast,
        ..options.reader.clone()
    });
    let (lines, read_stats) = reader.read_file_lines(path).await?;

    if let Some(error) = read_stats.read_error {
        return Ok(FileOutcome {
            path: path.to_path_buf(),
            lines,
            stats: FileStats::failed(path, error),
        });
    }

    let (converted, pipeline_stats) = convert_lines(settings, service, &lines).await;

    let mut stats = FileStats {
        path: path.display().to_string(),
        lines_read: read_stats.lines_read,
        bytes_read: read_stats.bytes_read,
        status: "success".to_string(),
        ..FileStats::default()
    };
    stats.record_pipeline(pipeline_stats);

    if options.in_place && stats.units_converted > 0 {
        write_file_lines(path, &converted, &read_stats.line_endings).await?;
        info!("Rewrote {} ({} lines converted)", path.display(), stats.units_converted);
    }

    stats.processing_time_ms = start.elapsed().as_millis() as u64;
    Ok(FileOutcome {
        path: path.to_path_buf(),
        lines: converted,
        stats,
    })
}

/// Process files concurrently on the current task; with `fail_fast` the first error aborts the run.
/// `on_done` sees outcomes as they complete; the returned outcomes are in input order.
pub async fn process_files_parallel(
    paths: Vec<PathBuf>,
    settings: &Settings,
    service: Arc<ConversionService>,
    options: &ProcessOptions,
    concurrency: usize,
    mut on_done: impl FnMut(&FileOutcome),
) -> Result<Vec<FileOutcome>> {
    let mut outcomes = stream::iter(paths.into_iter().enumerate())
        .map(|(index, path)| {
            let service = service.clone();
            async move {
                let result = process_file(&path, settings, service, options).await;
                (index, path, result)
            }
        })
        .buffer_unordered(concurrency.max(1));

    let mut results = Vec::new();
    while let Some((index, path, result)) = outcomes.next().await {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                warn!("Failed to process {}: {:#}", path.display(), e);
                FileOutcome {
                    stats: FileStats::failed(&path, format!("{e:#}")),
                    path,
                    lines: Vec::new(),
                }
            }
        };
        on_done(&outcome);
        results.push((index, outcome));
    }
    results.sort_unstable_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, outcome)| outcome).collect())
}
