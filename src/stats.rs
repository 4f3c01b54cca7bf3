// WHY: per-file and per-run metrics for the CLI, written as JSON with --stats-out

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pipeline::PipelineStats;

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FileStats {
    pub path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    /// Candidate units sent for detection
    pub units_scanned: u64,
    pub units_detected: u64,
    pub units_converted: u64,
    pub processing_time_ms: u64,
    /// success, failed, or skipped
    pub status: String,
    pub error: Option<String>,
}

impl FileStats {
    pub fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            status: "failed".to_string(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn skipped(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            status: "skipped".to_string(),
            ..Self::default()
        }
    }

    pub fn record_pipeline(&mut self, stats: PipelineStats) {
        self.units_scanned = stats.units_scanned;
        self.units_detected = stats.units_detected;
        self.units_converted = stats.units_converted;
    }
}

/// Totals across one CLI run
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub files_processed: u64,
    pub files_failed: u64,
    pub files_skipped: u64,
    pub units_detected: u64,
    pub units_converted: u64,
    pub run_time_ms: u64,
    pub files: Vec<FileStats>,
}

impl RunStats {
    pub fn push(&mut self, file: FileStats) {
        match file.status.as_str() {
            "failed" => self.files_failed += 1,
            "skipped" => self.files_skipped += 1,
            _ => self.files_processed += 1,
        }
        self.units_detected += file.units_detected;
        self.units_converted += file.units_converted;
        self.files.push(file);
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_totals() {
        let mut run = RunStats::default();
        run.push(FileStats {
            status: "success".to_string(),
            units_detected: 3,
            units_converted: 2,
            ..FileStats::default()
        });
        run.push(FileStats::failed(Path::new("x.txt"), "boom".to_string()));
        run.push(FileStats::skipped(Path::new("y.txt")));

        assert_eq!(run.files_processed, 1);
        assert_eq!(run.files_failed, 1);
        assert_eq!(run.files_skipped, 1);
        assert_eq!(run.units_converted, 2);
        assert_eq!(run.files.len(), 3);
    }

    #[tokio::test]
    async fn test_save_writes_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.json");
        let mut run = RunStats::default();
        run.push(FileStats::skipped(Path::new("a.txt")));
        run.save(&path).await.unwrap();

        let parsed: RunStats = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(parsed, run);
    }
}
