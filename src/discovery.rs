use anyhow::{anyhow, Result};
use futures::stream::{self, Stream, StreamExt};
use glob::glob;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// Configuration for input file discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// One input path and whether it can be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

impl FileValidation {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Expand each pattern with `glob`, yielding every match once in pattern order.
/// A pattern without glob metacharacters names a single file and is validated even if missing.
pub fn discover_files(patterns: Vec<String>, config: DiscoveryConfig) -> impl Stream<Item = Result<FileValidation>> {
    let mut seen = HashSet::new();
    let mut candidates: Vec<Result<PathBuf>> = Vec::new();

    for pattern in &patterns {
        let is_literal = !pattern.contains(['*', '?', '[']);
        if is_literal {
            let path = PathBuf::from(pattern);
            if seen.insert(path.clone()) {
                candidates.push(Ok(path));
            }
            continue;
        }

        match glob(pattern) {
            Ok(paths) => {
                let mut matched = 0usize;
                for entry in paths {
                    match entry {
                        Ok(path) => {
                            matched += 1;
                            if seen.insert(path.clone()) {
                                candidates.push(Ok(path));
                            }
                        }
                        Err(e) => candidates.push(Err(anyhow!("Glob iteration error: {e}"))),
                    }
                }
                debug!("Pattern {} matched {} paths", pattern, matched);
            }
            Err(e) => candidates.push(Err(anyhow!("Invalid glob pattern {}: {}", pattern, e))),
        }
    }

    info!("File discovery found {} candidates from {} patterns", candidates.len(), patterns.len());

    stream::iter(candidates).filter_map(move |candidate| {
        let config = config.clone();
        async move {
            match candidate {
                Ok(path) => Some(validate_file(path, &config).await),
                Err(e) if config.fail_fast => Some(Err(e)),
                Err(e) => {
                    warn!("{} (continuing)", e);
                    None
                }
            }
        }
    })
}

async fn validate_file(path: PathBuf, config: &DiscoveryConfig) -> Result<FileValidation> {
    match fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Ok(FileValidation { path, error: None }),
        Ok(_) => {
            let error = format!("Path is not a file: {}", path.display());
            warn!("{}", error);
            Ok(FileValidation {
                path,
                error: Some(error),
            })
        }
        Err(e) => {
            let error = format!("Cannot access file {}: {}", path.display(), e);
            warn!("{}", error);
            if config.fail_fast {
                return Err(anyhow!(error));
            }
            Ok(FileValidation {
                path,
                error: Some(error),
            })
        }
    }
}

/// Collect all discovered files into a Vec for easier processing
pub async fn collect_discovered_files(patterns: Vec<String>, config: DiscoveryConfig) -> Result<Vec<FileValidation>> {
    let mut files = Vec::new();
    let mut stream = Box::pin(discover_files(patterns, config));

    while let Some(result) = stream.next().await {
        files.push(result?);
    }

    let valid_count = files.iter().filter(|f| f.is_valid()).count();
    let invalid_count = files.len() - valid_count;
    if invalid_count > 0 {
        warn!("Found {} inputs with validation issues", invalid_count);
    }
    info!("File discovery summary: {} valid, {} invalid", valid_count, invalid_count);

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_glob_and_literal_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").await.unwrap();
        fs::write(root.join("b.txt"), "b").await.unwrap();
        fs::create_dir(root.join("sub.txt")).await.unwrap();

        let patterns = vec![
            format!("{}/*.txt", root.display()),
            root.join("a.txt").display().to_string(),
        ];
        let files = collect_discovered_files(patterns, DiscoveryConfig::default()).await.unwrap();

        // a.txt listed twice but reported once; the directory matches but is flagged
        assert_eq!(files.len(), 3);
        assert_eq!(files.iter().filter(|f| f.is_valid()).count(), 2);
        assert!(files.iter().any(|f| f.path.ends_with("sub.txt") && !f.is_valid()));
    }

    #[tokio::test]
    async fn test_missing_literal_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt").display().to_string();

        let files = collect_discovered_files(vec![missing.clone()], DiscoveryConfig::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(!files[0].is_valid());

        let strict = DiscoveryConfig { fail_fast: true };
        assert!(collect_discovered_files(vec![missing], strict).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_pattern() {
        let strict = DiscoveryConfig { fail_fast: true };
        assert!(collect_discovered_files(vec!["[".to_string()], strict).await.is_err());

        let lenient = collect_discovered_files(vec!["[".to_string()], DiscoveryConfig::default())
            .await
            .unwrap();
        assert!(lenient.is_empty());
    }
}
