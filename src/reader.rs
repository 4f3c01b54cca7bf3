use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, warn};

/// Configuration for file reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// Terminator a line ended with in the source file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline
    Unterminated,
}

impl LineEnding {
    fn of(raw: &str) -> Self {
        if raw.ends_with("\r\n") {
            LineEnding::CrLf
        } else if raw.ends_with('\n') {
            LineEnding::Lf
        } else {
            LineEnding::Unterminated
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Unterminated => b"",
        }
    }
}

/// Statistics for one file read
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
    /// Input ended with a newline
    pub trailing_newline: bool,
    /// One terminator per line read, so a rewrite reproduces the original endings
    #[serde(skip)]
    pub line_endings: Vec<LineEnding>,
}

/// Line-oriented async reader for text inputs
pub struct AsyncFileReader {
    config: ReaderConfig,
}

impl AsyncFileReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    fn fail(&self, stats: ReadStats, lines: Vec<String>, error_msg: String) -> Result<(Vec<String>, ReadStats)> {
        warn!("{}", error_msg);
        if self.config.fail_fast {
            return Err(anyhow!(error_msg));
        }
        Ok((
            lines,
            ReadStats {
                read_error: Some(error_msg),
                ..stats
            },
        ))
    }

    /// Read a UTF-8 file line by line; a decoding error keeps the lines read so far unless failing fast
    pub async fn read_file_lines<P: AsRef<Path>>(&self, file_path: P) -> Result<(Vec<String>, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();
        let mut stats = ReadStats {
            file_path: path.display().to_string(),
            ..ReadStats::default()
        };

        debug!("Starting async read of file: {}", path.display());

        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                stats.duration_ms = start_time.elapsed().as_millis() as u64;
                return self.fail(stats, Vec::new(), format!("Failed to open file {}: {}", path.display(), e));
            }
        };

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut lines = Vec::new();
        let mut buffer = String::new();

        loop {
            buffer.clear();
            match reader.read_line(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    stats.bytes_read += n as u64;
                    stats.lines_read += 1;
                    stats.trailing_newline = buffer.ends_with('\n');
                    stats.line_endings.push(LineEnding::of(&buffer));
                    let line = buffer.strip_suffix('\n').unwrap_or(&buffer);
                    let line = line.strip_suffix('\r').unwrap_or(line);
                    lines.push(line.to_string());
                }
                Err(e) => {
                    stats.duration_ms = start_time.elapsed().as_millis() as u64;
                    let error_msg = format!(
                        "UTF-8 decoding error in {} at line {}: {}",
                        path.display(),
                        stats.lines_read + 1,
                        e
                    );
                    return self.fail(stats, lines, error_msg);
                }
            }
        }

        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        debug!(
            "Read {}: {} lines, {} bytes in {}ms",
            path.display(),
            stats.lines_read,
            stats.bytes_read,
            stats.duration_ms
        );
        Ok((lines, stats))
    }
}

/// Write `lines` with the terminators in `endings`, replacing the file atomically via a sibling temp file.
/// Lines past the end of `endings` get the last recorded terminator, or `\n` when none was recorded.
pub async fn write_file_lines<P: AsRef<Path>>(file_path: P, lines: &[String], endings: &[LineEnding]) -> Result<()> {
    let path = file_path.as_ref();
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".zawgyi-sweep.tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let fallback = endings
        .iter()
        .rev()
        .copied()
        .find(|e| *e != LineEnding::Unterminated)
        .unwrap_or_default();

    let file = File::create(&tmp_path)
        .await
        .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
    let mut writer = BufWriter::new(file);
    for (i, line) in lines.iter().enumerate() {
        writer.write_all(line.as_bytes()).await?;
        let ending = endings.get(i).copied().unwrap_or(fallback);
        // only the final line may go unterminated
        let ending = if ending == LineEnding::Unterminated && i + 1 < lines.len() {
            fallback
        } else {
            ending
        };
        writer.write_all(ending.as_bytes()).await?;
    }
    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    async fn create_test_file(dir: &Path, name: &str, content: &[u8]) -> Result<std::path::PathBuf> {
        let file_path = dir.join(name);
        fs::write(&file_path, content).await?;
        Ok(file_path)
    }

    #[tokio::test]
    async fn test_read_myanmar_lines() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        let content = "\u{1031}\u{1000}\r\nHello\n\u{106A}\n";
        let file_path = create_test_file(temp_dir.path(), "zg.txt", content.as_bytes()).await.unwrap();

        let (lines, stats) = reader.read_file_lines(&file_path).await.unwrap();
        assert_eq!(lines, vec!["\u{1031}\u{1000}", "Hello", "\u{106A}"]);
        assert_eq!(stats.lines_read, 3);
        assert_eq!(stats.bytes_read, content.len() as u64);
        assert!(stats.trailing_newline);
        assert!(stats.read_error.is_none());
    }

    #[tokio::test]
    async fn test_read_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());
        let file_path = create_test_file(temp_dir.path(), "empty.txt", b"").await.unwrap();

        let (lines, stats) = reader.read_file_lines(&file_path).await.unwrap();
        assert!(lines.is_empty());
        assert_eq!(stats.bytes_read, 0);
        assert!(!stats.trailing_newline);
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nonexistent.txt");

        let lenient = AsyncFileReader::new(ReaderConfig::default());
        let (lines, stats) = lenient.read_file_lines(&file_path).await.unwrap();
        assert!(lines.is_empty());
        assert!(stats.read_error.is_some());

        let strict = AsyncFileReader::new(ReaderConfig {
            fail_fast: true,
            ..Default::default()
        });
        assert!(strict.read_file_lines(&file_path).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_keeps_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());
        let file_path = create_test_file(temp_dir.path(), "bad.txt", b"ok line\n\xff\xfe\n").await.unwrap();

        let (lines, stats) = reader.read_file_lines(&file_path).await.unwrap();
        assert_eq!(lines, vec!["ok line"]);
        assert!(stats.read_error.unwrap().contains("line 2"));
    }

    #[tokio::test]
    async fn test_write_round_trips_trailing_newline() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        let lines = vec!["\u{1000}\u{1031}".to_string(), "Hello".to_string()];

        write_file_lines(&path, &lines, &[LineEnding::Lf, LineEnding::Lf]).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "\u{1000}\u{1031}\nHello\n");

        write_file_lines(&path, &lines, &[LineEnding::Lf, LineEnding::Unterminated]).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "\u{1000}\u{1031}\nHello");
    }

    #[tokio::test]
    async fn test_crlf_and_mixed_endings_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let reader = AsyncFileReader::new(ReaderConfig::default());

        for content in ["\u{1064}\r\nHello\r\n", "\u{1064}\r\nHello\nlast", "a\nb\r\n"] {
            let path = create_test_file(temp_dir.path(), "endings.txt", content.as_bytes()).await.unwrap();
            let (lines, stats) = reader.read_file_lines(&path).await.unwrap();
            assert!(lines.iter().all(|l| !l.ends_with('\r')));

            write_file_lines(&path, &lines, &stats.line_endings).await.unwrap();
            assert_eq!(fs::read_to_string(&path).await.unwrap(), content);
        }
    }

    #[tokio::test]
    async fn test_write_without_recorded_endings_uses_last_terminator() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        let lines = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        write_file_lines(&path, &lines, &[LineEnding::CrLf]).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "a\r\nb\r\nc\r\n");
    }
}
