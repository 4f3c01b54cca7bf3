// WHY: trained first-order Markov classifier giving a Zawgyi probability per fragment
// Stores per-bigram log-odds between a Zawgyi corpus and a Unicode corpus.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::charset;
use super::detector::ScoreModel;

const MODEL_FORMAT: u32 = 1;

/// One symbol per Myanmar block codepoint plus a shared "other" symbol at index 0
pub const SYMBOLS: usize = 1 + 0xA0;

fn symbol(c: char) -> usize {
    if charset::is_myanmar(c) {
        1 + (c as usize - 0x1000)
    } else {
        0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainedModel {
    format: u32,
    /// Row-major `SYMBOLS x SYMBOLS` table of `ln(P_zawgyi(b|a) / P_unicode(b|a))`
    log_odds: Vec<f32>,
}

/// Per-row transition counts for one corpus
struct TransitionCounts {
    counts: Vec<u32>,
    row_totals: Vec<u64>,
}

impl TransitionCounts {
    fn new() -> Self {
        Self {
            counts: vec![0; SYMBOLS * SYMBOLS],
            row_totals: vec![0; SYMBOLS],
        }
    }

    fn observe(&mut self, text: &str) {
        for (a, b) in bigrams(text) {
            self.counts[a * SYMBOLS + b] += 1;
            self.row_totals[a] += 1;
        }
    }

    /// Add-one smoothed `ln P(b|a)`
    fn log_probability(&self, a: usize, b: usize) -> f64 {
        let count = self.counts[a * SYMBOLS + b] as f64 + 1.0;
        let total = self.row_totals[a] as f64 + SYMBOLS as f64;
        (count / total).ln()
    }
}

/// Symbol pairs touching the Myanmar range; runs of unrelated text contribute nothing
fn bigrams(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut previous: Option<usize> = None;
    text.chars().filter_map(move |c| {
        let current = symbol(c);
        let pair = previous.map(|p| (p, current));
        previous = Some(current);
        pair.filter(|&(a, b)| a != 0 || b != 0)
    })
}

impl TrainedModel {
    pub fn train<Z, U, S>(zawgyi: Z, unicode: U) -> Result<Self>
    where
        Z: IntoIterator<Item = S>,
        U: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut z_counts = TransitionCounts::new();
        let mut u_counts = TransitionCounts::new();
        let mut z_samples = 0usize;
        let mut u_samples = 0usize;

        for sample in zawgyi {
            z_counts.observe(sample.as_ref());
            z_samples += 1;
        }
        for sample in unicode {
            u_counts.observe(sample.as_ref());
            u_samples += 1;
        }

        if z_samples == 0 || u_samples == 0 {
            bail!("Training needs at least one Zawgyi and one Unicode sample");
        }

        let mut log_odds = Vec::with_capacity(SYMBOLS * SYMBOLS);
        for a in 0..SYMBOLS {
            for b in 0..SYMBOLS {
                let odds = z_counts.log_probability(a, b) - u_counts.log_probability(a, b);
                log_odds.push(odds as f32);
            }
        }

        info!("Trained Zawgyi model on {} Zawgyi and {} Unicode samples", z_samples, u_samples);
        Ok(Self {
            format: MODEL_FORMAT,
            log_odds,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let model: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model file {}", path.display()))?;
        model.validate()?;
        debug!("Model {} validated", path.display());
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write model file {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.format != MODEL_FORMAT {
            bail!("Unsupported model format {} (expected {})", self.format, MODEL_FORMAT);
        }
        if self.log_odds.len() != SYMBOLS * SYMBOLS {
            bail!("Model table has {} entries, expected {}", self.log_odds.len(), SYMBOLS * SYMBOLS);
        }
        Ok(())
    }

    /// Summed log-odds over every Myanmar bigram in `text`
    pub fn log_odds(&self, text: &str) -> Result<f64> {
        let mut total = 0.0f64;
        let mut seen = 0usize;
        for (a, b) in bigrams(text) {
            let Some(&odds) = self.log_odds.get(a * SYMBOLS + b) else {
                bail!("Model table truncated");
            };
            total += odds as f64;
            seen += 1;
        }
        if seen == 0 {
            bail!("No Myanmar bigrams to score");
        }
        Ok(total)
    }
}

impl ScoreModel for TrainedModel {
    fn name(&self) -> &'static str {
        "markov"
    }

    fn score(&self, text: &str) -> Result<f64> {
        let odds = self.log_odds(text)?;
        let p = 1.0 / (1.0 + (-odds).exp());
        if !p.is_finite() {
            bail!("Score overflowed for fragment of {} bytes", text.len());
        }
        Ok(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Zawgyi order: e-vowel before consonant, U+1039 as asat
    const ZAWGYI: &[&str] = &[
        "\u{1031}\u{1000}\u{102C}\u{1004}\u{1039}\u{1038}",
        "\u{1031}\u{1019}\u{1037}\u{1031}\u{101C}\u{102C}",
        "\u{1031}\u{1015}\u{102B}\u{1004}\u{1039}",
    ];

    const UNICODE: &[&str] = &[
        "\u{1000}\u{1031}\u{102C}\u{1004}\u{103A}\u{1038}",
        "\u{1019}\u{1031}\u{1037}\u{101C}\u{1031}\u{102C}",
        "\u{1015}\u{1031}\u{102B}\u{1004}\u{103A}",
    ];

    #[test]
    fn test_trained_model_separates_encodings() {
        let model = TrainedModel::train(ZAWGYI.iter(), UNICODE.iter()).unwrap();

        let zawgyi_score = model.score(ZAWGYI[0]).unwrap();
        let unicode_score = model.score(UNICODE[0]).unwrap();

        assert!(zawgyi_score > 0.5, "zawgyi scored {zawgyi_score}");
        assert!(unicode_score < 0.5, "unicode scored {unicode_score}");
    }

    #[test]
    fn test_score_without_myanmar_is_error() {
        let model = TrainedModel::train(ZAWGYI.iter(), UNICODE.iter()).unwrap();
        assert!(model.score("plain ascii").is_err());
        assert!(model.score("").is_err());
    }

    #[test]
    fn test_train_requires_both_corpora() {
        let empty: Vec<&str> = Vec::new();
        assert!(TrainedModel::train(ZAWGYI.iter().copied(), empty).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("models").join("zawgyi.json");

        let model = TrainedModel::train(ZAWGYI.iter(), UNICODE.iter()).unwrap();
        model.save(&path).unwrap();

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.score(ZAWGYI[1]).unwrap(), model.score(ZAWGYI[1]).unwrap());
    }

    #[test]
    fn test_load_rejects_wrong_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{"format": 99, "log_odds": []}"#).unwrap();

        assert!(TrainedModel::load(&path).is_err());
    }
}
