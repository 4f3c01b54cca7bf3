// WHY: classify a fragment as Zawgyi with an optional trained score plus a fixed override heuristic
// Classification never errors outward; a failing model degrades to the heuristic alone.

use anyhow::Result;
use regex_automata::meta::Regex;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use super::markov::TrainedModel;

/// Scoring capability selected once at startup
pub trait ScoreModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Probability in `[0, 1]` that `text` is Zawgyi encoded
    fn score(&self, text: &str) -> Result<f64>;
}

/// Stand-in when no trained model is available: certainty from the override signals alone
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicModel;

impl ScoreModel for HeuristicModel {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn score(&self, text: &str) -> Result<f64> {
        Ok(if has_zawgyi_signal(text) { 1.0 } else { 0.0 })
    }
}

fn signal_pattern() -> String {
    // characters a canonical dependent sign may directly follow
    let base = "\u{1000}-\u{102A}\u{103B}-\u{103F}\u{104E}\u{1050}-\u{1055}\u{25CC}";
    [
        // legacy glyph-variant block
        "[\u{1060}-\u{1097}]".to_string(),
        // e-vowel or ya-yit written before its consonant
        format!("(?:^|[^{base}])[\u{1031}\u{103B}]"),
        // medial stored after the e-vowel
        "\u{1031}[\u{103B}-\u{103E}]".to_string(),
        // U+1039 used as a visible asat instead of a stacking virama
        "\u{1039}(?:$|[^\u{1000}-\u{1021}])".to_string(),
        // mark orders canonical text never produces
        "\u{1037}\u{1036}".to_string(),
        "\u{1036}[\u{102F}\u{1030}]".to_string(),
        "[\u{102F}\u{1030}][\u{102D}\u{102E}]".to_string(),
        "\u{103A}\u{1037}".to_string(),
        "\u{102D}\u{102D}".to_string(),
    ]
    .join("|")
}

fn signal_regex() -> &'static Regex {
    static SIGNALS: OnceLock<Regex> = OnceLock::new();
    SIGNALS.get_or_init(|| {
        Regex::new(&signal_pattern()).expect("Zawgyi signal pattern is a valid regex")
    })
}

/// True when `text` carries a codepoint or ordering that only Zawgyi-encoded text produces
pub fn has_zawgyi_signal(text: &str) -> bool {
    signal_regex().is_match(text)
}

#[derive(Clone)]
pub struct Detector {
    model: Arc<dyn ScoreModel>,
    threshold: f64,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("model", &self.model.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Detector {
    pub const DEFAULT_THRESHOLD: f64 = 0.95;

    pub fn new(model: Arc<dyn ScoreModel>, threshold: f64) -> Self {
        Self { model, threshold }
    }

    pub fn heuristic() -> Self {
        Self::new(Arc::new(HeuristicModel), Self::DEFAULT_THRESHOLD)
    }

    /// Pick the scoring strategy once: the trained model if it loads, else heuristic only
    pub fn resolve(model_path: Option<&Path>, threshold: f64) -> Self {
        let Some(path) = model_path else {
            debug!("No trained model configured, using heuristic detection");
            return Self::new(Arc::new(HeuristicModel), threshold);
        };

        match TrainedModel::load(path) {
            Ok(model) => {
                info!("Loaded trained Zawgyi model from {}", path.display());
                Self::new(Arc::new(model), threshold)
            }
            Err(e) => {
                warn!("Trained model unavailable ({:#}), falling back to heuristic detection", e);
                Self::new(Arc::new(HeuristicModel), threshold)
            }
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Model score, or `None` when the model cannot give a usable one for this text
    pub fn probability(&self, text: &str) -> Option<f64> {
        match self.model.score(text) {
            Ok(p) if p.is_finite() => Some(p),
            Ok(p) => {
                debug!("Discarding non-finite score {} from {} model", p, self.model.name());
                None
            }
            Err(e) => {
                debug!("{} model could not score fragment: {:#}", self.model.name(), e);
                None
            }
        }
    }

    pub fn is_zawgyi(&self, text: &str) -> bool {
        if has_zawgyi_signal(text) {
            return true;
        }
        self.probability(text).is_some_and(|p| p >= self.threshold)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::heuristic()
    }
}
