// WHY: the conversion engine proper; everything on the far side of the request/response boundary
// Stateless apart from the resolved detector, so one service can be shared by the inline and worker engines.

pub mod charset;
pub mod detector;
pub mod markov;
pub mod protocol;
pub mod rules;
pub mod transliterator;

use serde_json::Value;
use tracing::debug;

pub use detector::{has_zawgyi_signal, Detector, HeuristicModel, ScoreModel};
pub use markov::TrainedModel;
pub use protocol::{ConversionRequest, ConversionResponse, ConversionResult, Method};
pub use rules::{Rule, RuleSet};
pub use transliterator::{convert, Transliterator};

#[derive(Debug, Clone, Default)]
pub struct ConversionService {
    detector: Detector,
    transliterator: Transliterator,
}

impl ConversionService {
    pub fn new(detector: Detector, transliterator: Transliterator) -> Self {
        Self {
            detector,
            transliterator,
        }
    }

    pub fn with_detector(detector: Detector) -> Self {
        Self::new(detector, Transliterator::default())
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Classify one input and rewrite it when `convert` is set and it is Zawgyi
    pub fn classify(&self, input: &str, convert: bool) -> ConversionResult {
        let is_myanmar_script = charset::contains_myanmar(input);
        let is_zawgyi_encoded = is_myanmar_script && self.detector.is_zawgyi(input);
        let converted_text = (convert && is_zawgyi_encoded).then(|| self.transliterator.convert(input));

        ConversionResult {
            input: input.to_string(),
            is_myanmar_script,
            is_zawgyi_encoded,
            converted_text,
        }
    }

    /// Results come back in input order
    pub fn detect_and_convert<S: AsRef<str>>(&self, inputs: &[S], convert: bool) -> Vec<ConversionResult> {
        inputs
            .iter()
            .map(|input| self.classify(input.as_ref(), convert))
            .collect()
    }

    pub fn handle(&self, request: &ConversionRequest) -> ConversionResponse {
        let results = match request.method {
            protocol::Method::DetectAndConvert => {
                self.detect_and_convert(&request.payload.inputs, request.payload.convert)
            }
        };
        ConversionResponse {
            id: request.id,
            results,
        }
    }

    /// Message-level entry point; malformed messages get no reply
    pub fn handle_message(&self, message: &Value) -> Option<Value> {
        let Some(request) = ConversionRequest::from_message(message) else {
            debug!("Ignoring malformed conversion message");
            return None;
        };
        Some(self.handle(&request).to_message())
    }
}
