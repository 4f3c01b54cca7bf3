// WHY: one wire shape for the conversion boundary, whether the engine runs inline or on the worker thread

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Methods understood by the conversion engine
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[serde(rename = "detectAndConvert")]
    DetectAndConvert,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversionPayload {
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub convert: bool,
}

/// `{ id, method: "detectAndConvert", payload: { inputs, convert } }`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub id: u64,
    pub method: Method,
    #[serde(default)]
    pub payload: ConversionPayload,
}

impl ConversionRequest {
    pub fn detect_and_convert(id: u64, inputs: Vec<String>, convert: bool) -> Self {
        Self {
            id,
            method: Method::DetectAndConvert,
            payload: ConversionPayload { inputs, convert },
        }
    }

    /// Parse an inbound message; anything missing an id or a known method yields `None`
    pub fn from_message(message: &Value) -> Option<Self> {
        serde_json::from_value(message.clone()).ok()
    }

    pub fn to_message(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Per-input verdict; `converted_text` is only present for positively detected input when conversion was requested
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub input: String,
    pub is_myanmar_script: bool,
    pub is_zawgyi_encoded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConversionResponse {
    pub id: u64,
    #[serde(default)]
    pub results: Vec<ConversionResult>,
}

impl ConversionResponse {
    pub fn from_message(message: &Value) -> Option<Self> {
        serde_json::from_value(message.clone()).ok()
    }

    pub fn to_message(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = ConversionRequest::detect_and_convert(7, vec!["\u{106A}".to_string()], true);
        let message = request.to_message();

        assert_eq!(message["id"], 7);
        assert_eq!(message["method"], "detectAndConvert");
        assert_eq!(message["payload"]["convert"], true);
        assert_eq!(message["payload"]["inputs"][0], "\u{106A}");
    }

    #[test]
    fn test_malformed_requests_rejected() {
        assert!(ConversionRequest::from_message(&json!({ "method": "detectAndConvert" })).is_none());
        assert!(ConversionRequest::from_message(&json!({ "id": 1 })).is_none());
        assert!(ConversionRequest::from_message(&json!({ "id": 1, "method": "shutdown" })).is_none());
        assert!(ConversionRequest::from_message(&json!("garbage")).is_none());
    }

    #[test]
    fn test_missing_payload_defaults_to_empty() {
        let request = ConversionRequest::from_message(&json!({ "id": 3, "method": "detectAndConvert" }))
            .expect("id and method are enough");
        assert!(request.payload.inputs.is_empty());
        assert!(!request.payload.convert);
    }

    #[test]
    fn test_result_omits_absent_conversion() {
        let result = ConversionResult {
            input: "Hello".to_string(),
            is_myanmar_script: false,
            is_zawgyi_encoded: false,
            converted_text: None,
        };
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["isMyanmarScript"], false);
        assert_eq!(value["isZawgyiEncoded"], false);
        assert!(value.get("convertedText").is_none());
    }
}
