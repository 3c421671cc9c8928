use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A stage of the remote search pipeline as reported on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    RetrievedParents,
    LlmResponse,
    OutputParser,
    PostProcessing,
    Final,
    Error,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetrievedParents => "retrieved_parents",
            Self::LlmResponse => "llm_response",
            Self::OutputParser => "output_parser",
            Self::PostProcessing => "post_processing",
            Self::Final => "final",
            Self::Error => "error",
        }
    }

    /// `final` and `error` end the logical event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Final | Self::Error)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retrieved_parents" => Ok(Self::RetrievedParents),
            "llm_response" => Ok(Self::LlmResponse),
            "output_parser" => Ok(Self::OutputParser),
            "post_processing" => Ok(Self::PostProcessing),
            "final" => Ok(Self::Final),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown step: {}", other)),
        }
    }
}

/// One decoded event of the search stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub step: Step,
    pub data: Map<String, Value>,
}

impl StreamEvent {
    pub fn new(step: Step, data: Map<String, Value>) -> Self {
        Self { step, data }
    }

    /// An `error` event produced locally rather than by the service.
    pub fn synthetic_error(message: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("message".to_string(), Value::String(message.into()));
        Self::new(Step::Error, data)
    }

    /// Builds an event from a parsed `{step, data}` payload.
    ///
    /// Returns `None` when `step` is missing or not one of the known names. A missing
    /// or non-object `data` becomes an empty map.
    pub fn from_payload(payload: Value) -> Option<Self> {
        let Value::Object(mut object) = payload else {
            return None;
        };
        let step = object.get("step")?.as_str()?.parse::<Step>().ok()?;
        let data = match object.remove("data") {
            Some(Value::Object(data)) => data,
            _ => Map::new(),
        };
        Some(Self { step, data })
    }

    pub fn is_terminal(&self) -> bool {
        self.step.is_terminal()
    }

    /// Numeric field, `0` when absent, negative or not a number. Floats such as
    /// `3.0` are truncated.
    pub fn count(&self, key: &str) -> u64 {
        let Some(value) = self.data.get(key) else {
            return 0;
        };
        value
            .as_u64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n as u64)
            })
            .unwrap_or(0)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}
