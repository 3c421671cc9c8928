//! Folding stream events into user-facing progress.

use serde::Serialize;
use serde_json::{Map, Value};
use sm_core::{Document, SearchOutcome, Step, StreamEvent, GENERIC_ERROR_MESSAGE};
use tracing::trace;

pub const NO_RESULTS_MESSAGE: &str = "No results found for this query";
pub const STREAM_ENDED_MESSAGE: &str = "The search stream ended before a final result";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Retrieving,
    Generating,
    Structuring,
    Validating,
    Done,
    Failed,
}

impl Phase {
    pub fn from_step(step: Step) -> Self {
        match step {
            Step::RetrievedParents => Self::Retrieving,
            Step::LlmResponse => Self::Generating,
            Step::OutputParser => Self::Structuring,
            Step::PostProcessing => Self::Validating,
            Step::Final => Self::Done,
            Step::Error => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectionContent {
    Text(String),
    Structured(Value),
}

impl std::fmt::Display for ProjectionContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Structured(value) => write!(f, "{}", value),
        }
    }
}

/// Summary of the step currently in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressProjection {
    pub step: Step,
    pub title: String,
    pub content: ProjectionContent,
}

impl ProgressProjection {
    fn text(step: Step, title: &str, content: impl Into<String>) -> Self {
        Self {
            step,
            title: title.to_string(),
            content: ProjectionContent::Text(content.into()),
        }
    }
}

/// Progress of one search invocation.
///
/// `idle -> retrieving -> generating -> structuring -> validating -> done | failed`,
/// driven by the step of each event. Once `done` or `failed` is reached every
/// further event is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressStateMachine {
    phase: Phase,
    projection: Option<ProgressProjection>,
    status: String,
    outcome: Option<SearchOutcome>,
}

impl ProgressStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn projection(&self) -> Option<&ProgressProjection> {
        self.projection.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn outcome(&self) -> Option<&SearchOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Next state after `event`.
    pub fn apply(self, event: &StreamEvent) -> Self {
        if self.is_terminal() {
            trace!("Ignoring {} after the search finished", event.step);
            return self;
        }

        let phase = Phase::from_step(event.step);
        match event.step {
            Step::RetrievedParents => {
                let count = event.count("count");
                self.progress(
                    phase,
                    ProgressProjection::text(event.step, "Retrieved Sources", format!("{} sources", count)),
                    format!("Retrieved {} sources...", count),
                )
            }
            Step::LlmResponse => self.progress(
                phase,
                ProgressProjection::text(event.step, "LLM Response", event.text("text").unwrap_or_default()),
                "Generating response...".to_string(),
            ),
            Step::OutputParser => {
                let format = match event.data.get("format") {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => Value::Object(Map::new()),
                };
                self.progress(
                    phase,
                    ProgressProjection {
                        step: event.step,
                        title: "Structuring Output".to_string(),
                        content: ProjectionContent::Structured(format),
                    },
                    "Structuring output...".to_string(),
                )
            }
            Step::PostProcessing => {
                let validated = event.count("validated_docs");
                self.progress(
                    phase,
                    ProgressProjection::text(event.step, "Validating Results", format!("{} validated", validated)),
                    "Validating results...".to_string(),
                )
            }
            Step::Final => Self::done(&event.data),
            Step::Error => {
                let message = event
                    .text("message")
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(GENERIC_ERROR_MESSAGE);
                Self::failed(message)
            }
        }
    }

    /// The stream closed. Without a terminal event so far this counts as a failure.
    pub fn end_of_stream(self) -> Self {
        if self.is_terminal() {
            self
        } else {
            Self::failed(STREAM_ENDED_MESSAGE)
        }
    }

    fn progress(self, phase: Phase, projection: ProgressProjection, status: String) -> Self {
        Self {
            phase,
            projection: Some(projection),
            status,
            outcome: None,
        }
    }

    fn done(data: &Map<String, Value>) -> Self {
        let documents: Vec<Document> = data
            .get("docs")
            .and_then(Value::as_array)
            .map(|docs| docs.iter().map(Document::from_value).collect())
            .unwrap_or_default();
        let summary_text = data
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let format = data.get("format").filter(|v| !v.is_null()).cloned();

        let status = if documents.is_empty() {
            NO_RESULTS_MESSAGE.to_string()
        } else {
            String::new()
        };

        Self {
            phase: Phase::Done,
            projection: None,
            status,
            outcome: Some(SearchOutcome {
                documents,
                summary_text,
                format,
                error_message: None,
            }),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            phase: Phase::Failed,
            projection: None,
            status: message.to_string(),
            outcome: Some(SearchOutcome::failed(message)),
        }
    }
}
