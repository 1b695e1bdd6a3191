//! The advisor seam: six untrusted stages behind one small sync trait.
//!
//! The engine builds a stage-specific input record, the suite returns parsed
//! JSON (or `None` for a legitimate null, crisis only), and the pipeline
//! validates and applies it. Any error here becomes the stage's fallback;
//! a tick is never aborted by an advisor.

use std::collections::BTreeMap;
use std::fmt;

use contracts::AdvisorStage;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    /// Transport failure: connect error, non-2xx, timeout.
    Transport(String),
    /// The response text was not valid JSON.
    Parse(String),
    /// A required top-level field was absent.
    MissingField {
        stage: AdvisorStage,
        field: &'static str,
    },
    /// A field was present but semantically out of range.
    OutOfRange {
        stage: AdvisorStage,
        field: &'static str,
    },
    /// `null` from a stage that does not allow it, or a non-object payload.
    UnexpectedShape(AdvisorStage),
}

impl fmt::Display for AdvisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "advisor transport failed: {message}"),
            Self::Parse(message) => write!(f, "advisor response was not JSON: {message}"),
            Self::MissingField { stage, field } => {
                write!(f, "{} output missing required field {field}", stage.as_str())
            }
            Self::OutOfRange { stage, field } => {
                write!(f, "{} output field {field} out of range", stage.as_str())
            }
            Self::UnexpectedShape(stage) => {
                write!(f, "{} output had an unexpected shape", stage.as_str())
            }
        }
    }
}

impl std::error::Error for AdvisorError {}

/// One call per pipeline stage. Implementations may block on network I/O;
/// the engine treats every failure as the stage's documented fallback.
pub trait AdvisorSuite {
    fn consult(&self, stage: AdvisorStage, input: &Value) -> Result<Option<Value>, AdvisorError>;
}

/// Suite with no transport behind it: every stage falls back. Used when no
/// API key is configured and as the scenario-5 baseline in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAdvisors;

impl AdvisorSuite for NoopAdvisors {
    fn consult(&self, _stage: AdvisorStage, _input: &Value) -> Result<Option<Value>, AdvisorError> {
        Err(AdvisorError::Transport(
            "no advisor transport configured".to_string(),
        ))
    }
}

/// Fixed per-stage responses, for deterministic tests and replays.
#[derive(Debug, Default, Clone)]
pub struct ScriptedAdvisors {
    outputs: BTreeMap<AdvisorStage, Value>,
}

impl ScriptedAdvisors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, stage: AdvisorStage, output: Value) -> Self {
        self.outputs.insert(stage, output);
        self
    }
}

impl AdvisorSuite for ScriptedAdvisors {
    fn consult(&self, stage: AdvisorStage, _input: &Value) -> Result<Option<Value>, AdvisorError> {
        match self.outputs.get(&stage) {
            Some(Value::Null) => Ok(None),
            Some(output) => Ok(Some(output.clone())),
            None => Err(AdvisorError::Transport(format!(
                "no scripted output for {}",
                stage.as_str()
            ))),
        }
    }
}
