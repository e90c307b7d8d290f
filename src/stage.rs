//! Single-stage test harness for pipeline processing stages.
//!
//! A stage is configured from a JSON policy and transforms a clipboard, a
//! string-keyed map of JSON values passed between stages. `run_stage`
//! builds one stage from a policy string and runs it over a clipboard
//! once, which is how pipelines unit-test a stage in isolation.

use serde_json::Value;
use std::fmt;

/// Values passed between pipeline stages.
pub type Clipboard = serde_json::Map<String, Value>;

pub trait Stage {
    fn process(&mut self, clipboard: &mut Clipboard) -> Result<(), StageError>;
}

#[derive(Debug)]
pub enum StageError {
    Policy(serde_json::Error),
    Process(String),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Policy(e) => write!(f, "Failed to parse stage policy: {}", e),
            StageError::Process(msg) => write!(f, "Stage failed: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}

impl From<serde_json::Error> for StageError {
    fn from(err: serde_json::Error) -> StageError {
        StageError::Policy(err)
    }
}

/// Parses a policy string into a JSON value, accepting an optional
/// `#<?cfg ...?>` directive line ahead of the body.
pub fn parse_policy(text: &str) -> Result<Value, StageError> {
    let body = if text.starts_with("#<?cfg ") {
        match text.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        }
    } else {
        text
    };
    Ok(serde_json::from_str(body)?)
}

/// Builds a stage from a policy string and runs it over the clipboard
/// once, returning the updated clipboard.
pub fn run_stage<S, F>(
    factory: F,
    policy: &str,
    clipboard: Clipboard,
) -> Result<Clipboard, StageError>
where
    S: Stage,
    F: FnOnce(Value) -> Result<S, StageError>,
{
    let policy = parse_policy(policy)?;
    let mut stage = factory(policy)?;
    let mut clipboard = clipboard;
    stage.process(&mut clipboard)?;
    Ok(clipboard)
}
