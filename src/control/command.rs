//! Parameter-change commands and their JSON message form
//!
//! Messages look like `{"type": "frequency", "value": 220}`, the format sent
//! by the web control panel.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::synth::Waveform;

/// A parameter change understood by the oscillator
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Frequency in Hz
    Frequency(f64),
    /// Volume in percent, 0-100
    Volume(f32),
    Waveform(Waveform),
    /// Open the gate and restart the cycle from phase 0
    PlayNote,
    StopNote,
}

/// Reasons a message could not be decoded
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for '{kind}': expected {expected}, got {got}")]
    InvalidValue {
        kind: String,
        expected: &'static str,
        got: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

impl Command {
    /// Decode a JSON text message.
    ///
    /// Returns `Ok(None)` for message types that are not oscillator commands.
    pub fn parse(text: &str) -> Result<Option<Self>, CommandError> {
        let raw: RawMessage = serde_json::from_str(text)?;
        Self::decode(&raw.kind, &raw.value)
    }

    /// Decode a message from its type tag and value
    fn decode(kind: &str, value: &Value) -> Result<Option<Self>, CommandError> {
        let command = match kind {
            "frequency" => Command::Frequency(number(kind, value)?),
            "volume" => Command::Volume(number(kind, value)? as f32),
            "waveform" => match value {
                Value::String(name) => Command::Waveform(Waveform::from_name(name)),
                other => return Err(invalid(kind, "a string", other)),
            },
            "playNote" => Command::PlayNote,
            "stopNote" => Command::StopNote,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

fn number(kind: &str, value: &Value) -> Result<f64, CommandError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(kind, "a number", value))
}

fn invalid(kind: &str, expected: &'static str, got: &Value) -> CommandError {
    CommandError::InvalidValue {
        kind: kind.to_string(),
        expected,
        got: got.to_string(),
    }
}
