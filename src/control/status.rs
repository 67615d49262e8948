//! Outbound display messages
//!
//! The control panel updates its widgets from `{"type": "updateX", "value": ...}`
//! messages. These are derived from a parameter snapshot on request; the
//! engine never pushes them.

use serde::Serialize;

use crate::params::ParameterSnapshot;
use crate::synth::Waveform;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum StatusMessage {
    UpdateFrequency(f64),
    /// Percent, 0-100
    UpdateVolume(f32),
    UpdateWaveform(Waveform),
    UpdateGate(bool),
}

impl StatusMessage {
    /// All display messages describing `snapshot`
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Vec<Self> {
        vec![
            StatusMessage::UpdateFrequency(snapshot.frequency_hz),
            StatusMessage::UpdateVolume(snapshot.volume_percent()),
            StatusMessage::UpdateWaveform(snapshot.waveform),
            StatusMessage::UpdateGate(snapshot.gate_open),
        ]
    }

    pub fn to_json(&self) -> String {
        // Only plain numbers, strings and bools: serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
