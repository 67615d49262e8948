//! Control plane
//!
//! Decodes parameter-change messages from any transport and applies them to
//! the shared parameter store. Malformed messages are logged and dropped.

mod command;
mod midi;
mod status;

pub use command::{Command, CommandError};
pub use midi::{list_midi_ports, note_to_frequency, MidiControl, MidiMapper, MidiMessage};
pub use status::StatusMessage;

use std::sync::Arc;

use crate::params::ParameterStore;

/// Applies commands to a parameter store. Cheap to clone across transports.
#[derive(Debug, Clone)]
pub struct Controller {
    params: Arc<ParameterStore>,
}

impl Controller {
    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    /// Apply a decoded command
    pub fn apply(&self, command: Command) {
        log::debug!("applying {:?}", command);
        match command {
            Command::Frequency(hz) => self.params.set_frequency(hz),
            Command::Volume(percent) => self.params.set_volume(percent),
            Command::Waveform(waveform) => self.params.set_waveform_kind(waveform),
            Command::PlayNote => self.params.start_note(),
            Command::StopNote => self.params.set_gate(false),
        }
    }

    /// Decode and apply a JSON text message.
    ///
    /// Returns the applied command, or `None` if the message was ignored or dropped.
    pub fn handle_message(&self, text: &str) -> Option<Command> {
        match Command::parse(text) {
            Ok(Some(command)) => {
                self.apply(command.clone());
                Some(command)
            }
            Ok(None) => {
                log::debug!("ignoring message: {}", text);
                None
            }
            Err(e) => {
                log::warn!("dropping message: {}", e);
                None
            }
        }
    }

    /// Display messages for the current parameter values
    pub fn status(&self) -> Vec<StatusMessage> {
        StatusMessage::from_snapshot(&self.params.snapshot())
    }
}
