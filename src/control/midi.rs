//! MIDI input for monosynth.
//!
//! Maps incoming note and controller messages to oscillator commands.

use anyhow::{anyhow, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};

use super::{Command, Controller};

/// MIDI controller number for channel volume
const CC_VOLUME: u8 = 7;

/// MIDI message types the oscillator responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
}

impl MidiMessage {
    /// Decode raw MIDI bytes. Returns `None` for unsupported or truncated messages.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        match (status & 0xF0, data) {
            (0x90, [note, vel, ..]) => Some(MidiMessage::NoteOn(channel, note & 0x7F, vel & 0x7F)),
            (0x80, [note, vel, ..]) => Some(MidiMessage::NoteOff(channel, note & 0x7F, vel & 0x7F)),
            (0xB0, [ctrl, val, ..]) => {
                Some(MidiMessage::ControlChange(channel, ctrl & 0x7F, val & 0x7F))
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn(ch, _, _)
            | MidiMessage::NoteOff(ch, _, _)
            | MidiMessage::ControlChange(ch, _, _) => ch,
        }
    }
}

/// Equal-tempered frequency of a MIDI note (A4 = 69 = 440 Hz)
pub fn note_to_frequency(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

/// Turns MIDI messages into commands for a single monophonic voice.
///
/// Tracks the sounding note so releasing an older key does not cut off a newer one.
#[derive(Debug, Clone, Default)]
pub struct MidiMapper {
    /// Only accept this channel (None = omni)
    channel: Option<u8>,
    sounding: Option<u8>,
}

impl MidiMapper {
    pub fn new(channel: Option<u8>) -> Self {
        Self {
            channel,
            sounding: None,
        }
    }

    /// Note currently held, if any
    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    /// Commands for one incoming message, in order
    pub fn map(&mut self, msg: MidiMessage) -> Vec<Command> {
        if let Some(ch) = self.channel {
            if msg.channel() != ch {
                return Vec::new();
            }
        }

        match msg {
            MidiMessage::NoteOn(_, note, vel) if vel > 0 => {
                self.sounding = Some(note);
                vec![Command::Frequency(note_to_frequency(note)), Command::PlayNote]
            }
            // Note on with velocity 0 is a note off
            MidiMessage::NoteOn(_, note, _) | MidiMessage::NoteOff(_, note, _) => {
                if self.sounding == Some(note) {
                    self.sounding = None;
                    vec![Command::StopNote]
                } else {
                    Vec::new()
                }
            }
            MidiMessage::ControlChange(_, CC_VOLUME, val) => {
                vec![Command::Volume(val as f32 * 100.0 / 127.0)]
            }
            MidiMessage::ControlChange(..) => Vec::new(),
        }
    }
}

/// Live MIDI input feeding a controller. Input stops when dropped.
pub struct MidiControl {
    port_name: String,
    _connection: MidiInputConnection<()>,
}

impl MidiControl {
    /// Connect to the named input port (substring match) or the first available one.
    pub fn connect(port_name: Option<&str>, channel: Option<u8>, controller: Controller) -> Result<Self> {
        let mut midi_in = MidiInput::new("monosynth MIDI input")?;
        midi_in.ignore(Ignore::All);
        let ports = midi_in.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI input ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_in
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_in.port_name(&port)?;
        let mut mapper = MidiMapper::new(channel);

        let connection = midi_in
            .connect(
                &port,
                "monosynth-input",
                move |_stamp, bytes, _| match MidiMessage::from_bytes(bytes) {
                    Some(msg) => {
                        for command in mapper.map(msg) {
                            controller.apply(command);
                        }
                    }
                    None => log::trace!("ignoring MIDI bytes {:02X?}", bytes),
                },
                (),
            )
            .map_err(|e| anyhow!("failed to connect MIDI input: {}", e))?;

        log::info!("MIDI input connected to: {}", port_name_actual);

        Ok(Self {
            port_name: port_name_actual,
            _connection: connection,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// List available MIDI input ports.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("monosynth MIDI list")?;
    let ports = midi_in.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();

    Ok(names)
}
