//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::params::{
    DEFAULT_FREQUENCY_HZ, DEFAULT_VOLUME_PERCENT, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ,
};
use crate::synth::Waveform;

/// Main configuration for monosynth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Initial voice parameters
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Control inputs
    #[serde(default)]
    pub control: ControlConfig,
}

impl SynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if let Some(frames) = self.audio.buffer_size {
            if !(16..=8192).contains(&frames) {
                bail!("Buffer size must be between 16 and 8192");
            }
        }
        if self.audio.channels == 0 || self.audio.channels > 8 {
            bail!("Channels must be between 1 and 8");
        }

        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&self.voice.frequency) {
            bail!(
                "Frequency must be between {} and {} Hz",
                MIN_FREQUENCY_HZ,
                MAX_FREQUENCY_HZ
            );
        }
        if !(0.0..=100.0).contains(&self.voice.volume) {
            bail!("Volume must be between 0 and 100");
        }

        if let Some(channel) = self.control.midi_channel {
            if channel > 15 {
                bail!("MIDI channel must be between 0 and 15");
            }
        }

        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz for offline rendering (default: 48000).
    /// Real-time playback uses the device's own rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in frames (None = device default; offline renders use 512)
    #[serde(default)]
    pub buffer_size: Option<usize>,

    /// Output channels for offline rendering (default: 2)
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,
}

fn default_sample_rate() -> u32 { 48000 }
const DEFAULT_BLOCK_SIZE: usize = 512;
fn default_channels() -> u16 { 2 }

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: None,
            channels: default_channels(),
            device: None,
        }
    }
}

impl AudioConfig {
    /// Block size for offline rendering
    pub fn block_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }
}

/// Initial oscillator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Frequency in Hz (default: 440)
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Volume 0-100 (default: 50)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Waveform (default: sine)
    #[serde(default)]
    pub waveform: Waveform,
}

fn default_frequency() -> f64 { DEFAULT_FREQUENCY_HZ }
fn default_volume() -> f32 { DEFAULT_VOLUME_PERCENT }

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            frequency: default_frequency(),
            volume: default_volume(),
            waveform: Waveform::default(),
        }
    }
}

/// Control input configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    /// MIDI input port name (None = first available port)
    #[serde(default)]
    pub midi_port: Option<String>,

    /// MIDI channel 0-15 to listen on (None = all channels)
    #[serde(default)]
    pub midi_channel: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 44100";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert!(config.buffer_size.is_none()); // device default
        assert_eq!(config.block_size(), 512);
        assert_eq!(config.channels, 2); // default
        assert!(config.device.is_none());
    }

    #[test]
    fn test_voice_config() {
        let yaml = r#"
frequency: 220.0
volume: 80
waveform: sawtooth
"#;
        let config: VoiceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.frequency, 220.0);
        assert_eq!(config.volume, 80.0);
        assert_eq!(config.waveform, Waveform::Sawtooth);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: SynthConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.voice.frequency, 440.0);
        assert_eq!(config.voice.volume, 50.0);
        assert_eq!(config.voice.waveform, Waveform::Sine);
        assert!(config.control.midi_port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_sample_rate() {
        let mut config = SynthConfig::default();
        config.audio.sample_rate = 4000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_buffer_size_validated_only_when_set() {
        let mut config = SynthConfig::default();
        assert!(config.validate().is_ok());

        config.audio.buffer_size = Some(8);
        assert!(config.validate().is_err());

        config.audio.buffer_size = Some(256);
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.block_size(), 256);
    }

    #[test]
    fn test_invalid_voice() {
        let mut config = SynthConfig::default();
        config.voice.frequency = 0.0;
        assert!(config.validate().is_err());

        let mut config = SynthConfig::default();
        config.voice.volume = 101.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_midi_channel() {
        let mut config = SynthConfig::default();
        config.control.midi_channel = Some(16);
        assert!(config.validate().is_err());
    }
}
