//! monosynth - a monophonic real-time oscillator
//!
//! A control thread writes parameters into a lock-free store; the audio
//! thread's render callback reads them and synthesizes one mono signal into
//! every output channel.

pub mod config;
pub mod control;
pub mod engine;
pub mod params;
pub mod synth;

pub use config::SynthConfig;
pub use control::{Command, Controller};
pub use engine::{AudioCallback, OscillatorEngine};
pub use params::ParameterStore;
pub use synth::Waveform;
