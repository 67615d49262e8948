//! Synthesis primitives
//!
//! Contains the waveform shapes evaluated by the oscillator engine.

mod oscillator;

pub use oscillator::Waveform;
