//! Shared parameter store
//!
//! Written by the control thread, read by the render thread. Every field is
//! its own atomic cell; no setter blocks, allocates or fails.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use super::atomic::{AtomicF32, AtomicF64};
use crate::synth::Waveform;

/// Lowest frequency a configuration file may request
pub const MIN_FREQUENCY_HZ: f64 = 1.0;
/// Highest frequency a configuration file may request
pub const MAX_FREQUENCY_HZ: f64 = 20_000.0;
/// Non-positive frequencies are raised to this
pub const FREQUENCY_FLOOR_HZ: f64 = 0.01;

pub const DEFAULT_FREQUENCY_HZ: f64 = 440.0;
/// Default volume in percent
pub const DEFAULT_VOLUME_PERCENT: f32 = 50.0;

/// Latest commanded oscillator parameters
#[derive(Debug)]
pub struct ParameterStore {
    frequency_hz: AtomicF64,
    /// Linear gain in `[0, 1]`
    volume: AtomicF32,
    waveform: AtomicU8,
    gate_open: AtomicBool,
    /// Bumped on every note start; the engine resets phase when it changes
    note_count: AtomicU64,
}

impl ParameterStore {
    /// Create a store with the default parameters (440 Hz, 50%, sine, gate closed)
    pub fn new() -> Self {
        Self::with_defaults(DEFAULT_FREQUENCY_HZ, DEFAULT_VOLUME_PERCENT, Waveform::Sine)
    }

    /// Create a store seeded with initial values. Values are clamped like the setters.
    pub fn with_defaults(frequency_hz: f64, volume_percent: f32, waveform: Waveform) -> Self {
        let store = Self {
            frequency_hz: AtomicF64::new(DEFAULT_FREQUENCY_HZ),
            volume: AtomicF32::new(DEFAULT_VOLUME_PERCENT / 100.0),
            waveform: AtomicU8::new(waveform.to_u8()),
            gate_open: AtomicBool::new(false),
            note_count: AtomicU64::new(0),
        };
        store.set_frequency(frequency_hz);
        store.set_volume(volume_percent);
        store
    }

    /// Set the oscillator frequency in Hz.
    ///
    /// Any positive value is stored as given. Zero or negative input is raised
    /// to `FREQUENCY_FLOOR_HZ`; non-finite input is ignored.
    pub fn set_frequency(&self, hz: f64) {
        if !hz.is_finite() {
            return;
        }
        let hz = if hz > 0.0 { hz } else { FREQUENCY_FLOOR_HZ };
        self.frequency_hz.store(hz, Ordering::Release);
    }

    /// Set the volume from a 0-100 percentage. NaN is ignored.
    pub fn set_volume(&self, percent: f32) {
        if percent.is_nan() {
            return;
        }
        let gain = (percent / 100.0).clamp(0.0, 1.0);
        self.volume.store(gain, Ordering::Release);
    }

    /// Select the waveform by name; unknown names select `Sine`.
    pub fn set_waveform(&self, name: &str) -> Waveform {
        let waveform = Waveform::from_name(name);
        self.set_waveform_kind(waveform);
        waveform
    }

    pub fn set_waveform_kind(&self, waveform: Waveform) {
        self.waveform.store(waveform.to_u8(), Ordering::Release);
    }

    /// Open or close the gate. Opening a closed gate requests a phase reset.
    pub fn set_gate(&self, open: bool) {
        if open && !self.gate_open.load(Ordering::Acquire) {
            // Counter before gate, as in `start_note`
            self.note_count.fetch_add(1, Ordering::AcqRel);
        }
        self.gate_open.store(open, Ordering::Release);
    }

    /// Start a note: open the gate and always request a phase reset,
    /// even if a note is already sounding.
    pub fn start_note(&self) {
        // Counter first so the render thread never sees the gate open
        // against a stale count while a new note is being started.
        self.note_count.fetch_add(1, Ordering::AcqRel);
        self.gate_open.store(true, Ordering::Release);
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency_hz.load(Ordering::Acquire)
    }

    /// Linear gain in `[0, 1]`
    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume.load(Ordering::Acquire)
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        Waveform::from_u8(self.waveform.load(Ordering::Acquire))
    }

    #[inline]
    pub fn gate_open(&self) -> bool {
        self.gate_open.load(Ordering::Acquire)
    }

    /// Number of note starts so far
    #[inline]
    pub fn note_count(&self) -> u64 {
        self.note_count.load(Ordering::Acquire)
    }

    /// Read every field for display. Fields are read independently.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            frequency_hz: self.frequency(),
            volume: self.volume(),
            waveform: self.waveform(),
            gate_open: self.gate_open(),
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the store, for display and outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterSnapshot {
    pub frequency_hz: f64,
    /// Linear gain in `[0, 1]`
    pub volume: f32,
    pub waveform: Waveform,
    pub gate_open: bool,
}

impl ParameterSnapshot {
    /// Volume expressed as a 0-100 percentage
    pub fn volume_percent(&self) -> f32 {
        self.volume * 100.0
    }
}
