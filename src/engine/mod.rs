//! Audio engine for monosynth
//!
//! The oscillator engine advances a phase accumulator and synthesizes one
//! mono sample per frame, reading its parameters from the shared store.
//! Device hosts drive it through the `AudioCallback` contract.

mod player;
mod recorder;

pub use player::{default_device_name, list_output_devices, OutputDeviceInfo, Player};
pub use recorder::{render_to_wav, Recorder};

use std::f64::consts::TAU;
use std::sync::Arc;

use crate::params::ParameterStore;

/// Contract between an audio device host and the thing it renders.
///
/// `on_device_start` happens-before any `render_block` of the same session.
pub trait AudioCallback: Send {
    /// The device opened at `sample_rate_hz`
    fn on_device_start(&mut self, sample_rate_hz: f64);

    /// The device closed; no render calls follow until the next start
    fn on_device_stop(&mut self);

    /// Overwrite `num_samples` samples of every channel in `outputs`
    fn render_block(&mut self, outputs: &mut [&mut [f32]], num_samples: usize);
}

/// Monophonic phase-accumulator oscillator
pub struct OscillatorEngine {
    params: Arc<ParameterStore>,
    sample_rate: f64,
    phase: f64,
    phase_increment: f64,
    /// Note count last seen in the store
    seen_notes: u64,
    /// False until a valid sample rate has been reported
    rate_valid: bool,
    /// Set when a render ran without a valid rate; logged off the render thread
    rendered_without_rate: bool,
}

impl OscillatorEngine {
    /// Create an engine reading from `params`. It renders silence until
    /// `on_device_start` supplies a sample rate.
    pub fn new(params: Arc<ParameterStore>) -> Self {
        let seen_notes = params.note_count();
        Self {
            params,
            sample_rate: 0.0,
            phase: 0.0,
            phase_increment: 0.0,
            seen_notes,
            rate_valid: false,
            rendered_without_rate: false,
        }
    }

    /// Shared parameter store
    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    /// Sample rate of the current device session (0 before the first start)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current phase in radians, always in `[0, 2π)`
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase advance per sample as last computed
    pub fn phase_increment(&self) -> f64 {
        self.phase_increment
    }

    /// Whether a render has produced forced silence for lack of a valid sample rate
    pub fn rendered_without_rate(&self) -> bool {
        self.rendered_without_rate
    }

    /// Whether a note is sounding
    pub fn is_sounding(&self) -> bool {
        self.params.gate_open()
    }

    fn compute_increment(&self) -> f64 {
        TAU * self.params.frequency() / self.sample_rate
    }

    /// Generate the next mono sample.
    ///
    /// Never blocks, allocates or panics. Renders silence without advancing
    /// phase while the gate is closed or no valid sample rate is known.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.rate_valid {
            self.rendered_without_rate = true;
            return 0.0;
        }

        let params = &*self.params;

        // Gate before note count: a visible open gate implies its note start is visible too
        let gate_open = params.gate_open();
        let notes = params.note_count();
        if notes != self.seen_notes {
            self.seen_notes = notes;
            self.phase = 0.0;
            self.phase_increment = self.compute_increment();
        }

        if !gate_open {
            return 0.0;
        }

        // Recomputed every sample so retuning is sample-accurate
        self.phase_increment = self.compute_increment();

        let raw = params.waveform().sample(self.phase) as f32;
        let sample = raw * params.volume();

        self.phase += self.phase_increment;
        if self.phase >= TAU {
            self.phase -= TAU;
            if self.phase >= TAU {
                self.phase = self.phase.rem_euclid(TAU);
            }
        }

        sample
    }

    /// Fill interleaved frames of `channels` samples with the mono signal
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = self.next_sample();
            frame.fill(sample);
        }
    }
}

impl AudioCallback for OscillatorEngine {
    fn on_device_start(&mut self, sample_rate_hz: f64) {
        if sample_rate_hz.is_finite() && sample_rate_hz > 0.0 {
            self.sample_rate = sample_rate_hz;
            self.rate_valid = true;
            self.phase_increment = self.compute_increment();
            log::info!("audio device started, sample rate: {} Hz", sample_rate_hz);
        } else {
            self.rate_valid = false;
            log::error!(
                "audio device reported invalid sample rate {}; rendering silence",
                sample_rate_hz
            );
        }
    }

    fn on_device_stop(&mut self) {
        if self.rendered_without_rate {
            self.rendered_without_rate = false;
            log::error!("render ran without a valid sample rate; output was silence");
        }
        log::info!("audio device stopped");
    }

    fn render_block(&mut self, outputs: &mut [&mut [f32]], num_samples: usize) {
        for i in 0..num_samples {
            let sample = self.next_sample();
            for channel in outputs.iter_mut() {
                if let Some(slot) = channel.get_mut(i) {
                    *slot = sample;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Command, Controller};
    use crate::synth::Waveform;
    use std::f64::consts::PI;

    fn started_engine(sample_rate: f64) -> OscillatorEngine {
        let mut engine = OscillatorEngine::new(Arc::new(ParameterStore::new()));
        engine.on_device_start(sample_rate);
        engine
    }

    fn render_mono(engine: &mut OscillatorEngine, n: usize) -> Vec<f32> {
        let mut buf = vec![0.0f32; n];
        engine.render_block(&mut [buf.as_mut_slice()], n);
        buf
    }

    #[test]
    fn test_engine_creation() {
        let engine = OscillatorEngine::new(Arc::new(ParameterStore::new()));
        assert_eq!(engine.sample_rate(), 0.0);
        assert_eq!(engine.phase(), 0.0);
        assert!(!engine.is_sounding());
    }

    #[test]
    fn test_device_start_computes_increment() {
        let engine = started_engine(44100.0);
        assert_eq!(engine.sample_rate(), 44100.0);
        assert!((engine.phase_increment() - TAU * 440.0 / 44100.0).abs() < 1e-15);
    }

    #[test]
    fn test_silence_when_idle() {
        let mut engine = started_engine(48000.0);
        let mut left = vec![1.0f32; 256];
        let mut right = vec![-1.0f32; 256];
        engine.render_block(&mut [left.as_mut_slice(), right.as_mut_slice()], 256);

        assert!(left.iter().all(|&s| s == 0.0));
        assert!(right.iter().all(|&s| s == 0.0));
        assert_eq!(engine.phase(), 0.0);
    }

    #[test]
    fn test_phase_stays_wrapped() {
        let mut engine = started_engine(44100.0);
        engine.params().set_frequency(20_000.0);
        engine.params().start_note();

        for _ in 0..50_000 {
            engine.next_sample();
            assert!((0.0..TAU).contains(&engine.phase()), "phase {}", engine.phase());
        }
    }

    #[test]
    fn test_phase_wraps_when_frequency_exceeds_sample_rate() {
        let mut engine = started_engine(8000.0);
        engine.params().set_frequency(19_000.0);
        engine.params().start_note();

        for _ in 0..1_000 {
            engine.next_sample();
            assert!((0.0..TAU).contains(&engine.phase()));
        }
    }

    #[test]
    fn test_volume_scaling_is_linear() {
        let render_at = |volume: f32| {
            let mut engine = started_engine(44100.0);
            engine.params().set_waveform("sine");
            engine.params().set_volume(volume);
            engine.params().start_note();
            render_mono(&mut engine, 512)
        };

        let full = render_at(100.0);
        let half = render_at(50.0);
        for (f, h) in full.iter().zip(&half) {
            assert_eq!(*h, *f * 0.5);
        }
        assert!(full.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_sawtooth_full_cycle() {
        // 8 samples per cycle
        let mut engine = started_engine(8.0);
        engine.params().set_frequency(1.0);
        engine.params().set_waveform("sawtooth");
        engine.params().set_volume(100.0);
        engine.params().start_note();

        let out = render_mono(&mut engine, 9);
        let expected = [-1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75];
        for (i, e) in expected.iter().enumerate() {
            assert!((out[i] - e).abs() < 1e-6, "sample {}: {} != {}", i, out[i], e);
        }
        // Wraps back to the bottom of the ramp
        assert!((out[8] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_triangle_full_cycle() {
        let mut engine = started_engine(8.0);
        engine.params().set_frequency(1.0);
        engine.params().set_waveform("triangle");
        engine.params().set_volume(100.0);
        engine.params().start_note();

        let out = render_mono(&mut engine, 8);
        let expected = [-1.0, -0.5, 0.0, 0.5, 1.0, 0.5, 0.0, -0.5];
        for (i, e) in expected.iter().enumerate() {
            assert!((out[i] - e).abs() < 1e-6, "sample {}: {} != {}", i, out[i], e);
        }
    }

    #[test]
    fn test_play_note_resets_phase() {
        let mut engine = started_engine(44100.0);
        engine.params().set_waveform("sawtooth");
        engine.params().set_volume(100.0);
        engine.params().start_note();
        render_mono(&mut engine, 137);
        assert!(engine.phase() > 0.0);

        // Retrigger while already sounding
        engine.params().start_note();
        let out = render_mono(&mut engine, 1);
        assert_eq!(out[0], -1.0);
        assert_eq!(engine.phase(), engine.phase_increment());
    }

    #[test]
    fn test_stop_note_keeps_phase() {
        let mut engine = started_engine(44100.0);
        engine.params().start_note();
        render_mono(&mut engine, 100);
        let phase = engine.phase();

        engine.params().set_gate(false);
        let out = render_mono(&mut engine, 64);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(engine.phase(), phase);
    }

    #[test]
    fn test_frequency_change_applies_next_sample() {
        let mut engine = started_engine(44100.0);
        engine.params().start_note();
        render_mono(&mut engine, 10);
        assert!((engine.phase_increment() - TAU * 440.0 / 44100.0).abs() < 1e-15);

        engine.params().set_frequency(880.0);
        render_mono(&mut engine, 1);
        assert!((engine.phase_increment() - TAU * 880.0 / 44100.0).abs() < 1e-15);
    }

    #[test]
    fn test_invalid_sample_rate_renders_silence() {
        let mut engine = started_engine(0.0);
        engine.params().start_note();
        let out = render_mono(&mut engine, 32);
        assert!(out.iter().all(|&s| s == 0.0));

        let mut engine = started_engine(-44100.0);
        engine.params().start_note();
        let out = render_mono(&mut engine, 32);
        assert!(out.iter().all(|&s| s == 0.0));

        // Recovers on the next valid start
        engine.on_device_start(44100.0);
        engine.params().set_waveform("square");
        let out = render_mono(&mut engine, 4);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_render_before_start_is_silent() {
        let mut engine = OscillatorEngine::new(Arc::new(ParameterStore::new()));
        engine.params().start_note();
        assert!(!engine.rendered_without_rate());

        let out = render_mono(&mut engine, 16);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(engine.rendered_without_rate());

        // Reported and cleared by the stop notification, not the render path
        engine.on_device_stop();
        assert!(!engine.rendered_without_rate());
    }

    #[test]
    fn test_valid_session_does_not_flag_missing_rate() {
        let mut engine = started_engine(44100.0);
        engine.params().start_note();
        render_mono(&mut engine, 64);
        assert!(!engine.rendered_without_rate());
    }

    #[test]
    fn test_sample_rate_change_across_restart() {
        let mut engine = started_engine(44100.0);
        engine.on_device_stop();
        engine.on_device_start(96000.0);
        assert_eq!(engine.sample_rate(), 96000.0);
        assert!((engine.phase_increment() - TAU * 440.0 / 96000.0).abs() < 1e-15);
    }

    #[test]
    fn test_render_block_overwrites_every_channel() {
        let mut engine = started_engine(48000.0);
        engine.params().set_waveform("square");
        engine.params().start_note();

        let mut a = vec![9.0f32; 16];
        let mut b = vec![9.0f32; 16];
        let mut c = vec![9.0f32; 16];
        engine.render_block(&mut [a.as_mut_slice(), b.as_mut_slice(), c.as_mut_slice()], 16);

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(a.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_render_block_short_buffer() {
        let mut engine = started_engine(48000.0);
        engine.params().start_note();
        let mut short = vec![7.0f32; 4];
        engine.render_block(&mut [short.as_mut_slice()], 8);
        assert!(short.iter().all(|&s| s != 7.0));
    }

    #[test]
    fn test_render_interleaved() {
        let mut engine = started_engine(48000.0);
        engine.params().set_waveform("sawtooth");
        engine.params().start_note();

        let mut data = vec![0.0f32; 8 * 2];
        engine.render_interleaved(&mut data, 2);
        for frame in data.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(data[0], -0.5);
    }

    #[test]
    fn test_end_to_end_square_scenario() {
        let params = Arc::new(ParameterStore::new());
        let controller = Controller::new(params.clone());
        let mut engine = OscillatorEngine::new(params);
        engine.on_device_start(48000.0);

        controller.handle_message(r#"{"type":"frequency","value":220}"#);
        controller.handle_message(r#"{"type":"waveform","value":"square"}"#);
        controller.handle_message(r#"{"type":"playNote"}"#);

        let out = render_mono(&mut engine, 10);
        let increment = TAU * 220.0 / 48000.0;
        assert!((increment - 0.02879).abs() < 1e-5);
        for (i, sample) in out.iter().enumerate() {
            let phase = increment * i as f64;
            let expected = if phase < PI { 0.5 } else { -0.5 };
            assert_eq!(*sample, expected, "sample {}", i);
        }
        assert_eq!(engine.params().waveform(), Waveform::Square);
    }

    #[test]
    fn test_unknown_command_is_noop() {
        let params = Arc::new(ParameterStore::new());
        let controller = Controller::new(params.clone());
        controller.apply(Command::Frequency(330.0));
        controller.apply(Command::PlayNote);
        let before = params.snapshot();
        let notes = params.note_count();

        controller.handle_message(r#"{"type":"detune","value":5}"#);

        assert_eq!(params.snapshot(), before);
        assert_eq!(params.note_count(), notes);
    }

    #[test]
    fn test_render_thread_with_concurrent_control() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::thread;

        let params = Arc::new(ParameterStore::new());
        let controller = Controller::new(params.clone());
        let done = Arc::new(AtomicBool::new(false));

        let render = {
            let done = done.clone();
            let mut engine = OscillatorEngine::new(params);
            thread::spawn(move || {
                engine.on_device_start(48000.0);
                let mut block = vec![0.0f32; 64];
                loop {
                    let finished = done.load(Ordering::Acquire);
                    engine.render_block(&mut [block.as_mut_slice()], 64);
                    assert!((0.0..TAU).contains(&engine.phase()), "phase {}", engine.phase());
                    if finished {
                        // The final stopNote happened-before `done` was set
                        assert!(block.iter().all(|&s| s == 0.0));
                        break;
                    }
                }
                engine.on_device_stop();
            })
        };

        let waveforms = ["sine", "square", "sawtooth", "triangle"];
        for i in 0..2_000 {
            let hz = 50.0 + (i % 40) as f64 * 250.0;
            controller.handle_message(&format!(r#"{{"type":"frequency","value":{}}}"#, hz));
            controller.handle_message(&format!(
                r#"{{"type":"waveform","value":"{}"}}"#,
                waveforms[i % waveforms.len()]
            ));
            if i % 3 == 0 {
                controller.handle_message(r#"{"type":"playNote"}"#);
            } else if i % 7 == 0 {
                controller.handle_message(r#"{"type":"stopNote"}"#);
            }
        }
        controller.handle_message(r#"{"type":"stopNote"}"#);
        done.store(true, Ordering::Release);

        render.join().unwrap();
        assert!(!controller.params().gate_open());
    }
}
