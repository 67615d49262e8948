//! WAV file recorder
//!
//! Offline host: drives an `AudioCallback` block by block and writes the
//! result to a WAV file.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::AudioCallback;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    channels: u16,
    frames_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    /// * `channels` - Number of interleaved channels
    pub fn new(path: &Path, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            channels,
            frames_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (one sample per channel) written
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write planar channel buffers as interleaved frames
    pub fn write_planar(&mut self, channels: &[Vec<f32>], frames: usize) -> Result<()> {
        if channels.len() != self.channels as usize {
            bail!(
                "expected {} channels, got {}",
                self.channels,
                channels.len()
            );
        }
        for i in 0..frames {
            for channel in channels {
                let sample = channel.get(i).copied().unwrap_or(0.0);
                self.writer
                    .write_sample(sample)
                    .context("failed to write sample")?;
            }
        }
        self.frames_written += frames as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

/// Render `seconds` of audio from `callback` into a WAV file.
///
/// Runs a full device session: start at `sample_rate`, render in blocks of
/// `block_size` frames, stop. Returns the number of frames written.
pub fn render_to_wav<C: AudioCallback + ?Sized>(
    callback: &mut C,
    path: &Path,
    sample_rate: u32,
    channels: u16,
    seconds: f64,
    block_size: usize,
) -> Result<u64> {
    if channels == 0 {
        bail!("at least one channel is required");
    }
    if block_size == 0 {
        bail!("block size must be non-zero");
    }

    let total_frames = (sample_rate as f64 * seconds).round().max(0.0) as usize;
    let mut recorder = Recorder::new(path, sample_rate, channels)?;
    let mut buffers = vec![vec![0.0f32; block_size]; channels as usize];

    callback.on_device_start(sample_rate as f64);

    let mut remaining = total_frames;
    while remaining > 0 {
        let frames = remaining.min(block_size);
        {
            let mut outputs: Vec<&mut [f32]> =
                buffers.iter_mut().map(|b| &mut b[..frames]).collect();
            callback.render_block(&mut outputs, frames);
        }
        recorder.write_planar(&buffers, frames)?;
        remaining -= frames;
    }

    callback.on_device_stop();

    let written = recorder.frames_written();
    recorder.finalize()?;
    log::info!("rendered {} frames to {:?}", written, path);
    Ok(written)
}
