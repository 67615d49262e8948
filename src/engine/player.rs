//! Real-time audio playback using cpal

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use super::{AudioCallback, OscillatorEngine};

/// Real-time audio player.
///
/// Owns the engine for the lifetime of one device session. The audio callback
/// only ever `try_lock`s the engine; the lock is otherwise taken at start and stop.
pub struct Player {
    stream: Option<Stream>,
    engine: Option<Arc<Mutex<OscillatorEngine>>>,
    device_name: String,
    config: StreamConfig,
}

impl Player {
    /// Open an output device and start rendering `engine` into it.
    ///
    /// `device_name` selects a device by substring; `None` uses the default output.
    /// `buffer_size` requests a fixed callback size in frames; `None` keeps the
    /// device default. A rejected fixed size falls back to the default.
    pub fn start(
        mut engine: OscillatorEngine,
        device_name: Option<&str>,
        buffer_size: Option<u32>,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_output_device(&host, device_name)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .context("failed to query default output config")?;
        let sample_format = supported.sample_format();
        let mut config: StreamConfig = supported.into();
        config.buffer_size = requested_buffer_size(buffer_size);

        // Happens-before the first callback of this session
        engine.on_device_start(config.sample_rate.0 as f64);
        let engine = Arc::new(Mutex::new(engine));

        let stream = match open_stream(&device, sample_format, &config, &engine) {
            Ok(stream) => stream,
            Err(e) if matches!(config.buffer_size, BufferSize::Fixed(_)) => {
                log::warn!(
                    "device rejected {:?}, retrying with its default buffer size: {:#}",
                    config.buffer_size,
                    e
                );
                config.buffer_size = BufferSize::Default;
                open_stream(&device, sample_format, &config, &engine)?
            }
            Err(e) => return Err(e),
        };

        stream.play().context("failed to start output stream")?;
        log::info!(
            "playing on '{}' ({} Hz, {} ch)",
            name,
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            stream: Some(stream),
            engine: Some(engine),
            device_name: name,
            config,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop playback and hand the engine back for reuse on another device.
    pub fn stop(mut self) -> Result<OscillatorEngine> {
        self.close();
        let engine = self
            .engine
            .take()
            .ok_or_else(|| anyhow!("engine already taken"))?;
        let engine = Arc::try_unwrap(engine)
            .map_err(|_| anyhow!("engine still referenced by the audio stream"))?;
        engine
            .into_inner()
            .map_err(|_| anyhow!("engine lock poisoned by the audio callback"))
    }

    fn close(&mut self) {
        // Dropping the stream joins the callback, so the lock below is uncontended
        if self.stream.take().is_some() {
            if let Some(Ok(mut engine)) = self.engine.as_ref().map(|e| e.lock()) {
                engine.on_device_stop();
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.close();
    }
}

fn find_output_device(host: &cpal::Host, name: Option<&str>) -> Result<Device> {
    match name {
        Some(wanted) => host
            .output_devices()
            .context("failed to enumerate output devices")?
            .find(|d| d.name().map(|n| n.contains(wanted)).unwrap_or(false))
            .ok_or_else(|| anyhow!("Output device '{}' not found", wanted)),
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available")),
    }
}

fn requested_buffer_size(frames: Option<u32>) -> BufferSize {
    match frames {
        Some(frames) => BufferSize::Fixed(frames),
        None => BufferSize::Default,
    }
}

fn open_stream(
    device: &Device,
    sample_format: SampleFormat,
    config: &StreamConfig,
    engine: &Arc<Mutex<OscillatorEngine>>,
) -> Result<Stream> {
    match sample_format {
        SampleFormat::F32 => build_stream::<f32>(device, config, engine.clone()),
        SampleFormat::I16 => build_stream::<i16>(device, config, engine.clone()),
        SampleFormat::U16 => build_stream::<u16>(device, config, engine.clone()),
        other => Err(anyhow!("Unsupported sample format: {:?}", other)),
    }
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    engine: Arc<Mutex<OscillatorEngine>>,
) -> Result<Stream> {
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if let Ok(mut eng) = engine.try_lock() {
                for frame in data.chunks_mut(channels) {
                    let sample = T::from_sample(eng.next_sample());
                    for channel_sample in frame.iter_mut() {
                        *channel_sample = sample;
                    }
                }
            } else {
                // Engine busy, fill with silence
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0f32);
                }
            }
        },
        |err| {
            log::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Summary of an output device
#[derive(Debug, Clone)]
pub struct OutputDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    for device in host.output_devices()? {
        if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
            devices.push(OutputDeviceInfo {
                name,
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
            });
        }
    }

    Ok(devices)
}
