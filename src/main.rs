//! monosynth - monophonic oscillator with a lock-free control plane

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use monosynth::config::{self, SynthConfig};
use monosynth::control::{list_midi_ports, Controller, MidiControl, StatusMessage};
use monosynth::engine::{self, OscillatorEngine, Player};
use monosynth::{ParameterStore, Waveform};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Play {
            config: config_path,
            midi,
            echo,
        } => play(&config_path, midi, echo)?,

        Commands::Render {
            config: config_path,
            output,
            duration,
            frequency,
            waveform,
            volume,
        } => {
            let mut cfg = config::load_or_default(&config_path)?;
            if let Some(hz) = frequency {
                cfg.voice.frequency = hz;
            }
            if let Some(name) = waveform {
                cfg.voice.waveform = Waveform::from_name(&name);
            }
            if let Some(percent) = volume {
                cfg.voice.volume = percent;
            }

            let params = Arc::new(store_from_config(&cfg));
            params.start_note();
            let mut oscillator = OscillatorEngine::new(params);

            println!(
                "Rendering {}s of {} at {} Hz to {:?}...",
                duration, cfg.voice.waveform, cfg.voice.frequency, output
            );
            let frames = engine::render_to_wav(
                &mut oscillator,
                &output,
                cfg.audio.sample_rate,
                cfg.audio.channels,
                duration,
                cfg.audio.block_size(),
            )?;
            println!("Recorded {} frames to {:?}", frames, output);
        }

        Commands::Devices => {
            println!("Available audio output devices:\n");

            if let Some(name) = engine::default_device_name() {
                println!("Default output: {}\n", name);
            }

            match engine::list_output_devices() {
                Ok(devices) => {
                    for device in devices {
                        println!(
                            "  - {} ({} Hz, {} ch)",
                            device.name, device.sample_rate, device.channels
                        );
                    }
                }
                Err(e) => {
                    println!("  Error listing devices: {}", e);
                }
            }
        }

        Commands::MidiPorts => {
            println!("Available MIDI input ports:\n");
            let ports = list_midi_ports()?;
            if ports.is_empty() {
                println!("  (none)");
            }
            for port in ports {
                println!("  - {}", port);
            }
        }

        Commands::Check {
            config: config_path,
        } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    match cfg.audio.buffer_size {
                        Some(frames) => println!("  Buffer size: {} frames", frames),
                        None => println!("  Buffer size: (device default)"),
                    }
                    println!("  Channels: {}", cfg.audio.channels);
                    println!(
                        "  Device: {}",
                        cfg.audio.device.as_deref().unwrap_or("(default)")
                    );
                    println!("  Frequency: {} Hz", cfg.voice.frequency);
                    println!("  Volume: {:.0}%", cfg.voice.volume);
                    println!("  Waveform: {}", cfg.voice.waveform);
                    println!(
                        "  MIDI port: {}",
                        cfg.control.midi_port.as_deref().unwrap_or("(first available)")
                    );
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "monosynth.yaml";
            if Path::new(path).exists() {
                println!("monosynth.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created monosynth.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

fn store_from_config(cfg: &SynthConfig) -> ParameterStore {
    ParameterStore::with_defaults(cfg.voice.frequency, cfg.voice.volume, cfg.voice.waveform)
}

fn play(config_path: &Path, midi: bool, echo: bool) -> Result<()> {
    let cfg = config::load_or_default(config_path)?;

    let params = Arc::new(store_from_config(&cfg));
    let controller = Controller::new(params.clone());
    let engine = OscillatorEngine::new(params);

    let buffer_frames = cfg.audio.buffer_size.map(|frames| frames as u32);
    let player = Player::start(engine, cfg.audio.device.as_deref(), buffer_frames)?;
    println!(
        "Playing on {} ({} Hz, {} ch). Send JSON commands on stdin, Ctrl-C to quit.",
        player.device_name(),
        player.sample_rate(),
        player.channels()
    );

    let _midi = if midi {
        Some(MidiControl::connect(
            cfg.control.midi_port.as_deref(),
            cfg.control.midi_channel,
            controller.clone(),
        )?)
    } else {
        None
    };

    let (quit_tx, quit_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;

    // Stdin reader is detached: a blocking read cannot be interrupted
    let stdin_controller = controller.clone();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("stdin read failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if stdin_controller.handle_message(&line).is_some() && echo {
                print_status(&stdin_controller);
            }
        }
        log::debug!("stdin closed; still playing until Ctrl-C");
    });

    let _ = quit_rx.recv();

    let engine = player.stop()?;
    let snapshot = engine.params().snapshot();
    println!(
        "\nStopped. Last state: {} Hz, {:.0}%, {}, {}",
        snapshot.frequency_hz,
        snapshot.volume_percent(),
        snapshot.waveform,
        if snapshot.gate_open { "sounding" } else { "idle" }
    );

    Ok(())
}

fn print_status(controller: &Controller) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for message in controller.status() {
        let _ = writeln!(out, "{}", StatusMessage::to_json(&message));
    }
    let _ = out.flush();
}
