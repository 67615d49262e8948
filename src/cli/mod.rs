//! CLI interface for monosynth

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Monophonic oscillator controlled by JSON or MIDI messages
#[derive(Parser)]
#[command(name = "monosynth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play in real time, reading JSON commands from stdin, one per line
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,

        /// Also accept notes and volume from a MIDI input
        #[arg(long)]
        midi: bool,

        /// Print the parameter state as JSON lines after each command
        #[arg(long)]
        echo: bool,
    },

    /// Render one note to a WAV file
    Render {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "2")]
        duration: f64,

        /// Frequency in Hz (overrides config)
        #[arg(short, long)]
        frequency: Option<f64>,

        /// Waveform name (overrides config)
        #[arg(short, long)]
        waveform: Option<String>,

        /// Volume 0-100 (overrides config)
        #[arg(long)]
        volume: Option<f32>,
    },

    /// List available audio output devices
    Devices,

    /// List available MIDI input ports
    MidiPorts,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "monosynth.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
