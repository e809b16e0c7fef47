//! Stagehand CLI - direct control of the stage box registers.
//!
//! Every command opens the device against the configured register tree,
//! performs one read or one verified write per register touched, and
//! exits; nothing is cached across invocations.

mod config;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use stagehand_core::provision;
use stagehand_core::{DeviceConfig, LedState, NUM_MIC_INPUTS, Stage16};
use stagehand_registers::SYSFS_REGISTER_ROOT;

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(about = "Direct control of the stage box mic inputs and front-panel LEDs", long_about = None)]
#[command(version)]
struct Cli {
    /// Register tree root (overrides the config file and the built-in default)
    #[arg(long, global = true)]
    register_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show LED states and per-input gain/pad/phantom settings
    Status {
        /// Show undecoded register contents instead of decoded values
        #[arg(long)]
        raw: bool,
        /// Emit the status as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every register with its path and power-on default
    List,
    /// Get or set the preamp gain of a mic input, in dB (10-60)
    Gain {
        /// Mic input number (1-16)
        channel: u16,
        /// New gain in dB; prints the current gain when omitted
        db: Option<u8>,
    },
    /// Get or set the -20 dB pad of a mic input
    Pad {
        /// Mic input number (1-16)
        channel: u16,
        /// New pad state; prints the current state when omitted
        state: Option<Switch>,
    },
    /// Get or set -48 V phantom power of a mic input
    Phantom {
        /// Mic input number (1-16)
        channel: u16,
        /// New phantom state; prints the current state when omitted
        state: Option<Switch>,
    },
    /// Get or set a front-panel LED
    Led {
        led: LedName,
        /// New LED state; prints the current state when omitted
        state: Option<LedStateArg>,
    },
    /// Create a scratch register tree seeded with power-on defaults
    Provision {
        /// Print the register map without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Write power-on defaults to every register through the verify protocol
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        matches!(switch, Switch::On)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LedName {
    Power,
    Status,
    Mute,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LedStateArg {
    Off,
    Alert,
    On,
}

impl From<LedStateArg> for LedState {
    fn from(state: LedStateArg) -> Self {
        match state {
            LedStateArg::Off => LedState::Off,
            LedStateArg::Alert => LedState::Alert,
            LedStateArg::On => LedState::On,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config()?;

    let level = config.log.level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("stagehand={level}").parse()?)
                .add_directive(format!("stagehand_core={level}").parse()?)
                .add_directive(format!("stagehand_registers={level}").parse()?),
        )
        .init();

    let register_root = cli
        .register_root
        .or(config.device.register_root)
        .unwrap_or_else(|| PathBuf::from(SYSFS_REGISTER_ROOT));

    match cli.command {
        Commands::Status { raw, json } => {
            let mut device = open_device(register_root)?;
            let status = report::gather(&mut device, raw)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print!("{}", report::render_text(&status));
            }
        }

        Commands::List => {
            let map = provision::register_map(NUM_MIC_INPUTS)?;
            println!("{:<10} {:<3} {:<26} DEFAULT", "KIND", "CH", "PATH");
            for entry in &map {
                let channel = entry.channel.map_or_else(|| "-".to_string(), |c| c.to_string());
                println!(
                    "{:<10} {:<3} {:<26} {}",
                    entry.kind.to_string(),
                    channel,
                    entry.path.display().to_string(),
                    entry.default
                );
            }
        }

        Commands::Gain { channel, db } => {
            let mut device = open_device(register_root)?;
            let signal = device.mic_input(channel)?;
            match db {
                Some(db) => signal.set_gain(db)?,
                None => println!("{}", signal.gain()?),
            }
        }

        Commands::Pad { channel, state } => {
            let mut device = open_device(register_root)?;
            let signal = device.mic_input(channel)?;
            match state {
                Some(state) => signal.set_pad(state.into())?,
                None => println!("{}", if signal.pad()? { "on" } else { "off" }),
            }
        }

        Commands::Phantom { channel, state } => {
            let mut device = open_device(register_root)?;
            let signal = device.mic_input(channel)?;
            match state {
                Some(state) => signal.set_phantom(state.into())?,
                None => println!("{}", if signal.phantom()? { "on" } else { "off" }),
            }
        }

        Commands::Led { led, state } => {
            let mut device = open_device(register_root)?;
            let leds = device.leds();
            let led = match led {
                LedName::Power => leds.power(),
                LedName::Status => leds.status(),
                LedName::Mute => leds.mute(),
            };
            match state {
                Some(state) => led.set_state(state.into())?,
                None => println!("{}", led.state_text()),
            }
        }

        Commands::Provision { dry_run } => {
            let map = provision::register_map(NUM_MIC_INPUTS)?;
            if dry_run {
                for entry in &map {
                    println!("{} {}", register_root.join(&entry.path).display(), entry.default);
                }
            } else {
                provision::seed(&register_root, NUM_MIC_INPUTS)?;
                println!("seeded {} registers under {}", map.len(), register_root.display());
            }
        }

        Commands::Reset => {
            let mut device = open_device(register_root)?;
            device.initialize().context("failed to reset registers")?;
        }
    }

    Ok(())
}

/// Open the device with eager reads so broken registers surface up front.
fn open_device(register_root: PathBuf) -> Result<Stage16> {
    let config = DeviceConfig { register_root, ..DeviceConfig::default() };
    Stage16::new(config).context("failed to open the device registers")
}
