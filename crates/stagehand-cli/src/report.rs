//! Status and list reports over the device API.

use anyhow::{Context, Result};
use serde::Serialize;

use stagehand_core::{Connector, Format, Level, Stage16};

/// Snapshot of every LED and mic input on the device.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub leds: Vec<LedStatus>,
    pub inputs: Vec<InputStatus>,
}

/// One front-panel LED.
#[derive(Debug, Serialize)]
pub struct LedStatus {
    pub name: String,
    pub state: String,
}

/// One mic input.
///
/// `gain`/`pad`/`phantom` hold decoded values, or the undecoded register
/// strings when the report was gathered in raw mode.
#[derive(Debug, Serialize)]
pub struct InputStatus {
    pub channel: u16,
    pub name: String,
    pub connector: Connector,
    pub format: Format,
    pub level: Level,
    pub gain: String,
    pub pad: String,
    pub phantom: String,
}

/// Gather the full device status.
///
/// LED reads degrade to "Unknown"; input reads propagate their errors with
/// the channel attached.
///
/// # Errors
///
/// Any register read or decode failure on a mic input.
pub fn gather(device: &mut Stage16, raw: bool) -> Result<StatusReport> {
    let leds = vec![
        LedStatus { name: "Power".to_string(), state: device.leds().power().state_text() },
        LedStatus { name: "Status".to_string(), state: device.leds().status().state_text() },
        LedStatus { name: "Mute".to_string(), state: device.leds().mute().state_text() },
    ];

    let mut inputs = Vec::new();
    for signal in device.mic_inputs() {
        let channel = signal.channel();
        let (gain, pad, phantom) = if raw {
            (
                signal.raw_gain().with_context(|| format!("reading input {channel} gain"))?,
                signal.raw_pad().with_context(|| format!("reading input {channel} pad"))?,
                signal
                    .raw_phantom()
                    .with_context(|| format!("reading input {channel} phantom"))?,
            )
        } else {
            (
                signal
                    .gain()
                    .with_context(|| format!("reading input {channel} gain"))?
                    .to_string(),
                on_off(signal.pad().with_context(|| format!("reading input {channel} pad"))?),
                on_off(
                    signal
                        .phantom()
                        .with_context(|| format!("reading input {channel} phantom"))?,
                ),
            )
        };
        inputs.push(InputStatus {
            channel,
            name: signal.name().to_string(),
            connector: signal.connector(),
            format: signal.format(),
            level: signal.level(),
            gain,
            pad,
            phantom,
        });
    }

    Ok(StatusReport { leds, inputs })
}

fn on_off(enabled: bool) -> String {
    if enabled { "on" } else { "off" }.to_string()
}

/// Render the report as aligned plain text.
#[must_use]
pub fn render_text(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str("LED     STATE\n");
    for led in &report.leds {
        out.push_str(&format!("{:<7} {}\n", led.name, led.state));
    }

    out.push_str("\nCH  NAME            CONN  FORMAT  LEVEL  GAIN  PAD  PHANTOM\n");
    for input in &report.inputs {
        out.push_str(&format!(
            "{:<3} {:<15} {:<5} {:<7} {:<6} {:<5} {:<4} {}\n",
            input.channel,
            input.name,
            input.connector.to_string(),
            input.format.to_string(),
            input.level.to_string(),
            input.gain,
            input.pad,
            input.phantom,
        ));
    }
    out
}
