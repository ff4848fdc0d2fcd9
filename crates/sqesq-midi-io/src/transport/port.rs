//! System MIDI ports through `midir`.
//!
//! One input and one output connection are held together. SysEx is filtered
//! out by default on every backend, so the input is opened with
//! `Ignore::None`; only frames starting with `F0` reach the inbox.

use std::sync::Arc;

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use super::{find_device, MidiDevice, SysexTransport};
use crate::error::{Error, Result};
use crate::inbox::SysexInbox;

const CLIENT_NAME: &str = "sqesq";

pub fn list_input_devices() -> Vec<MidiDevice> {
    let mut devices = Vec::new();
    if let Ok(midi_input) = MidiInput::new("sqesq-device-list") {
        for (index, port) in midi_input.ports().iter().enumerate() {
            let name = midi_input
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index));
            devices.push(MidiDevice { index, name });
        }
    }
    devices
}

pub fn list_output_devices() -> Vec<MidiDevice> {
    let mut devices = Vec::new();
    if let Ok(midi_output) = MidiOutput::new("sqesq-device-list") {
        for (index, port) in midi_output.ports().iter().enumerate() {
            let name = midi_output
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index));
            devices.push(MidiDevice { index, name });
        }
    }
    devices
}

pub struct MidirTransport {
    output: MidiOutputConnection,
    _input: MidiInputConnection<()>,
    inbox: Arc<SysexInbox>,
    input_name: String,
    output_name: String,
}

impl MidirTransport {
    /// Opens the ports at the given positions in [`list_input_devices`] and
    /// [`list_output_devices`].
    pub fn open(input_index: usize, output_index: usize) -> Result<Self> {
        let inbox = Arc::new(SysexInbox::new());
        let (input, input_name) = connect_input(input_index, Arc::clone(&inbox))?;
        let (output, output_name) = connect_output(output_index)?;
        info!(input = %input_name, output = %output_name, "MIDI ports opened");
        Ok(Self {
            output,
            _input: input,
            inbox,
            input_name,
            output_name,
        })
    }

    /// Opens the first ports whose names contain `input` and `output`,
    /// ignoring case.
    pub fn open_by_name(input: &str, output: &str) -> Result<Self> {
        let inputs = list_input_devices();
        let input_device = find_device(&inputs, input).ok_or_else(|| {
            Error::MidiDevice(format!("No MIDI input device found matching '{}'", input))
        })?;
        let outputs = list_output_devices();
        let output_device = find_device(&outputs, output).ok_or_else(|| {
            Error::MidiDevice(format!("No MIDI output device found matching '{}'", output))
        })?;
        Self::open(input_device.index, output_device.index)
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

fn connect_input(
    device_index: usize,
    inbox: Arc<SysexInbox>,
) -> Result<(MidiInputConnection<()>, String)> {
    let mut midi_input = MidiInput::new(CLIENT_NAME)?;
    midi_input.ignore(Ignore::None);

    let ports = midi_input.ports();
    let port = ports.get(device_index).ok_or_else(|| {
        Error::MidiDevice(format!("MIDI input device {} not found", device_index))
    })?;
    let port_name = midi_input
        .port_name(port)
        .unwrap_or_else(|_| format!("Device {}", device_index));

    let connection = midi_input.connect(
        port,
        "sqesq-input",
        move |_timestamp, message, _| {
            inbox.push(message);
        },
        (),
    )?;
    Ok((connection, port_name))
}

fn connect_output(device_index: usize) -> Result<(MidiOutputConnection, String)> {
    let midi_output = MidiOutput::new(CLIENT_NAME)?;

    let ports = midi_output.ports();
    let port = ports.get(device_index).ok_or_else(|| {
        Error::MidiDevice(format!("MIDI output device {} not found", device_index))
    })?;
    let port_name = midi_output
        .port_name(port)
        .unwrap_or_else(|_| format!("Device {}", device_index));

    let connection = midi_output.connect(port, "sqesq-output")?;
    Ok((connection, port_name))
}

impl SysexTransport for MidirTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!(len = frame.len(), output = %self.output_name, "Sending SysEx");
        self.output.send(frame)?;
        Ok(())
    }

    fn inbox(&self) -> &Arc<SysexInbox> {
        &self.inbox
    }
}

impl std::fmt::Debug for MidirTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidirTransport")
            .field("input", &self.input_name)
            .field("output", &self.output_name)
            .finish()
    }
}
