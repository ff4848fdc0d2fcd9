//! A scripted ESQ-1 / SQ-80 that answers over a `MemoryTransport`.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use sqesq_midi_io::MemoryTransport;
use sqesq_sysex::codec::{self, DumpType};
use sqesq_sysex::{NibblePair, Oscillator, ProgramDump};

pub const ESQ1: u8 = 0x01;
pub const RACK: u8 = 0x02;
pub const SQ80: u8 = 0x03;

pub fn identity_payload(model: u8, major: u8, minor: u8, channel: u8) -> Vec<u8> {
    vec![
        0x7E, channel, 0x06, 0x02, 0x0F, 0x02, 0x00, model, 0x00, 0x00, 0x00, minor, major,
    ]
}

pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.push(0xF0);
    frame.extend_from_slice(payload);
    frame.push(0xF7);
    frame
}

/// A program named `name` on `channel` with osc 1 at OCT 0 SEMI 0 playing
/// waveform 5 and resonance 17.
pub fn program_payload(name: &str, channel: u8) -> Vec<u8> {
    let mut payload = vec![0u8; 208];
    payload[0] = 0x0F;
    payload[1] = 0x02;
    payload[2] = channel;
    payload[3] = 0x01;
    let padded = format!("{name:<6}");
    for (i, c) in padded.bytes().take(6).enumerate() {
        payload[4 + i * 2] = c & 0x0F;
        payload[5 + i * 2] = c >> 4;
    }
    let program = ProgramDump::from_payload(&payload)
        .unwrap()
        .with_pitch_pair(Oscillator::Osc1, NibblePair::from_value(36))
        .with_waveform(Oscillator::Osc1, 5)
        .with_resonance_pair(NibblePair::from_value(17));
    program.as_bytes().to_vec()
}

#[derive(Debug, Clone)]
pub struct SynthState {
    pub channel: u8,
    /// Identity reply payload; `None` for firmware that ignores the request.
    pub identity: Option<Vec<u8>>,
    /// Current edit buffer payload.
    pub program: Vec<u8>,
    /// When off, program requests are answered with an empty SysEx frame.
    pub sysex_enabled: bool,
    pub programs_received: usize,
    pub soft_button_presses: usize,
    pub internal_presses: usize,
    pub requests_seen: Vec<(u8, u8)>,
}

#[derive(Clone)]
pub struct FakeSynth {
    state: Arc<Mutex<SynthState>>,
}

impl FakeSynth {
    pub fn new(identity: Option<Vec<u8>>, channel: u8) -> Self {
        Self {
            state: Arc::new(Mutex::new(SynthState {
                channel,
                identity,
                program: program_payload("PIANO", channel),
                sysex_enabled: true,
                programs_received: 0,
                soft_button_presses: 0,
                internal_presses: 0,
                requests_seen: Vec::new(),
            })),
        }
    }

    pub fn esq1(major: u8, minor: u8, channel: u8) -> Self {
        Self::new(Some(identity_payload(ESQ1, major, minor, channel)), channel)
    }

    pub fn sq80(major: u8, minor: u8, channel: u8) -> Self {
        Self::new(Some(identity_payload(SQ80, major, minor, channel)), channel)
    }

    pub fn rack(major: u8, minor: u8, channel: u8) -> Self {
        Self::new(Some(identity_payload(RACK, major, minor, channel)), channel)
    }

    /// Pre-3.00 ESQ-1: answers program requests only.
    pub fn silent(channel: u8) -> Self {
        Self::new(None, channel)
    }

    pub fn with_sysex_disabled(self) -> Self {
        self.state.lock().sysex_enabled = false;
        self
    }

    pub fn state(&self) -> SynthState {
        self.state.lock().clone()
    }

    pub fn program(&self) -> ProgramDump {
        ProgramDump::from_payload(&self.state.lock().program).unwrap()
    }

    pub fn set_program(&self, program: &ProgramDump) {
        self.state.lock().program = program.as_bytes().to_vec();
    }

    pub fn transport(&self) -> MemoryTransport {
        let state = Arc::clone(&self.state);
        MemoryTransport::with_responder(move |sent| respond(&mut state.lock(), sent))
    }
}

fn respond(state: &mut SynthState, sent: &[u8]) -> Vec<Vec<u8>> {
    if sent == codec::DEVICE_INQUIRY.as_slice() {
        return state.identity.iter().map(|payload| frame(payload)).collect();
    }

    if sent.len() == 210 {
        state.program = sent[1..209].to_vec();
        state.programs_received += 1;
        return Vec::new();
    }

    if sent.len() < 6 || sent[1] != 0x0F || sent[2] != 0x02 {
        return Vec::new();
    }
    let channel = sent[3];
    if channel != state.channel {
        return Vec::new();
    }

    match &sent[4..sent.len() - 1] {
        [0x0E, 0x2F, 0x62] => state.soft_button_presses += 1,
        [0x0E, 0x26] => state.internal_presses += 1,
        [code] => {
            state.requests_seen.push((channel, *code));
            if *code == DumpType::Program.code() {
                return if state.sysex_enabled {
                    vec![frame(&state.program)]
                } else {
                    vec![frame(&[])]
                };
            }
            if *code == DumpType::Bank.code() && state.sysex_enabled {
                return vec![frame(&[0u8; 4])];
            }
        }
        _ => {}
    }
    Vec::new()
}
