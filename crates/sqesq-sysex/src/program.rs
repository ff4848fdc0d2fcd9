//! Program dump payload and its semantic parameters.
//!
//! Every program byte travels as two SysEx bytes (low nibble first), so a
//! parameter occupies a pair of payload offsets. Only the fields below are
//! interpreted; the rest of the 208 bytes is carried through untouched.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::SynthModel;

/// 210-byte wire frame minus `F0`/`F7`.
pub const PROGRAM_PAYLOAD_LEN: usize = 208;

const CHANNEL_IDX: usize = 2;
const NAME_START: usize = 4;
const NAME_LEN: usize = 6;

const WAVE: [[usize; 2]; 3] = [[130, 131], [150, 151], [170, 171]];
const PITCH: [[usize; 2]; 3] = [[120, 121], [140, 141], [160, 161]];
const RESONANCE: [usize; 2] = [184, 185];

/// Highest pitch value that is not in low-frequency mode.
pub const MAX_SEMI_NORMAL_RANGE: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Oscillator {
    Osc1,
    Osc2,
    Osc3,
}

impl Oscillator {
    pub const ALL: [Oscillator; 3] = [Oscillator::Osc1, Oscillator::Osc2, Oscillator::Osc3];

    pub fn index(self) -> usize {
        self as usize
    }

    fn wave_offsets(self) -> [usize; 2] {
        WAVE[self.index()]
    }

    fn pitch_offsets(self) -> [usize; 2] {
        PITCH[self.index()]
    }
}

impl TryFrom<usize> for Oscillator {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Oscillator::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidOscillator(index))
    }
}

/// The two SysEx bytes holding one program byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NibblePair {
    pub low: u8,
    pub high: u8,
}

impl NibblePair {
    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    pub const fn from_value(value: u8) -> Self {
        Self {
            low: value % 16,
            high: value / 16,
        }
    }

    /// `low | (high << 4)`. Stray bits above the nibble are ignored.
    pub const fn value(self) -> u8 {
        (self.low & 0x0F) | ((self.high & 0x0F) << 4)
    }
}

/// Octave menu buckets: the whole front-panel range collapses into one entry,
/// the two extended octaves get their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OctaveBucket {
    /// -3 to +5
    Normal,
    Plus6,
    Plus7,
}

impl OctaveBucket {
    pub const ALL: [OctaveBucket; 3] = [OctaveBucket::Normal, OctaveBucket::Plus6, OctaveBucket::Plus7];

    pub fn from_real_octave(real_octave: u8) -> Self {
        match real_octave % 11 {
            0..=8 => OctaveBucket::Normal,
            9 => OctaveBucket::Plus6,
            _ => OctaveBucket::Plus7,
        }
    }

    pub fn menu_index(self) -> usize {
        self as usize
    }

    pub fn from_menu_index(index: usize) -> Option<Self> {
        OctaveBucket::ALL.get(index).copied()
    }

    /// The displayed octave this bucket writes (+5 for the normal bucket).
    pub fn octave(self) -> u8 {
        5 + self as u8
    }

    pub fn is_extended(self) -> bool {
        self != OctaveBucket::Normal
    }
}

/// Decoded oscillator pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OscillatorPitch {
    /// Semitones above OCT-3 SEMI+0, 0-255.
    pub total_semitones: u8,
    pub real_octave: u8,
    pub real_semitone: u8,
    pub low_frequency: bool,
}

impl OscillatorPitch {
    pub fn from_total(total_semitones: u8) -> Self {
        let low_frequency = total_semitones > MAX_SEMI_NORMAL_RANGE;
        let total = total_semitones as u16;
        let (real_octave, real_semitone) = if low_frequency {
            ((total + 4) / 12, (total - 8) % 12)
        } else {
            (total / 12, total % 12)
        };
        Self {
            total_semitones,
            real_octave: real_octave as u8,
            real_semitone: real_semitone as u8,
            low_frequency,
        }
    }

    /// Octave within the current range, counted from OCT-3. Low-frequency
    /// mode restarts the count, so this is `real_octave mod 11`.
    pub fn range_octave(&self) -> u8 {
        self.real_octave % 11
    }

    /// Octave as the instrument displays it (-3 to +7).
    pub fn display_octave(&self) -> i8 {
        self.range_octave() as i8 - 3
    }

    pub fn octave_bucket(&self) -> OctaveBucket {
        OctaveBucket::from_real_octave(self.real_octave)
    }

    /// Re-encodes to the total this pitch was decoded from.
    pub fn encode(&self) -> u8 {
        let total = self.range_octave() as u16 * 12
            + self.real_semitone as u16
            + if self.low_frequency { 128 } else { 0 };
        total as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OscillatorParameters {
    pub raw_waveform: u8,
    /// 0 for any normal waveform, `n` for the n-th hidden one.
    pub waveform_index: u8,
    pub pitch: OscillatorPitch,
}

/// Everything the editor displays for one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramParameters {
    pub oscillators: [OscillatorParameters; 3],
    pub self_oscillation: bool,
}

impl ProgramParameters {
    pub fn oscillator(&self, osc: Oscillator) -> &OscillatorParameters {
        &self.oscillators[osc.index()]
    }
}

/// One program as received from the instrument, framing removed.
///
/// Immutable: edits go through the `with_*` methods, which return a modified
/// copy and leave `self` alone.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ProgramDump {
    bytes: Vec<u8>,
}

impl ProgramDump {
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() != PROGRAM_PAYLOAD_LEN {
            return Err(Error::PayloadLength {
                expected: PROGRAM_PAYLOAD_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            bytes: payload.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Channel the dump was sent on.
    pub fn channel(&self) -> u8 {
        self.bytes[CHANNEL_IDX] & 0x0F
    }

    /// Six-character patch name, trailing blanks trimmed.
    pub fn name(&self) -> String {
        (0..NAME_LEN)
            .map(|i| {
                let at = NAME_START + i * 2;
                let c = NibblePair::new(self.bytes[at], self.bytes[at + 1]).value();
                if c.is_ascii_graphic() {
                    c as char
                } else {
                    ' '
                }
            })
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn pair(&self, offsets: [usize; 2]) -> NibblePair {
        NibblePair::new(self.bytes[offsets[0]], self.bytes[offsets[1]])
    }

    fn with_pair(&self, offsets: [usize; 2], pair: NibblePair) -> Self {
        let mut bytes = self.bytes.clone();
        bytes[offsets[0]] = pair.low;
        bytes[offsets[1]] = pair.high;
        Self { bytes }
    }

    pub fn raw_waveform(&self, osc: Oscillator) -> u8 {
        self.pair(osc.wave_offsets()).value()
    }

    /// Hidden-waveform index for the UI: 0 when the oscillator plays one of
    /// the model's normal waveforms.
    pub fn waveform_index(&self, osc: Oscillator, model: SynthModel) -> u8 {
        model.hidden_wave_menu_index(self.raw_waveform(osc))
    }

    pub fn pitch_pair(&self, osc: Oscillator) -> NibblePair {
        self.pair(osc.pitch_offsets())
    }

    pub fn pitch(&self, osc: Oscillator) -> OscillatorPitch {
        OscillatorPitch::from_total(self.pitch_pair(osc).value())
    }

    pub fn resonance_pair(&self) -> NibblePair {
        self.pair(RESONANCE)
    }

    pub fn self_oscillation_enabled(&self) -> bool {
        self.bytes[RESONANCE[1]] > 1
    }

    pub fn with_waveform(&self, osc: Oscillator, raw: u8) -> Self {
        self.with_pair(osc.wave_offsets(), NibblePair::from_value(raw))
    }

    pub fn with_pitch_pair(&self, osc: Oscillator, pair: NibblePair) -> Self {
        self.with_pair(osc.pitch_offsets(), pair)
    }

    pub fn with_resonance_pair(&self, pair: NibblePair) -> Self {
        self.with_pair(RESONANCE, pair)
    }

    pub fn parameters(&self, model: SynthModel) -> ProgramParameters {
        ProgramParameters {
            oscillators: Oscillator::ALL.map(|osc| OscillatorParameters {
                raw_waveform: self.raw_waveform(osc),
                waveform_index: self.waveform_index(osc, model),
                pitch: self.pitch(osc),
            }),
            self_oscillation: self.self_oscillation_enabled(),
        }
    }
}

impl std::fmt::Debug for ProgramDump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramDump")
            .field("name", &self.name())
            .field("channel", &self.channel())
            .finish()
    }
}

impl TryFrom<Vec<u8>> for ProgramDump {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != PROGRAM_PAYLOAD_LEN {
            return Err(Error::PayloadLength {
                expected: PROGRAM_PAYLOAD_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }
}

impl From<ProgramDump> for Vec<u8> {
    fn from(program: ProgramDump) -> Self {
        program.bytes
    }
}
