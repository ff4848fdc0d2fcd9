//! Remembered register values for the two-way edits.
//!
//! Switching an oscillator into an extended octave or low-frequency mode, or
//! switching the filter into self-oscillation, overwrites a register the user
//! will want back later. These slots keep the value that was there so the
//! reverse switch can restore it.

use serde::{Deserialize, Serialize};
use sqesq_sysex::program::MAX_SEMI_NORMAL_RANGE;
use sqesq_sysex::{NibblePair, OctaveBucket, Oscillator, OscillatorPitch, ProgramDump};

/// OCT 0, SEMI 0.
pub const DEFAULT_PITCH_NORMAL: NibblePair = NibblePair::new(0x0, 0x6);
/// Pitch restored when leaving low-frequency mode with nothing remembered.
pub const DEFAULT_TOGGLE_NORMAL: NibblePair = NibblePair::new(0x4, 0x2);
/// Pitch used when entering low-frequency mode with nothing remembered.
pub const DEFAULT_TOGGLE_LOW_FREQ: NibblePair = NibblePair::new(0xC, 0x8);
pub const DEFAULT_RESONANCE_NORMAL: NibblePair = NibblePair::new(0x0, 0x1);
pub const DEFAULT_RESONANCE_SELF_OSC: NibblePair = NibblePair::new(0x0, 0x2);

/// Highest pitch total that still counts as "inside the normal range" when
/// deciding whether an extended or LF pitch must be undone.
const NORMAL_RETURN_LIMIT: u8 = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OscillatorSlots {
    /// Last normal-range pitch before moving to +6/+7 or LF.
    pub pitch_normal: NibblePair,
    /// Pitch restored when LF mode is switched off.
    pub toggle_normal: NibblePair,
    /// Pitch restored when LF mode is switched on.
    pub toggle_low_freq: NibblePair,
}

impl Default for OscillatorSlots {
    fn default() -> Self {
        Self {
            pitch_normal: DEFAULT_PITCH_NORMAL,
            toggle_normal: DEFAULT_TOGGLE_NORMAL,
            toggle_low_freq: DEFAULT_TOGGLE_LOW_FREQ,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeMemory {
    oscillators: [OscillatorSlots; 3],
    resonance_normal: NibblePair,
    resonance_self_osc: NibblePair,
}

impl Default for RangeMemory {
    fn default() -> Self {
        Self {
            oscillators: [OscillatorSlots::default(); 3],
            resonance_normal: DEFAULT_RESONANCE_NORMAL,
            resonance_self_osc: DEFAULT_RESONANCE_SELF_OSC,
        }
    }
}

impl RangeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oscillator(&self, osc: Oscillator) -> &OscillatorSlots {
        &self.oscillators[osc.index()]
    }

    pub fn resonance_normal(&self) -> NibblePair {
        self.resonance_normal
    }

    pub fn resonance_self_osc(&self) -> NibblePair {
        self.resonance_self_osc
    }

    /// Sets the pitch of `osc` from the editor's octave menu and semitone.
    ///
    /// Extended buckets and LF write an absolute total, saving the current
    /// pitch first if it was in the normal range. Picking `Normal` from an
    /// extended pitch restores the saved value. Otherwise only the semitone
    /// changes and the octave is kept. `semitone` is clamped to 0-11.
    pub fn apply_pitch(
        &mut self,
        program: &ProgramDump,
        osc: Oscillator,
        bucket: OctaveBucket,
        semitone: u8,
        low_frequency: bool,
    ) -> ProgramDump {
        let semitone = semitone.min(11) as u16;
        let lf_offset = if low_frequency { 128 } else { 0 };
        let current = program.pitch_pair(osc);
        let slots = &mut self.oscillators[osc.index()];

        let pitch = if bucket.is_extended() || low_frequency {
            if current.value() <= MAX_SEMI_NORMAL_RANGE {
                slots.pitch_normal = current;
            }
            let total = (bucket.octave() as u16 + 3) * 12 + semitone + lf_offset;
            // The register is 8 bits wide; the top of +7 LF wraps.
            NibblePair::from_value((total % 256) as u8)
        } else if current.value() > NORMAL_RETURN_LIMIT {
            if slots.pitch_normal.value() > NORMAL_RETURN_LIMIT {
                slots.pitch_normal = DEFAULT_PITCH_NORMAL;
            }
            slots.pitch_normal
        } else {
            let octave = OscillatorPitch::from_total(current.value()).real_octave as u16;
            NibblePair::from_value((octave * 12 + semitone) as u8)
        };

        program.with_pitch_pair(osc, pitch)
    }

    /// Switches LF mode for `osc` on or off by swapping in the remembered
    /// pitch for the other mode.
    pub fn apply_low_frequency(
        &mut self,
        program: &ProgramDump,
        osc: Oscillator,
        enable: bool,
    ) -> ProgramDump {
        let current = program.pitch_pair(osc);
        let slots = &mut self.oscillators[osc.index()];
        if enable {
            if current.value() <= MAX_SEMI_NORMAL_RANGE {
                slots.toggle_normal = current;
            }
            program.with_pitch_pair(osc, slots.toggle_low_freq)
        } else {
            slots.toggle_low_freq = current;
            program.with_pitch_pair(osc, slots.toggle_normal)
        }
    }

    pub fn apply_self_oscillation(&mut self, program: &ProgramDump, enable: bool) -> ProgramDump {
        let current = program.resonance_pair();
        if enable {
            self.resonance_normal = current;
            program.with_resonance_pair(self.resonance_self_osc)
        } else {
            self.resonance_self_osc = current;
            program.with_resonance_pair(self.resonance_normal)
        }
    }
}
