//! SysEx protocol layer for the Ensoniq ESQ-1 / SQ-80 family.
//!
//! Pure data: frame builders, payload classification, program parameter
//! decoding and device identification. No I/O and no threads; the
//! `sqesq-midi-io` crate drives these against a live instrument.
//!
//! # Example
//!
//! ```ignore
//! use sqesq_sysex::{codec, DeviceIdentity, Oscillator, SysexMessage};
//!
//! let request = codec::dump_request(0, codec::DumpType::Program);
//! // ... send `request`, receive `frame` ...
//! if let SysexMessage::Program(program) = SysexMessage::decode(&frame) {
//!     let pitch = program.pitch(Oscillator::Osc1);
//!     let edited = program.with_waveform(Oscillator::Osc1, 100);
//! }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod codec;
pub use codec::{DumpType, PayloadKind, SysexMessage};

pub mod identity;
pub use identity::{DeviceIdReply, DeviceIdentity, FirmwareVersion, SynthModel};

pub mod program;
pub use program::{
    NibblePair, OctaveBucket, Oscillator, OscillatorParameters, OscillatorPitch, ProgramDump,
    ProgramParameters,
};
