//! Error types for SysEx encoding and program editing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("MIDI channel out of range: {0} (expected 0-15)")]
    InvalidChannel(u8),

    #[error("Oscillator out of range: {0} (expected 0-2)")]
    InvalidOscillator(usize),

    #[error("Payload length mismatch: expected {expected}, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    #[error("Not a SysEx frame")]
    FrameNotSysex,
}

pub type Result<T> = std::result::Result<T, Error>;
