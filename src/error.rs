//! Centralized error type for the sqesq umbrella crate.
//!
//! Wraps both subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SysEx: {0}")]
    Sysex(#[from] sqesq_sysex::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] sqesq_midi_io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
