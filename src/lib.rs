//! # sqesq - SysEx editor core for the Ensoniq ESQ-1 / SQ-80 family
//!
//! Reads and edits the oscillator and filter settings the front panel can't
//! reach: the +6 and +7 octaves, low-frequency oscillator mode, hidden
//! waveforms and filter self-oscillation.
//!
//! ## Architecture
//!
//! sqesq is an umbrella crate that coordinates:
//! - **sqesq-sysex** - Frame builders, payload classification, program
//!   parameters and device identification. Pure data.
//! - **sqesq-midi-io** - Transports, the device session state machine and the
//!   worker thread that runs it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sqesq::prelude::*;
//!
//! let transport = MidirTransport::open_by_name("UM-ONE", "UM-ONE")?;
//! let worker = SessionWorker::spawn(DeviceSession::with_transport(
//!     SessionConfig::default(),
//!     transport,
//! ))?;
//!
//! worker.submit(SessionCommand::Connect)?;
//! worker.submit(SessionCommand::ToggleSelfOscillation { enable: true })?;
//!
//! while let Some(response) = worker.recv_timeout(Duration::from_secs(10))? {
//!     println!("{}", response.status);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `midi-io`
//! - `midi-io` - System MIDI ports through midir

/// Re-export of sqesq-sysex for direct access
pub use sqesq_sysex as sysex;

/// Re-export of sqesq-midi-io for direct access
pub use sqesq_midi_io as midi_io;

mod error;
pub use error::{Error, Result};

pub use sqesq_sysex::{
    codec, DeviceIdReply, DeviceIdentity, DumpType, FirmwareVersion, NibblePair, OctaveBucket,
    Oscillator, OscillatorParameters, OscillatorPitch, PayloadKind, ProgramDump,
    ProgramParameters, SynthModel, SysexMessage,
};

pub use sqesq_midi_io::{
    BusyReason, ConnectionStatus, DeviceResponse, DeviceSession, MemoryTransport, MidiDevice,
    RangeMemory, SessionCommand, SessionConfig, SessionConfigBuilder, SessionWorker, SysexInbox,
    SysexTransport,
};

#[cfg(feature = "midi-io")]
pub use sqesq_midi_io::{list_input_devices, list_output_devices, MidirTransport};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Error, Result};

    pub use crate::{
        BusyReason, ConnectionStatus, DeviceIdentity, DeviceResponse, DeviceSession, DumpType,
        FirmwareVersion, MemoryTransport, OctaveBucket, Oscillator, ProgramDump, SessionCommand,
        SessionConfig, SessionWorker, SynthModel, SysexTransport,
    };

    #[cfg(feature = "midi-io")]
    pub use crate::{list_input_devices, list_output_devices, MidirTransport};

    pub use std::time::Duration;
}
