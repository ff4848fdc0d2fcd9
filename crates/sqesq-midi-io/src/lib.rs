//! Device session for the Ensoniq ESQ-1 / SQ-80 family.
//!
//! Connects to an instrument over MIDI, identifies it, reads its edit buffer
//! and writes oscillator and filter edits back. Protocol operations never
//! fail with an error: the outcome of each is a [`DeviceResponse`] whose
//! [`ConnectionStatus`] says what happened.
//!
//! Feature gates: `midi-io` (system MIDI ports through `midir`). Without it
//! only [`MemoryTransport`] is available.
//!
//! # Example
//!
//! ```ignore
//! use sqesq_midi_io::{DeviceSession, MidirTransport, SessionConfig};
//!
//! let transport = MidirTransport::open_by_name("UM-ONE", "UM-ONE")?;
//! let mut session = DeviceSession::with_transport(SessionConfig::default(), transport);
//! let response = session.connect();
//! println!("{} ({})", response.status, response.model());
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod inbox;
pub use inbox::SysexInbox;

pub mod transport;
pub use transport::{find_device, MemoryTransport, MidiDevice, SentLog, SysexTransport};
#[cfg(feature = "midi-io")]
pub use transport::{list_input_devices, list_output_devices, MidirTransport};

pub mod config;
pub use config::{SessionConfig, SessionConfigBuilder};

pub mod response;
pub use response::{BusyReason, ConnectionStatus, DeviceResponse};

pub mod session;
pub use session::{select_device_reply, DeviceSession, OscillatorSlots, RangeMemory};

mod worker;
pub use worker::{SessionCommand, SessionWorker};
