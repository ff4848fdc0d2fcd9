//! The byte pipe between a session and an instrument.
//!
//! A transport sends complete SysEx frames and collects whatever comes back
//! into a shared [`SysexInbox`]. Delivery happens on the transport's own
//! callback thread; the session only ever drains the inbox.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::inbox::SysexInbox;

pub mod memory;
pub use memory::{MemoryTransport, SentLog};

#[cfg(feature = "midi-io")]
pub mod port;
#[cfg(feature = "midi-io")]
pub use port::{list_input_devices, list_output_devices, MidirTransport};

pub trait SysexTransport: Send {
    /// Sends one complete frame (`F0 ... F7`).
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Where inbound SysEx lands.
    fn inbox(&self) -> &Arc<SysexInbox>;
}

impl<T: SysexTransport + ?Sized> SysexTransport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn inbox(&self) -> &Arc<SysexInbox> {
        (**self).inbox()
    }
}

/// A system MIDI port as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MidiDevice {
    pub index: usize,
    pub name: String,
}

/// Case-insensitive partial match, first hit wins.
pub fn find_device<'a>(devices: &'a [MidiDevice], name: &str) -> Option<&'a MidiDevice> {
    let needle = name.to_lowercase();
    devices
        .iter()
        .find(|device| device.name.to_lowercase().contains(&needle))
}
