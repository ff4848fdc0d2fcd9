//! The request/response state machine for one instrument.
//!
//! Every exchange is fire-and-wait: send a request, sleep for the settle
//! window, then drain whatever arrived. A `DeviceSession` is plain blocking
//! code; run it behind a [`SessionWorker`](crate::SessionWorker) to keep a UI
//! responsive.

use std::thread;
use std::time::Duration;

use sqesq_sysex::codec;
use sqesq_sysex::{
    DeviceIdReply, DeviceIdentity, DumpType, OctaveBucket, Oscillator, ProgramDump, SynthModel,
    SysexMessage,
};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::response::DeviceResponse;
use crate::transport::SysexTransport;

pub mod memory;
pub use memory::{OscillatorSlots, RangeMemory};

pub struct DeviceSession {
    transport: Option<Box<dyn SysexTransport>>,
    config: SessionConfig,
    channel: u8,
    current_model: SynthModel,
    memory: RangeMemory,
}

impl DeviceSession {
    /// A session with no transport attached. Every operation reports
    /// `Disconnected` until one is.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            channel: config.channel.min(15),
            transport: None,
            config,
            current_model: SynthModel::Unknown,
            memory: RangeMemory::new(),
        }
    }

    pub fn with_transport(config: SessionConfig, transport: impl SysexTransport + 'static) -> Self {
        let mut session = Self::new(config);
        session.attach(transport);
        session
    }

    /// Replaces the transport. Frames left over from a previous one are
    /// discarded.
    pub fn attach(&mut self, transport: impl SysexTransport + 'static) {
        self.attach_boxed(Box::new(transport));
    }

    pub fn attach_boxed(&mut self, transport: Box<dyn SysexTransport>) {
        transport.inbox().clear();
        self.transport = Some(transport);
        debug!("Transport attached");
    }

    pub fn detach(&mut self) -> Option<Box<dyn SysexTransport>> {
        let transport = self.transport.take();
        if transport.is_some() {
            debug!("Transport detached");
        }
        transport
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// Channel used for outgoing requests, 0-15.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel.min(15);
    }

    /// Last model a successful identification settled on. Never `Unknown`
    /// once something has been identified.
    pub fn current_model(&self) -> SynthModel {
        self.current_model
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn range_memory(&self) -> &RangeMemory {
        &self.memory
    }

    /// Identifies the instrument and reads its current program.
    ///
    /// An ESQ-1 family reply wins over an SQ-80 family reply regardless of
    /// arrival order. Without a transport this returns `Disconnected` and
    /// touches nothing.
    pub fn connect(&mut self) -> DeviceResponse {
        if self.transport.is_none() {
            debug!("Connect without transport");
            return DeviceResponse::disconnected(self.channel);
        }

        let replies = self.exchange(&codec::device_inquiry(), self.config.inquiry_delay);
        let device_id = select_device_reply(replies);
        if device_id.is_none() {
            debug!("No ESQ-1 or SQ-80 answered the identity request");
        }
        self.connection_status(device_id)
    }

    /// Decides the connection status from an identity reply (if any) and a
    /// fresh program read. With neither, every channel is swept for a
    /// program.
    pub fn connection_status(&mut self, device_id: Option<DeviceIdReply>) -> DeviceResponse {
        let identity = device_id.as_ref().map(DeviceIdentity::classify);
        if let Some(channel) = identity.and_then(|identity| identity.channel) {
            self.set_channel(channel);
        }

        let mut program = self.request_program();
        if identity.is_none() && program.is_none() {
            program = self.sweep_channels();
        }

        match (identity, program) {
            (identity, Some(program)) => {
                let identity = identity.unwrap_or_else(DeviceIdentity::silent_esq1);
                self.adopt(&identity);
                info!(
                    model = %identity.model,
                    firmware = %identity.firmware,
                    channel = self.channel + 1,
                    program = %program.name(),
                    "Connected"
                );
                DeviceResponse::connected(Some(identity), program, self.current_model, self.channel)
            }
            (Some(identity), None) => {
                self.adopt(&identity);
                warn!(model = %identity.model, "Instrument identified but sent no program");
                DeviceResponse::sysex_disabled(identity, self.channel)
            }
            (None, None) => {
                info!("No instrument found");
                DeviceResponse::disconnected(self.channel)
            }
        }
    }

    /// Reads the program in the edit buffer. The first frame to arrive is
    /// taken as the answer; anything but a 208-byte payload means no program.
    pub fn request_program(&mut self) -> Option<ProgramDump> {
        let delay = self.config.dump_delay(DumpType::Program);
        self.request_program_with_delay(delay)
    }

    /// Sends a dump request of any kind and returns the first frame that came
    /// back, decoded.
    pub fn request_dump(&mut self, dump: DumpType) -> Option<SysexMessage> {
        let frame = codec::dump_request(self.channel, dump);
        let delay = self.config.dump_delay(dump);
        self.exchange(&frame, delay).into_iter().next()
    }

    /// Presses INTERNAL on the front panel. Returns whether the frame was
    /// sent.
    pub fn press_internal(&mut self) -> bool {
        let frame = codec::internal_button_press(self.channel);
        self.send_frame(&frame)
    }

    /// Selects waveform `raw` (0-255) on `osc`.
    pub fn change_oscillator_waveform(&mut self, osc: Oscillator, raw: u8) -> DeviceResponse {
        debug!(?osc, raw, "Changing waveform");
        self.read_modify_write(|_, program| program.with_waveform(osc, raw))
    }

    /// Sets the pitch of `osc` from an octave bucket and a semitone (0-11).
    pub fn change_oscillator_pitch(
        &mut self,
        osc: Oscillator,
        bucket: OctaveBucket,
        semitone: u8,
        low_frequency: bool,
    ) -> DeviceResponse {
        debug!(?osc, ?bucket, semitone, low_frequency, "Changing pitch");
        self.read_modify_write(|memory, program| {
            memory.apply_pitch(program, osc, bucket, semitone, low_frequency)
        })
    }

    /// Switches LF mode on `osc` to `enable`.
    pub fn toggle_low_frequency_mode(&mut self, osc: Oscillator, enable: bool) -> DeviceResponse {
        debug!(?osc, enable, "Toggling low-frequency mode");
        self.read_modify_write(|memory, program| memory.apply_low_frequency(program, osc, enable))
    }

    /// Switches filter self-oscillation to `enable`.
    pub fn toggle_self_oscillation(&mut self, enable: bool) -> DeviceResponse {
        debug!(enable, "Toggling self-oscillation");
        self.read_modify_write(|memory, program| memory.apply_self_oscillation(program, enable))
    }

    /// Writes `program` to the edit buffer as is.
    pub fn send_program(&mut self, program: &ProgramDump) -> DeviceResponse {
        if !self.send_sysex(program) {
            return DeviceResponse::disconnected(self.channel);
        }
        DeviceResponse::connected(None, program.clone(), self.current_model, self.channel)
    }

    fn read_modify_write<F>(&mut self, edit: F) -> DeviceResponse
    where
        F: FnOnce(&mut RangeMemory, &ProgramDump) -> ProgramDump,
    {
        let Some(current) = self.request_program() else {
            warn!("No program received, edit abandoned");
            return DeviceResponse::disconnected(self.channel);
        };
        let edited = edit(&mut self.memory, &current);
        self.send_program(&edited)
    }

    /// Program frame first, then soft button 5 to dismiss the save prompt.
    fn send_sysex(&mut self, program: &ProgramDump) -> bool {
        let channel = self.channel;
        self.send_frame(&codec::program_frame(program))
            && self.send_frame(&codec::soft_button_5(channel))
    }

    fn sweep_channels(&mut self) -> Option<ProgramDump> {
        let start = self.channel;
        let delay = self.config.sweep_delay();
        for channel in 0..16 {
            self.channel = channel;
            if let Some(program) = self.request_program_with_delay(delay) {
                info!(channel = channel + 1, "Program found by channel sweep");
                return Some(program);
            }
        }
        self.channel = start;
        None
    }

    fn request_program_with_delay(&mut self, delay: Duration) -> Option<ProgramDump> {
        let frame = codec::dump_request(self.channel, DumpType::Program);
        let first = self.exchange(&frame, delay).into_iter().next()?;
        match first {
            SysexMessage::Program(program) => Some(program),
            other => {
                debug!(
                    channel = self.channel + 1,
                    len = other.payload_len(),
                    "Program request answered with something else"
                );
                None
            }
        }
    }

    /// Sends `frame`, waits `delay`, returns what arrived. Stale frames from
    /// before the send are dropped first.
    fn exchange(&mut self, frame: &[u8], delay: Duration) -> Vec<SysexMessage> {
        let Some(transport) = self.transport.as_ref() else {
            return Vec::new();
        };
        let stale = transport.inbox().drain();
        if !stale.is_empty() {
            debug!(count = stale.len(), "Dropping stale SysEx frames");
        }

        if !self.send_frame(frame) {
            return Vec::new();
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.transport
            .as_ref()
            .map(|transport| transport.inbox().drain_messages())
            .unwrap_or_default()
    }

    fn send_frame(&mut self, frame: &[u8]) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            debug!("Cannot send SysEx: no transport attached");
            return false;
        };
        match transport.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!("SysEx send failed: {}", e);
                false
            }
        }
    }

    fn adopt(&mut self, identity: &DeviceIdentity) {
        if identity.model.is_known() {
            self.current_model = identity.model;
        }
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("attached", &self.transport.is_some())
            .field("channel", &self.channel)
            .field("current_model", &self.current_model)
            .finish()
    }
}

/// Picks the reply to trust: the first ESQ-1 family reply, else the first
/// SQ-80 family reply. Other gear is ignored.
pub fn select_device_reply(
    messages: impl IntoIterator<Item = SysexMessage>,
) -> Option<DeviceIdReply> {
    let mut sq80 = None;
    for reply in messages.into_iter().filter_map(SysexMessage::into_device_id) {
        let model = DeviceIdentity::classify(&reply).model;
        if model.is_esq1_family() {
            return Some(reply);
        }
        if model.is_sq80_family() && sq80.is_none() {
            sq80 = Some(reply);
        }
    }
    sq80
}
