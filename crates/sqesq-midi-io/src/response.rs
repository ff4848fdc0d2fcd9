//! What every session operation reports back.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqesq_sysex::{DeviceIdentity, ProgramDump, ProgramParameters, SynthModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusyReason {
    Modifying,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// A valid program dump was read.
    Connected,
    /// Nothing usable came back.
    Disconnected,
    /// The instrument identified itself but will not send programs; its
    /// SysEx setting is probably off.
    SysexDisabled,
    /// An operation is in flight.
    Busy(BusyReason),
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::SysexDisabled => "SysEx Disabled",
            ConnectionStatus::Busy(BusyReason::Modifying) => "Modifying Program...",
            ConnectionStatus::Busy(BusyReason::Refreshing) => "Refreshing...",
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }

    pub fn is_busy(self) -> bool {
        matches!(self, ConnectionStatus::Busy(_))
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one session operation.
///
/// `program` and `parameters` are present exactly when `status` is
/// `Connected`. `identity` is present whenever an instrument answered the
/// identity request, or was inferred from a silent program reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub status: ConnectionStatus,
    pub identity: Option<DeviceIdentity>,
    pub program: Option<ProgramDump>,
    pub parameters: Option<ProgramParameters>,
    /// Session channel after the operation, 0-15.
    pub channel: u8,
}

impl DeviceResponse {
    pub fn disconnected(channel: u8) -> Self {
        Self::status_only(ConnectionStatus::Disconnected, channel)
    }

    pub fn busy(reason: BusyReason, channel: u8) -> Self {
        Self::status_only(ConnectionStatus::Busy(reason), channel)
    }

    pub fn sysex_disabled(identity: DeviceIdentity, channel: u8) -> Self {
        Self {
            identity: Some(identity),
            ..Self::status_only(ConnectionStatus::SysexDisabled, channel)
        }
    }

    /// `model` decides how hidden waveforms are numbered in `parameters`.
    pub fn connected(
        identity: Option<DeviceIdentity>,
        program: ProgramDump,
        model: SynthModel,
        channel: u8,
    ) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            identity,
            parameters: Some(program.parameters(model)),
            program: Some(program),
            channel,
        }
    }

    fn status_only(status: ConnectionStatus, channel: u8) -> Self {
        Self {
            status,
            identity: None,
            program: None,
            parameters: None,
            channel,
        }
    }

    /// Model from this response, or `Unchanged` when nothing identified
    /// itself.
    pub fn model(&self) -> SynthModel {
        self.identity
            .map(|identity| identity.model)
            .unwrap_or(SynthModel::Unchanged)
    }

    /// Channel as the instrument's front panel shows it, 1-16.
    pub fn display_channel(&self) -> u8 {
        self.channel + 1
    }

    pub fn program_name(&self) -> Option<String> {
        self.program.as_ref().map(ProgramDump::name)
    }
}
