//! Device identification from the universal identity reply.
//!
//! Reply payload layout (13 bytes, framing removed):
//!
//! | Offset | Meaning                              |
//! |--------|--------------------------------------|
//! | 0      | `0x7E` (universal non-realtime)      |
//! | 1      | device ID / base MIDI channel        |
//! | 2..4   | `06 02` (identity reply)             |
//! | 4      | manufacturer (`0x0F` Ensoniq)        |
//! | 5      | family                               |
//! | 7      | model                                |
//! | 11     | OS minor version                     |
//! | 12     | OS major version                     |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEVICE_ID_PAYLOAD_LEN: usize = 13;

const CHANNEL_IDX: usize = 1;
const FAMILY_IDX: usize = 5;
const MODEL_IDX: usize = 7;
const OS_MINOR_IDX: usize = 11;
const OS_MAJOR_IDX: usize = 12;

pub const ESQ_FAMILY: u8 = 0x02;
pub const ESQ1_MODEL: u8 = 0x01;
/// Shared by the ESQ-M and SQ-80M; only the OS version tells them apart.
pub const RACK_MODEL: u8 = 0x02;
pub const SQ80_MODEL: u8 = 0x03;

/// First ESQ-1 OS (as `major * 100 + minor`) that can play hidden waveforms.
pub const ESQ1_HIDDEN_WAVES_MIN_VERSION: u16 = 350;
/// Rack units reporting this OS or later are SQ-80M, earlier ones ESQ-M.
pub const SQ80M_MIN_VERSION: u16 = 130;

/// Firmware that cannot tell two releases apart in its own report:
/// (model, major, minor, the other possible minor).
const AMBIGUOUS_VERSIONS: &[(SynthModel, u8, u8, u8)] = &[(SynthModel::Sq80, 1, 80, 81)];

/// A 13-byte identity reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdReply([u8; DEVICE_ID_PAYLOAD_LEN]);

impl DeviceIdReply {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn family(&self) -> u8 {
        self.0[FAMILY_IDX]
    }

    pub fn model(&self) -> u8 {
        self.0[MODEL_IDX]
    }

    pub fn channel(&self) -> u8 {
        self.0[CHANNEL_IDX] & 0x0F
    }

    pub fn os_major(&self) -> u8 {
        self.0[OS_MAJOR_IDX]
    }

    pub fn os_minor(&self) -> u8 {
        self.0[OS_MINOR_IDX]
    }
}

impl TryFrom<&[u8]> for DeviceIdReply {
    type Error = Error;

    fn try_from(payload: &[u8]) -> Result<Self> {
        let bytes: [u8; DEVICE_ID_PAYLOAD_LEN] =
            payload.try_into().map_err(|_| Error::PayloadLength {
                expected: DEVICE_ID_PAYLOAD_LEN,
                actual: payload.len(),
            })?;
        Ok(Self(bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynthModel {
    Esq1,
    Sq80,
    /// SQ-80 rack (late rack OS).
    Sq80M,
    /// ESQ-1 rack (early rack OS).
    EsqM,
    Unknown,
    /// A write operation does not re-identify the device.
    Unchanged,
}

impl SynthModel {
    pub fn name(self) -> &'static str {
        match self {
            SynthModel::Esq1 => "ESQ-1",
            SynthModel::Sq80 => "SQ-80",
            SynthModel::Sq80M => "SQ-80M",
            SynthModel::EsqM => "ESQ-M",
            SynthModel::Unknown => "Unknown",
            SynthModel::Unchanged => "Unchanged",
        }
    }

    /// Number of front-panel-selectable waveforms. Everything at or above this
    /// index is a hidden waveform.
    pub fn wave_count(self) -> u8 {
        match self {
            SynthModel::Sq80 | SynthModel::Sq80M => 75,
            SynthModel::Esq1 | SynthModel::EsqM | SynthModel::Unknown | SynthModel::Unchanged => {
                32
            }
        }
    }

    pub fn is_esq1_family(self) -> bool {
        matches!(self, SynthModel::Esq1 | SynthModel::EsqM)
    }

    pub fn is_sq80_family(self) -> bool {
        matches!(self, SynthModel::Sq80 | SynthModel::Sq80M)
    }

    pub fn is_known(self) -> bool {
        self.is_esq1_family() || self.is_sq80_family()
    }

    /// Menu entry 0 stands for "a normal waveform"; entry `n > 0` is the
    /// `n`-th hidden one. Returns the raw index to write for a menu entry.
    pub fn hidden_wave_raw(self, menu_index: u8) -> u8 {
        menu_index.saturating_add(self.wave_count() - 1)
    }

    /// Inverse of [`hidden_wave_raw`](Self::hidden_wave_raw); normal waveforms
    /// all collapse to 0.
    pub fn hidden_wave_menu_index(self, raw: u8) -> u8 {
        let count = self.wave_count();
        if raw >= count {
            raw - count + 1
        } else {
            0
        }
    }
}

impl fmt::Display for SynthModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirmwareVersion {
    Reported {
        major: u8,
        minor: u8,
        /// Set when the firmware could equally be `major.alternate_minor`.
        alternate_minor: Option<u8>,
    },
    /// ESQ-1 firmware older than 3.00 does not answer the identity request.
    BelowThree,
}

impl FirmwareVersion {
    pub fn reported(major: u8, minor: u8) -> Self {
        FirmwareVersion::Reported {
            major,
            minor,
            alternate_minor: None,
        }
    }

    /// `major * 100 + minor`, using the lower candidate when ambiguous.
    /// Unreported pre-3.00 firmware compares as 299.
    pub fn combined(&self) -> u16 {
        match *self {
            FirmwareVersion::Reported { major, minor, .. } => major as u16 * 100 + minor as u16,
            FirmwareVersion::BelowThree => 299,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            FirmwareVersion::Reported {
                alternate_minor: Some(_),
                ..
            }
        )
    }

    /// The minor part as shown to the user, e.g. `"53"` or `"80/81"`.
    pub fn minor_display(&self) -> String {
        match *self {
            FirmwareVersion::Reported {
                minor,
                alternate_minor: Some(alt),
                ..
            } => format!("{minor:02}/{alt:02}"),
            FirmwareVersion::Reported { minor, .. } => format!("{minor:02}"),
            FirmwareVersion::BelowThree => "00".to_string(),
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareVersion::Reported { major, .. } => {
                write!(f, "{}.{}", major, self.minor_display())
            }
            FirmwareVersion::BelowThree => f.write_str("< 3.00"),
        }
    }
}

/// What the connected instrument is. Built fresh for every identification and
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub model: SynthModel,
    pub firmware: FirmwareVersion,
    pub supports_hidden_waveforms: bool,
    /// Base channel from the reply, if there was one.
    pub channel: Option<u8>,
}

impl DeviceIdentity {
    pub fn classify(reply: &DeviceIdReply) -> Self {
        let major = reply.os_major();
        let minor = reply.os_minor();
        let combined = major as u16 * 100 + minor as u16;

        let model = if reply.family() != ESQ_FAMILY {
            SynthModel::Unknown
        } else {
            match reply.model() {
                ESQ1_MODEL => SynthModel::Esq1,
                RACK_MODEL if combined < SQ80M_MIN_VERSION => SynthModel::EsqM,
                RACK_MODEL => SynthModel::Sq80M,
                SQ80_MODEL => SynthModel::Sq80,
                _ => SynthModel::Unknown,
            }
        };

        let alternate_minor = AMBIGUOUS_VERSIONS
            .iter()
            .find(|(m, ma, mi, _)| *m == model && *ma == major && *mi == minor)
            .map(|(_, _, _, alt)| *alt);

        let firmware = FirmwareVersion::Reported {
            major,
            minor,
            alternate_minor,
        };

        Self {
            model,
            firmware,
            supports_hidden_waveforms: supports_hidden_waveforms(model, &firmware),
            channel: Some(reply.channel()),
        }
    }

    /// Classifies a raw payload. Anything that is not exactly 13 bytes is
    /// treated as "no reply" and never reaches model classification.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        DeviceIdReply::try_from(payload)
            .ok()
            .map(|reply| Self::classify(&reply))
    }

    /// A program dump arrived but nothing answered the identity request. Only
    /// ESQ-1 firmware below 3.00 behaves this way.
    pub fn silent_esq1() -> Self {
        let firmware = FirmwareVersion::BelowThree;
        Self {
            model: SynthModel::Esq1,
            firmware,
            supports_hidden_waveforms: supports_hidden_waveforms(SynthModel::Esq1, &firmware),
            channel: None,
        }
    }
}

pub fn supports_hidden_waveforms(model: SynthModel, firmware: &FirmwareVersion) -> bool {
    let old_esq1 =
        model == SynthModel::Esq1 && firmware.combined() < ESQ1_HIDDEN_WAVES_MIN_VERSION;
    let rack = matches!(model, SynthModel::EsqM | SynthModel::Sq80M);
    !(old_esq1 || rack)
}
