//! Outbound SysEx frame builders and inbound frame classification.
//!
//! Every frame the session sends is a fixed layout with at most one variable
//! byte (the MIDI channel). Inbound frames carry no reliable type tag at the
//! transport layer, so they are told apart by payload length alone and wrapped
//! once in [`SysexMessage`] at the decode boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::identity::{DeviceIdReply, DEVICE_ID_PAYLOAD_LEN};
use crate::program::{ProgramDump, PROGRAM_PAYLOAD_LEN};

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Ensoniq manufacturer ID.
pub const ENSONIQ_ID: u8 = 0x0F;
/// ESQ-1 / SQ-80 product code used in every Ensoniq command frame.
pub const ESQ_PRODUCT_ID: u8 = 0x02;

const COMMAND_BUTTON: u8 = 0x0E;
const BUTTON_INTERNAL: u8 = 0x26;
const BUTTON_SOFT_5: [u8; 2] = [0x2F, 0x62];

/// Universal non-realtime identity request, broadcast to all devices.
pub const DEVICE_INQUIRY: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7];

/// Settle window after a device inquiry.
pub const DEVICE_INQUIRY_DELAY: Duration = Duration::from_millis(700);

/// The kinds of dump the instrument can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DumpType {
    /// The program currently in the edit buffer.
    Program,
    /// All 40 internal programs.
    Bank,
    /// The selected sequence.
    Sequence,
    /// Every sequence plus sequencer data.
    AllSequences,
}

impl DumpType {
    pub const ALL: [DumpType; 4] = [
        DumpType::Program,
        DumpType::Bank,
        DumpType::Sequence,
        DumpType::AllSequences,
    ];

    pub const fn code(self) -> u8 {
        match self {
            DumpType::Program => 0x09,
            DumpType::Bank => 0x0A,
            DumpType::Sequence => 0x0C,
            DumpType::AllSequences => 0x22,
        }
    }

    /// How long the instrument needs to answer a request of this kind.
    pub const fn settle_delay(self) -> Duration {
        match self {
            DumpType::Program | DumpType::Sequence => Duration::from_millis(700),
            DumpType::Bank | DumpType::AllSequences => Duration::from_millis(5000),
        }
    }
}

#[inline]
fn command_frame(channel: u8, body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 5);
    frame.extend_from_slice(&[SYSEX_START, ENSONIQ_ID, ESQ_PRODUCT_ID, channel.min(15)]);
    frame.extend_from_slice(body);
    frame.push(SYSEX_END);
    frame
}

pub fn device_inquiry() -> Vec<u8> {
    DEVICE_INQUIRY.to_vec()
}

/// `F0 0F 02 <channel> <code> F7`. Channels above 15 are clamped.
pub fn dump_request(channel: u8, dump: DumpType) -> Vec<u8> {
    command_frame(channel, &[dump.code()])
}

/// Presses INTERNAL on the front panel (enters program edit mode).
pub fn internal_button_press(channel: u8) -> Vec<u8> {
    command_frame(channel, &[COMMAND_BUTTON, BUTTON_INTERNAL])
}

/// Presses soft button 5, which dismisses the save prompt shown after a program
/// dump is received.
pub fn soft_button_5(channel: u8) -> Vec<u8> {
    command_frame(channel, &[COMMAND_BUTTON, BUTTON_SOFT_5[0], BUTTON_SOFT_5[1]])
}

/// Wraps a program payload back into a complete frame.
pub fn program_frame(program: &ProgramDump) -> Vec<u8> {
    let payload = program.as_bytes();
    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.push(SYSEX_START);
    frame.extend_from_slice(payload);
    frame.push(SYSEX_END);
    frame
}

/// Bytes strictly between `F0` and `F7`. A missing terminator is tolerated,
/// a missing start byte is not.
pub fn payload(frame: &[u8]) -> Result<&[u8]> {
    match frame.split_first() {
        Some((&SYSEX_START, rest)) => Ok(rest.strip_suffix(&[SYSEX_END]).unwrap_or(rest)),
        _ => Err(Error::FrameNotSysex),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    DeviceId,
    ProgramDump,
    Unrecognized,
}

/// Length-only classification; content is never inspected here.
pub fn classify_payload(payload: &[u8]) -> PayloadKind {
    match payload.len() {
        DEVICE_ID_PAYLOAD_LEN => PayloadKind::DeviceId,
        PROGRAM_PAYLOAD_LEN => PayloadKind::ProgramDump,
        _ => PayloadKind::Unrecognized,
    }
}

/// An inbound SysEx message, tagged once by payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SysexMessage {
    DeviceId(DeviceIdReply),
    Program(ProgramDump),
    /// Payload bytes of anything else (bank and sequence dumps, foreign gear).
    Unrecognized(Vec<u8>),
}

impl SysexMessage {
    pub fn decode(frame: &[u8]) -> Self {
        let Ok(payload) = payload(frame) else {
            return SysexMessage::Unrecognized(frame.to_vec());
        };
        match classify_payload(payload) {
            PayloadKind::DeviceId => DeviceIdReply::try_from(payload)
                .map(SysexMessage::DeviceId)
                .unwrap_or_else(|_| SysexMessage::Unrecognized(payload.to_vec())),
            PayloadKind::ProgramDump => ProgramDump::from_payload(payload)
                .map(SysexMessage::Program)
                .unwrap_or_else(|_| SysexMessage::Unrecognized(payload.to_vec())),
            PayloadKind::Unrecognized => {
                trace!(len = payload.len(), "Unrecognized SysEx payload");
                SysexMessage::Unrecognized(payload.to_vec())
            }
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            SysexMessage::DeviceId(_) => PayloadKind::DeviceId,
            SysexMessage::Program(_) => PayloadKind::ProgramDump,
            SysexMessage::Unrecognized(_) => PayloadKind::Unrecognized,
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            SysexMessage::DeviceId(reply) => reply.as_bytes().len(),
            SysexMessage::Program(program) => program.as_bytes().len(),
            SysexMessage::Unrecognized(bytes) => bytes.len(),
        }
    }

    pub fn into_program(self) -> Option<ProgramDump> {
        match self {
            SysexMessage::Program(program) => Some(program),
            _ => None,
        }
    }

    pub fn into_device_id(self) -> Option<DeviceIdReply> {
        match self {
            SysexMessage::DeviceId(reply) => Some(reply),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_inquiry_bytes() {
        assert_eq!(device_inquiry(), vec![0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
    }

    #[test]
    fn test_dump_request_codes() {
        assert_eq!(
            dump_request(0, DumpType::Program),
            vec![0xF0, 0x0F, 0x02, 0x00, 0x09, 0xF7]
        );
        assert_eq!(dump_request(3, DumpType::Bank)[3..5], [0x03, 0x0A]);
        assert_eq!(dump_request(15, DumpType::Sequence)[3..5], [0x0F, 0x0C]);
        assert_eq!(dump_request(7, DumpType::AllSequences)[3..5], [0x07, 0x22]);
    }

    #[test]
    fn test_channel_clamped() {
        assert_eq!(dump_request(200, DumpType::Program)[3], 0x0F);
    }

    #[test]
    fn test_button_frames() {
        assert_eq!(
            internal_button_press(2),
            vec![0xF0, 0x0F, 0x02, 0x02, 0x0E, 0x26, 0xF7]
        );
        assert_eq!(
            soft_button_5(0),
            vec![0xF0, 0x0F, 0x02, 0x00, 0x0E, 0x2F, 0x62, 0xF7]
        );
    }

    #[test]
    fn test_settle_delays() {
        assert_eq!(DumpType::Program.settle_delay(), Duration::from_millis(700));
        assert_eq!(DumpType::Bank.settle_delay(), Duration::from_millis(5000));
        assert_eq!(DumpType::Sequence.settle_delay(), Duration::from_millis(700));
        assert_eq!(DumpType::AllSequences.settle_delay(), Duration::from_millis(5000));
    }

    #[test]
    fn test_payload_strips_framing() {
        assert_eq!(payload(&[0xF0, 1, 2, 0xF7]).unwrap(), &[1, 2]);
        assert_eq!(payload(&[0xF0, 1, 2]).unwrap(), &[1, 2]);
        assert_eq!(payload(&[0xF0, 0xF7]).unwrap(), &[] as &[u8]);
        assert_eq!(payload(&[0x90, 60, 100]), Err(Error::FrameNotSysex));
        assert_eq!(payload(&[]), Err(Error::FrameNotSysex));
    }

    #[test]
    fn test_classification_by_length_only() {
        assert_eq!(classify_payload(&[0u8; 13]), PayloadKind::DeviceId);
        assert_eq!(classify_payload(&[0xFFu8; 208]), PayloadKind::ProgramDump);
        assert_eq!(classify_payload(&[]), PayloadKind::Unrecognized);
        assert_eq!(classify_payload(&[0u8; 12]), PayloadKind::Unrecognized);
        assert_eq!(classify_payload(&[0u8; 209]), PayloadKind::Unrecognized);
    }

    #[test]
    fn test_decode_tags_messages() {
        let mut frame = vec![0xF0];
        frame.extend_from_slice(&[0u8; 208]);
        frame.push(0xF7);
        assert_eq!(SysexMessage::decode(&frame).kind(), PayloadKind::ProgramDump);

        let reply = [
            0xF0, 0x7E, 0x00, 0x06, 0x02, 0x0F, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x35, 0x03,
            0xF7,
        ];
        assert_eq!(SysexMessage::decode(&reply).kind(), PayloadKind::DeviceId);

        let other = SysexMessage::decode(&[0xF0, 0x43, 0x10, 0xF7]);
        assert_eq!(other, SysexMessage::Unrecognized(vec![0x43, 0x10]));
        assert_eq!(other.payload_len(), 2);
    }

    #[test]
    fn test_program_frame_wraps_payload() {
        let program = ProgramDump::from_payload(&[0u8; 208]).unwrap();
        let frame = program_frame(&program);
        assert_eq!(frame.len(), 210);
        assert_eq!(frame[0], SYSEX_START);
        assert_eq!(frame[209], SYSEX_END);
        assert_eq!(
            SysexMessage::decode(&frame).into_program(),
            Some(program)
        );
    }
}
