//! End-to-end tests through the umbrella crate.
//!
//! Each test plays the instrument with a `MemoryTransport` responder, so the
//! whole request/settle/drain cycle runs without hardware.

use sqesq::codec;
use sqesq::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0xF0];
    frame.extend_from_slice(payload);
    frame.push(0xF7);
    frame
}

fn esq1_identity(major: u8, minor: u8) -> Vec<u8> {
    frame(&[
        0x7E, 0x00, 0x06, 0x02, 0x0F, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, minor, major,
    ])
}

fn is_program_request(sent: &[u8]) -> bool {
    sent.len() == 6 && sent[1] == 0x0F && sent[4] == DumpType::Program.code()
}

#[test]
fn test_esq1_353_identifies_with_hidden_waveforms() {
    init_tracing();
    let transport = MemoryTransport::with_responder(|sent| {
        if sent == codec::DEVICE_INQUIRY.as_slice() {
            vec![esq1_identity(3, 53)]
        } else if is_program_request(sent) {
            vec![frame(&[0u8; 208])]
        } else {
            Vec::new()
        }
    });
    let mut session = DeviceSession::with_transport(SessionConfig::instant(), transport);
    let response = session.connect();

    assert_eq!(response.status, ConnectionStatus::Connected);
    let identity = response.identity.unwrap();
    assert_eq!(identity.model, SynthModel::Esq1);
    assert_eq!(identity.firmware.to_string(), "3.53");
    assert!(identity.supports_hidden_waveforms);
}

#[test]
fn test_empty_program_after_identity_is_sysex_disabled() {
    init_tracing();
    let transport = MemoryTransport::with_responder(|sent| {
        if sent == codec::DEVICE_INQUIRY.as_slice() {
            vec![esq1_identity(3, 53)]
        } else if is_program_request(sent) {
            vec![frame(&[])]
        } else {
            Vec::new()
        }
    });
    let mut session = DeviceSession::with_transport(SessionConfig::instant(), transport);
    let response = session.connect();

    assert_eq!(response.status, ConnectionStatus::SysexDisabled);
    assert_eq!(response.status.label(), "SysEx Disabled");
    assert_eq!(response.model(), SynthModel::Esq1);
}

#[test]
fn test_no_identity_and_wrong_length_everywhere_is_disconnected() {
    init_tracing();
    let transport = MemoryTransport::with_responder(|sent| {
        if is_program_request(sent) {
            vec![frame(&[0u8; 207])]
        } else {
            Vec::new()
        }
    });
    let log = transport.sent_log();
    let mut session = DeviceSession::with_transport(SessionConfig::instant(), transport);
    let response = session.connect();

    assert_eq!(response.status, ConnectionStatus::Disconnected);
    assert!(response.identity.is_none());
    assert_eq!(response.model(), SynthModel::Unchanged);

    let swept: Vec<u8> = log
        .frames()
        .iter()
        .filter(|sent| is_program_request(sent))
        .map(|sent| sent[3])
        .skip(1)
        .collect();
    assert_eq!(swept, (0..16).collect::<Vec<u8>>());
}

#[test]
fn test_worker_through_prelude() {
    init_tracing();
    let transport = MemoryTransport::with_responder(|sent| {
        if is_program_request(sent) {
            vec![frame(&[0u8; 208])]
        } else {
            Vec::new()
        }
    });
    let worker =
        SessionWorker::spawn(DeviceSession::with_transport(SessionConfig::instant(), transport))
            .unwrap();
    worker.submit(SessionCommand::Connect).unwrap();
    worker
        .submit(SessionCommand::ChangePitch {
            osc: Oscillator::Osc2,
            bucket: OctaveBucket::Plus6,
            semitone: 4,
            low_frequency: false,
        })
        .unwrap();

    let timeout = Duration::from_secs(5);
    let connected = worker.recv_final(timeout).unwrap().unwrap();
    assert_eq!(connected.model(), SynthModel::Esq1);
    let edited = worker.recv_final(timeout).unwrap().unwrap();
    let pitch = edited.parameters.unwrap().oscillator(Oscillator::Osc2).pitch;
    assert_eq!(pitch.octave_bucket(), OctaveBucket::Plus6);
    assert_eq!(pitch.real_semitone, 4);
}

#[test]
fn test_response_serializes() {
    let program = ProgramDump::from_payload(&[0u8; 208]).unwrap();
    let response = DeviceResponse::connected(
        Some(DeviceIdentity::silent_esq1()),
        program,
        SynthModel::Esq1,
        0,
    );
    let bytes = bincode::serialize(&response).unwrap();
    let back: DeviceResponse = bincode::deserialize(&bytes).unwrap();
    assert_eq!(back, response);
}

#[test]
fn test_errors_convert_into_umbrella_error() {
    fn build(channel: u8) -> Result<SessionConfig> {
        Ok(SessionConfig::builder().channel(channel).build()?)
    }
    fn decode(payload: &[u8]) -> Result<ProgramDump> {
        Ok(ProgramDump::from_payload(payload)?)
    }

    assert!(build(3).is_ok());
    assert!(matches!(build(16), Err(Error::Midi(_))));
    assert!(matches!(decode(&[0u8; 12]), Err(Error::Sysex(_))));
}
