//! Connects to an instrument and prints what it reports.
//!
//!   cargo run -p sqesq-midi-io --example probe -- <input name> [output name]

use std::process::ExitCode;

use sqesq_midi_io::{DeviceSession, MidirTransport, SessionConfig};
use sqesq_sysex::Oscillator;

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: probe <input name> [output name]");
        return ExitCode::FAILURE;
    };
    let output = args.next().unwrap_or_else(|| input.clone());

    let transport = match MidirTransport::open_by_name(&input, &output) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    println!("{} -> {}", transport.output_name(), transport.input_name());

    let mut session = DeviceSession::with_transport(SessionConfig::default(), transport);
    let response = session.connect();
    println!("Status:  {}", response.status);
    if let Some(identity) = response.identity {
        println!("Model:   {} ({})", identity.model, identity.firmware);
        println!("Hidden:  {}", identity.supports_hidden_waveforms);
    }
    println!("Channel: {}", response.display_channel());

    if let (Some(name), Some(parameters)) = (response.program_name(), response.parameters) {
        println!("Program: {name}");
        for osc in Oscillator::ALL {
            let p = parameters.oscillator(osc);
            println!(
                "  {:?}: wave {:3} (hidden #{})  oct {:+} semi {:2}{}",
                osc,
                p.raw_waveform,
                p.waveform_index,
                p.pitch.display_octave(),
                p.pitch.real_semitone,
                if p.pitch.low_frequency { "  LF" } else { "" }
            );
        }
        println!("  Self-oscillation: {}", parameters.self_oscillation);
    }
    ExitCode::SUCCESS
}
