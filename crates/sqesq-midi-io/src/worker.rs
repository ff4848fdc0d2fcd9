//! Runs a [`DeviceSession`] on its own thread.
//!
//! Settle windows block for up to several seconds, so UI code submits
//! commands here and polls for responses. Commands run strictly one after
//! another. Each one first yields a `Busy` response, then its result.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use sqesq_sysex::{OctaveBucket, Oscillator, ProgramDump};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::response::{BusyReason, DeviceResponse};
use crate::session::DeviceSession;
use crate::transport::SysexTransport;

const COMMAND_QUEUE_DEPTH: usize = 64;

pub enum SessionCommand {
    Connect,
    ChangeWaveform {
        osc: Oscillator,
        raw: u8,
    },
    ChangePitch {
        osc: Oscillator,
        bucket: OctaveBucket,
        semitone: u8,
        low_frequency: bool,
    },
    ToggleLowFrequency {
        osc: Oscillator,
        enable: bool,
    },
    ToggleSelfOscillation {
        enable: bool,
    },
    SendProgram(ProgramDump),
    /// Swap in a new transport. Produces no response.
    Attach(Box<dyn SysexTransport>),
    /// Drop the transport. Answers `Disconnected`.
    Detach,
}

impl SessionCommand {
    fn busy_reason(&self) -> Option<BusyReason> {
        match self {
            SessionCommand::Connect => Some(BusyReason::Refreshing),
            SessionCommand::Attach(_) | SessionCommand::Detach => None,
            _ => Some(BusyReason::Modifying),
        }
    }
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionCommand::Connect => f.write_str("Connect"),
            SessionCommand::ChangeWaveform { osc, raw } => f
                .debug_struct("ChangeWaveform")
                .field("osc", osc)
                .field("raw", raw)
                .finish(),
            SessionCommand::ChangePitch {
                osc,
                bucket,
                semitone,
                low_frequency,
            } => f
                .debug_struct("ChangePitch")
                .field("osc", osc)
                .field("bucket", bucket)
                .field("semitone", semitone)
                .field("low_frequency", low_frequency)
                .finish(),
            SessionCommand::ToggleLowFrequency { osc, enable } => f
                .debug_struct("ToggleLowFrequency")
                .field("osc", osc)
                .field("enable", enable)
                .finish(),
            SessionCommand::ToggleSelfOscillation { enable } => f
                .debug_struct("ToggleSelfOscillation")
                .field("enable", enable)
                .finish(),
            SessionCommand::SendProgram(program) => {
                f.debug_tuple("SendProgram").field(program).finish()
            }
            SessionCommand::Attach(_) => f.write_str("Attach"),
            SessionCommand::Detach => f.write_str("Detach"),
        }
    }
}

enum WorkerMessage {
    Run(SessionCommand),
    Shutdown,
}

pub struct SessionWorker {
    command_sender: Sender<WorkerMessage>,
    responses: Receiver<DeviceResponse>,
    handle: Option<JoinHandle<()>>,
}

impl SessionWorker {
    pub fn spawn(session: DeviceSession) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(COMMAND_QUEUE_DEPTH);
        let (response_sender, responses) = unbounded();

        let handle = thread::Builder::new()
            .name("sqesq-session".to_string())
            .spawn(move || Self::session_thread(session, command_receiver, response_sender))?;

        Ok(Self {
            command_sender,
            responses,
            handle: Some(handle),
        })
    }

    fn session_thread(
        mut session: DeviceSession,
        command_receiver: Receiver<WorkerMessage>,
        response_sender: Sender<DeviceResponse>,
    ) {
        info!("Session worker started");
        while let Ok(WorkerMessage::Run(command)) = command_receiver.recv() {
            debug!(?command, "Session command");
            if let Some(reason) = command.busy_reason() {
                let _ = response_sender.send(DeviceResponse::busy(reason, session.channel()));
            }
            if let Some(response) = Self::execute(&mut session, command) {
                if response_sender.send(response).is_err() {
                    break;
                }
            }
        }
        info!("Session worker stopped");
    }

    fn execute(session: &mut DeviceSession, command: SessionCommand) -> Option<DeviceResponse> {
        let response = match command {
            SessionCommand::Connect => session.connect(),
            SessionCommand::ChangeWaveform { osc, raw } => {
                session.change_oscillator_waveform(osc, raw)
            }
            SessionCommand::ChangePitch {
                osc,
                bucket,
                semitone,
                low_frequency,
            } => session.change_oscillator_pitch(osc, bucket, semitone, low_frequency),
            SessionCommand::ToggleLowFrequency { osc, enable } => {
                session.toggle_low_frequency_mode(osc, enable)
            }
            SessionCommand::ToggleSelfOscillation { enable } => {
                session.toggle_self_oscillation(enable)
            }
            SessionCommand::SendProgram(program) => session.send_program(&program),
            SessionCommand::Attach(transport) => {
                session.attach_boxed(transport);
                return None;
            }
            SessionCommand::Detach => {
                session.detach();
                DeviceResponse::disconnected(session.channel())
            }
        };
        Some(response)
    }

    /// Queues `command`. Blocks only if the queue is full.
    pub fn submit(&self, command: SessionCommand) -> Result<()> {
        self.command_sender
            .send(WorkerMessage::Run(command))
            .map_err(|_| Error::WorkerStopped)
    }

    pub fn responses(&self) -> &Receiver<DeviceResponse> {
        &self.responses
    }

    pub fn try_recv(&self) -> Option<DeviceResponse> {
        self.responses.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<DeviceResponse>> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerStopped),
        }
    }

    /// Waits past `Busy` responses for the next final one.
    pub fn recv_final(&self, timeout: Duration) -> Result<Option<DeviceResponse>> {
        loop {
            match self.recv_timeout(timeout)? {
                Some(response) if response.status.is_busy() => continue,
                other => return Ok(other),
            }
        }
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        let _ = self.command_sender.send(WorkerMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::response::ConnectionStatus;
    use crate::transport::MemoryTransport;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_busy_then_final() {
        let session = DeviceSession::with_transport(SessionConfig::instant(), MemoryTransport::new());
        let worker = SessionWorker::spawn(session).unwrap();
        worker.submit(SessionCommand::Connect).unwrap();

        let busy = worker.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(busy.status, ConnectionStatus::Busy(BusyReason::Refreshing));
        let done = worker.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(done.status, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_edit_reports_modifying() {
        let session = DeviceSession::new(SessionConfig::instant());
        let worker = SessionWorker::spawn(session).unwrap();
        worker
            .submit(SessionCommand::ToggleSelfOscillation { enable: true })
            .unwrap();
        let busy = worker.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(busy.status.label(), "Modifying Program...");
        let done = worker.recv_final(TIMEOUT).unwrap().unwrap();
        assert_eq!(done.status, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_attach_is_silent_and_detach_answers() {
        let worker = SessionWorker::spawn(DeviceSession::new(SessionConfig::instant())).unwrap();
        worker
            .submit(SessionCommand::Attach(Box::new(MemoryTransport::new())))
            .unwrap();
        worker.submit(SessionCommand::Detach).unwrap();
        let response = worker.recv_timeout(TIMEOUT).unwrap().unwrap();
        assert_eq!(response.status, ConnectionStatus::Disconnected);
        assert!(worker.try_recv().is_none());
    }

    #[test]
    fn test_drop_stops_thread() {
        let worker = SessionWorker::spawn(DeviceSession::new(SessionConfig::instant())).unwrap();
        drop(worker);
    }
}
