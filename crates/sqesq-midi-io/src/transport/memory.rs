//! In-process transport for tests and offline use.
//!
//! Every sent frame is recorded. An optional responder plays the instrument:
//! it sees each outgoing frame and returns the frames to deliver back, which
//! land in the inbox before `send` returns.

use std::sync::Arc;

use parking_lot::Mutex;

use super::SysexTransport;
use crate::error::Result;
use crate::inbox::SysexInbox;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>> + Send>;

/// Handle onto a [`MemoryTransport`]'s outgoing frames that stays valid after
/// the transport has been moved into a session.
#[derive(Debug, Clone, Default)]
pub struct SentLog(Arc<Mutex<Vec<Vec<u8>>>>);

impl SentLog {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.0.lock().clone()
    }

    pub fn last(&self) -> Option<Vec<u8>> {
        self.0.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    fn record(&self, frame: &[u8]) {
        self.0.lock().push(frame.to_vec());
    }
}

#[derive(Default)]
pub struct MemoryTransport {
    inbox: Arc<SysexInbox>,
    sent: SentLog,
    responder: Option<Responder>,
}

impl MemoryTransport {
    /// A transport nothing ever answers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<Vec<u8>> + Send + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    pub fn sent_log(&self) -> SentLog {
        self.sent.clone()
    }

    /// Delivers a frame as if the instrument had sent it unprompted.
    pub fn deliver(&self, frame: &[u8]) {
        self.inbox.push(frame);
    }
}

impl SysexTransport for MemoryTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.sent.record(frame);
        if let Some(responder) = self.responder.as_mut() {
            for reply in responder(frame) {
                self.inbox.push(&reply);
            }
        }
        Ok(())
    }

    fn inbox(&self) -> &Arc<SysexInbox> {
        &self.inbox
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("sent", &self.sent.len())
            .field("pending", &self.inbox.len())
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_transport_records() {
        let mut transport = MemoryTransport::new();
        let log = transport.sent_log();
        transport.send(&[0xF0, 0x7E, 0xF7]).unwrap();
        transport.send(&[0xF0, 0x0F, 0xF7]).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(vec![0xF0, 0x0F, 0xF7]));
        assert!(transport.inbox().is_empty());
    }

    #[test]
    fn test_responder_fills_inbox() {
        let mut transport =
            MemoryTransport::with_responder(|frame| vec![frame.to_vec(), vec![0xF0, 0x00, 0xF7]]);
        transport.send(&[0xF0, 0x42, 0xF7]).unwrap();
        assert_eq!(
            transport.inbox().drain(),
            vec![vec![0xF0, 0x42, 0xF7], vec![0xF0, 0x00, 0xF7]]
        );
    }

    #[test]
    fn test_deliver_skips_non_sysex() {
        let transport = MemoryTransport::new();
        transport.deliver(&[0x90, 60, 100]);
        transport.deliver(&[0xF0, 0xF7]);
        assert_eq!(transport.inbox().len(), 1);
    }
}
