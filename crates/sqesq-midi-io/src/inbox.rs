//! Shared buffer for incoming SysEx frames.
//!
//! The transport's delivery callback appends, the session thread drains. Both
//! sides take the same short lock, and `drain` swaps the whole buffer out so a
//! frame is never seen twice or lost between a read and a clear.

use parking_lot::Mutex;
use sqesq_sysex::codec::SYSEX_START;
use sqesq_sysex::SysexMessage;
use tracing::trace;

#[derive(Debug, Default)]
pub struct SysexInbox {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl SysexInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `message` if it is a SysEx frame. Channel and realtime messages
    /// are ignored. Returns whether the message was kept.
    pub fn push(&self, message: &[u8]) -> bool {
        if message.first() != Some(&SYSEX_START) {
            return false;
        }
        trace!(len = message.len(), "SysEx frame received");
        self.frames.lock().push(message.to_vec());
        true
    }

    /// Takes every buffered frame, oldest first, leaving the inbox empty.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.frames.lock())
    }

    /// Drains and decodes in one step.
    pub fn drain_messages(&self) -> Vec<SysexMessage> {
        self.drain()
            .iter()
            .map(|frame| SysexMessage::decode(frame))
            .collect()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqesq_sysex::PayloadKind;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_only_sysex_is_kept() {
        let inbox = SysexInbox::new();
        assert!(!inbox.push(&[0x90, 60, 100]));
        assert!(!inbox.push(&[]));
        assert!(inbox.push(&[0xF0, 0x01, 0xF7]));
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_drain_empties_in_order() {
        let inbox = SysexInbox::new();
        inbox.push(&[0xF0, 0x01, 0xF7]);
        inbox.push(&[0xF0, 0x02, 0xF7]);
        let frames = inbox.drain();
        assert_eq!(frames, vec![vec![0xF0, 0x01, 0xF7], vec![0xF0, 0x02, 0xF7]]);
        assert!(inbox.is_empty());
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_drain_messages_decodes() {
        let inbox = SysexInbox::new();
        let mut frame = vec![0xF0];
        frame.extend_from_slice(&[0u8; 208]);
        frame.push(0xF7);
        inbox.push(&frame);
        inbox.push(&[0xF0, 0x43, 0xF7]);
        let kinds: Vec<_> = inbox.drain_messages().iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, vec![PayloadKind::ProgramDump, PayloadKind::Unrecognized]);
    }

    #[test]
    fn test_concurrent_push_and_drain() {
        let inbox = Arc::new(SysexInbox::new());
        let producer = {
            let inbox = Arc::clone(&inbox);
            thread::spawn(move || {
                for i in 0..1000u16 {
                    inbox.push(&[0xF0, (i % 128) as u8, 0xF7]);
                }
            })
        };

        let mut seen = 0;
        while seen < 1000 {
            seen += inbox.drain().len();
            thread::yield_now();
        }
        producer.join().unwrap();
        assert_eq!(seen, 1000);
        assert!(inbox.is_empty());
    }
}
