//! Session timing and channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqesq_sysex::codec::DEVICE_INQUIRY_DELAY;
use sqesq_sysex::DumpType;

use crate::error::{Error, Result};

/// Channel sweeps wait this fraction of the normal program settle delay per
/// channel.
pub const SWEEP_DELAY_DIVISOR: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub inquiry_delay: Duration,
    pub program_delay: Duration,
    pub bank_delay: Duration,
    pub sequence_delay: Duration,
    pub all_sequences_delay: Duration,
    pub sweep_divisor: u32,
    /// Channel used until an instrument reports its own, 0-15.
    pub channel: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inquiry_delay: DEVICE_INQUIRY_DELAY,
            program_delay: DumpType::Program.settle_delay(),
            bank_delay: DumpType::Bank.settle_delay(),
            sequence_delay: DumpType::Sequence.settle_delay(),
            all_sequences_delay: DumpType::AllSequences.settle_delay(),
            sweep_divisor: SWEEP_DELAY_DIVISOR,
            channel: 0,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// No settle delays at all. Only useful against transports that answer
    /// synchronously, such as [`MemoryTransport`](crate::MemoryTransport).
    pub fn instant() -> Self {
        Self {
            inquiry_delay: Duration::ZERO,
            program_delay: Duration::ZERO,
            bank_delay: Duration::ZERO,
            sequence_delay: Duration::ZERO,
            all_sequences_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn dump_delay(&self, dump: DumpType) -> Duration {
        match dump {
            DumpType::Program => self.program_delay,
            DumpType::Bank => self.bank_delay,
            DumpType::Sequence => self.sequence_delay,
            DumpType::AllSequences => self.all_sequences_delay,
        }
    }

    pub fn sweep_delay(&self) -> Duration {
        self.program_delay / self.sweep_divisor.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel > 15 {
            return Err(sqesq_sysex::Error::InvalidChannel(self.channel).into());
        }
        if self.sweep_divisor == 0 {
            return Err(Error::InvalidConfig(
                "sweep divisor must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn inquiry_delay(mut self, delay: Duration) -> Self {
        self.config.inquiry_delay = delay;
        self
    }

    pub fn dump_delay(mut self, dump: DumpType, delay: Duration) -> Self {
        match dump {
            DumpType::Program => self.config.program_delay = delay,
            DumpType::Bank => self.config.bank_delay = delay,
            DumpType::Sequence => self.config.sequence_delay = delay,
            DumpType::AllSequences => self.config.all_sequences_delay = delay,
        }
        self
    }

    pub fn sweep_divisor(mut self, divisor: u32) -> Self {
        self.config.sweep_divisor = divisor;
        self
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.config.channel = channel;
        self
    }

    /// Zeroes every settle delay. See [`SessionConfig::instant`].
    pub fn instant(mut self) -> Self {
        let SessionConfig {
            sweep_divisor,
            channel,
            ..
        } = self.config;
        self.config = SessionConfig {
            sweep_divisor,
            channel,
            ..SessionConfig::instant()
        };
        self
    }

    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
