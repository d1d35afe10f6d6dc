//! Session and simulator configuration.
//!
//! Plain structs with defaults and consuming builders. The CLI layer fills
//! these from arguments; tests build them directly.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::ConfigError;
use crate::core::constants::{DEFAULT_ACK_TIMEOUT, DEFAULT_LINGER};
use crate::transport::FrameKind;

/// Sender configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    /// How long to wait for an ACK before retransmitting.
    pub timeout: Duration,

    /// Give up after this many retransmissions of one unit (`None` = never).
    pub max_retransmits: Option<u32>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_ACK_TIMEOUT,
            max_retransmits: None,
        }
    }
}

impl SenderConfig {
    /// Start building a sender configuration.
    pub fn builder() -> SenderConfigBuilder {
        SenderConfigBuilder::default()
    }
}

/// Builder for [`SenderConfig`].
#[derive(Debug, Default)]
pub struct SenderConfigBuilder {
    config: SenderConfig,
}

impl SenderConfigBuilder {
    /// Set the ACK timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retransmission limit per unit.
    pub fn max_retransmits(mut self, limit: u32) -> Self {
        self.config.max_retransmits = Some(limit);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<SenderConfig, ConfigError> {
        if self.config.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(self.config)
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// After the final unit, keep re-acknowledging retransmissions until the
    /// channel has been quiet this long.
    pub linger: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            linger: DEFAULT_LINGER,
        }
    }
}

impl ReceiverConfig {
    /// Set the linger period.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }
}

/// Kind of fault injected into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip one bit in the frame body.
    Corrupt,
    /// Discard the frame.
    Drop,
}

/// Named channel conditions.
///
/// Parses from the numeric selector `1`..`5` or from the kebab-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scenario {
    /// Perfect channel.
    #[default]
    NoLoss,
    /// ACKs travelling receiver to sender get corrupted.
    TxAckLoss,
    /// DATA travelling sender to receiver gets corrupted.
    RxDataLoss,
    /// ACKs travelling receiver to sender get dropped.
    TxAckDrop,
    /// DATA travelling sender to receiver gets dropped.
    RxDataDrop,
}

impl Scenario {
    /// All scenarios in selector order.
    pub const ALL: [Scenario; 5] = [
        Scenario::NoLoss,
        Scenario::TxAckLoss,
        Scenario::RxDataLoss,
        Scenario::TxAckDrop,
        Scenario::RxDataDrop,
    ];

    /// Fault applied to a frame of `kind`, if this scenario targets it.
    pub fn fault_for(self, kind: FrameKind) -> Option<Fault> {
        match (self, kind) {
            (Scenario::TxAckLoss, FrameKind::Ack) => Some(Fault::Corrupt),
            (Scenario::RxDataLoss, FrameKind::Data) => Some(Fault::Corrupt),
            (Scenario::TxAckDrop, FrameKind::Ack) => Some(Fault::Drop),
            (Scenario::RxDataDrop, FrameKind::Data) => Some(Fault::Drop),
            _ => None,
        }
    }

    /// Kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Scenario::NoLoss => "no-loss",
            Scenario::TxAckLoss => "tx-ack-loss",
            Scenario::RxDataLoss => "rx-data-loss",
            Scenario::TxAckDrop => "tx-ack-drop",
            Scenario::RxDataDrop => "rx-data-drop",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| Scenario::ALL.get(i).copied())
                .ok_or_else(|| ConfigError::UnknownScenario(s.to_owned()));
        }
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownScenario(s.to_owned()))
    }
}

/// Loss probability normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LossProbability(f64);

impl LossProbability {
    /// Never inject.
    pub const NONE: Self = Self(0.0);

    /// Always inject.
    pub const ALWAYS: Self = Self(1.0);

    /// Accept a `0..=1` fraction or a `0..=100` percentage.
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !value.is_finite() || value < 0.0 || value > 100.0 {
            return Err(ConfigError::InvalidLossProbability(value));
        }
        if value > 1.0 {
            Ok(Self(value / 100.0))
        } else {
            Ok(Self(value))
        }
    }

    /// Probability as a fraction.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Probability as a whole percentage, for result logs.
    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

impl FromStr for LossProbability {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidLossProbability(f64::NAN))?;
        Self::new(value)
    }
}

/// Channel simulator configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulatorConfig {
    /// Which direction and fault to apply.
    pub scenario: Scenario,

    /// Chance that a targeted frame is hit.
    pub loss: LossProbability,

    /// RNG seed for reproducible runs (`None` = seeded from the OS).
    pub seed: Option<u64>,

    /// Stop injecting after this many faults (`None` = unlimited).
    pub max_faults: Option<u64>,
}

impl SimulatorConfig {
    /// Configuration for `scenario` at `loss`.
    pub fn new(scenario: Scenario, loss: LossProbability) -> Self {
        Self {
            scenario,
            loss,
            seed: None,
            max_faults: None,
        }
    }

    /// Fix the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the number of injected faults.
    pub fn with_max_faults(mut self, max: u64) -> Self {
        self.max_faults = Some(max);
        self
    }
}
