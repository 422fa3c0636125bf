use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type UnitId = u32;

/// The service category of an event, which decides the lane (pool and wait
/// queue), the rate and the price it is served with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Kind {
    Fast,
    Slow,
    Discharge,
    Exchange,
    Parking,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Fast,
        Kind::Slow,
        Kind::Discharge,
        Kind::Exchange,
        Kind::Parking,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Kind::Fast => 0,
            Kind::Slow => 1,
            Kind::Discharge => 2,
            Kind::Exchange => 3,
            Kind::Parking => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Fast => "fast",
            Kind::Slow => "slow",
            Kind::Discharge => "discharge",
            Kind::Exchange => "exchange",
            Kind::Parking => "parking",
        }
    }

    /// Kinds that move energy from the station into the vehicle.
    pub fn is_charging(self) -> bool {
        matches!(self, Kind::Fast | Kind::Slow | Kind::Parking)
    }

    /// The condition an event of this kind enters once its unit starts.
    pub(crate) fn active_condition(self) -> Condition {
        match self {
            Kind::Fast | Kind::Slow => Condition::Charging,
            Kind::Discharge => Condition::Discharging,
            Kind::Exchange => Condition::Swapping,
            Kind::Parking => Condition::Parking,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown kind of service '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Lifecycle of an event.
///
/// `Arrived` and `Wait` are the only conditions admission acts on;
/// `NonExecutable` and `Finished` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    Arrived,
    Wait,
    Ready,
    Charging,
    Discharging,
    Swapping,
    Parking,
    Finished,
    NonExecutable,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Arrived => "arrived",
            Condition::Wait => "wait",
            Condition::Ready => "ready",
            Condition::Charging => "charging",
            Condition::Discharging => "discharging",
            Condition::Swapping => "swapping",
            Condition::Parking => "parking",
            Condition::Finished => "finished",
            Condition::NonExecutable => "nonExecutable",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            Condition::Charging | Condition::Discharging | Condition::Swapping | Condition::Parking
        )
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rates at which each kind of service is delivered.
///
/// Energy rates are expressed in energy units per hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceRates {
    pub fast: f64,
    pub slow: f64,
    pub discharge: f64,
    pub inductive: f64,
    pub exchange: Duration,
}

impl ServiceRates {
    /// Energy rate of a kind, `None` for the exchange which takes a fixed time.
    pub fn energy_rate(&self, kind: Kind) -> Option<f64> {
        match kind {
            Kind::Fast => Some(self.fast),
            Kind::Slow => Some(self.slow),
            Kind::Discharge => Some(self.discharge),
            Kind::Parking => Some(self.inductive),
            Kind::Exchange => None,
        }
    }
}

impl Default for ServiceRates {
    fn default() -> Self {
        ServiceRates {
            fast: 10.0,
            slow: 10.0,
            discharge: 10.0,
            inductive: 10.0,
            exchange: Duration::from_secs(300),
        }
    }
}

/// Time needed to move `energy` at `rate` energy units per hour.
pub(crate) fn transfer_time(energy: f64, rate: f64) -> Duration {
    if energy.is_nan() || rate.is_nan() || energy <= 0.0 || rate <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(energy * 3600.0 / rate).unwrap_or(Duration::MAX)
}

/// Energy deliverable in `time` at `rate` energy units per hour.
pub(crate) fn energy_within(time: Duration, rate: f64) -> f64 {
    time.as_secs_f64() * rate / 3600.0
}
