//! Admission control and scheduling for an electric vehicle charging station.
//!
//! A [`Station`] owns one pool of [`ResourceUnit`]s and one wait queue per
//! [`Kind`] of service. An [`Event`] asks for a unit through
//! [`Event::pre_processing`]; it is either bound to a free unit, queued when
//! the estimated wait fits the driver's tolerance, or rejected. Started
//! events finish on their own on the Tokio runtime, which frees the unit for
//! the next queued event.

mod config;
mod error;
mod estimate;
mod event;
mod ledger;
mod models;
mod pricing;
mod queue;
mod report;
mod source;
mod station;
mod unit;
mod vehicle;

pub use crate::config::{
    BatteryConfig, ParkingSlotConfig, Prices, PricingPolicyConfig, RatesConfig, SourceConfig,
    StationConfig, TierConfig, TieredPolicyConfig, UniformPolicyConfig,
};
pub use crate::error::StationError;
pub use crate::estimate::estimate_wait;
pub use crate::event::{Event, EventRequest, EventSnapshot};
pub use crate::ledger::{DISCHARGING_SOURCE, EnergyLedger, SourceStock};
pub use crate::models::{Condition, Kind, ServiceRates, UnitId, UnknownKind};
pub use crate::pricing::{PriceTier, PricingPolicy};
pub use crate::queue::WaitQueue;
pub use crate::source::{EnergySource, PackagedSource, SourceKind};
pub use crate::station::{EnergyAddition, LaneStatus, Station, StationStatus};
pub use crate::unit::ResourceUnit;
pub use crate::vehicle::{Battery, Vehicle};
