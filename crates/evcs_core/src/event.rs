use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{energy_within, transfer_time};
use crate::station::Admission;
use crate::{Battery, Condition, Kind, ResourceUnit, ServiceRates, Station, UnitId, Vehicle};

/// What a vehicle asks the station for.
#[derive(Debug, Clone)]
pub struct EventRequest {
    kind: Kind,
    vehicle: Arc<Vehicle>,
    amount: f64,
    max_wait: Duration,
    parking_time: Duration,
    pool_battery: bool,
}

impl EventRequest {
    pub fn new(kind: Kind, vehicle: Arc<Vehicle>, amount: f64) -> Self {
        EventRequest {
            kind,
            vehicle,
            amount: amount.max(0.0),
            max_wait: Duration::ZERO,
            parking_time: Duration::ZERO,
            pool_battery: false,
        }
    }

    /// Fast or slow charging of `amount` energy units.
    pub fn charging(fast: bool, vehicle: Arc<Vehicle>, amount: f64) -> Self {
        let kind = if fast { Kind::Fast } else { Kind::Slow };
        EventRequest::new(kind, vehicle, amount)
    }

    pub fn discharging(vehicle: Arc<Vehicle>, amount: f64) -> Self {
        EventRequest::new(Kind::Discharge, vehicle, amount)
    }

    pub fn exchange(vehicle: Arc<Vehicle>) -> Self {
        EventRequest::new(Kind::Exchange, vehicle, 0.0)
    }

    /// Occupy a parking slot for `parking_time`, charging up to `amount` on
    /// the way if the slot is inductive.
    pub fn parking(vehicle: Arc<Vehicle>, parking_time: Duration, amount: f64) -> Self {
        EventRequest {
            parking_time,
            ..EventRequest::new(Kind::Parking, vehicle, amount)
        }
    }

    /// How long the driver accepts to wait. Zero, the default, means the
    /// event never enters the wait queue.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Charge a battery taken out of the exchange pool; it goes back to the
    /// pool when the event finishes.
    pub(crate) fn for_pool_battery(mut self) -> Self {
        self.pool_battery = true;
        self
    }
}

/// Why an event could not be sized on the unit it was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refusal {
    /// The exchange pool has no charged battery right now. The event can
    /// keep waiting for one.
    NoDonorBattery,
    Rejected(&'static str),
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::NoDonorBattery => write!(f, "no charged battery in stock"),
            Refusal::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug)]
struct EventState {
    condition: Condition,
    unit: Option<Arc<ResourceUnit>>,
    served_by: Option<UnitId>,
    energy: f64,
    duration: Duration,
    cost: f64,
    estimated_wait: Option<Duration>,
    donor: Option<Battery>,
}

/// One request for service, tracked through its whole lifecycle.
///
/// The station only keeps a weak reference back from the event so that a
/// station and its event log can be dropped together.
pub struct Event {
    id: Uuid,
    kind: Kind,
    vehicle: Arc<Vehicle>,
    requested: f64,
    max_wait: Duration,
    parking_time: Duration,
    pool_battery: bool,
    station: Weak<Station>,
    state: Mutex<EventState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    pub id: Uuid,
    pub kind: Kind,
    pub condition: Condition,
    pub vehicle_id: Uuid,
    pub requested: f64,
    pub energy_to_be_received: f64,
    pub duration_ms: u64,
    pub parking_ms: u64,
    pub cost: f64,
    pub max_wait_ms: u64,
    pub estimated_wait_ms: Option<u64>,
    pub unit_id: Option<UnitId>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Event {
    /// Create an event in `Arrived` condition and record it in the station log.
    pub fn new(station: &Arc<Station>, request: EventRequest) -> Arc<Event> {
        let event = Arc::new(Event {
            id: Uuid::new_v4(),
            kind: request.kind,
            vehicle: request.vehicle,
            requested: request.amount,
            max_wait: request.max_wait,
            parking_time: request.parking_time,
            pool_battery: request.pool_battery,
            station: Arc::downgrade(station),
            state: Mutex::new(EventState {
                condition: Condition::Arrived,
                unit: None,
                served_by: None,
                energy: 0.0,
                duration: Duration::ZERO,
                cost: 0.0,
                estimated_wait: None,
                donor: None,
            }),
        });
        station.record(&event);
        event
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn vehicle(&self) -> &Arc<Vehicle> {
        &self.vehicle
    }

    /// Energy asked for; for discharging, the energy offered.
    pub fn requested(&self) -> f64 {
        self.requested
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub fn parking_time(&self) -> Duration {
        self.parking_time
    }

    pub fn station(&self) -> Option<Arc<Station>> {
        self.station.upgrade()
    }

    pub fn condition(&self) -> Condition {
        self.state.lock().condition
    }

    pub fn energy_to_be_received(&self) -> f64 {
        self.state.lock().energy
    }

    /// How long the event keeps its unit once started.
    pub fn duration(&self) -> Duration {
        self.state.lock().duration
    }

    /// Price paid by the driver, or for discharging the amount paid to them.
    pub fn cost(&self) -> f64 {
        self.state.lock().cost
    }

    /// Wait computed by the last admission attempt that did not find a free unit.
    pub fn estimated_wait(&self) -> Option<Duration> {
        self.state.lock().estimated_wait
    }

    /// The unit currently bound to the event.
    pub fn unit(&self) -> Option<Arc<ResourceUnit>> {
        self.state.lock().unit.clone()
    }

    /// The unit the event was admitted on, kept after it finishes.
    pub fn served_by(&self) -> Option<UnitId> {
        self.state.lock().served_by
    }

    /// Try to get the event a unit, or a place in the wait queue.
    ///
    /// Acts on `Arrived` and `Wait` events only; any other condition is
    /// returned untouched. Calling it again on a waiting event re-checks it
    /// against the current state of the station.
    pub fn pre_processing(self: &Arc<Self>) -> Condition {
        let condition = self.condition();
        if !matches!(condition, Condition::Arrived | Condition::Wait) {
            return condition;
        }
        let Some(station) = self.station.upgrade() else {
            tracing::warn!("Event {} belongs to a station that no longer exists", self.id);
            self.set_condition(Condition::NonExecutable);
            return Condition::NonExecutable;
        };

        if !self.vehicle.is_active() {
            tracing::info!(
                "Event {} rejected: battery of vehicle {} is inactive",
                self.id,
                self.vehicle.id()
            );
            return station.withdraw(self);
        }

        let can_assign = self.kind != Kind::Exchange || station.has_donor_battery();
        let admission = match station.admit(self, can_assign) {
            Admission::Assigned(unit) => match self.admit_on(&station, &unit) {
                Ok(()) => return Condition::Ready,
                Err(Refusal::NoDonorBattery) => {
                    // The last donor went to another exchange after the check
                    station.unbind(&unit, false);
                    station.admit(self, false)
                }
                Err(Refusal::Rejected(reason)) => {
                    tracing::info!("Event {} rejected on unit {}: {}", self.id, unit.id(), reason);
                    self.set_condition(Condition::NonExecutable);
                    station.release(&unit);
                    return Condition::NonExecutable;
                }
            },
            admission => admission,
        };

        match admission {
            Admission::Queued(wait) => {
                tracing::info!(
                    "Event {} waits for {} service, estimated {:?}",
                    self.id,
                    self.kind,
                    wait
                );
                Condition::Wait
            }
            Admission::Rejected(wait) => {
                tracing::info!(
                    "Event {} rejected: estimated wait {:?} exceeds {:?}",
                    self.id,
                    wait,
                    self.max_wait
                );
                Condition::NonExecutable
            }
            Admission::Assigned(_) | Admission::Pending => self.condition(),
        }
    }

    /// Size the service on the unit it was just bound to and move to `Ready`.
    ///
    /// Fails, leaving the unit bound, when the station cannot serve the
    /// request at all.
    pub(crate) fn admit_on(&self, station: &Station, unit: &ResourceUnit) -> Result<(), Refusal> {
        if !self.vehicle.is_active() {
            return Err(Refusal::Rejected("battery is inactive"));
        }
        let rates = station.rates();
        let prices = station.prices();
        let (energy, duration, cost, donor) = match self.kind {
            Kind::Fast | Kind::Slow => {
                let wanted = self.requested.min(self.vehicle.headroom());
                let energy = station.draw_energy(wanted);
                if energy <= 0.0 {
                    return Err(Refusal::Rejected("no energy available"));
                }
                let rate = rates.energy_rate(self.kind).unwrap_or(rates.fast);
                (energy, transfer_time(energy, rate), energy * station.current_price(), None)
            }
            Kind::Discharge => {
                let energy = self.requested.min(self.vehicle.remaining());
                if energy <= 0.0 {
                    return Err(Refusal::Rejected("nothing to discharge"));
                }
                let duration = transfer_time(energy, rates.discharge);
                (energy, duration, energy * prices.discharge, None)
            }
            Kind::Exchange => {
                let Some(battery) = station.take_donor_battery() else {
                    return Err(Refusal::NoDonorBattery);
                };
                (battery.remaining(), rates.exchange, prices.exchange, Some(battery))
            }
            Kind::Parking => {
                let wanted = self
                    .requested
                    .min(self.vehicle.headroom())
                    .min(energy_within(self.parking_time, rates.inductive));
                let energy = if unit.is_inductive() && wanted > 0.0 {
                    station.draw_energy(wanted)
                } else {
                    0.0
                };
                (energy, self.parking_time, energy * prices.inductive, None)
            }
        };

        unit.commit(duration);
        let mut state = self.state.lock();
        state.energy = energy;
        state.duration = duration;
        state.cost = cost;
        state.donor = donor;
        state.served_by = Some(unit.id());
        state.condition = Condition::Ready;
        tracing::info!(
            "Event {} ready on {} unit {}: energy {}, duration {:?}, cost {}",
            self.id,
            self.kind,
            unit.id(),
            energy,
            duration,
            cost
        );
        Ok(())
    }

    /// Start a `Ready` event on its unit. Any other condition is returned
    /// unchanged.
    pub fn execution(&self) -> Condition {
        let Some(station) = self.station.upgrade() else {
            tracing::warn!("Event {} belongs to a station that no longer exists", self.id);
            return self.condition();
        };
        let (unit, duration) = {
            let mut state = self.state.lock();
            if state.condition != Condition::Ready {
                return state.condition;
            }
            let Some(unit) = state.unit.clone() else {
                return state.condition;
            };
            state.condition = self.kind.active_condition();
            (unit, state.duration)
        };

        if self.kind.is_charging() && self.energy_to_be_received() > 0.0 {
            self.vehicle.add_charge_cycle();
        }
        tracing::info!("Event {} started on {} unit {}", self.id, self.kind, unit.id());
        unit.start_completion(station, duration);
        self.kind.active_condition()
    }

    /// Give a rejected event another chance; it goes back to `Arrived`.
    pub fn resubmit(&self) -> Condition {
        let mut state = self.state.lock();
        if state.condition == Condition::NonExecutable {
            state.condition = Condition::Arrived;
            state.estimated_wait = None;
        }
        state.condition
    }

    pub fn snapshot(&self) -> EventSnapshot {
        let state = self.state.lock();
        EventSnapshot {
            id: self.id,
            kind: self.kind,
            condition: state.condition,
            vehicle_id: self.vehicle.id(),
            requested: self.requested,
            energy_to_be_received: state.energy,
            duration_ms: millis(state.duration),
            parking_ms: millis(self.parking_time),
            cost: state.cost,
            max_wait_ms: millis(self.max_wait),
            estimated_wait_ms: state.estimated_wait.map(millis),
            unit_id: state.served_by,
        }
    }

    /// Apply the effects of the service to the vehicle and the station.
    pub(crate) fn finish(&self, station: &Station) {
        let (energy, cost, donor) = {
            let mut state = self.state.lock();
            (state.energy, state.cost, state.donor.take())
        };
        match self.kind {
            Kind::Fast | Kind::Slow | Kind::Parking => {
                self.vehicle.adjust_remaining(energy);
                if self.pool_battery {
                    station.join_battery(self.vehicle.battery());
                }
            }
            Kind::Discharge => {
                self.vehicle.adjust_remaining(-energy);
                self.vehicle.credit_profit(cost);
                station.credit_discharged(energy);
            }
            Kind::Exchange => {
                if let Some(battery) = donor {
                    let old = self.vehicle.swap_battery(battery);
                    station.join_battery(old);
                }
            }
        }
        self.set_condition(Condition::Finished);
        tracing::info!("Event {} finished", self.id);
    }

    /// Expected time on a unit, used to estimate waits for later arrivals.
    pub(crate) fn planned_service(&self, rates: &ServiceRates) -> Duration {
        match self.kind {
            Kind::Exchange => rates.exchange,
            Kind::Parking => self.parking_time,
            kind => {
                let rate = rates.energy_rate(kind).unwrap_or(rates.fast);
                transfer_time(self.requested, rate)
            }
        }
    }

    pub(crate) fn set_condition(&self, condition: Condition) {
        self.state.lock().condition = condition;
    }

    pub(crate) fn set_estimated_wait(&self, wait: Option<Duration>) {
        self.state.lock().estimated_wait = wait;
    }

    pub(crate) fn set_unit(&self, unit: Option<Arc<ResourceUnit>>) {
        self.state.lock().unit = unit;
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("requested", &self.requested)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}
