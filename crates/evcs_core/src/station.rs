use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::event::Refusal;
use crate::ledger::DISCHARGING_SOURCE;
use crate::{
    Battery, Condition, EnergyLedger, EnergySource, Event, EventRequest, Kind, PackagedSource,
    Prices, PricingPolicy, ResourceUnit, ServiceRates, SourceKind, SourceStock, StationConfig,
    StationError, UnitId, Vehicle, WaitQueue, estimate_wait,
};

/// Units of one kind and the events waiting for them. Both live under the
/// same lock so that hand-offs and new arrivals never race.
#[derive(Debug, Default)]
struct Lane {
    units: Vec<Arc<ResourceUnit>>,
    queue: WaitQueue<Arc<Event>>,
}

#[derive(Debug)]
struct Tariff {
    prices: Prices,
    policy: Option<(PricingPolicy, Instant)>,
}

impl Tariff {
    fn current_price(&self) -> f64 {
        self.policy
            .as_ref()
            .and_then(|(policy, since)| policy.price_at(since.elapsed()))
            .unwrap_or(self.prices.unit)
    }
}

/// Outcome of the admission decision taken under the lane lock.
#[derive(Debug)]
pub(crate) enum Admission {
    /// The event is bound to this unit and still has to be sized on it.
    Assigned(Arc<ResourceUnit>),
    Queued(Duration),
    /// `None` when the kind has no units at all.
    Rejected(Option<Duration>),
    /// A hand-off already gave the event a unit, or settled it.
    Pending,
}

/// What became of an event drained from a queue onto a freed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Launch {
    Started,
    /// Nothing left to start on the unit.
    Idle,
    /// The head event went back to the queue until a donor battery joins.
    Blocked,
}

/// Energy credited to the station by one of its sources.
#[derive(Debug, Clone)]
pub struct EnergyAddition {
    pub source: SourceKind,
    pub amount: f64,
    pub at: DateTime<Local>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneStatus {
    pub kind: Kind,
    pub units: usize,
    pub busy: usize,
    pub queued: usize,
    pub wait_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationStatus {
    pub id: Uuid,
    pub name: String,
    pub total_stock: f64,
    pub stock: Vec<SourceStock>,
    pub current_price: f64,
    pub batteries: usize,
    pub auto_queue_handling: bool,
    pub lanes: Vec<LaneStatus>,
}

/// A charging station: resource pools and wait queues per kind of service,
/// the energy ledger, the battery pool for exchanges, pricing and the log of
/// every event created against it.
///
/// Lock order is lane, then unit, then event state. No path holds two lanes,
/// or a lane and any of the station-wide locks, at the same time.
pub struct Station {
    id: Uuid,
    name: String,
    rates: ServiceRates,
    lanes: [Mutex<Lane>; 5],
    next_unit_id: AtomicU32,
    ledger: Mutex<EnergyLedger>,
    sources: Mutex<Vec<Box<dyn EnergySource>>>,
    additions: Mutex<Vec<EnergyAddition>>,
    batteries: Mutex<Vec<Battery>>,
    tariff: Mutex<Tariff>,
    log: Mutex<Vec<Arc<Event>>>,
    auto_queue_handling: AtomicBool,
    replenishment: Mutex<Option<JoinHandle<()>>>,
}

impl Station {
    pub fn new(config: &StationConfig) -> Result<Arc<Station>, StationError> {
        config.validate()?;

        let mut ledger =
            EnergyLedger::new(config.sources.iter().map(|source| source.kind.ledger_name()));
        let mut sources: Vec<Box<dyn EnergySource>> = Vec::new();
        for source in &config.sources {
            ledger.credit(source.kind.ledger_name(), source.initial_amount)?;
            sources.push(Box::new(PackagedSource::with_packages(
                source.kind,
                source.packages.iter().copied(),
            )));
        }

        let station = Station {
            id: Uuid::new_v4(),
            name: config.name.clone(),
            rates: config.rates.into(),
            lanes: Default::default(),
            next_unit_id: AtomicU32::new(1),
            ledger: Mutex::new(ledger),
            sources: Mutex::new(sources),
            additions: Mutex::new(Vec::new()),
            batteries: Mutex::new(
                config
                    .batteries
                    .iter()
                    .map(|battery| Battery::new(battery.capacity, battery.remaining))
                    .collect(),
            ),
            tariff: Mutex::new(Tariff {
                prices: config.prices,
                policy: config
                    .pricing_policy
                    .as_ref()
                    .map(|policy| (policy.to_policy(), Instant::now())),
            }),
            log: Mutex::new(Vec::new()),
            auto_queue_handling: AtomicBool::new(config.auto_queue_handling),
            replenishment: Mutex::new(None),
        };

        let counts = [
            (Kind::Fast, config.fast_chargers),
            (Kind::Slow, config.slow_chargers),
            (Kind::Discharge, config.dischargers),
            (Kind::Exchange, config.exchange_handlers),
        ];
        for (kind, count) in counts {
            for _ in 0..count {
                station.push_unit(kind, false);
            }
        }
        for slot in &config.parking_slots {
            station.push_unit(Kind::Parking, slot.inductive);
        }

        tracing::info!("Station {} ({}) created", station.name, station.id);
        Ok(Arc::new(station))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rates(&self) -> ServiceRates {
        self.rates
    }

    fn lane(&self, kind: Kind) -> &Mutex<Lane> {
        &self.lanes[kind.index()]
    }

    // Units

    fn push_unit(&self, kind: Kind, inductive: bool) -> Arc<ResourceUnit> {
        let id = self.next_unit_id.fetch_add(1, Ordering::Relaxed);
        let unit = ResourceUnit::new(id, kind, inductive);
        self.lane(kind).lock().units.push(Arc::clone(&unit));
        unit
    }

    /// Add a unit to the pool of `kind`. A new parking slot has no inductive
    /// charging; see [`Station::add_parking_slot`].
    pub fn add_unit(&self, kind: Kind) -> Arc<ResourceUnit> {
        self.add_to_pool(kind, false)
    }

    pub fn add_parking_slot(&self, inductive: bool) -> Arc<ResourceUnit> {
        self.add_to_pool(Kind::Parking, inductive)
    }

    fn add_to_pool(&self, kind: Kind, inductive: bool) -> Arc<ResourceUnit> {
        let unit = self.push_unit(kind, inductive);
        tracing::info!("Added {} unit {} to station {}", kind, unit.id(), self.name);
        if self.auto_queue_handling() {
            self.serve_queue(kind);
        }
        unit
    }

    /// Take an idle unit out of its pool.
    pub fn remove_unit(&self, unit_id: UnitId) -> Result<(), StationError> {
        for lane in &self.lanes {
            let mut lane = lane.lock();
            let Some(idx) = lane.units.iter().position(|unit| unit.id() == unit_id) else {
                continue;
            };
            if lane.units[idx].is_busy() {
                return Err(StationError::UnitBusy { unit_id });
            }
            lane.units.remove(idx);
            tracing::info!("Removed unit {} from station {}", unit_id, self.name);
            return Ok(());
        }
        Err(StationError::UnitNotFound { unit_id })
    }

    pub fn units(&self, kind: Kind) -> Vec<Arc<ResourceUnit>> {
        self.lane(kind).lock().units.clone()
    }

    pub fn unit_count(&self, kind: Kind) -> usize {
        self.lane(kind).lock().units.len()
    }

    pub fn busy_count(&self, kind: Kind) -> usize {
        self.lane(kind).lock().units.iter().filter(|unit| unit.is_busy()).count()
    }

    pub fn queue_len(&self, kind: Kind) -> usize {
        self.lane(kind).lock().queue.len()
    }

    /// Events waiting for `kind`, head first.
    pub fn queued(&self, kind: Kind) -> Vec<Arc<Event>> {
        self.lane(kind).lock().queue.iter().cloned().collect()
    }

    // Assignment and queueing

    /// Bind the event to the first idle unit of its kind that can serve it.
    pub fn assign(&self, event: &Arc<Event>) -> Option<Arc<ResourceUnit>> {
        let mut lane = self.lane(event.kind()).lock();
        Self::bind_first_idle(&mut lane, event)
    }

    fn bind_first_idle(lane: &mut Lane, event: &Arc<Event>) -> Option<Arc<ResourceUnit>> {
        let mut bound = None;
        for unit in &lane.units {
            if unit.is_busy() || !unit.can_serve(event) {
                continue;
            }
            match unit.bind(Arc::clone(event)) {
                Ok(()) => {
                    bound = Some(Arc::clone(unit));
                    break;
                }
                Err(err) => tracing::error!("Skipping unit during assignment: {}", err),
            }
        }
        let unit = bound?;
        event.set_unit(Some(Arc::clone(&unit)));
        lane.queue.remove(event);
        tracing::debug!("Event {} bound to unit {}", event.id(), unit.id());
        Some(unit)
    }

    /// Put the event at the back of its kind's queue, once.
    pub fn enqueue(&self, event: &Arc<Event>) {
        let mut lane = self.lane(event.kind()).lock();
        if !lane.queue.contains(event) {
            lane.queue.enqueue(Arc::clone(event));
        }
    }

    /// Assign, enqueue or reject the event in a single critical section.
    pub(crate) fn admit(&self, event: &Arc<Event>, can_assign: bool) -> Admission {
        let mut guard = self.lane(event.kind()).lock();
        let lane = &mut *guard;

        let settled = !matches!(event.condition(), Condition::Arrived | Condition::Wait);
        if settled || event.unit().is_some() {
            return Admission::Pending;
        }
        if !lane.units.iter().any(|unit| unit.can_serve(event)) {
            lane.queue.remove(event);
            event.set_estimated_wait(None);
            event.set_condition(Condition::NonExecutable);
            tracing::warn!(
                "Station {} has no {} unit able to serve event {}",
                self.name,
                event.kind(),
                event.id()
            );
            return Admission::Rejected(None);
        }
        if can_assign {
            if let Some(unit) = Self::bind_first_idle(lane, event) {
                return Admission::Assigned(unit);
            }
        }

        let wait = self.estimate(lane, Some(event)).unwrap_or(Duration::ZERO);
        tracing::debug!("Estimated wait for event {}: {:?}", event.id(), wait);
        event.set_estimated_wait(Some(wait));
        if wait < event.max_wait() {
            if !lane.queue.contains(event) {
                lane.queue.enqueue(Arc::clone(event));
            }
            event.set_condition(Condition::Wait);
            Admission::Queued(wait)
        } else {
            lane.queue.remove(event);
            event.set_condition(Condition::NonExecutable);
            Admission::Rejected(Some(wait))
        }
    }

    /// Reject an event that cannot be served, unless a hand-off already gave
    /// it a unit or settled it.
    pub(crate) fn withdraw(&self, event: &Arc<Event>) -> Condition {
        let mut lane = self.lane(event.kind()).lock();
        let condition = event.condition();
        if event.unit().is_some() || !matches!(condition, Condition::Arrived | Condition::Wait) {
            return condition;
        }
        lane.queue.remove(event);
        event.set_condition(Condition::NonExecutable);
        Condition::NonExecutable
    }

    /// Estimated wait for an event queued behind everything ahead of `event`,
    /// or behind the whole queue when `event` is `None`. Only units able to
    /// serve `event` count.
    fn estimate(&self, lane: &Lane, event: Option<&Arc<Event>>) -> Option<Duration> {
        let remaining: Vec<Option<Duration>> = lane
            .units
            .iter()
            .filter(|unit| event.is_none_or(|event| unit.can_serve(event)))
            .map(|unit| unit.load())
            .collect();
        let ahead = lane
            .queue
            .iter()
            .take_while(|queued| event.is_none_or(|event| *queued != event))
            .map(|queued| queued.planned_service(&self.rates));
        estimate_wait(&remaining, ahead)
    }

    /// How long a new arrival of `kind` would wait; `None` without units.
    pub fn wait_time(&self, kind: Kind) -> Option<Duration> {
        let lane = self.lane(kind).lock();
        self.estimate(&lane, None)
    }

    // Release and hand-off

    /// Free a unit. With automatic queue handling the unit goes straight to
    /// the first queued event it can serve.
    pub fn release(&self, unit: &Arc<ResourceUnit>) {
        let pull = self.auto_queue_handling();
        let next = self.unbind(unit, pull);
        self.launch_queued(unit, next, pull);
    }

    pub(crate) fn unbind(&self, unit: &Arc<ResourceUnit>, pull: bool) -> Option<Arc<Event>> {
        let mut guard = self.lane(unit.kind()).lock();
        if let Some(event) = unit.release() {
            event.set_unit(None);
        }
        if pull { Self::hand_off(&mut guard, unit) } else { None }
    }

    fn hand_off(lane: &mut Lane, unit: &Arc<ResourceUnit>) -> Option<Arc<Event>> {
        let next = lane.queue.remove_first(|event| unit.can_serve(event))?;
        match unit.bind(Arc::clone(&next)) {
            Ok(()) => {
                next.set_unit(Some(Arc::clone(unit)));
                tracing::debug!("Unit {} handed to queued event {}", unit.id(), next.id());
                Some(next)
            }
            Err(err) => {
                tracing::error!("Hand-off failed: {}", err);
                lane.queue.requeue_front(next);
                None
            }
        }
    }

    /// Admit and start the event the unit was handed to. Events that can no
    /// longer be served are rejected and the next one is tried. An exchange
    /// short of a donor battery goes back to the head of the queue.
    fn launch_queued(
        &self,
        unit: &Arc<ResourceUnit>,
        mut next: Option<Arc<Event>>,
        pull: bool,
    ) -> Launch {
        while let Some(event) = next {
            match event.admit_on(self, unit) {
                Ok(()) => {
                    event.execution();
                    return Launch::Started;
                }
                Err(Refusal::NoDonorBattery) => {
                    tracing::debug!("Event {} keeps waiting for a charged battery", event.id());
                    self.requeue(unit, event);
                    return Launch::Blocked;
                }
                Err(reason) => {
                    tracing::info!(
                        "Queued event {} rejected on unit {}: {}",
                        event.id(),
                        unit.id(),
                        reason
                    );
                    event.set_condition(Condition::NonExecutable);
                    next = self.unbind(unit, pull);
                }
            }
        }
        Launch::Idle
    }

    /// Undo a hand-off: free the unit and put the event back at the head of
    /// its queue, still waiting.
    fn requeue(&self, unit: &Arc<ResourceUnit>, event: Arc<Event>) {
        let mut lane = self.lane(unit.kind()).lock();
        unit.release();
        event.set_unit(None);
        lane.queue.requeue_front(event);
    }

    /// Pair idle units of `kind` with queued events and start them. Returns
    /// the number of events started.
    pub fn serve_queue(&self, kind: Kind) -> usize {
        let mut started = 0;
        loop {
            let paired = {
                let mut guard = self.lane(kind).lock();
                let lane = &mut *guard;
                let idle: Vec<Arc<ResourceUnit>> =
                    lane.units.iter().filter(|unit| !unit.is_busy()).cloned().collect();
                idle.into_iter()
                    .find_map(|unit| Self::hand_off(lane, &unit).map(|event| (unit, event)))
            };
            let Some((unit, event)) = paired else {
                break;
            };
            match self.launch_queued(&unit, Some(event), true) {
                Launch::Started => started += 1,
                Launch::Idle => {}
                Launch::Blocked => break,
            }
        }
        started
    }

    /// Apply the effects of the event bound to `unit` and free the unit.
    pub(crate) fn complete(&self, unit: &Arc<ResourceUnit>) {
        match unit.event() {
            Some(event) => event.finish(self),
            None => tracing::warn!("Unit {} completed without a bound event", unit.id()),
        }
        self.release(unit);
    }

    pub fn auto_queue_handling(&self) -> bool {
        self.auto_queue_handling.load(Ordering::Relaxed)
    }

    pub fn set_auto_queue_handling(&self, enabled: bool) {
        self.auto_queue_handling.store(enabled, Ordering::Relaxed);
    }

    // Ledger

    pub fn stock_of(&self, source: &str) -> Option<f64> {
        self.ledger.lock().stock_of(source)
    }

    pub fn set_stock(&self, source: &str, amount: f64) -> Result<(), StationError> {
        self.ledger.lock().set_stock(source, amount)
    }

    pub fn total_stock(&self) -> f64 {
        self.ledger.lock().total()
    }

    /// Stock per source, in draw-down order.
    pub fn stock(&self) -> Vec<SourceStock> {
        self.ledger.lock().entries().to_vec()
    }

    pub fn prioritize_sources(&self, order: &[&str]) {
        self.ledger.lock().prioritize(order);
    }

    pub(crate) fn draw_energy(&self, amount: f64) -> f64 {
        let drawn = self.ledger.lock().draw(amount);
        tracing::debug!("Drew {} of {} requested energy from station {}", drawn, amount, self.name);
        drawn
    }

    pub(crate) fn credit_discharged(&self, amount: f64) {
        if let Err(err) = self.ledger.lock().credit(DISCHARGING_SOURCE, amount) {
            tracing::error!("Discharged energy lost: {}", err);
        }
    }

    // Energy sources

    /// Attach a source; a station has at most one source per kind.
    pub fn add_energy_source(&self, source: Box<dyn EnergySource>) -> bool {
        let kind = source.kind();
        {
            let mut sources = self.sources.lock();
            if sources.iter().any(|existing| existing.kind() == kind) {
                return false;
            }
            sources.push(source);
        }
        self.ledger.lock().add_source(kind.ledger_name());
        tracing::info!("Energy source {} added to station {}", kind, self.name);
        true
    }

    /// Detach a source, returning the stock it still held.
    pub fn remove_energy_source(&self, kind: SourceKind) -> Option<f64> {
        self.sources.lock().retain(|source| source.kind() != kind);
        let left = self.ledger.lock().remove_source(kind.ledger_name());
        if left.is_some() {
            tracing::info!("Energy source {} removed from station {}", kind, self.name);
        }
        left
    }

    /// Credit the next pending package of every source. Returns the total
    /// energy added.
    pub fn replenish(&self) -> f64 {
        let popped: Vec<(SourceKind, f64)> = self
            .sources
            .lock()
            .iter_mut()
            .map(|source| (source.kind(), source.pop_amount()))
            .filter(|(_, amount)| *amount > 0.0)
            .collect();

        let mut added = 0.0;
        for (kind, amount) in popped {
            if let Err(err) = self.ledger.lock().credit(kind.ledger_name(), amount) {
                tracing::error!("Replenishment from {} dropped: {}", kind, err);
                continue;
            }
            self.additions.lock().push(EnergyAddition {
                source: kind,
                amount,
                at: Local::now(),
            });
            added += amount;
        }
        if added > 0.0 {
            tracing::info!("Station {} replenished with {} energy", self.name, added);
        }
        added
    }

    pub fn energy_additions(&self) -> Vec<EnergyAddition> {
        self.additions.lock().clone()
    }

    /// Replenish every `every`, starting now, until stopped or the station
    /// is dropped. Replaces a schedule already running.
    pub fn start_replenishment(self: &Arc<Self>, every: Duration) {
        if every.is_zero() {
            tracing::warn!("Ignoring replenishment schedule with a zero interval");
            return;
        }
        let station = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(station) = station.upgrade() else {
                    break;
                };
                station.replenish();
            }
        });
        if let Some(previous) = self.replenishment.lock().replace(handle) {
            previous.abort();
        }
        tracing::info!("Station {} replenishes every {:?}", self.name, every);
    }

    pub fn stop_replenishment(&self) {
        if let Some(handle) = self.replenishment.lock().take() {
            handle.abort();
            tracing::info!("Station {} stopped replenishing", self.name);
        }
    }

    // Batteries

    /// Add a battery to the exchange pool.
    pub fn join_battery(&self, battery: Battery) {
        self.batteries.lock().push(battery);
        if self.auto_queue_handling() {
            self.serve_queue(Kind::Exchange);
        }
    }

    pub fn remove_battery(&self, id: Uuid) -> Option<Battery> {
        let mut batteries = self.batteries.lock();
        let idx = batteries.iter().position(|battery| battery.id() == id)?;
        Some(batteries.remove(idx))
    }

    pub fn batteries(&self) -> Vec<Battery> {
        self.batteries.lock().clone()
    }

    pub(crate) fn has_donor_battery(&self) -> bool {
        self.batteries.lock().iter().any(|battery| battery.remaining() > 0.0)
    }

    pub(crate) fn take_donor_battery(&self) -> Option<Battery> {
        let mut batteries = self.batteries.lock();
        let idx = batteries.iter().position(|battery| battery.remaining() > 0.0)?;
        Some(batteries.remove(idx))
    }

    /// Recharge the pool batteries that are not full on `kind` chargers.
    ///
    /// Each battery goes through the same admission as a vehicle: it needs
    /// a free charger and energy from the ledger, and never queues. Batteries
    /// that start charging leave the pool until their event finishes; the
    /// others stay. Returns the number of batteries put on charge.
    pub fn charge_batteries(self: &Arc<Self>, kind: Kind) -> usize {
        if !matches!(kind, Kind::Fast | Kind::Slow) {
            tracing::warn!("Batteries cannot be charged on {} units", kind);
            return 0;
        }
        let flat: Vec<Battery> = {
            let mut batteries = self.batteries.lock();
            let (full, flat): (Vec<Battery>, Vec<Battery>) =
                batteries.drain(..).partition(|battery| battery.headroom() <= 0.0);
            *batteries = full;
            flat
        };

        let mut started = 0;
        for battery in flat {
            let amount = battery.headroom();
            let holder = Vehicle::new("pool", self.name.as_str(), battery);
            let request = EventRequest::new(kind, Arc::clone(&holder), amount).for_pool_battery();
            let event = Event::new(self, request);
            if event.pre_processing() == Condition::Ready && event.execution().is_active() {
                started += 1;
            } else {
                self.batteries.lock().push(holder.battery());
            }
        }
        tracing::info!(
            "Station {} charging {} pool batteries on {} units",
            self.name,
            started,
            kind
        );
        started
    }

    // Pricing

    /// Price per energy unit right now: the pricing policy while it runs,
    /// the flat unit price otherwise.
    pub fn current_price(&self) -> f64 {
        self.tariff.lock().current_price()
    }

    pub fn prices(&self) -> Prices {
        self.tariff.lock().prices
    }

    pub fn set_prices(&self, prices: Prices) {
        self.tariff.lock().prices = prices;
    }

    pub fn set_unit_price(&self, price: f64) {
        self.tariff.lock().prices.unit = price;
    }

    /// Attach a policy; its tiers are counted from now.
    pub fn set_pricing_policy(&self, policy: PricingPolicy) {
        self.tariff.lock().policy = Some((policy, Instant::now()));
    }

    pub fn clear_pricing_policy(&self) {
        self.tariff.lock().policy = None;
    }

    pub fn pricing_policy(&self) -> Option<PricingPolicy> {
        self.tariff.lock().policy.as_ref().map(|(policy, _)| policy.clone())
    }

    /// Energy `money` buys at the current price, bounded by the stock.
    pub fn energy_for_budget(&self, money: f64) -> f64 {
        let total = self.total_stock();
        let price = self.current_price();
        if price <= 0.0 {
            return total;
        }
        (money.max(0.0) / price).min(total)
    }

    // Event log

    pub(crate) fn record(&self, event: &Arc<Event>) {
        self.log.lock().push(Arc::clone(event));
    }

    /// Every event created against the station, oldest first.
    pub fn events(&self) -> Vec<Arc<Event>> {
        self.log.lock().clone()
    }

    pub fn event(&self, id: Uuid) -> Option<Arc<Event>> {
        self.log.lock().iter().find(|event| event.id() == id).cloned()
    }

    pub fn status(&self) -> StationStatus {
        let lanes = Kind::ALL
            .iter()
            .map(|kind| {
                let lane = self.lane(*kind).lock();
                LaneStatus {
                    kind: *kind,
                    units: lane.units.len(),
                    busy: lane.units.iter().filter(|unit| unit.is_busy()).count(),
                    queued: lane.queue.len(),
                    wait_ms: self
                        .estimate(&lane, None)
                        .map(|wait| u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)),
                }
            })
            .collect();
        StationStatus {
            id: self.id,
            name: self.name.clone(),
            total_stock: self.total_stock(),
            stock: self.stock(),
            current_price: self.current_price(),
            batteries: self.batteries.lock().len(),
            auto_queue_handling: self.auto_queue_handling(),
            lanes,
        }
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rates", &self.rates)
            .finish_non_exhaustive()
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        if let Some(handle) = self.replenishment.get_mut().take() {
            handle.abort();
        }
    }
}
