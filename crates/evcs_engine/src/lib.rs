use std::sync::Arc;
use std::time::Duration;

use evcs_core::{
    Battery, Condition, Event, EventRequest, EventSnapshot, Kind, Station, StationConfig,
    StationError, StationStatus, Vehicle,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Event {event_id} not found")]
    EventNotFound { event_id: Uuid },
    #[error(transparent)]
    Station(#[from] StationError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryRequest {
    pub capacity: f64,
    pub remaining: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRequest {
    pub brand: String,
    pub driver: String,
    pub battery: BatteryRequest,
}

/// A vehicle asking the station for a service.
///
/// Charging can be asked either as an `amount` of energy or as a `budget`
/// the driver is willing to spend at the current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvent {
    pub kind: Kind,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub max_wait_secs: u64,
    #[serde(default)]
    pub parking_secs: Option<u64>,
    pub vehicle: VehicleRequest,
}

pub struct Engine {
    config: StationConfig,
    station: Arc<Station>,
}

impl Engine {
    pub fn new(config: StationConfig) -> Result<Self, EngineError> {
        let station = Station::new(&config)?;
        Ok(Engine { config, station })
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    /// Start the background work the configuration asks for. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self) {
        if let Some(secs) = self.config.replenishment_interval_secs {
            self.station.start_replenishment(Duration::from_secs(secs));
        }
    }

    /// Create the event, run admission and start it if it got a unit.
    pub fn submit(&self, request: SubmitEvent) -> Result<EventSnapshot, EngineError> {
        let amount = self.requested_amount(&request)?;
        let battery_request = &request.vehicle.battery;
        let mut battery = Battery::new(battery_request.capacity, battery_request.remaining);
        battery.set_active(battery_request.active);
        let vehicle = Vehicle::new(
            request.vehicle.brand.as_str(),
            request.vehicle.driver.as_str(),
            battery,
        );

        let event_request = match request.kind {
            Kind::Parking => {
                let secs = request
                    .parking_secs
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        EngineError::InvalidRequest("parking needs a positive parkingSecs".into())
                    })?;
                EventRequest::parking(vehicle, Duration::from_secs(secs), amount)
            }
            kind => EventRequest::new(kind, vehicle, amount),
        };
        let event = Event::new(
            &self.station,
            event_request.with_max_wait(Duration::from_secs(request.max_wait_secs)),
        );
        tracing::info!("Submitted {} event {}", event.kind(), event.id());

        event.pre_processing();
        event.execution();
        Ok(event.snapshot())
    }

    fn requested_amount(&self, request: &SubmitEvent) -> Result<f64, EngineError> {
        let amount = match (request.amount, request.budget) {
            (Some(_), Some(_)) => {
                return Err(EngineError::InvalidRequest(
                    "give either amount or budget, not both".into(),
                ));
            }
            (Some(amount), None) => amount,
            (None, Some(budget)) if matches!(request.kind, Kind::Fast | Kind::Slow) => {
                if !budget.is_finite() || budget < 0.0 {
                    return Err(EngineError::InvalidRequest(format!("invalid budget {}", budget)));
                }
                self.station.energy_for_budget(budget)
            }
            (None, Some(_)) => {
                return Err(EngineError::InvalidRequest(format!(
                    "a budget only applies to charging, not {}",
                    request.kind
                )));
            }
            (None, None) => match request.kind {
                Kind::Exchange | Kind::Parking => 0.0,
                kind => {
                    return Err(EngineError::InvalidRequest(format!("{} needs an amount", kind)));
                }
            },
        };
        if !amount.is_finite() || amount < 0.0 {
            return Err(EngineError::InvalidRequest(format!("invalid amount {}", amount)));
        }
        Ok(amount)
    }

    fn find(&self, event_id: Uuid) -> Result<Arc<Event>, EngineError> {
        self.station
            .event(event_id)
            .ok_or(EngineError::EventNotFound { event_id })
    }

    pub fn event(&self, event_id: Uuid) -> Result<EventSnapshot, EngineError> {
        Ok(self.find(event_id)?.snapshot())
    }

    /// Run admission again for an event that was rejected, or re-check a
    /// waiting one against the current state of the station.
    pub fn resubmit(&self, event_id: Uuid) -> Result<EventSnapshot, EngineError> {
        let event = self.find(event_id)?;
        let condition = event.resubmit();
        if !matches!(condition, Condition::Arrived | Condition::Wait) {
            return Err(EngineError::InvalidRequest(format!(
                "event {} is {} and cannot be resubmitted",
                event_id, condition
            )));
        }
        event.pre_processing();
        event.execution();
        Ok(event.snapshot())
    }

    pub fn events(&self) -> Vec<EventSnapshot> {
        self.station.events().iter().map(|event| event.snapshot()).collect()
    }

    pub fn status(&self) -> StationStatus {
        self.station.status()
    }

    pub fn wait_time(&self, kind: Kind) -> Option<Duration> {
        self.station.wait_time(kind)
    }

    pub fn report(&self) -> String {
        self.station.render_report()
    }

    pub fn replenish(&self) -> StationStatus {
        self.station.replenish();
        self.station.status()
    }

    /// Put the pool batteries that are not full on fast or slow chargers.
    pub fn charge_batteries(&self, kind: Kind) -> Result<usize, EngineError> {
        if !matches!(kind, Kind::Fast | Kind::Slow) {
            return Err(EngineError::InvalidRequest(format!(
                "batteries charge on fast or slow units, not {}",
                kind
            )));
        }
        Ok(self.station.charge_batteries(kind))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use evcs_core::{BatteryConfig, SourceConfig, SourceKind};

    fn default_config() -> StationConfig {
        let mut config = StationConfig::named("ENGINE_TEST");
        config.fast_chargers = 1;
        config.prices.unit = 0.5;
        config.sources.push(SourceConfig {
            kind: SourceKind::Solar,
            initial_amount: 100.0,
            packages: vec![25.0],
        });
        config
    }

    fn request(kind: Kind, amount: Option<f64>) -> SubmitEvent {
        SubmitEvent {
            kind,
            amount,
            budget: None,
            max_wait_secs: 0,
            parking_secs: None,
            vehicle: VehicleRequest {
                brand: "Tesla".into(),
                driver: "Maria".into(),
                battery: BatteryRequest {
                    capacity: 80.0,
                    remaining: 10.0,
                    active: true,
                },
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_starts_event() {
        let engine = Engine::new(default_config()).unwrap();
        let snapshot = engine.submit(request(Kind::Fast, Some(5.0))).unwrap();
        assert_eq!(snapshot.condition, Condition::Charging);
        assert_eq!(snapshot.duration_ms, 1_800_000);
        assert_eq!(snapshot.cost, 2.5);

        tokio::time::sleep(Duration::from_secs(1801)).await;
        assert_eq!(engine.event(snapshot.id).unwrap().condition, Condition::Finished);
        assert_eq!(engine.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_converted_to_energy() {
        let engine = Engine::new(default_config()).unwrap();
        let mut budget_request = request(Kind::Fast, None);
        budget_request.budget = Some(2.0);
        let snapshot = engine.submit(budget_request).unwrap();
        assert_eq!(snapshot.requested, 4.0);
        assert_eq!(snapshot.energy_to_be_received, 4.0);
    }

    #[test]
    fn test_invalid_requests() {
        let engine = Engine::new(default_config()).unwrap();

        let mut both = request(Kind::Fast, Some(1.0));
        both.budget = Some(1.0);
        assert!(matches!(engine.submit(both), Err(EngineError::InvalidRequest(_))));

        let missing = request(Kind::Slow, None);
        assert!(matches!(engine.submit(missing), Err(EngineError::InvalidRequest(_))));

        let parking = request(Kind::Parking, None);
        assert!(matches!(engine.submit(parking), Err(EngineError::InvalidRequest(_))));

        let negative = request(Kind::Fast, Some(-3.0));
        assert!(matches!(engine.submit(negative), Err(EngineError::InvalidRequest(_))));

        let mut discharge_budget = request(Kind::Discharge, None);
        discharge_budget.budget = Some(1.0);
        assert!(matches!(
            engine.submit(discharge_budget),
            Err(EngineError::InvalidRequest(_))
        ));
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_unknown_event() {
        let engine = Engine::new(default_config()).unwrap();
        let event_id = Uuid::new_v4();
        match engine.event(event_id) {
            Err(EngineError::EventNotFound { event_id: missing }) => assert_eq!(missing, event_id),
            other => panic!("Expected EventNotFound, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_after_replenishment() {
        let mut config = default_config();
        config.sources[0].initial_amount = 0.0;
        let engine = Engine::new(config).unwrap();

        let rejected = engine.submit(request(Kind::Fast, Some(5.0))).unwrap();
        assert_eq!(rejected.condition, Condition::NonExecutable);

        let status = engine.replenish();
        assert_eq!(status.total_stock, 25.0);
        let resubmitted = engine.resubmit(rejected.id).unwrap();
        assert_eq!(resubmitted.condition, Condition::Charging);

        assert!(matches!(
            engine.resubmit(rejected.id),
            Err(EngineError::InvalidRequest(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_charge_pool_batteries() {
        let mut config = default_config();
        config.batteries.push(BatteryConfig {
            capacity: 60.0,
            remaining: 50.0,
        });
        let engine = Engine::new(config).unwrap();

        assert!(matches!(
            engine.charge_batteries(Kind::Exchange),
            Err(EngineError::InvalidRequest(_))
        ));
        assert_eq!(engine.charge_batteries(Kind::Fast).unwrap(), 1);
        assert_eq!(engine.status().batteries, 0);

        tokio::time::sleep(Duration::from_secs(3601)).await;
        let status = engine.status();
        assert_eq!(status.batteries, 1);
        assert_eq!(status.total_stock, 90.0);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = default_config();
        config.rates.fast = -1.0;
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::Station(StationError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_submit_event_json() {
        let json = r#"{
            "kind": "parking",
            "amount": 2.0,
            "parkingSecs": 3600,
            "maxWaitSecs": 60,
            "vehicle": {
                "brand": "Renault",
                "driver": "Nikos",
                "battery": {"capacity": 40.0, "remaining": 5.0}
            }
        }"#;
        let request: SubmitEvent = serde_json::from_str(json).unwrap();
        assert_eq!(request.kind, Kind::Parking);
        assert_eq!(request.parking_secs, Some(3600));
        assert!(request.budget.is_none());
        assert!(request.vehicle.battery.active);
    }
}
