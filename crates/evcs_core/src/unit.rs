use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::{Event, Kind, Station, StationError, UnitId};

#[derive(Debug, Default)]
struct UnitState {
    binding: Option<Arc<Event>>,
    planned: Duration,
    started_at: Option<Instant>,
}

/// A charger, discharger, exchange handler or parking slot.
///
/// A unit serves at most one event at a time. Binding and releasing happen
/// under the lock of the station lane the unit belongs to.
#[derive(Debug)]
pub struct ResourceUnit {
    id: UnitId,
    kind: Kind,
    inductive: bool,
    state: Mutex<UnitState>,
}

impl ResourceUnit {
    pub(crate) fn new(id: UnitId, kind: Kind, inductive: bool) -> Arc<Self> {
        Arc::new(ResourceUnit {
            id,
            kind,
            inductive: kind == Kind::Parking && inductive,
            state: Mutex::new(UnitState::default()),
        })
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Whether a parking slot can charge the parked vehicle.
    pub fn is_inductive(&self) -> bool {
        self.inductive
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().binding.is_some()
    }

    /// The event currently bound to the unit.
    pub fn event(&self) -> Option<Arc<Event>> {
        self.state.lock().binding.clone()
    }

    /// A slot without inductive charging only takes events asking for no energy.
    pub fn can_serve(&self, event: &Event) -> bool {
        event.kind() == self.kind
            && (self.kind != Kind::Parking || self.inductive || event.requested() <= 0.0)
    }

    pub(crate) fn bind(&self, event: Arc<Event>) -> Result<(), StationError> {
        let mut state = self.state.lock();
        if state.binding.is_some() {
            return Err(StationError::AlreadyBound { unit_id: self.id });
        }
        state.binding = Some(event);
        state.planned = Duration::ZERO;
        state.started_at = None;
        Ok(())
    }

    pub(crate) fn release(&self) -> Option<Arc<Event>> {
        let mut state = self.state.lock();
        state.planned = Duration::ZERO;
        state.started_at = None;
        state.binding.take()
    }

    /// Record how long the bound event is going to keep the unit.
    pub(crate) fn commit(&self, duration: Duration) {
        self.state.lock().planned = duration;
    }

    /// Time until the unit frees up; zero when idle.
    pub fn remaining_commit_time(&self) -> Duration {
        self.load().unwrap_or(Duration::ZERO)
    }

    /// `None` when idle, otherwise the time the bound event still needs.
    pub(crate) fn load(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.binding.as_ref()?;
        Some(match state.started_at {
            Some(started_at) => state.planned.saturating_sub(started_at.elapsed()),
            None => state.planned,
        })
    }

    /// Run the bound event for `duration`, then let the station complete it.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn start_completion(self: &Arc<Self>, station: Arc<Station>, duration: Duration) {
        {
            let mut state = self.state.lock();
            state.planned = duration;
            state.started_at = Some(Instant::now());
        }
        tracing::debug!("Unit {} busy for {:?}", self.id, duration);
        let unit = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            station.complete(&unit);
        });
    }
}
