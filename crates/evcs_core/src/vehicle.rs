use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    id: uuid::Uuid,
    capacity: f64,
    remaining: f64,
    active: bool,
    charge_cycles: u32,
}

impl Battery {
    pub fn new(capacity: f64, remaining: f64) -> Self {
        let capacity = capacity.max(0.0);
        Battery {
            id: uuid::Uuid::new_v4(),
            capacity,
            remaining: remaining.clamp(0.0, capacity),
            active: true,
            charge_cycles: 0,
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn set_remaining(&mut self, amount: f64) {
        self.remaining = amount.clamp(0.0, self.capacity);
    }

    /// Room left before the battery is full.
    pub fn headroom(&self) -> f64 {
        (self.capacity - self.remaining).max(0.0)
    }

    pub fn charge_cycles(&self) -> u32 {
        self.charge_cycles
    }

    pub fn add_charge_cycle(&mut self) {
        self.charge_cycles += 1;
    }
}

#[derive(Debug)]
struct VehicleState {
    battery: Battery,
    driver_profit: f64,
}

/// An electric vehicle and its driver, shared between the caller and the
/// events it takes part in.
#[derive(Debug)]
pub struct Vehicle {
    id: uuid::Uuid,
    brand: String,
    driver: String,
    state: Mutex<VehicleState>,
}

impl Vehicle {
    pub fn new(brand: impl Into<String>, driver: impl Into<String>, battery: Battery) -> Arc<Self> {
        Arc::new(Vehicle {
            id: uuid::Uuid::new_v4(),
            brand: brand.into(),
            driver: driver.into(),
            state: Mutex::new(VehicleState {
                battery,
                driver_profit: 0.0,
            }),
        })
    }

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Copy of the battery currently fitted.
    pub fn battery(&self) -> Battery {
        self.state.lock().battery.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().battery.is_active()
    }

    pub fn capacity(&self) -> f64 {
        self.state.lock().battery.capacity()
    }

    pub fn remaining(&self) -> f64 {
        self.state.lock().battery.remaining()
    }

    pub fn headroom(&self) -> f64 {
        self.state.lock().battery.headroom()
    }

    pub fn set_remaining(&self, amount: f64) {
        self.state.lock().battery.set_remaining(amount);
    }

    /// Add (or, negative, remove) energy from the fitted battery.
    pub fn adjust_remaining(&self, delta: f64) {
        let mut state = self.state.lock();
        let remaining = state.battery.remaining() + delta;
        state.battery.set_remaining(remaining);
    }

    pub fn add_charge_cycle(&self) {
        self.state.lock().battery.add_charge_cycle();
    }

    pub fn set_battery_active(&self, active: bool) {
        self.state.lock().battery.set_active(active);
    }

    pub fn driver_profit(&self) -> f64 {
        self.state.lock().driver_profit
    }

    pub fn credit_profit(&self, amount: f64) {
        self.state.lock().driver_profit += amount;
    }

    /// Fit `battery`, returning the one that was taken out.
    pub fn swap_battery(&self, battery: Battery) -> Battery {
        std::mem::replace(&mut self.state.lock().battery, battery)
    }
}
