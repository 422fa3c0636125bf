use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{PriceTier, PricingPolicy, ServiceRates, SourceKind, StationError};

/// Represents a charging station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfig {
    pub name: String,
    #[serde(default)]
    pub fast_chargers: u32,
    #[serde(default)]
    pub slow_chargers: u32,
    #[serde(default)]
    pub dischargers: u32,
    #[serde(default)]
    pub exchange_handlers: u32,
    #[serde(default)]
    pub parking_slots: Vec<ParkingSlotConfig>,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default)]
    pub pricing_policy: Option<PricingPolicyConfig>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub batteries: Vec<BatteryConfig>,
    #[serde(default = "default_auto_queue_handling")]
    pub auto_queue_handling: bool,
    /// Seconds between two automatic replenishments, none when absent.
    #[serde(default)]
    pub replenishment_interval_secs: Option<u64>,
}

fn default_auto_queue_handling() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSlotConfig {
    #[serde(default)]
    pub inductive: bool,
}

/// Service rates; energy rates in units per hour
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatesConfig {
    pub fast: f64,
    pub slow: f64,
    pub discharge: f64,
    pub inductive: f64,
    pub exchange_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        let rates = ServiceRates::default();
        RatesConfig {
            fast: rates.fast,
            slow: rates.slow,
            discharge: rates.discharge,
            inductive: rates.inductive,
            exchange_secs: rates.exchange.as_secs(),
        }
    }
}

impl From<RatesConfig> for ServiceRates {
    fn from(rates: RatesConfig) -> Self {
        ServiceRates {
            fast: rates.fast,
            slow: rates.slow,
            discharge: rates.discharge,
            inductive: rates.inductive,
            exchange: Duration::from_secs(rates.exchange_secs),
        }
    }
}

/// Flat prices per energy unit, and per swap for the exchange
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Prices {
    pub unit: f64,
    pub discharge: f64,
    pub inductive: f64,
    pub exchange: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PricingPolicyConfig {
    Uniform(UniformPolicyConfig),
    Tiered(TieredPolicyConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniformPolicyConfig {
    pub slice_secs: u64,
    pub prices: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredPolicyConfig {
    pub tiers: Vec<TierConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    pub duration_secs: u64,
    pub price: f64,
}

impl PricingPolicyConfig {
    pub fn to_policy(&self) -> PricingPolicy {
        match self {
            PricingPolicyConfig::Uniform(uniform) => {
                let slice = Duration::from_secs(uniform.slice_secs);
                PricingPolicy::uniform(slice, uniform.prices.clone())
            }
            PricingPolicyConfig::Tiered(tiered) => PricingPolicy::tiered(
                tiered
                    .tiers
                    .iter()
                    .map(|tier| PriceTier {
                        duration: Duration::from_secs(tier.duration_secs),
                        price: tier.price,
                    })
                    .collect(),
            ),
        }
    }

    fn prices(&self) -> Vec<f64> {
        match self {
            PricingPolicyConfig::Uniform(uniform) => uniform.prices.clone(),
            PricingPolicyConfig::Tiered(tiered) => {
                tiered.tiers.iter().map(|tier| tier.price).collect()
            }
        }
    }
}

/// An energy source and the packages it will deliver on replenishment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default)]
    pub initial_amount: f64,
    #[serde(default)]
    pub packages: Vec<f64>,
}

/// A charged battery kept for exchanges
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryConfig {
    pub capacity: f64,
    pub remaining: f64,
}

impl StationConfig {
    /// An empty station: no units, no sources, default rates.
    pub fn named(name: impl Into<String>) -> Self {
        StationConfig {
            name: name.into(),
            fast_chargers: 0,
            slow_chargers: 0,
            dischargers: 0,
            exchange_handlers: 0,
            parking_slots: Vec::new(),
            rates: RatesConfig::default(),
            prices: Prices::default(),
            pricing_policy: None,
            sources: Vec::new(),
            batteries: Vec::new(),
            auto_queue_handling: true,
            replenishment_interval_secs: None,
        }
    }

    pub fn validate(&self) -> Result<(), StationError> {
        let rates = [
            ("fast", self.rates.fast),
            ("slow", self.rates.slow),
            ("discharge", self.rates.discharge),
            ("inductive", self.rates.inductive),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(invalid(format!("{} rate must be positive, got {}", name, rate)));
            }
        }

        let prices = [
            ("unit", self.prices.unit),
            ("discharge", self.prices.discharge),
            ("inductive", self.prices.inductive),
            ("exchange", self.prices.exchange),
        ];
        for (name, price) in prices {
            check_amount(&format!("{} price", name), price)?;
        }

        if let Some(policy) = &self.pricing_policy {
            if let PricingPolicyConfig::Uniform(uniform) = policy {
                if uniform.slice_secs == 0 {
                    return Err(invalid(
                        "pricing policy slice must last at least one second".into(),
                    ));
                }
            }
            for price in policy.prices() {
                check_amount("policy price", price)?;
            }
        }

        for source in &self.sources {
            check_amount(&format!("{} initial amount", source.kind), source.initial_amount)?;
            for package in &source.packages {
                check_amount(&format!("{} package", source.kind), *package)?;
            }
        }

        for battery in &self.batteries {
            check_amount("battery capacity", battery.capacity)?;
            check_amount("battery charge", battery.remaining)?;
        }

        if self.replenishment_interval_secs == Some(0) {
            return Err(invalid("replenishment interval must be at least one second".into()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> StationError {
    StationError::InvalidConfig(reason)
}

fn check_amount(what: &str, amount: f64) -> Result<(), StationError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid(format!("{} must be a non-negative number, got {}", what, amount)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_deserialization() {
        let json = r#"
        {
          "name": "ATHENS_CENTRAL",
          "fastChargers": 2,
          "slowChargers": 2,
          "dischargers": 1,
          "exchangeHandlers": 1,
          "parkingSlots": [{"inductive": true}, {"inductive": false}],
          "rates": {
            "fast": 50.0, "slow": 10.0, "discharge": 20.0, "inductive": 5.0, "exchangeSecs": 300
          },
          "prices": {"unit": 0.3, "discharge": 0.2, "inductive": 0.4, "exchange": 15.0},
          "pricingPolicy": {"sliceSecs": 3600, "prices": [0.2, 0.4]},
          "sources": [{"kind": "solar", "initialAmount": 100.0, "packages": [20.0, 30.0]}],
          "batteries": [{"capacity": 60.0, "remaining": 60.0}],
          "autoQueueHandling": false,
          "replenishmentIntervalSecs": 60
        }
        "#;

        let config: StationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "ATHENS_CENTRAL");
        assert_eq!(config.fast_chargers, 2);
        assert_eq!(config.parking_slots.len(), 2);
        assert!(config.parking_slots[0].inductive);
        assert_eq!(config.rates.fast, 50.0);
        assert_eq!(config.prices.exchange, 15.0);
        assert!(matches!(config.pricing_policy, Some(PricingPolicyConfig::Uniform(_))));
        assert_eq!(config.sources[0].kind, SourceKind::Solar);
        assert_eq!(config.sources[0].packages, vec![20.0, 30.0]);
        assert!(!config.auto_queue_handling);
        assert_eq!(config.replenishment_interval_secs, Some(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let json = r#"{"name": "TINY", "rates": {"fast": 25.0}}"#;
        let config: StationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fast_chargers, 0);
        assert_eq!(config.rates.fast, 25.0);
        assert_eq!(config.rates.slow, 10.0);
        assert_eq!(config.rates.exchange_secs, 300);
        assert_eq!(config.prices, Prices::default());
        assert!(config.auto_queue_handling);
        assert!(config.replenishment_interval_secs.is_none());
    }

    #[test]
    fn test_tiered_policy() {
        let json = r#"{"tiers": [
            {"durationSecs": 7200, "price": 0.1},
            {"durationSecs": 3600, "price": 0.4}
        ]}"#;
        let policy: PricingPolicyConfig = serde_json::from_str(json).unwrap();
        let policy = policy.to_policy();
        assert_eq!(policy.duration_of_policy(), Duration::from_secs(3 * 3600));
        assert_eq!(policy.price_at(Duration::from_secs(7200)), Some(0.4));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = StationConfig::named("BROKEN");
        config.rates.slow = 0.0;
        assert!(matches!(config.validate(), Err(StationError::InvalidConfig(_))));

        let mut config = StationConfig::named("BROKEN");
        config.prices.unit = -0.1;
        assert!(matches!(config.validate(), Err(StationError::InvalidConfig(_))));

        let mut config = StationConfig::named("BROKEN");
        config.sources.push(SourceConfig {
            kind: SourceKind::Wind,
            initial_amount: f64::NAN,
            packages: vec![],
        });
        assert!(matches!(config.validate(), Err(StationError::InvalidConfig(_))));

        let mut config = StationConfig::named("BROKEN");
        config.pricing_policy = Some(PricingPolicyConfig::Uniform(UniformPolicyConfig {
            slice_secs: 0,
            prices: vec![0.1],
        }));
        assert!(matches!(config.validate(), Err(StationError::InvalidConfig(_))));
    }
}
