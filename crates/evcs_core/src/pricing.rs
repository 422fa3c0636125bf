use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub duration: Duration,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
enum Schedule {
    /// Every tier lasts the same time slice.
    Uniform { slice: Duration, prices: Vec<f64> },
    /// Every tier carries its own duration.
    Tiered(Vec<PriceTier>),
}

/// Time-dependent unit price, counted from the moment the policy is attached
/// to a station. Once the policy has run its course the station falls back
/// to its flat unit price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingPolicy {
    schedule: Schedule,
}

impl PricingPolicy {
    pub fn uniform(slice: Duration, prices: Vec<f64>) -> Self {
        PricingPolicy {
            schedule: Schedule::Uniform { slice, prices },
        }
    }

    pub fn tiered(tiers: Vec<PriceTier>) -> Self {
        PricingPolicy {
            schedule: Schedule::Tiered(tiers),
        }
    }

    pub fn duration_of_policy(&self) -> Duration {
        match &self.schedule {
            Schedule::Uniform { slice, prices } => {
                slice.saturating_mul(u32::try_from(prices.len()).unwrap_or(u32::MAX))
            }
            Schedule::Tiered(tiers) => tiers
                .iter()
                .fold(Duration::ZERO, |acc, tier| acc.saturating_add(tier.duration)),
        }
    }

    /// Unit price in force `elapsed` after the policy started, or `None` once
    /// the policy has expired.
    pub fn price_at(&self, elapsed: Duration) -> Option<f64> {
        match &self.schedule {
            Schedule::Uniform { slice, prices } => {
                if slice.is_zero() {
                    return None;
                }
                let idx = elapsed.as_nanos() / slice.as_nanos();
                usize::try_from(idx).ok().and_then(|idx| prices.get(idx).copied())
            }
            Schedule::Tiered(tiers) => {
                let mut tier_end = Duration::ZERO;
                for tier in tiers {
                    tier_end = tier_end.saturating_add(tier.duration);
                    if elapsed < tier_end {
                        return Some(tier.price);
                    }
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hours(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    #[test]
    fn test_uniform_slices() {
        let policy = PricingPolicy::uniform(hours(1), vec![0.2, 0.3, 0.5]);
        assert_eq!(policy.duration_of_policy(), hours(3));
        assert_eq!(policy.price_at(Duration::ZERO), Some(0.2));
        assert_eq!(policy.price_at(hours(1)), Some(0.3));
        assert_eq!(policy.price_at(hours(2) + Duration::from_secs(59)), Some(0.5));
        assert_eq!(policy.price_at(hours(3)), None);
    }

    #[test]
    fn test_explicit_tiers() {
        let policy = PricingPolicy::tiered(vec![
            PriceTier {
                duration: hours(2),
                price: 0.1,
            },
            PriceTier {
                duration: hours(1),
                price: 0.4,
            },
        ]);
        assert_eq!(policy.duration_of_policy(), hours(3));
        assert_eq!(policy.price_at(hours(1)), Some(0.1));
        assert_eq!(policy.price_at(hours(2)), Some(0.4));
        assert_eq!(policy.price_at(hours(5)), None);
    }

    #[test]
    fn test_empty_policy_never_applies() {
        let policy = PricingPolicy::uniform(Duration::ZERO, vec![1.0]);
        assert_eq!(policy.price_at(Duration::ZERO), None);
        assert_eq!(PricingPolicy::tiered(vec![]).price_at(Duration::ZERO), None);
    }
}
