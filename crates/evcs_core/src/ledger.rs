use serde::{Deserialize, Serialize};

use crate::StationError;

/// Ledger entry credited by discharging events.
pub const DISCHARGING_SOURCE: &str = "discharging";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceStock {
    pub source: String,
    pub amount: f64,
}

/// Available energy per source.
///
/// The order of the entries is the draw-down priority: a draw empties each
/// source completely before touching the next one.
#[derive(Debug, Clone, Default)]
pub struct EnergyLedger {
    entries: Vec<SourceStock>,
}

impl EnergyLedger {
    /// A ledger with the given sources at zero, followed by the discharging source.
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ledger = EnergyLedger::default();
        for source in sources {
            ledger.add_source(source);
        }
        ledger.add_source(DISCHARGING_SOURCE);
        ledger
    }

    /// Append a source at the lowest priority. Returns false if it already exists.
    pub fn add_source(&mut self, source: impl Into<String>) -> bool {
        let source = source.into();
        if self.position(&source).is_some() {
            return false;
        }
        self.entries.push(SourceStock { source, amount: 0.0 });
        true
    }

    /// Remove a source, returning the energy it still held.
    pub fn remove_source(&mut self, source: &str) -> Option<f64> {
        let idx = self.position(source)?;
        Some(self.entries.remove(idx).amount)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.source.as_str())
    }

    pub fn entries(&self) -> &[SourceStock] {
        &self.entries
    }

    pub fn stock_of(&self, source: &str) -> Option<f64> {
        self.position(source).map(|idx| self.entries[idx].amount)
    }

    pub fn set_stock(&mut self, source: &str, amount: f64) -> Result<(), StationError> {
        let idx = self
            .position(source)
            .ok_or_else(|| StationError::UnknownSource {
                name: source.to_string(),
            })?;
        self.entries[idx].amount = amount.max(0.0);
        Ok(())
    }

    pub fn credit(&mut self, source: &str, amount: f64) -> Result<(), StationError> {
        let current = self
            .stock_of(source)
            .ok_or_else(|| StationError::UnknownSource {
                name: source.to_string(),
            })?;
        self.set_stock(source, current + amount)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    /// Take up to `amount` out of the ledger in priority order.
    ///
    /// Returns what was actually drawn, which is `amount` clamped to the total
    /// stock.
    pub fn draw(&mut self, amount: f64) -> f64 {
        let wanted = amount.max(0.0).min(self.total());
        let mut left = wanted;
        for entry in self.entries.iter_mut() {
            if left <= 0.0 {
                break;
            }
            let taken = left.min(entry.amount);
            entry.amount -= taken;
            left -= taken;
        }
        wanted - left
    }

    /// Move the listed sources to the front, in the given order. Sources not
    /// listed keep their relative order behind them; unknown names are ignored.
    pub fn prioritize(&mut self, order: &[&str]) {
        let mut reordered = Vec::with_capacity(self.entries.len());
        for source in order {
            if let Some(idx) = self.position(source) {
                reordered.push(self.entries.remove(idx));
            }
        }
        reordered.append(&mut self.entries);
        self.entries = reordered;
    }

    fn position(&self, source: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.source.eq_ignore_ascii_case(source))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn stocked_ledger() -> EnergyLedger {
        let mut ledger = EnergyLedger::new(["solar", "wind", "nonrenewable"]);
        ledger.set_stock("solar", 10.0).unwrap();
        ledger.set_stock("wind", 20.0).unwrap();
        ledger.set_stock("nonrenewable", 40.0).unwrap();
        ledger
    }

    #[test]
    fn test_discharging_source_is_last() {
        let ledger = EnergyLedger::new(["solar", "wind"]);
        assert_eq!(
            ledger.sources().collect::<Vec<_>>(),
            vec!["solar", "wind", DISCHARGING_SOURCE]
        );
        assert_eq!(ledger.total(), 0.0);
    }

    #[test]
    fn test_draw_empties_sources_in_order() {
        let mut ledger = stocked_ledger();
        assert_eq!(ledger.draw(25.0), 25.0);
        assert_eq!(ledger.stock_of("solar"), Some(0.0));
        assert_eq!(ledger.stock_of("wind"), Some(5.0));
        assert_eq!(ledger.stock_of("nonrenewable"), Some(40.0));
    }

    #[test]
    fn test_draw_clamps_to_total() {
        let mut ledger = stocked_ledger();
        assert_eq!(ledger.draw(100.0), 70.0);
        assert_eq!(ledger.total(), 0.0);
        assert_eq!(ledger.draw(5.0), 0.0);
    }

    #[test]
    fn test_conservation_across_draws() {
        let mut ledger = stocked_ledger();
        let initial = ledger.total();
        let drawn: f64 = [7.5, 12.5, 3.0, 0.0, 21.0]
            .iter()
            .map(|amount| ledger.draw(*amount))
            .sum();
        assert_eq!(drawn, 44.0);
        assert_eq!(ledger.total(), initial - drawn);
    }

    #[test]
    fn test_prioritize_changes_draw_order() {
        let mut ledger = stocked_ledger();
        ledger.prioritize(&["nonrenewable", "missing"]);
        assert_eq!(
            ledger.sources().collect::<Vec<_>>(),
            vec!["nonrenewable", "solar", "wind", DISCHARGING_SOURCE]
        );
        ledger.draw(30.0);
        assert_eq!(ledger.stock_of("nonrenewable"), Some(10.0));
        assert_eq!(ledger.stock_of("solar"), Some(10.0));
    }

    #[test]
    fn test_unknown_source() {
        let mut ledger = stocked_ledger();
        assert_eq!(
            ledger.set_stock("wave", 1.0),
            Err(StationError::UnknownSource {
                name: "wave".into()
            })
        );
        assert!(ledger.stock_of("wave").is_none());
    }

    #[test]
    fn test_add_and_remove_sources() {
        let mut ledger = stocked_ledger();
        assert!(!ledger.add_source("solar"));
        assert!(ledger.add_source("wave"));
        ledger.credit("wave", 2.5).unwrap();
        assert_eq!(ledger.remove_source("wave"), Some(2.5));
        assert_eq!(ledger.total(), 70.0);
    }
}
