use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Solar,
    Wind,
    Wave,
    Hydroelectric,
    Geothermal,
    Nonrenewable,
}

impl SourceKind {
    /// Name of the ledger entry this source credits.
    pub fn ledger_name(self) -> &'static str {
        match self {
            SourceKind::Solar => "solar",
            SourceKind::Wind => "wind",
            SourceKind::Wave => "wave",
            SourceKind::Hydroelectric => "hydroelectric",
            SourceKind::Geothermal => "geothermal",
            SourceKind::Nonrenewable => "nonrenewable",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ledger_name())
    }
}

/// Something that periodically hands energy to the station.
pub trait EnergySource: Send {
    fn kind(&self) -> SourceKind;
    /// Next pending amount, `0.0` once exhausted.
    fn pop_amount(&mut self) -> f64;
    fn insert_amount(&mut self, amount: f64);
}

/// A source delivering pre-recorded energy packages in order.
#[derive(Debug, Clone)]
pub struct PackagedSource {
    kind: SourceKind,
    packages: VecDeque<f64>,
}

impl PackagedSource {
    pub fn new(kind: SourceKind) -> Self {
        PackagedSource {
            kind,
            packages: VecDeque::new(),
        }
    }

    pub fn with_packages(kind: SourceKind, packages: impl IntoIterator<Item = f64>) -> Self {
        PackagedSource {
            kind,
            packages: packages.into_iter().collect(),
        }
    }

    pub fn pending(&self) -> usize {
        self.packages.len()
    }
}

impl EnergySource for PackagedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn pop_amount(&mut self) -> f64 {
        self.packages.pop_front().unwrap_or(0.0)
    }

    fn insert_amount(&mut self, amount: f64) {
        self.packages.push_back(amount);
    }
}
