use thiserror::Error;

use crate::UnitId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StationError {
    #[error("Unit {unit_id} is already bound to another event")]
    AlreadyBound { unit_id: UnitId },
    #[error("Unit {unit_id} does not exist in the station")]
    UnitNotFound { unit_id: UnitId },
    #[error("Unit {unit_id} is serving an event and cannot be removed")]
    UnitBusy { unit_id: UnitId },
    #[error("Energy source {name} is not part of the station ledger")]
    UnknownSource { name: String },
    #[error("Invalid station configuration: {0}")]
    InvalidConfig(String),
}
