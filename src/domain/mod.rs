// Domain layer: ledger data model and the ports the ledger and command surface depend on.

pub mod model;
pub mod ports;
