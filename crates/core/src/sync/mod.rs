//! Calendar sync error ledger and retry coordination

pub mod ports;
pub mod retry;
pub mod service;
