//! Appointment booking: conflict resolution and lifecycle

pub mod ports;
pub mod service;
