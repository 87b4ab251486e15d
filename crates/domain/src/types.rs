//! Common data types used throughout the application

pub mod appointment;
pub mod professional;
pub mod sync_error;

pub use appointment::*;
pub use professional::*;
pub use sync_error::*;
