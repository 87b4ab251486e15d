//! SQLite persistence layer
//!
//! Repository implementations of the core ports, backed by an r2d2
//! connection pool. All rusqlite work runs on the blocking thread pool.

pub mod appointment_repository;
pub mod manager;
pub mod professional_repository;
pub mod sync_error_repository;

pub use appointment_repository::SqliteAppointmentRepository;
pub use manager::DbManager;
pub use professional_repository::SqliteProfessionalRepository;
pub use sync_error_repository::SqliteSyncErrorRepository;
