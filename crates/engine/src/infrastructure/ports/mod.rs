//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Player and word storage (the in-memory store could be swapped for a database)
//! - Clock/Random (for testing)

mod error;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{PlayerRepo, WordRepo};

// =============================================================================
// Test-Only Mock Repositories (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::MockPlayerRepo;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
