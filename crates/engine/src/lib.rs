//! WordMon Engine library.
//!
//! The runtime side of WordMon: word generation, single-player encounters
//! and the concurrent spawn / capture arena.
//!
//! ## Structure
//!
//! - `use_cases/` - generator, encounter, arena and the request-facing game service
//! - `infrastructure/` - ports and their implementations (clock, random, store, config)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
