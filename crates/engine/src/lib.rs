//! Storyloom Engine library.
//!
//! Async orchestration around the pure `storyloom-domain` crate.
//!
//! ## Structure
//!
//! - `use_cases/` - Story creation and page generation pipelines
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition
//! - `telemetry` - Tracing setup

pub mod app;
pub mod infrastructure;
pub mod telemetry;
pub mod use_cases;

pub use app::App;
