//! `roster-recon`: Multi-source user reconciliation engine keyed by email.
//!
//! Pure engine crate: receives decoded CSV text, returns consolidated users,
//! alerts and statistics. File access and encoding recovery live in the CLI.

pub mod alerts;
pub mod config;
pub mod consolidate;
pub mod diff;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod profile;
pub mod summary;

pub use config::ReconConfig;
pub use engine::{run, run_diff, DiffResult, ReconInput, ReconResult};
pub use error::ReconError;
pub use model::{AlertTag, ConsolidatedUser, SourceKind};
