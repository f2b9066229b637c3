//! Update checking
//! - strategy.rs: per-package lookup strategy
//! - prefetch.rs: warm-up request planning
//! - record.rs: result records and statuses
//! - orchestrator.rs: one checking run over a manifest

pub mod orchestrator;
pub mod prefetch;
pub mod record;
pub mod strategy;

pub use orchestrator::UpdateChecker;
pub use record::{CheckMethod, CheckRecord, UpdateStatus};
pub use strategy::{PrivateRepo, Resolution, StrategyResolver};
