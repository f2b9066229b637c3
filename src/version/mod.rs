//! Version lookup layer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Lookup    │────▶│ Registries  │────▶│   Fetcher   │
//! │ (fallbacks) │     │ (3 sources) │     │ (memo, HTTP)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │  Patterns   │
//!                     │(vendor HTML)│
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: SQLite-backed result cache with TTL
//! - [`fetcher`]: Fetcher trait and memoizing HTTP implementation
//! - [`lookup`]: Version lookup engine composing the sources
//! - [`patterns`]: Per-vendor page extraction rules
//! - [`registries`]: Public registry, private repository and vendor page sources
//! - [`error`]: Error types for cache, fetch and lookup operations
//! - [`semver`]: Composer version ordering and stability rules
//! - [`types`]: Common types like `LookupResult`

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod lookup;
pub mod patterns;
pub mod registries;
pub mod semver;
pub mod types;
