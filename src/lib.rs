//! Esoccer Signal Bot
//!
//! Watches live e-soccer matches, fires betting tips when a strategy's
//! conditions line up, and settles every tip against the final result.
//!
//! ## Architecture
//!
//! ```text
//! Live feed ─► Metrics ─┐
//! H2H feed ──► H2H ─────┼─► Strategy ─► Store (dedup) ─► Notifier
//! Ended feed ► League ──┘                   │
//!      └─────────────────► Settlement ──────┴─► Performance summary
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod h2h;
pub mod league;
pub mod metrics;
pub mod notify;
pub mod performance;
pub mod settlement;
pub mod store;
pub mod strategy;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
