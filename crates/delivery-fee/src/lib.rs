//! Weather-aware delivery fee calculation.
//!
//! The [`fees`] module holds the engine: snapshot resolution, base fee lookup, condition
//! rule evaluation and aggregation. [`ingestion`] and [`tariffs`] populate the storage
//! ports the engine reads from.

pub mod config;
pub mod error;
pub mod fees;
pub mod ingestion;
pub mod tariffs;
pub mod telemetry;
