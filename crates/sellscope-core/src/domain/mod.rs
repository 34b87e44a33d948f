//! Canonical domain types for insider-sell data.
//!
//! All models validate their invariants at construction time:
//!
//! - [`Symbol`] — uppercase canonical ticker
//! - [`SellRecord`] — one normalized disposal event (`shares_sold > 0`)
//! - [`dates`] — strict and lenient `YYYY-MM-DD` parsing plus serde adapters

pub mod dates;
mod record;
mod symbol;

pub use record::SellRecord;
pub use symbol::Symbol;
