//! Analysis modules.
//!
//! Pure computations over already loaded snapshots: dashboard aggregation and
//! list filtering.

pub mod aggregator;
pub mod filter;

pub use aggregator::*;
pub use filter::{client_filter, journal_filter, subscription_filter};
