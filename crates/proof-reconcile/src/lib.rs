//! proof-reconcile
//!
//! Reconciliation engine: one expected roster against one observed listing.
//!
//! - Fetch failure yields exactly one `FetchFailed` finding
//! - Unexpected and missing names come from set differences
//! - Order and badge checks run on the shared intersection only, with ranks
//!   and positions re-based to that intersection
//!
//! Deterministic, pure logic. No IO. No fetching.

mod engine;
mod types;

pub use engine::{reconcile, reconcile_category};
pub use types::*;
