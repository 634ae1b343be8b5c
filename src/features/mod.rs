//! Feature implementations for ulimi.
//!
//! - Sync queue: offline mutation queue, connectivity and reconciliation
pub mod sync;
