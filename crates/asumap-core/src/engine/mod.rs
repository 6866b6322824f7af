//! # Engine Module
//!
//! This module implements the stateful orchestration layer: symmetry-orbit
//! expansion of sites against a buffered asymmetric unit and deterministic
//! enumeration of candidate neighbor pairs over the expanded copies.
//!
//! ## Architecture
//!
//! - **Site Mapping** ([`mappings`]) - accumulates one mapping group per
//!   processed site, then freezes into a read-only snapshot via `lock()`
//! - **Pair Generation** ([`neighbors`]) - lazy, order-stable enumeration of
//!   candidate pairs over a locked mapping set, with optional distance
//!   filtering
//! - **Error Handling** ([`error`]) - engine-specific error types
//!
//! The spatial binning used to prune distance work under a cutoff is internal
//! to this layer.

pub mod error;
pub(crate) mod grid;
pub mod mappings;
pub mod neighbors;
