//! # Core Module
//!
//! This module provides the fundamental building blocks for direct-space
//! asymmetric unit geometry: the collaborator value types consumed by the
//! engine and the convex-region primitives the engine searches against.
//!
//! ## Architecture
//!
//! - **Crystallographic Models** ([`models`]) - Unit-cell metric and ordered
//!   symmetry operator tables
//! - **Convex Geometry** ([`geometry`]) - Half-space cut planes, asymmetric
//!   units as facet intersections, and covering spheres
//!
//! All types in this layer are immutable after construction (or mutable only
//! through plain public fields, as for [`geometry::cut_plane::CutPlane`]) and
//! perform no logging or orchestration.

pub mod geometry;
pub mod models;
