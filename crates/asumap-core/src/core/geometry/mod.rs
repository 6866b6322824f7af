//! # Convex Geometry
//!
//! Primitives for describing one asymmetric unit of a crystal as a convex
//! region in fractional space:
//!
//! - **Half-space constraints** ([`cut_plane`]) - a single facet of the region
//! - **Facet intersections** ([`asu`]) - containment, vertex enumeration,
//!   bounding boxes, and outward buffering of the region
//! - **Covering spheres** ([`sphere`]) - minimal Cartesian spheres used to
//!   bound the buffered search region

pub mod asu;
pub mod cut_plane;
pub mod sphere;
