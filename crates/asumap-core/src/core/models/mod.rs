//! # Crystallographic Models
//!
//! Value types for the two external collaborators the engine consumes: the
//! unit-cell metric ([`unit_cell::UnitCell`]) and the ordered symmetry operator
//! table ([`symmetry::SpaceGroup`]).
//!
//! Deriving either from higher-level descriptions (space-group symbols,
//! change-of-basis operators, file formats) is out of scope; callers construct
//! these types from data they already hold.

pub mod symmetry;
pub mod unit_cell;
