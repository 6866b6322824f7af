use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The mapping set has been frozen; the message is stable and callers
    /// match on the `is_locked` substring.
    #[error("Mapping set is frozen: is_locked() == true, process() is no longer valid")]
    Locked,

    #[error("Neighbor pair generation requires a locked mapping set: call lock() first")]
    NotLocked,

    #[error("buffer_thickness must be finite and non-negative, got {value}")]
    InvalidBufferThickness { value: f64 },

    #[error("sym_equiv_epsilon must be finite and positive, got {value}")]
    InvalidSymEquivEpsilon { value: f64 },

    #[error("distance_cutoff must be finite and non-negative, got {value}")]
    InvalidDistanceCutoff { value: f64 },

    #[error("The asymmetric unit facets do not bound a finite polyhedron")]
    UnboundedAsu,
}
