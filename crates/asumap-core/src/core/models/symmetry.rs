use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SymmetryError {
    #[error("A symmetry operator table must contain at least one operator")]
    EmptyTable,
    #[error("Operator 0 of a symmetry operator table must be the identity")]
    FirstOperatorNotIdentity,
}

/// One space-group symmetry operation over fractional coordinates.
///
/// Applies as `x' = R x + t` with `R` the rotation part and `t` the
/// fractional translation part.
#[derive(Debug, Clone, PartialEq)]
pub struct SymOp {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymOp {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Transforms a fractional site.
    pub fn apply(&self, site: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * site.coords + self.translation)
    }

    pub fn is_identity(&self) -> bool {
        (self.rotation - Matrix3::identity()).abs().max() < 1e-12
            && self.translation.abs().max() < 1e-12
    }
}

/// An ordered, immutable table of space-group symmetry operators.
///
/// The table is an input of this crate: deriving it from a space-group symbol
/// or a change-of-basis operator is the caller's concern. Operator 0 is
/// required to be the identity; downstream code relies on it being checked
/// first during orbit expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceGroup {
    operators: Vec<SymOp>,
}

impl SpaceGroup {
    /// Wraps an ordered operator list.
    ///
    /// # Errors
    ///
    /// Returns a [`SymmetryError`] if the list is empty or its first entry is
    /// not the identity operation.
    pub fn from_operators(operators: Vec<SymOp>) -> Result<Self, SymmetryError> {
        match operators.first() {
            None => Err(SymmetryError::EmptyTable),
            Some(first) if !first.is_identity() => Err(SymmetryError::FirstOperatorNotIdentity),
            Some(_) => Ok(Self { operators }),
        }
    }

    /// Number of operators in the table.
    pub fn order(&self) -> usize {
        self.operators.len()
    }

    pub fn get(&self, i_sym_op: usize) -> &SymOp {
        &self.operators[i_sym_op]
    }

    pub fn operators(&self) -> &[SymOp] {
        &self.operators
    }
}
