use crate::core::models::unit_cell::UnitCell;
use nalgebra::{Point3, Vector3};

/// One half-space constraint in fractional space.
///
/// The plane is `n . x = c` and the admitted region is `n . x <= c`; the
/// normal is not required to have unit length. Both fields may be reassigned
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CutPlane {
    /// Fractional-space normal, pointing out of the admitted region.
    pub n: Vector3<f64>,
    /// Scalar offset of the plane along its normal.
    pub c: f64,
}

impl CutPlane {
    pub fn new(n: Vector3<f64>, c: f64) -> Self {
        Self { n, c }
    }

    /// Signed margin `c - n . site`; positive strictly inside the half-space.
    pub fn evaluate(&self, site: &Point3<f64>) -> f64 {
        self.c - self.n.dot(&site.coords)
    }

    /// Containment test, widened by `epsilon` when positive.
    pub fn is_inside(&self, site: &Point3<f64>, epsilon: f64) -> bool {
        self.evaluate(site) >= -epsilon
    }

    /// Foot of the perpendicular from the origin onto the plane.
    pub fn point_in_plane(&self) -> Point3<f64> {
        Point3::from(self.n * (self.c / self.n.norm_squared()))
    }

    /// Returns a copy of the plane moved outward so that the admitted region
    /// grows by `thickness`, measured as Cartesian distance along the normal.
    ///
    /// The fractional offset change is `thickness` times the Cartesian length
    /// of the fractional normal under the given metric. The receiver is left
    /// untouched.
    pub fn add_buffer(&self, unit_cell: &UnitCell, thickness: f64) -> CutPlane {
        CutPlane::new(
            self.n,
            self.c + thickness * unit_cell.plane_normal_length(&self.n),
        )
    }
}
