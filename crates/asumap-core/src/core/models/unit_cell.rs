use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum UnitCellError {
    #[error("Unit cell lengths must be positive and finite, got ({a}, {b}, {c})")]
    InvalidLengths { a: f64, b: f64, c: f64 },
    #[error("Unit cell angles must lie strictly between 0 and 180 degrees, got ({alpha}, {beta}, {gamma})")]
    InvalidAngles { alpha: f64, beta: f64, gamma: f64 },
    #[error("Unit cell parameters define a degenerate metric (non-positive cell volume)")]
    DegenerateMetric,
}

/// The metric of a crystallographic unit cell.
///
/// Stores the six cell parameters (lengths in the caller's Cartesian unit,
/// angles in degrees) together with the derived orthogonalization and
/// fractionalization matrices. All coordinate arguments elsewhere in this
/// crate are fractional unless a method name says otherwise.
///
/// The orthogonalization convention places `a` along the Cartesian x axis and
/// `b` in the xy plane.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    parameters: [f64; 6],
    orthogonalization: Matrix3<f64>,
    fractionalization: Matrix3<f64>,
    volume: f64,
}

impl UnitCell {
    /// Builds the metric from the six cell parameters.
    ///
    /// # Arguments
    ///
    /// * `a`, `b`, `c` - Cell edge lengths.
    /// * `alpha`, `beta`, `gamma` - Cell angles in degrees.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitCellError`] if any length is non-positive, any angle
    /// lies outside (0, 180), or the parameters do not define a cell of
    /// positive volume.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, UnitCellError> {
        if !(a.is_finite() && b.is_finite() && c.is_finite()) || a <= 0.0 || b <= 0.0 || c <= 0.0 {
            return Err(UnitCellError::InvalidLengths { a, b, c });
        }
        for angle in [alpha, beta, gamma] {
            if !angle.is_finite() || angle <= 0.0 || angle >= 180.0 {
                return Err(UnitCellError::InvalidAngles { alpha, beta, gamma });
            }
        }

        let (cos_alpha, cos_beta, cos_gamma) = (
            alpha.to_radians().cos(),
            beta.to_radians().cos(),
            gamma.to_radians().cos(),
        );
        let sin_gamma = gamma.to_radians().sin();
        let v_sq = 1.0 - cos_alpha * cos_alpha - cos_beta * cos_beta - cos_gamma * cos_gamma
            + 2.0 * cos_alpha * cos_beta * cos_gamma;
        if v_sq <= 0.0 {
            return Err(UnitCellError::DegenerateMetric);
        }
        let v = v_sq.sqrt();

        let orthogonalization = Matrix3::new(
            a,
            b * cos_gamma,
            c * cos_beta,
            0.0,
            b * sin_gamma,
            c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma,
            0.0,
            0.0,
            c * v / sin_gamma,
        );
        let fractionalization = orthogonalization
            .try_inverse()
            .ok_or(UnitCellError::DegenerateMetric)?;

        Ok(Self {
            parameters: [a, b, c, alpha, beta, gamma],
            orthogonalization,
            fractionalization,
            volume: a * b * c * v,
        })
    }

    /// The six cell parameters `(a, b, c, alpha, beta, gamma)` as given at
    /// construction.
    pub fn parameters(&self) -> &[f64; 6] {
        &self.parameters
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Converts a fractional site to Cartesian coordinates.
    pub fn to_cartesian(&self, site: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.orthogonalization * site.coords)
    }

    /// Converts a Cartesian site to fractional coordinates.
    pub fn to_fractional(&self, site: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.fractionalization * site.coords)
    }

    /// Squared Cartesian distance between two fractional sites.
    pub fn distance_sq(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        (self.orthogonalization * (a - b)).norm_squared()
    }

    /// Cartesian distance between two fractional sites.
    pub fn distance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.distance_sq(a, b).sqrt()
    }

    /// Cartesian length of a fractional-space plane normal.
    ///
    /// A plane `n . x = c` over fractional coordinates has the Cartesian
    /// normal `F^T n`, with `F` the fractionalization matrix; the returned
    /// length converts fractional offset changes into Cartesian plane
    /// displacements (see `CutPlane::add_buffer`).
    pub fn plane_normal_length(&self, n: &Vector3<f64>) -> f64 {
        (self.fractionalization.transpose() * n).norm()
    }

    /// Tolerance-based similarity test between two cells.
    ///
    /// Lengths are compared relative to `self`; angles are compared
    /// absolutely, in degrees.
    pub fn is_similar_to(
        &self,
        other: &UnitCell,
        relative_length_tolerance: f64,
        absolute_angle_tolerance: f64,
    ) -> bool {
        for i in 0..3 {
            if (1.0 - other.parameters[i] / self.parameters[i]).abs() > relative_length_tolerance {
                return false;
            }
        }
        for i in 3..6 {
            if (self.parameters[i] - other.parameters[i]).abs() > absolute_angle_tolerance {
                return false;
            }
        }
        true
    }
}
