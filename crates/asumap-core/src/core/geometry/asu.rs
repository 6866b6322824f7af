use super::cut_plane::CutPlane;
use crate::core::models::unit_cell::UnitCell;
use itertools::Itertools;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Facet triples whose normal matrix determinant falls below this fraction of
/// the combined normal scale are treated as parallel or otherwise degenerate
/// and skipped during vertex enumeration.
const DEGENERATE_TRIPLE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, PartialEq)]
pub enum AsuError {
    #[error("An asymmetric unit requires at least one facet")]
    NoFacets,
}

/// A convex region of fractional space, given as an intersection of
/// half-space facets.
///
/// The region must bound a finite polyhedron for vertex enumeration and
/// bounding-box queries to be meaningful; passing an unbounded facet set is a
/// caller error. The facet list is fixed at construction, together with the
/// tolerance used by the one-argument containment test.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetricUnit {
    unit_cell: UnitCell,
    facets: Vec<CutPlane>,
    is_inside_epsilon: f64,
}

impl AsymmetricUnit {
    /// # Errors
    ///
    /// Returns [`AsuError::NoFacets`] for an empty facet list.
    pub fn new(
        unit_cell: UnitCell,
        facets: Vec<CutPlane>,
        is_inside_epsilon: f64,
    ) -> Result<Self, AsuError> {
        if facets.is_empty() {
            return Err(AsuError::NoFacets);
        }
        Ok(Self {
            unit_cell,
            facets,
            is_inside_epsilon,
        })
    }

    pub fn unit_cell(&self) -> &UnitCell {
        &self.unit_cell
    }

    pub fn facets(&self) -> &[CutPlane] {
        &self.facets
    }

    pub fn is_inside_epsilon(&self) -> f64 {
        self.is_inside_epsilon
    }

    /// Containment against every facet, using the construction tolerance.
    pub fn is_inside(&self, site: &Point3<f64>) -> bool {
        self.is_inside_eps(site, self.is_inside_epsilon)
    }

    /// Containment against every facet with an explicit tolerance.
    pub fn is_inside_eps(&self, site: &Point3<f64>, epsilon: f64) -> bool {
        self.facets.iter().all(|f| f.is_inside(site, epsilon))
    }

    /// Enumerates the vertices of the polyhedron.
    ///
    /// Every combination of three facets is solved for its unique
    /// intersection point; degenerate (parallel or near-singular) triples are
    /// skipped, and solutions violating any remaining facet by more than
    /// `epsilon` are discarded. Vertices where more than three facets meet
    /// appear once per solvable triple.
    ///
    /// Returns fractional points, or Cartesian points when `cartesian` is set.
    pub fn volume_vertices(&self, cartesian: bool, epsilon: f64) -> Vec<Point3<f64>> {
        let mut vertices = Vec::new();
        for triple in (0..self.facets.len()).combinations(3) {
            let (fi, fj, fk) = (
                &self.facets[triple[0]],
                &self.facets[triple[1]],
                &self.facets[triple[2]],
            );
            let normals = Matrix3::from_rows(&[fi.n.transpose(), fj.n.transpose(), fk.n.transpose()]);
            let scale = fi.n.norm() * fj.n.norm() * fk.n.norm();
            if normals.determinant().abs() <= DEGENERATE_TRIPLE_TOLERANCE * scale {
                continue;
            }
            let Some(solution) = normals.lu().solve(&Vector3::new(fi.c, fj.c, fk.c)) else {
                continue;
            };
            let vertex = Point3::from(solution);
            let is_vertex = self
                .facets
                .iter()
                .enumerate()
                .all(|(m, f)| triple.contains(&m) || f.is_inside(&vertex, epsilon));
            if is_vertex {
                vertices.push(if cartesian {
                    self.unit_cell.to_cartesian(&vertex)
                } else {
                    vertex
                });
            }
        }
        vertices
    }

    /// Per-axis minimum over the fractional vertex set.
    ///
    /// # Panics
    ///
    /// Panics if the facets do not bound a finite polyhedron (no vertices).
    pub fn box_min(&self) -> Point3<f64> {
        self.bounding_box().0
    }

    /// Per-axis maximum over the fractional vertex set.
    ///
    /// # Panics
    ///
    /// Panics if the facets do not bound a finite polyhedron (no vertices).
    pub fn box_max(&self) -> Point3<f64> {
        self.bounding_box().1
    }

    pub(crate) fn bounding_box(&self) -> (Point3<f64>, Point3<f64>) {
        let vertices = self.volume_vertices(false, self.is_inside_epsilon);
        assert!(
            !vertices.is_empty(),
            "asymmetric unit facets do not bound a finite polyhedron"
        );
        let mut min = vertices[0];
        let mut max = vertices[0];
        for v in &vertices[1..] {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        (min, max)
    }

    /// Returns a copy of the region with every facet moved outward by
    /// `thickness` (Cartesian distance along its normal).
    pub fn add_buffer(&self, thickness: f64) -> AsymmetricUnit {
        AsymmetricUnit {
            unit_cell: self.unit_cell.clone(),
            facets: self
                .facets
                .iter()
                .map(|f| f.add_buffer(&self.unit_cell, thickness))
                .collect(),
            is_inside_epsilon: self.is_inside_epsilon,
        }
    }
}
