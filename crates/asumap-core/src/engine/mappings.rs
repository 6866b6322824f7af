use super::error::EngineError;
use crate::core::geometry::asu::AsymmetricUnit;
use crate::core::geometry::sphere::CoveringSphere;
use crate::core::models::symmetry::SpaceGroup;
use crate::core::models::unit_cell::UnitCell;
use nalgebra::{Point3, Vector3};
use tracing::{debug, trace};

/// One retained symmetry copy of a processed site.
///
/// `mapped_site` is the fractional position after applying operator
/// `i_sym_op` followed by the integer lattice translation `unit_shifts`; it
/// lies inside the buffered asymmetric unit within the mapping set's
/// `sym_equiv_epsilon`.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMapping {
    i_sym_op: usize,
    unit_shifts: Vector3<i32>,
    mapped_site: Point3<f64>,
}

impl SiteMapping {
    /// Index into the symmetry operator table (0 is the identity).
    pub fn i_sym_op(&self) -> usize {
        self.i_sym_op
    }

    /// Integer lattice translation applied after the symmetry operator.
    pub fn unit_shifts(&self) -> Vector3<i32> {
        self.unit_shifts
    }

    /// Fractional coordinates of the transformed site.
    pub fn mapped_site(&self) -> Point3<f64> {
        self.mapped_site
    }
}

/// Symmetry-orbit expansion of sites against a buffered asymmetric unit.
///
/// The instance starts open: `process()` appends one mapping group per
/// original site, in call order. `lock()` freezes the group sequence; after
/// that the instance is a read-only snapshot safe to share with any number of
/// pair generators (or threads), and further `process()` calls fail.
#[derive(Debug, Clone)]
pub struct AsuMappings {
    space_group: SpaceGroup,
    asu: AsymmetricUnit,
    asu_buffer: AsymmetricUnit,
    buffer_thickness: f64,
    sym_equiv_epsilon: f64,
    buffer_box_min: Point3<f64>,
    buffer_box_max: Point3<f64>,
    buffer_covering_sphere: CoveringSphere,
    mappings: Vec<Vec<SiteMapping>>,
    locked: bool,
}

impl AsuMappings {
    /// Derives the buffered search region for the given symmetry and
    /// asymmetric unit.
    ///
    /// The buffered region is the facet-wise outward buffering of `asu`
    /// intersected with the minimum covering sphere of `asu`'s vertices grown
    /// by `buffer_thickness`; the polyhedron alone overshoots the intended
    /// "within `buffer_thickness` of the region" band near vertices.
    ///
    /// # Errors
    ///
    /// Fails on out-of-range parameters, or when the facet set does not bound
    /// a finite polyhedron.
    pub fn new(
        space_group: SpaceGroup,
        asu: AsymmetricUnit,
        buffer_thickness: f64,
        sym_equiv_epsilon: f64,
    ) -> Result<Self, EngineError> {
        if !buffer_thickness.is_finite() || buffer_thickness < 0.0 {
            return Err(EngineError::InvalidBufferThickness {
                value: buffer_thickness,
            });
        }
        if !sym_equiv_epsilon.is_finite() || sym_equiv_epsilon <= 0.0 {
            return Err(EngineError::InvalidSymEquivEpsilon {
                value: sym_equiv_epsilon,
            });
        }

        let asu_buffer = asu.add_buffer(buffer_thickness);
        let buffer_vertices = asu_buffer.volume_vertices(false, sym_equiv_epsilon);
        let (buffer_box_min, buffer_box_max) =
            bounding_box(&buffer_vertices).ok_or(EngineError::UnboundedAsu)?;

        let asu_vertices_cart = asu.volume_vertices(true, sym_equiv_epsilon);
        let buffer_covering_sphere = CoveringSphere::minimum_covering(&asu_vertices_cart)
            .ok_or(EngineError::UnboundedAsu)?
            .expanded(buffer_thickness);

        debug!(
            n_facets = asu.facets().len(),
            sphere_radius = buffer_covering_sphere.radius(),
            "derived buffered search region"
        );

        Ok(Self {
            space_group,
            asu,
            asu_buffer,
            buffer_thickness,
            sym_equiv_epsilon,
            buffer_box_min,
            buffer_box_max,
            buffer_covering_sphere,
            mappings: Vec::new(),
            locked: false,
        })
    }

    /// Capacity hint for the expected final number of processed sites. Has no
    /// behavioral contract.
    pub fn reserve(&mut self, n_sites_final: usize) {
        self.mappings
            .reserve(n_sites_final.saturating_sub(self.mappings.len()));
    }

    /// Expands `original_site` over the symmetry table and appends the
    /// retained copies as a new mapping group.
    ///
    /// For every operator, in table order, the transformed site is shifted by
    /// each integer lattice translation that can land it inside the buffered
    /// bounding box; the copy is retained when it falls inside both the
    /// buffered polyhedron and the buffer covering sphere within
    /// `sym_equiv_epsilon`. Group order is operator index first, then shift
    /// discovery order; geometrically coincident copies of the same site are
    /// all kept.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Locked`] once `lock()` has been called.
    pub fn process(&mut self, original_site: Point3<f64>) -> Result<(), EngineError> {
        if self.locked {
            return Err(EngineError::Locked);
        }

        let eps = self.sym_equiv_epsilon;
        let mut group = Vec::new();
        for (i_sym_op, op) in self.space_group.operators().iter().enumerate() {
            let transformed = op.apply(&original_site);
            let mut lo = [0i32; 3];
            let mut hi = [0i32; 3];
            for axis in 0..3 {
                lo[axis] = (self.buffer_box_min[axis] - transformed[axis] - eps).ceil() as i32;
                hi[axis] = (self.buffer_box_max[axis] - transformed[axis] + eps).floor() as i32;
            }
            for u0 in lo[0]..=hi[0] {
                for u1 in lo[1]..=hi[1] {
                    for u2 in lo[2]..=hi[2] {
                        let unit_shifts = Vector3::new(u0, u1, u2);
                        let mapped_site = transformed
                            + Vector3::new(u0 as f64, u1 as f64, u2 as f64);
                        if self.asu_buffer.is_inside_eps(&mapped_site, eps)
                            && self.buffer_covering_sphere.is_inside(
                                &self.unit_cell().to_cartesian(&mapped_site),
                                eps,
                            )
                        {
                            group.push(SiteMapping {
                                i_sym_op,
                                unit_shifts,
                                mapped_site,
                            });
                        }
                    }
                }
            }
        }

        trace!(
            i_seq = self.mappings.len(),
            n_mappings = group.len(),
            "expanded site into the buffered region"
        );
        self.mappings.push(group);
        Ok(())
    }

    /// Freezes the mapping group sequence. Idempotent.
    pub fn lock(&mut self) {
        if !self.locked {
            debug!(n_sites = self.mappings.len(), "mapping set locked");
        }
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// All mapping groups, one per processed site, in processing order.
    pub fn mappings(&self) -> &[Vec<SiteMapping>] {
        &self.mappings
    }

    /// Number of processed sites.
    pub fn n_sites(&self) -> usize {
        self.mappings.len()
    }

    pub fn space_group(&self) -> &SpaceGroup {
        &self.space_group
    }

    pub fn asu(&self) -> &AsymmetricUnit {
        &self.asu
    }

    pub fn asu_buffer(&self) -> &AsymmetricUnit {
        &self.asu_buffer
    }

    pub fn unit_cell(&self) -> &UnitCell {
        self.asu.unit_cell()
    }

    pub fn buffer_thickness(&self) -> f64 {
        self.buffer_thickness
    }

    pub fn sym_equiv_epsilon(&self) -> f64 {
        self.sym_equiv_epsilon
    }

    pub fn buffer_covering_sphere(&self) -> &CoveringSphere {
        &self.buffer_covering_sphere
    }
}

fn bounding_box(vertices: &[Point3<f64>]) -> Option<(Point3<f64>, Point3<f64>)> {
    let first = *vertices.first()?;
    let mut min = first;
    let mut max = first;
    for v in &vertices[1..] {
        for axis in 0..3 {
            min[axis] = min[axis].min(v[axis]);
            max[axis] = max[axis].max(v[axis]);
        }
    }
    Some((min, max))
}
