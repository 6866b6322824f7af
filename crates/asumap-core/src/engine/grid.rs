use nalgebra::Point3;
use std::collections::HashMap;

/// Uniform Cartesian binning of a fixed point set.
///
/// With a cell edge no smaller than the search radius, any two points within
/// that radius land in the same or in directly adjacent cells, so a 27-cell
/// neighborhood query yields a superset of the true neighbors.
#[derive(Debug, Clone)]
pub(crate) struct BinGrid {
    cell_size: f64,
    buckets: HashMap<(i32, i32, i32), Vec<u32>>,
}

impl BinGrid {
    pub(crate) fn build(points: &[Point3<f64>], cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0 && cell_size.is_finite());
        let mut buckets: HashMap<(i32, i32, i32), Vec<u32>> = HashMap::new();
        for (index, point) in points.iter().enumerate() {
            buckets
                .entry(cell_of(point, cell_size))
                .or_default()
                .push(index as u32);
        }
        Self { cell_size, buckets }
    }

    /// Indices of all points in the 27 cells around `point`, ascending.
    pub(crate) fn neighborhood(&self, point: &Point3<f64>) -> Vec<u32> {
        let (cx, cy, cz) = cell_of(point, self.cell_size);
        let mut indices = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy, cz + dz)) {
                        indices.extend_from_slice(bucket);
                    }
                }
            }
        }
        indices.sort_unstable();
        indices
    }
}

fn cell_of(point: &Point3<f64>, cell_size: f64) -> (i32, i32, i32) {
    (
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
        (point.z / cell_size).floor() as i32,
    )
}
