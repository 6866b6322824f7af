use nalgebra::{Matrix3, Point3, Vector3};

/// Relative slack applied to containment tests inside the minimum covering
/// sphere recursion, so that support points on the boundary are not re-added.
const CONTAINMENT_SLACK: f64 = 1e-12;

/// A Cartesian sphere used to bound a buffered search region.
#[derive(Debug, Clone, PartialEq)]
pub struct CoveringSphere {
    center: Point3<f64>,
    radius: f64,
}

impl CoveringSphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Containment test, widened by `epsilon` when positive.
    pub fn is_inside(&self, point: &Point3<f64>, epsilon: f64) -> bool {
        (point - self.center).norm() <= self.radius + epsilon
    }

    /// Returns a concentric sphere with the radius grown by `thickness`.
    pub fn expanded(&self, thickness: f64) -> CoveringSphere {
        CoveringSphere::new(self.center, self.radius + thickness)
    }

    /// Minimum covering sphere of a point set (Welzl's algorithm, processing
    /// points in the given order). Returns `None` for an empty set.
    pub fn minimum_covering(points: &[Point3<f64>]) -> Option<CoveringSphere> {
        if points.is_empty() {
            return None;
        }
        let mut boundary = Vec::with_capacity(4);
        Some(welzl(points, &mut boundary))
    }
}

fn welzl(points: &[Point3<f64>], boundary: &mut Vec<Point3<f64>>) -> CoveringSphere {
    if points.is_empty() || boundary.len() == 4 {
        return sphere_through(boundary);
    }
    let p = points[0];
    let sphere = welzl(&points[1..], boundary);
    if sphere.is_inside(&p, CONTAINMENT_SLACK * (1.0 + sphere.radius)) {
        return sphere;
    }
    boundary.push(p);
    let sphere = welzl(&points[1..], boundary);
    boundary.pop();
    sphere
}

/// Smallest sphere with every boundary point on its surface. Degenerate
/// boundary configurations (collinear triples, coplanar quadruples) fall back
/// to a covering, if not minimal, sphere around the centroid.
fn sphere_through(boundary: &[Point3<f64>]) -> CoveringSphere {
    match boundary {
        [] => CoveringSphere::new(Point3::origin(), 0.0),
        [p] => CoveringSphere::new(*p, 0.0),
        [a, b] => {
            let center = Point3::from((a.coords + b.coords) * 0.5);
            CoveringSphere::new(center, (a - center).norm())
        }
        [a, b, c] => {
            let u = b - a;
            let v = c - a;
            let normal = u.cross(&v);
            circumcenter_offset(&u, &v, &normal, &Vector3::new(
                u.norm_squared() * 0.5,
                v.norm_squared() * 0.5,
                0.0,
            ))
            .map(|offset| CoveringSphere::new(a + offset, offset.norm()))
            .unwrap_or_else(|| centroid_fallback(boundary))
        }
        [a, b, c, d] => {
            let u = b - a;
            let v = c - a;
            let w = d - a;
            circumcenter_offset(&u, &v, &w, &Vector3::new(
                u.norm_squared() * 0.5,
                v.norm_squared() * 0.5,
                w.norm_squared() * 0.5,
            ))
            .map(|offset| CoveringSphere::new(a + offset, offset.norm()))
            .unwrap_or_else(|| centroid_fallback(boundary))
        }
        _ => unreachable!("welzl boundary never exceeds four points"),
    }
}

fn circumcenter_offset(
    r0: &Vector3<f64>,
    r1: &Vector3<f64>,
    r2: &Vector3<f64>,
    rhs: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    let m = Matrix3::from_rows(&[r0.transpose(), r1.transpose(), r2.transpose()]);
    if m.determinant().abs() <= 1e-14 {
        return None;
    }
    m.lu().solve(rhs)
}

fn centroid_fallback(points: &[Point3<f64>]) -> CoveringSphere {
    let centroid = Point3::from(
        points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64,
    );
    let radius = points
        .iter()
        .map(|p| (p - centroid).norm())
        .fold(0.0, f64::max);
    CoveringSphere::new(centroid, radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn empty_point_set_has_no_covering_sphere() {
        assert_eq!(CoveringSphere::minimum_covering(&[]), None);
    }

    #[test]
    fn single_point_gives_a_zero_radius_sphere() {
        let sphere = CoveringSphere::minimum_covering(&[Point3::new(1.0, 2.0, 3.0)]).unwrap();
        assert_eq!(sphere.center(), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(sphere.radius(), 0.0);
    }

    #[test]
    fn two_points_give_the_diameter_sphere() {
        let sphere = CoveringSphere::minimum_covering(&[
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ])
        .unwrap();
        assert!(f64_approx_equal(sphere.radius(), 1.0));
        assert!((sphere.center() - Point3::origin()).norm() < TOLERANCE);
    }

    #[test]
    fn interior_points_do_not_grow_the_sphere() {
        let sphere = CoveringSphere::minimum_covering(&[
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.1, 0.05, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.2, -0.3),
        ])
        .unwrap();
        assert!(f64_approx_equal(sphere.radius(), 1.0));
    }

    #[test]
    fn tetrahedral_region_vertices_are_covered_by_their_diagonal_sphere() {
        // Vertices of the four-facet asymmetric unit used by the engine
        // tests; the two xy-diagonal vertices are the farthest pair.
        let vertices = [
            Point3::new(1.25, -0.25, 0.5),
            Point3::new(0.25, 0.75, 0.5),
            Point3::new(0.25, -0.25, 0.5),
            Point3::new(0.75, 0.25, 1.0),
        ];
        let sphere = CoveringSphere::minimum_covering(&vertices).unwrap();
        assert!((sphere.center() - Point3::new(0.75, 0.25, 0.5)).norm() < TOLERANCE);
        assert!(f64_approx_equal(sphere.radius(), 0.5f64.sqrt()));
        for v in &vertices {
            assert!(sphere.is_inside(v, 1e-9));
        }
    }

    #[test]
    fn expanded_grows_the_radius_in_place() {
        let sphere = CoveringSphere::new(Point3::origin(), 0.5).expanded(0.1);
        assert!(f64_approx_equal(sphere.radius(), 0.6));
        assert_eq!(sphere.center(), Point3::origin());
        assert!(sphere.is_inside(&Point3::new(0.6, 0.0, 0.0), 0.0));
        assert!(!sphere.is_inside(&Point3::new(0.61, 0.0, 0.0), 0.0));
    }
}
