//! Facet/plane intersection: turns one triangle and a horizontal plane into
//! at most one oriented 2D segment.

use crate::geometry::{quantize_step, Point2};
use crate::mesh::store::{Facet, Mesh};

pub type Segment2 = (Point2, Point2);

const NORMAL_EPS: f64 = 1e-6;

/// Snaps a requested slice height to the mesh's Z quantum, then offsets by
/// half a quantum so slice planes fall between quantized vertex Z values
/// rather than on top of them.
pub fn snap_layer_z(k: f64, q: f64) -> f64 {
    quantize_step(k, q) + q / 2.0
}

/// Intersects `facet` with the horizontal plane `z`, returning an oriented
/// segment whose direction is chosen so the facet's 2D-projected normal
/// points to the right of the segment (i.e. the solid interior is on the
/// right when walking from the first point to the second).
pub fn slice_facet(mesh: &Mesh, facet: &Facet, z: f64) -> Option<Segment2> {
    let p = [
        mesh.points.get(facet.v[0]),
        mesh.points.get(facet.v[1]),
        mesh.points.get(facet.v[2]),
    ];

    let zmin = p[0].z.min(p[1].z).min(p[2].z);
    let zmax = p[0].z.max(p[1].z).max(p[2].z);
    if z < zmin || z > zmax {
        return None;
    }

    let normal2 = (facet.normal.0, facet.normal.1);
    if (normal2.0 * normal2.0 + normal2.1 * normal2.1).sqrt() < NORMAL_EPS {
        return None;
    }

    // Case 3: an edge lies exactly on the plane.
    for i in 0..3 {
        let j = (i + 1) % 3;
        if (p[i].z - z).abs() < 1e-9 && (p[j].z - z).abs() < 1e-9 {
            return Some(orient(p[i].xy(), p[j].xy(), normal2));
        }
    }

    // Case 4: exactly one vertex on the plane.
    let on_plane: Vec<usize> = (0..3).filter(|&i| (p[i].z - z).abs() < 1e-9).collect();
    if on_plane.len() == 1 {
        let i = on_plane[0];
        let a = p[(i + 1) % 3];
        let b = p[(i + 2) % 3];
        if (a.z - b.z).abs() < 1e-12 {
            return None;
        }
        let u = (z - a.z) / (b.z - a.z);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let intercept = (a.x + (b.x - a.x) * u, a.y + (b.y - a.y) * u);
        return Some(orient(p[i].xy(), intercept, normal2));
    }

    // Case 5: the two edges crossing z intersect the plane by interpolation.
    let mut hits = Vec::with_capacity(2);
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (v1, v2) = (p[i], p[j]);
        let (lo, hi) = if v1.z <= v2.z { (v1, v2) } else { (v2, v1) };
        if z < lo.z || z > hi.z || (hi.z - lo.z).abs() < 1e-12 {
            continue;
        }
        let u = (z - v1.z) / (v2.z - v1.z);
        if (0.0..=1.0).contains(&u) {
            hits.push((v1.x + (v2.x - v1.x) * u, v1.y + (v2.y - v1.y) * u));
        }
    }
    if hits.len() < 2 {
        return None;
    }
    Some(orient(hits[0], hits[1], normal2))
}

/// Tests a probe point offset from the segment midpoint by the 2D normal;
/// if the probe lies to the left of the directed segment, the endpoints are
/// swapped so the interior ends up on the right.
fn orient(a: Point2, b: Point2, normal2: (f64, f64)) -> Segment2 {
    let mid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
    let probe = (mid.0 + normal2.0, mid.1 + normal2.1);
    let dir = (b.0 - a.0, b.1 - a.1);
    let to_probe = (probe.0 - a.0, probe.1 - a.1);
    let cross = dir.0 * to_probe.1 - dir.1 * to_probe.0;
    if cross > 0.0 {
        (b, a)
    } else {
        (a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::store::Mesh;

    fn flat_triangle_mesh() -> (Mesh, crate::mesh::store::FacetId) {
        let mut mesh = Mesh::new(1e-3);
        let id = mesh.add_facet(
            (0.0, 0.0, 0.0),
            (2.0, 0.0, 1.0),
            (0.0, 2.0, 1.0),
            (0.0, 0.0, 0.0),
        );
        (mesh, id)
    }

    #[test]
    fn no_intersection_outside_z_range() {
        let (mesh, id) = flat_triangle_mesh();
        let f = mesh.facets.get(id);
        assert!(slice_facet(&mesh, &f, -1.0).is_none());
        assert!(slice_facet(&mesh, &f, 2.0).is_none());
    }

    #[test]
    fn no_intersection_for_horizontal_facet() {
        let mut mesh = Mesh::new(1e-3);
        let id = mesh.add_facet(
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (0.0, 1.0, 1.0),
            (0.0, 0.0, 1.0),
        );
        let f = mesh.facets.get(id);
        assert!(slice_facet(&mesh, &f, 1.0).is_none());
    }

    #[test]
    fn midplane_crossing_produces_segment() {
        let (mesh, id) = flat_triangle_mesh();
        let f = mesh.facets.get(id);
        let seg = slice_facet(&mesh, &f, 0.5);
        assert!(seg.is_some());
    }

    #[test]
    fn single_vertex_on_plane_case() {
        let mut mesh = Mesh::new(1e-3);
        let id = mesh.add_facet(
            (0.0, 0.0, 0.0),
            (2.0, 0.0, 2.0),
            (0.0, 2.0, 2.0),
            (0.0, 0.0, -1.0),
        );
        let f = mesh.facets.get(id);
        let seg = slice_facet(&mesh, &f, 0.0);
        assert!(seg.is_some());
        let (a, _b) = seg.unwrap();
        assert!((a.0).abs() < 1e-9 && (a.1).abs() < 1e-9);
    }
}
