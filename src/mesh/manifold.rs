//! Manifold validation: three diagnostic lists over a built [`Mesh`].

use tracing::warn;

use crate::mesh::store::{EdgeId, FacetId, Mesh};

/// Result of checking a mesh for manifoldness. Advisory: slicing can proceed
/// on a non-manifold mesh; the CLI decides whether to treat this as fatal.
#[derive(Debug, Clone, Default)]
pub struct ManifoldReport {
    pub duplicate_faces: Vec<FacetId>,
    pub hole_edges: Vec<EdgeId>,
    pub excess_edges: Vec<EdgeId>,
}

impl ManifoldReport {
    pub fn is_manifold(&self) -> bool {
        self.duplicate_faces.is_empty() && self.hole_edges.is_empty() && self.excess_edges.is_empty()
    }
}

/// Checks `mesh` and logs one diagnostic line per finding.
pub fn check_manifold(mesh: &Mesh) -> ManifoldReport {
    let mut report = ManifoldReport::default();

    for (id, facet) in mesh.facets.iter() {
        if facet.count != 1 {
            warn!(facet = id, count = facet.count, "duplicate face");
            report.duplicate_faces.push(id);
        }
    }

    for (id, edge) in mesh.edges.iter() {
        match edge.count {
            1 => {
                warn!(edge = id, "hole edge (borders only one facet)");
                report.hole_edges.push(id);
            }
            2 => {}
            n => {
                warn!(edge = id, count = n, "excess edge (borders more than two facets)");
                report.excess_edges.push(id);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::store::Mesh;

    #[test]
    fn closed_tetrahedron_is_manifold() {
        let mut mesh = Mesh::new(1e-3);
        let p = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
        ];
        mesh.add_facet(p[0], p[2], p[1], (0.0, 0.0, -1.0));
        mesh.add_facet(p[0], p[1], p[3], (0.0, -1.0, 0.0));
        mesh.add_facet(p[1], p[2], p[3], (1.0, 1.0, 1.0));
        mesh.add_facet(p[2], p[0], p[3], (-1.0, 0.0, 0.0));

        let report = check_manifold(&mesh);
        assert!(report.is_manifold(), "{:?}", report);
    }

    #[test]
    fn single_triangle_has_three_hole_edges() {
        let mut mesh = Mesh::new(1e-3);
        mesh.add_facet(
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
        );
        let report = check_manifold(&mesh);
        assert_eq!(report.hole_edges.len(), 3);
        assert!(!report.is_manifold());
    }

    #[test]
    fn duplicated_facet_is_flagged() {
        let mut mesh = Mesh::new(1e-3);
        let add = |mesh: &mut Mesh| {
            mesh.add_facet(
                (0.0, 0.0, 0.0),
                (1.0, 0.0, 0.0),
                (0.0, 1.0, 0.0),
                (0.0, 0.0, 1.0),
            )
        };
        add(&mut mesh);
        add(&mut mesh);
        let report = check_manifold(&mesh);
        assert_eq!(report.duplicate_faces.len(), 1);
    }
}
