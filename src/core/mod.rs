//! Stages B(partial)/D/E: layer assignment, facet slicing, and segment
//! stitching into per-layer closed paths.

pub mod facet_slicer;
pub mod layer_assembler;

use tracing::debug;

use crate::geometry::Path2;
use crate::mesh::store::{FacetId, Mesh};

pub type LayerIndex = usize;

/// Maps each layer index to the facets whose Z range covers it.
pub struct LayerAssignment {
    pub layer_height: f64,
    pub z_quantum: f64,
    pub min_z: f64,
    pub num_layers: usize,
    pub facets_by_layer: Vec<Vec<FacetId>>,
}

impl LayerAssignment {
    /// The mid-layer Z value used for slicing, snapped to the Z quantum.
    pub fn layer_z(&self, layer: LayerIndex) -> f64 {
        let raw = self.min_z + (layer as f64 + 0.5) * self.layer_height;
        facet_slicer::snap_layer_z(raw, self.z_quantum)
    }
}

/// Assigns facets to layers using `floor(minz/h + 0.01) .. ceil(maxz/h - 0.01)`
/// per facet, so a facet spanning several layers is indexed into all of them.
pub fn assign_facets_to_layers(mesh: &Mesh, layer_height: f64, z_quantum: f64) -> LayerAssignment {
    let bounds = mesh.points.bounds();
    if bounds.is_empty() {
        return LayerAssignment {
            layer_height,
            z_quantum,
            min_z: 0.0,
            num_layers: 0,
            facets_by_layer: Vec::new(),
        };
    }
    let min_z = bounds.min.z;
    let max_z = bounds.max.z;
    let num_layers = (((max_z - min_z) / layer_height).ceil() as isize).max(0) as usize;

    let mut facets_by_layer = vec![Vec::new(); num_layers];
    for (id, facet) in mesh.facets.iter() {
        let p = [
            mesh.points.get(facet.v[0]),
            mesh.points.get(facet.v[1]),
            mesh.points.get(facet.v[2]),
        ];
        let fz_min = p[0].z.min(p[1].z).min(p[2].z);
        let fz_max = p[0].z.max(p[1].z).max(p[2].z);
        let lo = ((fz_min - min_z) / layer_height + 0.01).floor().max(0.0) as usize;
        let hi_f = ((fz_max - min_z) / layer_height - 0.01).ceil();
        let hi = if hi_f < 0.0 {
            0
        } else {
            (hi_f as usize).min(num_layers.saturating_sub(1))
        };
        for layer in lo..=hi.max(lo) {
            if layer < num_layers {
                facets_by_layer[layer].push(id);
            }
        }
    }

    debug!(num_layers, "assigned facets to layers");
    LayerAssignment {
        layer_height,
        z_quantum,
        min_z,
        num_layers,
        facets_by_layer,
    }
}

/// Slices every layer into closed 2D paths. Layers are independent once
/// assignment is built, but slicing and assembly for a single layer (D then
/// E) is kept as one sequential unit per the hard serial dependency between
/// them.
pub fn slice_all_layers(mesh: &Mesh, assignment: &LayerAssignment) -> Vec<Vec<Path2>> {
    (0..assignment.num_layers)
        .map(|layer| slice_one_layer(mesh, assignment, layer))
        .collect()
}

fn slice_one_layer(mesh: &Mesh, assignment: &LayerAssignment, layer: LayerIndex) -> Vec<Path2> {
    let z = assignment.layer_z(layer);
    let mut segments = Vec::new();
    for &facet_id in &assignment.facets_by_layer[layer] {
        let facet = mesh.facets.get(facet_id);
        if let Some(seg) = facet_slicer::slice_facet(mesh, &facet, z) {
            segments.push(seg);
        }
    }
    layer_assembler::assemble_layer(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::store::Mesh;

    fn unit_cube(side: f64) -> Mesh {
        let mut mesh = Mesh::new(1e-3);
        let s = side;
        // Two triangles per face, 6 faces, wound outward.
        let v = [
            (0.0, 0.0, 0.0),
            (s, 0.0, 0.0),
            (s, s, 0.0),
            (0.0, s, 0.0),
            (0.0, 0.0, s),
            (s, 0.0, s),
            (s, s, s),
            (0.0, s, s),
        ];
        let faces: [[usize; 3]; 12] = [
            [0, 3, 2], [0, 2, 1], // bottom z=0, normal -z
            [4, 5, 6], [4, 6, 7], // top z=s, normal +z
            [0, 1, 5], [0, 5, 4], // front y=0
            [1, 2, 6], [1, 6, 5], // right x=s
            [2, 3, 7], [2, 7, 6], // back y=s
            [3, 0, 4], [3, 4, 7], // left x=0
        ];
        let normals = [
            (0.0, 0.0, -1.0), (0.0, 0.0, -1.0),
            (0.0, 0.0, 1.0), (0.0, 0.0, 1.0),
            (0.0, -1.0, 0.0), (0.0, -1.0, 0.0),
            (1.0, 0.0, 0.0), (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0), (0.0, 1.0, 0.0),
            (-1.0, 0.0, 0.0), (-1.0, 0.0, 0.0),
        ];
        for (face, normal) in faces.iter().zip(normals.iter()) {
            mesh.add_facet(v[face[0]], v[face[1]], v[face[2]], *normal);
        }
        mesh
    }

    #[test]
    fn unit_cube_slices_into_expected_layer_count() {
        let mesh = unit_cube(10.0);
        let assignment = assign_facets_to_layers(&mesh, 0.2, 1e-3);
        assert_eq!(assignment.num_layers, 50);
    }

    #[test]
    fn every_layer_of_cube_is_one_closed_square() {
        let mesh = unit_cube(10.0);
        let assignment = assign_facets_to_layers(&mesh, 0.2, 1e-3);
        let layers = slice_all_layers(&mesh, &assignment);
        assert_eq!(layers.len(), 50);
        for paths in &layers {
            assert_eq!(paths.len(), 1, "expected one closed loop per layer");
            assert_eq!(paths[0].first(), paths[0].last());
        }
    }

    #[test]
    fn empty_mesh_yields_zero_layers() {
        let mesh = Mesh::new(1e-3);
        let assignment = assign_facets_to_layers(&mesh, 0.2, 1e-3);
        assert_eq!(assignment.num_layers, 0);
        assert!(slice_all_layers(&mesh, &assignment).is_empty());
    }
}
