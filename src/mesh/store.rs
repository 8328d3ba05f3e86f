//! Edge and facet interning, plus the `Mesh` type tying all three caches
//! together. See [`crate::geometry::point`] for the point cache.

use std::collections::HashMap;

use crate::geometry::{Point3D, PointCache, PointId};

pub type EdgeId = u32;
pub type FacetId = u32;

/// An unordered pair of points with a reference count. Canonical storage
/// order is the numeric order of the two `PointId`s, so `(a, b)` and `(b,
/// a)` always hash to the same entry.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub a: PointId,
    pub b: PointId,
    pub count: u32,
}

#[derive(Default)]
pub struct EdgeCache {
    edges: Vec<Edge>,
    index: HashMap<(PointId, PointId), EdgeId>,
    incident: HashMap<PointId, Vec<EdgeId>>,
}

fn canonical_pair(a: PointId, b: PointId) -> (PointId, PointId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl EdgeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns the edge between `a` and `b`, incrementing its reference
    /// count. A manifold mesh has `count == 2` for every edge.
    pub fn add(&mut self, a: PointId, b: PointId) -> EdgeId {
        let key = canonical_pair(a, b);
        if let Some(&id) = self.index.get(&key) {
            self.edges[id as usize].count += 1;
            return id;
        }
        let id = self.edges.len() as EdgeId;
        self.edges.push(Edge {
            a: key.0,
            b: key.1,
            count: 1,
        });
        self.index.insert(key, id);
        self.incident.entry(key.0).or_default().push(id);
        self.incident.entry(key.1).or_default().push(id);
        id
    }

    pub fn get(&self, id: EdgeId) -> Edge {
        self.edges[id as usize]
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn incident_to(&self, p: PointId) -> &[EdgeId] {
        self.incident.get(&p).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (i as EdgeId, *e))
    }
}

/// An oriented triangle: three point handles, rotated so the smallest
/// `PointId` is first, plus a unit normal. Winding always matches the
/// normal by the right-hand rule.
#[derive(Debug, Clone, Copy)]
pub struct Facet {
    pub v: [PointId; 3],
    pub normal: (f64, f64, f64),
    pub count: u32,
}

#[derive(Default)]
pub struct FacetCache {
    facets: Vec<Facet>,
    index: HashMap<[PointId; 3], FacetId>,
    vertex_index: HashMap<PointId, Vec<FacetId>>,
    edge_index: HashMap<(PointId, PointId), Vec<FacetId>>,
}

fn rotate_to_min_first(v: [PointId; 3]) -> [PointId; 3] {
    let min_idx = (0..3).min_by_key(|&i| v[i]).unwrap();
    [v[min_idx], v[(min_idx + 1) % 3], v[(min_idx + 2) % 3]]
}

fn sub(a: Point3D, b: Point3D) -> (f64, f64, f64) {
    (a.x - b.x, a.y - b.y, a.z - b.z)
}

fn cross(a: (f64, f64, f64), b: (f64, f64, f64)) -> (f64, f64, f64) {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

fn dot(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

fn norm(v: (f64, f64, f64)) -> f64 {
    dot(v, v).sqrt()
}

impl FacetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a facet. If the supplied normal disagrees with the
    /// cross-product winding of `(v1,v2,v3)`, the second and third vertices
    /// are swapped so the stored winding matches. A degenerate normal is
    /// recomputed from the cross product; if that is also degenerate the
    /// facet is kept with a zero normal (it will be rejected later when
    /// slicing, since its projected normal has zero magnitude).
    pub fn add(
        &mut self,
        points: &PointCache,
        v1: PointId,
        v2: PointId,
        v3: PointId,
        normal_hint: (f64, f64, f64),
    ) -> FacetId {
        let p1 = points.get(v1);
        let p2 = points.get(v2);
        let p3 = points.get(v3);
        let geo_normal = cross(sub(p2, p1), sub(p3, p1));
        let geo_len = norm(geo_normal);

        let hint_len = norm(normal_hint);
        let mut normal = if hint_len > 1e-12 {
            (
                normal_hint.0 / hint_len,
                normal_hint.1 / hint_len,
                normal_hint.2 / hint_len,
            )
        } else if geo_len > 1e-12 {
            (geo_normal.0 / geo_len, geo_normal.1 / geo_len, geo_normal.2 / geo_len)
        } else {
            (0.0, 0.0, 0.0)
        };

        let (mut a, mut b, mut c) = (v1, v2, v3);
        if geo_len > 1e-12 && dot(geo_normal, normal) < 0.0 {
            std::mem::swap(&mut b, &mut c);
            if hint_len <= 1e-12 {
                normal = (-normal.0, -normal.1, -normal.2);
            }
        }

        let key = rotate_to_min_first([a, b, c]);
        // Re-derive a,b,c from the rotated key so the stored winding is
        // exactly what was inserted into the index.
        let rotated_from = |orig: [PointId; 3], rotated: [PointId; 3]| -> [PointId; 3] {
            let start = orig.iter().position(|&x| x == rotated[0]).unwrap();
            [orig[start], orig[(start + 1) % 3], orig[(start + 2) % 3]]
        };
        let ordered = rotated_from([a, b, c], key);
        a = ordered[0];
        b = ordered[1];
        c = ordered[2];
        let key = [a, b, c];

        if let Some(&id) = self.index.get(&key) {
            self.facets[id as usize].count += 1;
            return id;
        }

        let id = self.facets.len() as FacetId;
        self.facets.push(Facet {
            v: key,
            normal,
            count: 1,
        });
        self.index.insert(key, id);
        for p in key {
            self.vertex_index.entry(p).or_default().push(id);
        }
        for &(x, y) in &[(a, b), (b, c), (c, a)] {
            self.edge_index.entry(canonical_pair(x, y)).or_default().push(id);
        }
        id
    }

    pub fn get(&self, id: FacetId) -> Facet {
        self.facets[id as usize]
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FacetId, Facet)> + '_ {
        self.facets
            .iter()
            .enumerate()
            .map(|(i, f)| (i as FacetId, *f))
    }

    pub fn facets_on_edge(&self, a: PointId, b: PointId) -> &[FacetId] {
        self.edge_index
            .get(&canonical_pair(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A point/edge/facet triple of interning caches, built once during STL
/// reading and read-only for the rest of the pipeline.
pub struct Mesh {
    pub points: PointCache,
    pub edges: EdgeCache,
    pub facets: FacetCache,
}

impl Mesh {
    pub fn new(z_quantum: f64) -> Self {
        Self {
            points: PointCache::new(z_quantum),
            edges: EdgeCache::new(),
            facets: FacetCache::new(),
        }
    }

    /// Adds a facet from raw coordinates: interns its three points, the
    /// three edges between them, and the facet itself.
    pub fn add_facet(
        &mut self,
        v1: (f64, f64, f64),
        v2: (f64, f64, f64),
        v3: (f64, f64, f64),
        normal_hint: (f64, f64, f64),
    ) -> FacetId {
        let p1 = self.points.add(v1.0, v1.1, v1.2);
        let p2 = self.points.add(v2.0, v2.1, v2.2);
        let p3 = self.points.add(v3.0, v3.1, v3.2);
        self.edges.add(p1, p2);
        self.edges.add(p2, p3);
        self.edges.add(p3, p1);
        self.facets.add(&self.points, p1, p2, p3, normal_hint)
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Mutates every point coordinate and rebuilds the point index. Edge and
    /// facet identity is coordinate-independent (it's keyed by `PointId`),
    /// so only the point cache needs rehashing.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.points.translate(dx, dy, dz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle(mesh: &mut Mesh) -> FacetId {
        mesh.add_facet(
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
        )
    }

    #[test]
    fn add_facet_interns_shared_points_and_edges() {
        let mut mesh = Mesh::new(1e-3);
        unit_triangle(&mut mesh);
        assert_eq!(mesh.points.len(), 3);
        assert_eq!(mesh.edges.len(), 3);
        assert_eq!(mesh.facets.len(), 1);
    }

    #[test]
    fn repeated_facet_increments_count_not_storage() {
        let mut mesh = Mesh::new(1e-3);
        unit_triangle(&mut mesh);
        unit_triangle(&mut mesh);
        assert_eq!(mesh.facets.len(), 1);
        let (_, f) = mesh.facets.iter().next().unwrap();
        assert_eq!(f.count, 2);
    }

    #[test]
    fn shared_edge_between_two_facets_has_count_two() {
        let mut mesh = Mesh::new(1e-3);
        mesh.add_facet(
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
        );
        mesh.add_facet(
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
        );
        assert_eq!(mesh.edges.len(), 5);
        let shared = mesh
            .edges
            .iter()
            .find(|(_, e)| {
                let pa = mesh.points.get(e.a);
                let pb = mesh.points.get(e.b);
                (pa.x - 1.0).abs() < 1e-9 && pa.y.abs() < 1e-9 && pb.x.abs() < 1e-9 && (pb.y - 1.0).abs() < 1e-9
            })
            .map(|(_, e)| e)
            .unwrap();
        assert_eq!(shared.count, 2);
    }

    #[test]
    fn facet_winding_matches_normal_hint() {
        let mut mesh = Mesh::new(1e-3);
        // Deliberately reversed winding relative to the +Z hint.
        let id = mesh.add_facet(
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 0.0, 0.0),
            (0.0, 0.0, 1.0),
        );
        let f = mesh.facets.get(id);
        let p = [
            mesh.points.get(f.v[0]),
            mesh.points.get(f.v[1]),
            mesh.points.get(f.v[2]),
        ];
        let cross_z = (p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[1].y - p[0].y) * (p[2].x - p[0].x);
        assert!(cross_z > 0.0);
    }
}
