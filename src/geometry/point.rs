//! 3D point interning — the first third of the mesh store.
//!
//! Points live in one contiguous `Vec`; cross-references are `PointId`
//! handles, and the interning table is a hash map from a quantized integer
//! key to a handle, so coordinates that round to the same key collapse to
//! one point instead of duplicating it.

use std::collections::HashMap;

/// Handle into [`PointCache`]. Never constructed outside this module except
/// by [`PointCache::add`].
pub type PointId = u32;

/// An immutable 3D point. Equality for interning purposes is by coordinate
/// triple rounded to 1e-4 mm; the stored value keeps full precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Axis-aligned bounds, tracked incrementally by [`PointCache`].
#[derive(Debug, Clone, Copy)]
pub struct Bounds3 {
    pub min: Point3D,
    pub max: Point3D,
}

impl Bounds3 {
    fn empty() -> Self {
        Self {
            min: Point3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3D::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    fn absorb(&mut self, p: Point3D) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }
}

/// XY quantization step, fixed at 4 decimal digits.
pub const XY_QUANTUM: f64 = 1e-4;

/// Default Z quantization step; overridable per-mesh (a separate, coarser
/// quantum is typical for Z than for XY).
pub const DEFAULT_Z_QUANTUM: f64 = 1e-3;

/// `floor(v/q + 0.5) * q` — the rounding rule used for both point
/// quantization and plane-intersection heights.
pub fn quantize_step(v: f64, q: f64) -> f64 {
    (v / q + 0.5).floor() * q
}

fn key_component(v: f64, q: f64) -> i64 {
    (quantize_step(v, q) / q).round() as i64
}

/// Deduplicating point store with identity semantics: `add` returns the same
/// [`PointId`] for any two coordinate triples that quantize to the same key.
pub struct PointCache {
    points: Vec<Point3D>,
    index: HashMap<(i64, i64, i64), PointId>,
    z_quantum: f64,
    bounds: Bounds3,
}

impl PointCache {
    pub fn new(z_quantum: f64) -> Self {
        Self {
            points: Vec::new(),
            index: HashMap::new(),
            z_quantum,
            bounds: Bounds3::empty(),
        }
    }

    /// Interns a point, quantizing XY to 1e-4 mm and Z to this cache's
    /// z_quantum. Returns the canonical handle; repeated calls with
    /// coordinates that quantize identically return the same handle without
    /// allocating a new one.
    pub fn add(&mut self, x: f64, y: f64, z: f64) -> PointId {
        let key = (
            key_component(x, XY_QUANTUM),
            key_component(y, XY_QUANTUM),
            key_component(z, self.z_quantum),
        );
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let qx = quantize_step(x, XY_QUANTUM);
        let qy = quantize_step(y, XY_QUANTUM);
        let qz = quantize_step(z, self.z_quantum);
        let point = Point3D::new(qx, qy, qz);
        let id = self.points.len() as PointId;
        self.points.push(point);
        self.index.insert(key, id);
        self.bounds.absorb(point);
        id
    }

    pub fn get(&self, id: PointId) -> Point3D {
        self.points[id as usize]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Bounds3 {
        self.bounds
    }

    /// Mutates every interned coordinate in place and rebuilds the hash
    /// index from scratch, since the quantized keys all shift together.
    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        let mut bounds = Bounds3::empty();
        let mut index = HashMap::with_capacity(self.index.len());
        for p in self.points.iter_mut() {
            p.x += dx;
            p.y += dy;
            p.z += dz;
            bounds.absorb(*p);
        }
        for (id, p) in self.points.iter().enumerate() {
            let key = (
                key_component(p.x, XY_QUANTUM),
                key_component(p.y, XY_QUANTUM),
                key_component(p.z, self.z_quantum),
            );
            index.insert(key, id as PointId);
        }
        self.index = index;
        self.bounds = bounds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_interns_identical_coordinates() {
        let mut cache = PointCache::new(DEFAULT_Z_QUANTUM);
        let a = cache.add(1.0, 2.0, 3.0);
        let b = cache.add(1.00001, 2.0, 3.0);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn quantization_is_idempotent() {
        let v = 1.23456;
        let once = quantize_step(v, XY_QUANTUM);
        let twice = quantize_step(once, XY_QUANTUM);
        assert!((once - twice).abs() < 1e-12);
    }

    #[test]
    fn translate_preserves_lookup() {
        let mut cache = PointCache::new(DEFAULT_Z_QUANTUM);
        let id = cache.add(0.0, 0.0, 0.0);
        cache.translate(5.0, 0.0, 0.0);
        let moved = cache.add(5.0, 0.0, 0.0);
        assert_eq!(id, moved);
        assert_eq!(cache.get(id).x, 5.0);
    }
}
