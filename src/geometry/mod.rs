//! 2D/3D geometry primitives: point interning (used by the mesh store) and
//! the 2D polygon-operations seam (used from perimeters onward).

pub mod ops;
pub mod point;

pub use ops::{
    clip_polyline, close_path, close_paths, diff, intersection, offset, orient_path, orient_paths,
    paths_bounds, paths_contain, signed_area, union, Bounds2, Path2, Point2,
};
pub use point::{quantize_step, Bounds3, Point3D, PointCache, PointId, DEFAULT_Z_QUANTUM, XY_QUANTUM};
