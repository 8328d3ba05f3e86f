//! Line-pattern generators shared by the infill and support builders.
//!
//! Every pattern reduces to one or more families of parallel lines, each
//! family rotated by `base_angle + rot` for `rot` in the pattern's rotation
//! set, tiled across the bounding rectangle and centered on its snapped
//! midpoint.

use crate::geometry::{Bounds2, Point2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfillType {
    Lines,
    Triangles,
    Grid,
    Hexagons,
}

impl InfillType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "lines" => Some(Self::Lines),
            "triangles" => Some(Self::Triangles),
            "grid" => Some(Self::Grid),
            "hexagons" | "hexagon" | "honeycomb" => Some(Self::Hexagons),
            _ => None,
        }
    }

    fn rotation_set(self) -> &'static [f64] {
        match self {
            InfillType::Lines => &[0.0],
            InfillType::Triangles => &[0.0, 60.0, 120.0],
            InfillType::Grid => &[0.0, 90.0],
            InfillType::Hexagons => &[0.0, 60.0, 120.0],
        }
    }

    /// Line spacing for a requested fractional density `d` (0,1], given
    /// extrusion width `w`.
    fn spacing(self, w: f64, d: f64) -> f64 {
        let d = d.max(1e-6);
        match self {
            InfillType::Lines => w / d,
            InfillType::Triangles => 3.0 * w / d,
            InfillType::Grid => 2.0 * w / d,
            InfillType::Hexagons => (4.0 / 3.0) * w / d,
        }
    }
}

type Segment2 = (Point2, Point2);

/// Generates the full tiled line pattern for `pattern` across `bounds`, at
/// `base_angle_deg` plus each of the pattern's rotation offsets, with
/// spacing derived from `density` and extrusion width `w`.
pub fn make_infill_lines(
    bounds: Bounds2,
    base_angle_deg: f64,
    pattern: InfillType,
    density: f64,
    w: f64,
) -> Vec<Segment2> {
    if pattern == InfillType::Hexagons {
        return hexagon_lines(bounds, base_angle_deg, density, w);
    }
    let spacing = pattern.spacing(w, density);
    let mut lines = Vec::new();
    for &rot in pattern.rotation_set() {
        lines.extend(tiled_parallel_lines(bounds, base_angle_deg + rot, spacing));
    }
    lines
}

/// A single family of parallel lines at `angle_deg`, spaced `spacing` apart,
/// each spanning the full diagonal of `bounds` so it's guaranteed to cover
/// the rectangle regardless of rotation. Centered on the bounds' midpoint.
fn tiled_parallel_lines(bounds: Bounds2, angle_deg: f64, spacing: f64) -> Vec<Segment2> {
    if spacing <= 1e-9 {
        return Vec::new();
    }
    let center = bounds.center();
    let diag = ((bounds.width().powi(2) + bounds.height().powi(2)).sqrt()) / 2.0 + spacing;
    let theta = angle_deg.to_radians();
    let (dx, dy) = (theta.cos(), theta.sin());
    let (nx, ny) = (-dy, dx);

    let count = (diag / spacing).ceil() as i64;
    let mut lines = Vec::new();
    for i in -count..=count {
        let offset = i as f64 * spacing;
        let ox = center.0 + nx * offset;
        let oy = center.1 + ny * offset;
        let a = (ox - dx * diag, oy - dy * diag);
        let b = (ox + dx * diag, oy + dy * diag);
        lines.push((a, b));
    }
    lines
}

/// Honeycomb approximation: two interleaved families of parallel lines at
/// ±60° forming a zigzag, pitched at the column/row spacing the pattern
/// calls for, rather than true closed hexagon cells.
fn hexagon_lines(bounds: Bounds2, base_angle_deg: f64, density: f64, w: f64) -> Vec<Segment2> {
    let column = InfillType::Hexagons.spacing(w, density);
    let row = column * 3.0 / (60f64.to_radians().sin());
    let mut lines = tiled_parallel_lines(bounds, base_angle_deg, column);
    lines.extend(tiled_parallel_lines(bounds, base_angle_deg + 60.0, row));
    lines.extend(tiled_parallel_lines(bounds, base_angle_deg + 120.0, row));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds2 {
        Bounds2 {
            min: (-10.0, -10.0),
            max: (10.0, 10.0),
        }
    }

    #[test]
    fn lines_pattern_uses_single_rotation() {
        assert_eq!(InfillType::Lines.rotation_set().len(), 1);
    }

    #[test]
    fn denser_infill_produces_more_lines() {
        let sparse = make_infill_lines(bounds(), 0.0, InfillType::Lines, 0.1, 0.4);
        let dense = make_infill_lines(bounds(), 0.0, InfillType::Lines, 0.5, 0.4);
        assert!(dense.len() > sparse.len());
    }

    #[test]
    fn grid_has_two_perpendicular_families() {
        let lines = make_infill_lines(bounds(), 0.0, InfillType::Grid, 0.3, 0.4);
        assert!(!lines.is_empty());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(InfillType::from_name("GRID"), Some(InfillType::Grid));
        assert_eq!(InfillType::from_name("bogus"), None);
    }
}
