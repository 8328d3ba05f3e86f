//! The 2D geometry library interface: polygon booleans, offsetting,
//! containment, and bounds, treated as a single seam so the rest of the
//! pipeline never touches `geo`/`geo-buf` types directly.
//!
//! Backed by `geo` (booleans, containment, bounds, winding) and `geo-buf`
//! (straight-skeleton offsetting) — the same pair `atomCAD/csgrs` depends on
//! for CSG slicing/offsetting (see DESIGN.md).
//!
//! Paths are represented as `Path2`: a `Vec<(f64, f64)>` closed ring
//! (`first == last`), outer loops wound CCW and holes CW. A "path set" is
//! `&[Path2]`.

use geo::{BooleanOps, BoundingRect, Contains, Coord, LineString, MultiPolygon, Polygon, Winding};
use geo_buf::buffer_multi_polygon;

pub type Point2 = (f64, f64);
pub type Path2 = Vec<Point2>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    pub fn width(&self) -> f64 {
        self.max.0 - self.min.0
    }
    pub fn height(&self) -> f64 {
        self.max.1 - self.min.1
    }
    pub fn center(&self) -> Point2 {
        ((self.min.0 + self.max.0) / 2.0, (self.min.1 + self.max.1) / 2.0)
    }
}

/// Ensures `path[0] == path[last]`.
pub fn close_path(path: &mut Path2) {
    if path.is_empty() {
        return;
    }
    if path.first() != path.last() {
        path.push(path[0]);
    }
}

pub fn close_paths(paths: &mut [Path2]) {
    for p in paths.iter_mut() {
        close_path(p);
    }
}

/// Shoelace signed area. Positive = CCW, negative = CW.
pub fn signed_area(path: &Path2) -> f64 {
    if path.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let n = path.len();
    for i in 0..n {
        let (x0, y0) = path[i];
        let (x1, y1) = path[(i + 1) % n];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

/// Reorients a single ring to the requested winding in place.
pub fn orient_path(path: &mut Path2, ccw: bool) {
    close_path(path);
    let area = signed_area(path);
    if (area > 0.0) != ccw {
        path.reverse();
    }
}

/// Reorients a set of rings by containment: a ring is a hole (CW) iff it is
/// contained in an odd number of the *other* rings in the set, otherwise it
/// is an outer loop (CCW).
///
/// A naive version of this algorithm tests containment only against paths
/// still left to process, which makes the result depend on iteration order.
/// This implementation tests every ring against the full set of *other*
/// rings instead, so orientation is order-independent (see DESIGN.md, Open
/// Question decision #1).
pub fn orient_paths(paths: &[Path2]) -> Vec<Path2> {
    let mut out = paths.to_vec();
    for p in out.iter_mut() {
        close_path(p);
    }
    let probes: Vec<Point2> = out.iter().map(|p| p[0]).collect();
    for i in 0..out.len() {
        let mut containing = 0usize;
        for j in 0..out.len() {
            if i == j {
                continue;
            }
            if ring_contains_point(&out[j], probes[i]) {
                containing += 1;
            }
        }
        let should_be_ccw = containing % 2 == 0;
        orient_path(&mut out[i], should_be_ccw);
    }
    out
}

fn ring_contains_point(ring: &Path2, pt: Point2) -> bool {
    // Even-odd ray casting; used internally so orient_paths doesn't depend
    // on `geo` polygon construction (which itself depends on orientation).
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let (px, py) = pt;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > py) != (yj > py)) && (px < (xj - xi) * (py - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Point-in-polygon over a whole path set, using an even-odd crossing count
/// across every ring so nested holes cancel their enclosing outer loop.
pub fn paths_contain(pt: Point2, paths: &[Path2]) -> bool {
    let mut count = 0usize;
    for ring in paths {
        if ring_contains_point(ring, pt) {
            count += 1;
        }
    }
    count % 2 == 1
}

/// Axis-aligned bounds of a path set, or `None` if empty.
pub fn paths_bounds(paths: &[Path2]) -> Option<Bounds2> {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut any = false;
    for ring in paths {
        for &(x, y) in ring {
            any = true;
            min.0 = min.0.min(x);
            min.1 = min.1.min(y);
            max.0 = max.0.max(x);
            max.1 = max.1.max(y);
        }
    }
    if !any {
        None
    } else {
        Some(Bounds2 { min, max })
    }
}

fn line_string_of(ring: &Path2) -> LineString<f64> {
    LineString::new(ring.iter().map(|&(x, y)| Coord { x, y }).collect())
}

fn path_of(ls: &LineString<f64>) -> Path2 {
    ls.coords().map(|c| (c.x, c.y)).collect()
}

/// Groups a flat set of CCW outer / CW hole rings into `geo::Polygon`s by
/// containment, building a `MultiPolygon`.
fn paths_to_multipolygon(paths: &[Path2]) -> MultiPolygon<f64> {
    let oriented = orient_paths(paths);
    let mut outers: Vec<(Path2, Vec<Path2>)> = Vec::new();
    let mut holes: Vec<Path2> = Vec::new();
    for ring in oriented {
        if signed_area(&ring) >= 0.0 {
            outers.push((ring, Vec::new()));
        } else {
            holes.push(ring);
        }
    }
    for hole in holes {
        let probe = hole[0];
        // Assign to the smallest-area containing outer (innermost match).
        let mut best: Option<(usize, f64)> = None;
        for (idx, (outer, _)) in outers.iter().enumerate() {
            if ring_contains_point(outer, probe) {
                let area = signed_area(outer).abs();
                if best.map(|(_, a)| area < a).unwrap_or(true) {
                    best = Some((idx, area));
                }
            }
        }
        if let Some((idx, _)) = best {
            outers[idx].1.push(hole);
        }
    }
    let polys = outers
        .into_iter()
        .map(|(outer, holes)| {
            Polygon::new(
                line_string_of(&outer),
                holes.iter().map(line_string_of).collect(),
            )
        })
        .collect::<Vec<_>>();
    MultiPolygon::new(polys)
}

fn multipolygon_to_paths(mp: &MultiPolygon<f64>) -> Vec<Path2> {
    let mut out = Vec::new();
    for poly in mp.iter() {
        let mut exterior = poly.exterior().clone();
        exterior.make_ccw_winding();
        out.push(path_of(&exterior));
        for hole in poly.interiors() {
            let mut hole = hole.clone();
            hole.make_cw_winding();
            out.push(path_of(&hole));
        }
    }
    out
}

/// Minkowski inflation (`delta > 0`) or erosion (`delta < 0`) with square
/// joins.
pub fn offset(paths: &[Path2], delta: f64) -> Vec<Path2> {
    if paths.is_empty() || delta == 0.0 {
        return paths.to_vec();
    }
    let mp = paths_to_multipolygon(paths);
    let buffered = buffer_multi_polygon(&mp, delta);
    multipolygon_to_paths(&buffered)
}

/// Even-odd union.
pub fn union(a: &[Path2], b: &[Path2]) -> Vec<Path2> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    let ma = paths_to_multipolygon(a);
    let mb = paths_to_multipolygon(b);
    multipolygon_to_paths(&ma.union(&mb))
}

/// Even-odd difference `a - b`.
pub fn diff(a: &[Path2], b: &[Path2]) -> Vec<Path2> {
    if a.is_empty() {
        return Vec::new();
    }
    if b.is_empty() {
        return a.to_vec();
    }
    let ma = paths_to_multipolygon(a);
    let mb = paths_to_multipolygon(b);
    multipolygon_to_paths(&ma.difference(&mb))
}

/// Even-odd intersection of two closed path sets.
pub fn intersection(a: &[Path2], b: &[Path2]) -> Vec<Path2> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let ma = paths_to_multipolygon(a);
    let mb = paths_to_multipolygon(b);
    multipolygon_to_paths(&ma.intersection(&mb))
}

/// Clips an open polyline (not a closed ring) to a mask using an even-odd
/// fill rule, returning the surviving sub-segments. Used by the infill
/// builder to trim straight fill lines to solid/sparse masks.
///
/// Implemented directly (rather than routed through `geo`'s polygon-polygon
/// booleans, which don't apply to open subjects): walk the polyline,
/// intersect each segment against every edge of every mask ring, collect
/// the crossing parameters, and keep spans whose midpoint is inside the mask
/// (even-odd via [`paths_contain`]).
pub fn clip_polyline(line: &[Point2], mask: &[Path2]) -> Vec<Vec<Point2>> {
    if line.len() < 2 || mask.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for seg in line.windows(2) {
        let (p0, p1) = (seg[0], seg[1]);
        let mut ts = vec![0.0f64, 1.0f64];
        for ring in mask {
            let n = ring.len();
            if n < 2 {
                continue;
            }
            for i in 0..n - 1 {
                if let Some(t) = segment_intersection_t(p0, p1, ring[i], ring[i + 1]) {
                    ts.push(t);
                }
            }
        }
        ts.retain(|t| t.is_finite());
        ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        for w in ts.windows(2) {
            let (ta, tb) = (w[0], w[1]);
            if tb - ta < 1e-9 {
                continue;
            }
            let mid = lerp(p0, p1, (ta + tb) / 2.0);
            if paths_contain(mid, mask) {
                out.push(vec![lerp(p0, p1, ta), lerp(p0, p1, tb)]);
            }
        }
    }
    merge_collinear_chain(out)
}

fn lerp(a: Point2, b: Point2, t: f64) -> Point2 {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// Parametric intersection of segment (p0,p1) with segment (q0,q1); returns
/// `t` along (p0,p1) in `[0,1]` if they cross.
fn segment_intersection_t(p0: Point2, p1: Point2, q0: Point2, q1: Point2) -> Option<f64> {
    let r = (p1.0 - p0.0, p1.1 - p0.1);
    let s = (q1.0 - q0.0, q1.1 - q0.1);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = (q0.0 - p0.0, q0.1 - p0.1);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Joins adjacent sub-segments produced per-segment by [`clip_polyline`]
/// back into longer polylines where their endpoints coincide.
fn merge_collinear_chain(segments: Vec<Vec<Point2>>) -> Vec<Vec<Point2>> {
    let mut out: Vec<Vec<Point2>> = Vec::new();
    for seg in segments {
        if let Some(last) = out.last_mut() {
            let tail = *last.last().unwrap();
            let head = seg[0];
            if (tail.0 - head.0).abs() < 1e-6 && (tail.1 - head.1).abs() < 1e-6 {
                last.extend(seg.into_iter().skip(1));
                continue;
            }
        }
        out.push(seg);
    }
    out
}

/// Axis-aligned bounding rectangle via `geo`'s trait, exposed for parity
/// with the external-library interface shape even though [`paths_bounds`]
/// above is the hand-rolled primary entry point.
pub fn geo_bounds(paths: &[Path2]) -> Option<Bounds2> {
    let mp = paths_to_multipolygon(paths);
    mp.bounding_rect().map(|r| Bounds2 {
        min: (r.min().x, r.min().y),
        max: (r.max().x, r.max().y),
    })
}

/// Thin re-export so callers can use `geo`'s containment for a single
/// polygon set without re-deriving it, kept for parity with §4.M's listed
/// primitives.
pub fn contains(paths: &[Path2], pt: Point2) -> bool {
    let mp = paths_to_multipolygon(paths);
    mp.contains(&Coord { x: pt.0, y: pt.1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, half: f64) -> Path2 {
        vec![
            (cx - half, cy - half),
            (cx + half, cy - half),
            (cx + half, cy + half),
            (cx - half, cy + half),
            (cx - half, cy - half),
        ]
    }

    #[test]
    fn close_path_appends_first_point() {
        let mut p = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        close_path(&mut p);
        assert_eq!(p.first(), p.last());
    }

    #[test]
    fn close_path_is_idempotent() {
        let mut p = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        close_path(&mut p);
        let once = p.clone();
        close_path(&mut p);
        assert_eq!(once, p);
    }

    #[test]
    fn signed_area_positive_for_ccw_square() {
        let sq = square(0.0, 0.0, 5.0);
        assert!(signed_area(&sq) > 0.0);
        let mut rev = sq.clone();
        rev.reverse();
        assert!(signed_area(&rev) < 0.0);
    }

    #[test]
    fn orient_paths_fixes_hole_winding() {
        let mut outer = square(0.0, 0.0, 10.0);
        let mut hole = square(0.0, 0.0, 2.0);
        // Scramble both to the "wrong" winding before orienting.
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        if signed_area(&hole) > 0.0 {
            hole.reverse();
        }
        let oriented = orient_paths(&[outer, hole]);
        assert!(signed_area(&oriented[0]) > 0.0);
        assert!(signed_area(&oriented[1]) < 0.0);
    }

    #[test]
    fn orient_paths_is_idempotent() {
        let outer = square(0.0, 0.0, 10.0);
        let hole = square(0.0, 0.0, 2.0);
        let once = orient_paths(&[outer, hole]);
        let twice = orient_paths(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn paths_contain_respects_holes() {
        let outer = square(0.0, 0.0, 10.0);
        let hole = square(0.0, 0.0, 2.0);
        let oriented = orient_paths(&[outer, hole]);
        assert!(paths_contain((5.0, 5.0), &oriented));
        assert!(!paths_contain((0.0, 0.0), &oriented));
    }

    #[test]
    fn offset_shrinks_square_inward() {
        let sq = square(0.0, 0.0, 5.0);
        let shrunk = offset(&[sq], -1.0);
        let bounds = paths_bounds(&shrunk).unwrap();
        assert!((bounds.width() - 8.0).abs() < 0.2);
    }

    #[test]
    fn clip_polyline_keeps_only_interior_spans() {
        let mask = vec![square(0.0, 0.0, 5.0)];
        let line = vec![(-10.0, 0.0), (10.0, 0.0)];
        let clipped = clip_polyline(&line, &mask);
        assert_eq!(clipped.len(), 1);
        assert!((clipped[0][0].0 - (-5.0)).abs() < 1e-6);
        assert!((clipped[0][1].0 - 5.0).abs() < 1e-6);
    }
}
