//! Stitches per-facet slice segments into closed 2D polylines for one layer.

use std::collections::HashMap;

use tracing::warn;

use crate::core::facet_slicer::Segment2;
use crate::geometry::{orient_paths, Path2, Point2};

/// 3-decimal string key so near-identical endpoints (within float noise)
/// hash together, per the endpoint-hashing stitching rule.
fn endpoint_key(p: Point2) -> String {
    format!("{:.3},{:.3}", p.0, p.1)
}

/// Joins `segments` into closed, oriented loops. Segments whose chain never
/// closes (a dangling/incomplete polygon) are dropped and logged as
/// "incomplete polygon" — they do not abort the layer.
pub fn assemble_layer(segments: &[Segment2]) -> Vec<Path2> {
    let mut queues: HashMap<String, Vec<Vec<Point2>>> = HashMap::new();
    for &(p1, p2) in segments {
        queues.entry(endpoint_key(p1)).or_default().push(vec![p1, p2]);
    }

    let mut closed: Vec<Path2> = Vec::new();
    let mut dead_count = 0usize;

    loop {
        let start_key = match queues.iter().find(|(_, v)| !v.is_empty()).map(|(k, _)| k.clone()) {
            Some(k) => k,
            None => break,
        };
        let mut polyline = match queues.get_mut(&start_key).and_then(|v| v.pop()) {
            Some(p) => p,
            None => continue,
        };
        prune_empty(&mut queues, &start_key);

        loop {
            let first_key = endpoint_key(polyline[0]);
            let last_key = endpoint_key(*polyline.last().unwrap());
            if first_key == last_key {
                closed.push(polyline);
                break;
            }
            if let Some(next) = pop_any(&mut queues, &last_key) {
                polyline.extend(next.into_iter().skip(1));
                continue;
            }
            if let Some(mut next) = pop_any(&mut queues, &first_key) {
                next.reverse();
                let mut joined = next;
                joined.extend(polyline.into_iter().skip(1));
                polyline = joined;
                continue;
            }
            dead_count += 1;
            break;
        }
    }

    if dead_count > 0 {
        warn!(count = dead_count, "incomplete polygon(s) discarded in layer assembly");
    }

    for loop_path in closed.iter_mut() {
        crate::geometry::close_path(loop_path);
    }
    orient_paths(&closed)
}

fn pop_any(queues: &mut HashMap<String, Vec<Vec<Point2>>>, key: &str) -> Option<Vec<Point2>> {
    let v = queues.get_mut(key)?;
    let popped = v.pop();
    if popped.is_some() {
        prune_empty(queues, key);
    }
    popped
}

fn prune_empty(queues: &mut HashMap<String, Vec<Vec<Point2>>>, key: &str) {
    if queues.get(key).map(Vec::is_empty).unwrap_or(false) {
        queues.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_segments_close_into_a_square() {
        let segs: Vec<Segment2> = vec![
            ((0.0, 0.0), (1.0, 0.0)),
            ((1.0, 0.0), (1.0, 1.0)),
            ((1.0, 1.0), (0.0, 1.0)),
            ((0.0, 1.0), (0.0, 0.0)),
        ];
        let paths = assemble_layer(&segs);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].first(), paths[0].last());
        assert_eq!(paths[0].len(), 5);
    }

    #[test]
    fn segments_can_arrive_in_any_order_and_orientation() {
        let segs: Vec<Segment2> = vec![
            ((1.0, 1.0), (0.0, 1.0)),
            ((0.0, 0.0), (1.0, 0.0)),
            ((0.0, 1.0), (0.0, 0.0)),
            ((1.0, 0.0), (1.0, 1.0)),
        ];
        let paths = assemble_layer(&segs);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn dangling_segment_is_dropped_not_fatal() {
        let segs: Vec<Segment2> = vec![((0.0, 0.0), (1.0, 0.0)), ((5.0, 5.0), (6.0, 6.0))];
        let paths = assemble_layer(&segs);
        assert!(paths.is_empty());
    }

    #[test]
    fn two_disjoint_squares_stay_separate() {
        let mut segs = Vec::new();
        for &(ox, oy) in &[(0.0, 0.0), (20.0, 0.0)] {
            segs.push(((ox, oy), (ox + 1.0, oy)));
            segs.push(((ox + 1.0, oy), (ox + 1.0, oy + 1.0)));
            segs.push(((ox + 1.0, oy + 1.0), (ox, oy + 1.0)));
            segs.push(((ox, oy + 1.0), (ox, oy)));
        }
        let paths = assemble_layer(&segs);
        assert_eq!(paths.len(), 2);
    }
}
