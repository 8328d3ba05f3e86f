//! Stage K: joins near-touching polylines within one (layer, nozzle) bucket
//! into longer continuous paths, minimizing travel moves.

use crate::geometry::Point2;

const MAX_CHAIN_DIST: f64 = 2.0;

fn dist(a: Point2, b: Point2) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Chains `polylines`, destructively consuming the input list. Matching is
/// done by endpoint position, not identity, to avoid aliasing hazards when
/// two distinct polylines happen to share coordinates.
pub fn chain_layer(polylines: Vec<Vec<Point2>>) -> Vec<Vec<Point2>> {
    let mut remaining: Vec<Vec<Point2>> = polylines.into_iter().filter(|p| p.len() >= 2).collect();
    let mut result = Vec::new();

    while !remaining.is_empty() {
        let mut p = remaining.remove(0);
        loop {
            if remaining.is_empty() {
                result.push(p);
                break;
            }
            let p_front = p[0];
            let p_back = *p.last().unwrap();

            // (index into remaining, distance, prepend?, reverse the match?)
            let mut best: Option<(usize, f64, bool, bool)> = None;
            for (idx, q) in remaining.iter().enumerate() {
                let q_front = q[0];
                let q_back = *q.last().unwrap();
                let candidates = [
                    (dist(p_back, q_front), false, false),
                    (dist(p_back, q_back), false, true),
                    (dist(p_front, q_front), true, true),
                    (dist(p_front, q_back), true, false),
                ];
                for &(d, prepend, reverse) in &candidates {
                    if best.map(|(_, bd, _, _)| d < bd).unwrap_or(true) {
                        best = Some((idx, d, prepend, reverse));
                    }
                }
            }

            let (idx, d, prepend, reverse) = best.unwrap();
            if d > MAX_CHAIN_DIST {
                result.push(p);
                break;
            }
            let mut q = remaining.remove(idx);
            if reverse {
                q.reverse();
            }
            if prepend {
                q.extend(p.into_iter().skip(1));
                p = q;
            } else {
                p.extend(q.into_iter().skip(1));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_polylines_within_threshold_join() {
        let lines = vec![vec![(0.0, 0.0), (1.0, 0.0)], vec![(1.5, 0.0), (2.5, 0.0)]];
        let chained = chain_layer(lines);
        assert_eq!(chained.len(), 1);
        assert_eq!(chained[0].len(), 4);
    }

    #[test]
    fn polylines_beyond_threshold_stay_separate() {
        let lines = vec![vec![(0.0, 0.0), (1.0, 0.0)], vec![(10.0, 0.0), (11.0, 0.0)]];
        let chained = chain_layer(lines);
        assert_eq!(chained.len(), 2);
    }

    #[test]
    fn reversed_neighbor_is_spliced_with_correct_orientation() {
        let lines = vec![vec![(0.0, 0.0), (1.0, 0.0)], vec![(2.5, 0.0), (1.5, 0.0)]];
        let chained = chain_layer(lines);
        assert_eq!(chained.len(), 1);
        assert_eq!(chained[0].last().copied(), Some((2.5, 0.0)));
    }

    #[test]
    fn two_disjoint_squares_remain_two_chains() {
        let square = |ox: f64| {
            vec![
                vec![(ox, 0.0), (ox + 1.0, 0.0)],
                vec![(ox + 1.0, 0.0), (ox + 1.0, 1.0)],
            ]
        };
        let mut all = square(0.0);
        all.extend(square(20.0));
        let chained = chain_layer(all);
        assert_eq!(chained.len(), 2);
    }
}
