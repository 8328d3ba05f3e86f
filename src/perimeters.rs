//! Stage F: inward-offset perimeter shells per layer, with optional
//! randomized shell starts to avoid a visible seam line.

use rand::Rng;
use rayon::prelude::*;

use crate::geometry::{offset, Path2};

/// Per-layer list of shell rings, outermost first (index 0).
pub type Perimeter = Vec<Path2>;

#[derive(Debug, Clone, Copy)]
pub struct PerimeterOptions {
    pub shell_count: usize,
    pub extrusion_width: f64,
    pub random_starts: bool,
}

/// Builds perimeters for every layer. Independent across layers, so this
/// runs on rayon's pool.
pub fn build_perimeters(layer_paths: &[Vec<Path2>], opts: &PerimeterOptions) -> Vec<Perimeter> {
    layer_paths
        .par_iter()
        .map(|paths| build_layer_perimeter(paths, opts))
        .collect()
}

fn build_layer_perimeter(paths: &[Path2], opts: &PerimeterOptions) -> Perimeter {
    let mut shells = Vec::with_capacity(opts.shell_count);
    for k in 0..opts.shell_count {
        let delta = -((k as f64 + 0.5) * opts.extrusion_width);
        let mut shell = offset(paths, delta);
        crate::geometry::close_paths(&mut shell);
        if opts.random_starts && k > 0 {
            let mut rng = rand::thread_rng();
            for ring in shell.iter_mut() {
                rotate_start(ring, rng.gen_range(0.0..1.0));
            }
        }
        shells.extend(shell);
    }
    shells
}

/// Rotates a closed ring's starting vertex by `floor(r * (n-1))` positions,
/// where `r` is a uniform fraction of the ring's vertex count.
fn rotate_start(ring: &mut Path2, r: f64) {
    if ring.len() < 3 {
        return;
    }
    // Ring is closed (first == last); rotate the open part, then re-close.
    let open_len = ring.len() - 1;
    if open_len < 2 {
        return;
    }
    let shift = (r * (open_len as f64 - 1.0)).floor() as usize % open_len;
    if shift == 0 {
        return;
    }
    let mut rotated = Vec::with_capacity(ring.len());
    rotated.extend_from_slice(&ring[shift..open_len]);
    rotated.extend_from_slice(&ring[0..shift]);
    rotated.push(rotated[0]);
    *ring = rotated;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f64) -> Path2 {
        vec![
            (-half, -half),
            (half, -half),
            (half, half),
            (-half, half),
            (-half, -half),
        ]
    }

    #[test]
    fn shell_count_matches_option() {
        let opts = PerimeterOptions {
            shell_count: 3,
            extrusion_width: 0.4,
            random_starts: false,
        };
        let layers = vec![vec![square(5.0)]];
        let perims = build_perimeters(&layers, &opts);
        assert_eq!(perims[0].len(), 3);
    }

    #[test]
    fn shell_zero_is_outermost() {
        let opts = PerimeterOptions {
            shell_count: 2,
            extrusion_width: 0.4,
            random_starts: false,
        };
        let layers = vec![vec![square(5.0)]];
        let perims = build_perimeters(&layers, &opts);
        let outer_bounds =
            crate::geometry::paths_bounds(std::slice::from_ref(&perims[0][0])).unwrap();
        let inner_bounds =
            crate::geometry::paths_bounds(std::slice::from_ref(&perims[0][1])).unwrap();
        assert!(outer_bounds.width() > inner_bounds.width());
    }

    #[test]
    fn no_random_starts_keeps_vertex_zero_stable() {
        let opts = PerimeterOptions {
            shell_count: 2,
            extrusion_width: 0.4,
            random_starts: false,
        };
        let layers = vec![vec![square(5.0)], vec![square(5.0)]];
        let perims = build_perimeters(&layers, &opts);
        assert_eq!(perims[0][0][0], perims[1][0][0]);
    }
}
