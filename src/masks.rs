//! Stage G: per-layer top/bottom solid masks, derived from the outermost
//! perimeter shell of each layer and its vertical neighbors.

use rayon::prelude::*;

use crate::geometry::{diff, Path2};
use crate::perimeters::Perimeter;

/// Per-layer top and bottom solid-region masks.
#[derive(Debug, Clone, Default)]
pub struct LayerMasks {
    pub top: Vec<Path2>,
    pub bot: Vec<Path2>,
}

fn outer_shell(perimeters: &[Perimeter], layer: isize) -> &[Path2] {
    if layer < 0 || layer as usize >= perimeters.len() {
        &[]
    } else {
        perimeters[layer as usize].first().map(std::slice::from_ref).unwrap_or(&[])
    }
}

/// `top_mask[i] = diff(perim0[i], perim0[i+1])`,
/// `bot_mask[i] = diff(perim0[i], perim0[i-1])`, with out-of-range
/// neighbors treated as empty.
pub fn build_masks(perimeters: &[Perimeter]) -> Vec<LayerMasks> {
    (0..perimeters.len())
        .into_par_iter()
        .map(|i| {
            let here = outer_shell(perimeters, i as isize);
            let above = outer_shell(perimeters, i as isize + 1);
            let below = outer_shell(perimeters, i as isize - 1);
            LayerMasks {
                top: diff(here, above),
                bot: diff(here, below),
            }
        })
        .collect()
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

    fn uniform_column(layers: usize) -> Vec<Perimeter> {
        (0..layers).map(|_| vec![square(5.0)]).collect()
    }

    #[test]
    fn interior_layer_of_uniform_column_has_empty_masks() {
        let perims = uniform_column(5);
        let masks = build_masks(&perims);
        assert!(masks[2].top.is_empty());
        assert!(masks[2].bot.is_empty());
    }

    #[test]
    fn top_layer_mask_equals_its_own_outer_shell() {
        let perims = uniform_column(5);
        let masks = build_masks(&perims);
        let last = perims.len() - 1;
        assert!(!masks[last].top.is_empty());
        assert_eq!(
            crate::geometry::paths_bounds(&masks[last].top),
            crate::geometry::paths_bounds(&perims[last])
        );
    }

    #[test]
    fn bottom_layer_mask_equals_its_own_outer_shell() {
        let perims = uniform_column(5);
        let masks = build_masks(&perims);
        assert!(!masks[0].bot.is_empty());
    }
}
