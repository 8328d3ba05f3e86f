//! Stage J: per-layer solid and sparse infill, clipped to masks derived
//! from the top/bottom solid-region detector.

pub mod pattern;

use rayon::prelude::*;

pub use pattern::InfillType;

use crate::geometry::{clip_polyline, diff, offset, paths_bounds, union, Path2, Point2};
use crate::masks::LayerMasks;
use crate::perimeters::Perimeter;

#[derive(Debug, Clone, Copy)]
pub struct InfillOptions {
    pub top_layers: usize,
    pub bot_layers: usize,
    pub extrusion_width: f64,
    pub infill_overlap: f64,
    pub pattern: InfillType,
    pub density: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayerInfill {
    pub solid: Vec<Vec<Point2>>,
    pub sparse: Vec<Vec<Point2>>,
}

fn innermost(perimeter: &Perimeter) -> &[Path2] {
    perimeter.last().map(std::slice::from_ref).unwrap_or(&[])
}

fn solid_mask_for(layer: usize, masks: &[LayerMasks], opts: &InfillOptions) -> Vec<Path2> {
    let last = masks.len().saturating_sub(1);
    let top_hi = (layer + opts.top_layers.saturating_sub(1)).min(last);
    let bot_lo = layer.saturating_sub(opts.bot_layers.saturating_sub(1));

    let mut acc: Vec<Path2> = Vec::new();
    for i in layer..=top_hi {
        acc = union(&acc, &masks[i].top);
    }
    for i in bot_lo..=layer {
        acc = union(&acc, &masks[i].bot);
    }
    acc
}

/// Builds solid and sparse infill for every layer. Layers are independent.
pub fn build_infill(perimeters: &[Perimeter], masks: &[LayerMasks], opts: &InfillOptions) -> Vec<LayerInfill> {
    (0..perimeters.len())
        .into_par_iter()
        .map(|layer| build_layer_infill(layer, perimeters, masks, opts))
        .collect()
}

fn build_layer_infill(
    layer: usize,
    perimeters: &[Perimeter],
    masks: &[LayerMasks],
    opts: &InfillOptions,
) -> LayerInfill {
    let inner = innermost(&perimeters[layer]);
    let bounds = match paths_bounds(inner) {
        Some(b) => b,
        None => return LayerInfill::default(),
    };

    let raw_solid_mask = solid_mask_for(layer, masks, opts);
    let solid_mask = crate::geometry::intersection(&raw_solid_mask, inner);

    let solid_angle = if layer % 2 == 0 { 45.0 } else { -45.0 };
    let solid_lines = pattern::make_infill_lines(bounds, solid_angle, InfillType::Lines, 1.0, opts.extrusion_width);
    let solid_clip_mask = offset(&solid_mask, opts.infill_overlap - opts.extrusion_width);
    let solid = clip_all(&solid_lines, &solid_clip_mask);

    let density = opts.density;
    if density <= 0.0 {
        return LayerInfill { solid, sparse: Vec::new() };
    }

    let sparse_mask = diff(
        &offset(inner, opts.infill_overlap - opts.extrusion_width),
        &solid_mask,
    );

    let effective_pattern = if density >= 0.99 { InfillType::Lines } else { opts.pattern };
    let angle = sparse_angle(effective_pattern, layer);
    let sparse_lines = pattern::make_infill_lines(bounds, angle, effective_pattern, density, opts.extrusion_width);
    let sparse = clip_all(&sparse_lines, &sparse_mask);

    LayerInfill { solid, sparse }
}

fn sparse_angle(pattern: InfillType, layer: usize) -> f64 {
    let even = layer % 2 == 0;
    match pattern {
        InfillType::Lines => if even { 135.0 } else { 45.0 },
        InfillType::Triangles => 60.0 * (layer % 3) as f64,
        InfillType::Grid => if even { 135.0 } else { 45.0 },
        InfillType::Hexagons => 120.0 * (layer % 3) as f64,
    }
}

fn clip_all(lines: &[(Point2, Point2)], mask: &[Path2]) -> Vec<Vec<Point2>> {
    if mask.is_empty() {
        return Vec::new();
    }
    lines
        .iter()
        .flat_map(|&(a, b)| clip_polyline(&[a, b], mask))
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

    fn opts() -> InfillOptions {
        InfillOptions {
            top_layers: 3,
            bot_layers: 3,
            extrusion_width: 0.4,
            infill_overlap: 0.2,
            pattern: InfillType::Grid,
            density: 0.2,
        }
    }

    #[test]
    fn interior_layer_has_sparse_but_no_solid() {
        let perims: Vec<Perimeter> = (0..10).map(|_| vec![square(5.0), square(4.6)]).collect();
        let masks = vec![LayerMasks::default(); 10];
        let infill = build_infill(&perims, &masks, &opts());
        assert!(infill[5].solid.is_empty());
        assert!(!infill[5].sparse.is_empty());
    }

    #[test]
    fn zero_density_has_no_sparse_infill() {
        let perims: Vec<Perimeter> = (0..3).map(|_| vec![square(5.0), square(4.6)]).collect();
        let masks = vec![LayerMasks::default(); 3];
        let mut o = opts();
        o.density = 0.0;
        let infill = build_infill(&perims, &masks, &o);
        assert!(infill[0].sparse.is_empty());
    }

    #[test]
    fn high_density_promotes_to_lines_pattern() {
        assert_eq!(sparse_angle(InfillType::Lines, 0), 135.0);
        assert_eq!(sparse_angle(InfillType::Lines, 1), 45.0);
    }
}
