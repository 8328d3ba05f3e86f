//! Stage I: skirt, brim, and raft generation.

use crate::geometry::{close_paths, offset, union, Path2, Point2};
use crate::infill::pattern::{make_infill_lines, InfillType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdhesionType {
    None,
    Brim,
    Raft,
}

impl AdhesionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "brim" => Some(Self::Brim),
            "raft" => Some(Self::Raft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdhesionOptions {
    pub adhesion_type: AdhesionType,
    pub skirt_outset: f64,
    pub brim_width: f64,
    pub raft_outset: f64,
    pub raft_layer_count: usize,
    pub extrusion_width: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RaftLayer {
    pub infill: Vec<Vec<Point2>>,
}

#[derive(Debug, Clone, Default)]
pub struct AdhesionOutput {
    pub skirt: Vec<Path2>,
    pub brim: Vec<Path2>,
    pub raft_outline: Vec<Path2>,
    pub raft_layers: Vec<RaftLayer>,
}

/// Builds skirt/brim/raft geometry from the first printed layer's outline
/// and its support outline, if any.
pub fn build_adhesion(
    first_layer_paths: &[Path2],
    first_layer_support_outline: &[Path2],
    opts: &AdhesionOptions,
) -> AdhesionOutput {
    let w = opts.extrusion_width;
    let base = union(first_layer_paths, first_layer_support_outline);

    let skirt_mask = offset(&base, opts.skirt_outset);
    let mut skirt = offset(&skirt_mask, opts.brim_width + opts.skirt_outset + w / 2.0);
    close_paths(&mut skirt);

    let mut brim = Vec::new();
    if opts.adhesion_type == AdhesionType::Brim {
        let ring_count = (opts.brim_width / w).ceil().max(0.0) as usize;
        for i in 0..ring_count {
            let mut ring = offset(first_layer_paths, (i as f64 + 0.5) * w);
            close_paths(&mut ring);
            brim.extend(ring);
        }
    }

    let mut raft_outline = Vec::new();
    let mut raft_layers = Vec::new();
    if opts.adhesion_type == AdhesionType::Raft {
        // `raft_outset` is intentionally counted twice here, matching the
        // deposited behavior this was ported from bit-for-bit.
        let outset_val = opts.raft_outset
            + (opts.skirt_outset + w).max(opts.raft_outset + w);
        raft_outline = offset(&base, outset_val);
        let bounds = match crate::geometry::paths_bounds(&raft_outline) {
            Some(b) => b,
            None => return AdhesionOutput { skirt, brim, raft_outline, raft_layers },
        };
        for layer in 0..opts.raft_layer_count {
            let (angle, density) = if layer == 0 {
                (0.0, 0.75)
            } else if layer % 2 == 1 {
                (90.0, 1.0)
            } else {
                (0.0, 1.0)
            };
            let lines = make_infill_lines(bounds, angle, InfillType::Lines, density, w);
            let infill = lines
                .into_iter()
                .flat_map(|(a, b)| crate::geometry::clip_polyline(&[a, b], &raft_outline))
                .collect();
            raft_layers.push(RaftLayer { infill });
        }
    }

    AdhesionOutput {
        skirt,
        brim,
        raft_outline,
        raft_layers,
    }
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

    fn opts(t: AdhesionType) -> AdhesionOptions {
        AdhesionOptions {
            adhesion_type: t,
            skirt_outset: 2.0,
            brim_width: 2.0,
            raft_outset: 3.0,
            raft_layer_count: 3,
            extrusion_width: 0.4,
        }
    }

    #[test]
    fn skirt_is_always_produced() {
        let out = build_adhesion(&[square(5.0)], &[], &opts(AdhesionType::None));
        assert!(!out.skirt.is_empty());
        assert!(out.brim.is_empty());
        assert!(out.raft_outline.is_empty());
    }

    #[test]
    fn brim_produces_expected_ring_count() {
        let out = build_adhesion(&[square(5.0)], &[], &opts(AdhesionType::Brim));
        assert_eq!(out.brim.len(), 5);
    }

    #[test]
    fn raft_produces_configured_layer_count() {
        let out = build_adhesion(&[square(5.0)], &[], &opts(AdhesionType::Raft));
        assert_eq!(out.raft_layers.len(), 3);
        assert!(!out.raft_outline.is_empty());
    }

    #[test]
    fn raft_first_layer_is_lower_density_than_later_layers() {
        let out = build_adhesion(&[square(5.0)], &[], &opts(AdhesionType::Raft));
        assert!(out.raft_layers[0].infill.len() <= out.raft_layers[1].infill.len());
    }
}
