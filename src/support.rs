//! Stage H: overhang detection and support region computation.

use crate::core::LayerAssignment;
use crate::geometry::{diff, offset, orient_path, paths_bounds, union, Path2, Point2};
use crate::infill::pattern::{make_infill_lines, InfillType};
use crate::mesh::store::Mesh;
use crate::perimeters::Perimeter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportType {
    None,
    External,
    Everywhere,
}

impl SupportType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "external" => Some(Self::External),
            "everywhere" | "all" => Some(Self::Everywhere),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SupportOptions {
    pub support_type: SupportType,
    pub overhang_angle_deg: f64,
    pub outset: f64,
    pub extrusion_width: f64,
    pub support_density: f64,
    pub infill_overlap: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayerSupport {
    pub outline: Vec<Path2>,
    pub infill: Vec<Vec<Point2>>,
}

/// Computes per-layer support outlines and infill. Returns all-empty output
/// when `support_type` is `None`.
pub fn build_support(
    mesh: &Mesh,
    assignment: &LayerAssignment,
    layer_paths: &[Vec<Path2>],
    opts: &SupportOptions,
) -> Vec<LayerSupport> {
    let n = assignment.num_layers;
    if opts.support_type == SupportType::None || n == 0 {
        return vec![LayerSupport::default(); n];
    }

    let facets_by_layer = assign_support_facets(mesh, assignment);
    let drop_paths = top_down_drop_masks(mesh, &facets_by_layer, assignment, opts.overhang_angle_deg);
    let shadow_masks = bottom_up_shadow_masks(layer_paths, opts);

    let w = opts.extrusion_width;
    (0..n)
        .map(|layer| {
            let overhang = diff(&drop_paths[layer], &shadow_masks[layer]);
            let refined = refine_overhang(&overhang, w);
            let outline = offset(&refined, -w / 2.0);
            if outline.is_empty() {
                return LayerSupport::default();
            }
            let bounds = match paths_bounds(&outline) {
                Some(b) => b,
                None => return LayerSupport { outline, infill: Vec::new() },
            };
            let clip_mask = offset(&outline, opts.infill_overlap - w);
            let lines = make_infill_lines(bounds, 0.0, InfillType::Lines, opts.support_density, w);
            let infill = lines
                .into_iter()
                .flat_map(|(a, b)| crate::geometry::clip_polyline(&[a, b], &clip_mask))
                .collect();
            LayerSupport { outline, infill }
        })
        .collect()
}

/// Assigns each facet to every layer its Z range covers, using
/// `ceil(minz/h) .. floor(maxz/h)` inclusive (distinct from the slicer's own
/// `floor(...+0.01)..ceil(...-0.01)` rule: support only cares about whole
/// layers fully spanned by the facet, not partially grazed ones).
fn assign_support_facets(
    mesh: &Mesh,
    assignment: &LayerAssignment,
) -> Vec<Vec<crate::mesh::store::FacetId>> {
    let h = assignment.layer_height;
    let mut by_layer = vec![Vec::new(); assignment.num_layers];
    for (id, facet) in mesh.facets.iter() {
        let p = [
            mesh.points.get(facet.v[0]),
            mesh.points.get(facet.v[1]),
            mesh.points.get(facet.v[2]),
        ];
        let minz = p[0].z.min(p[1].z).min(p[2].z) - assignment.min_z;
        let maxz = p[0].z.max(p[1].z).max(p[2].z) - assignment.min_z;
        let lo = (minz / h).ceil().max(0.0) as usize;
        let hi_f = (maxz / h).floor();
        if hi_f < 0.0 {
            continue;
        }
        let hi = (hi_f as usize).min(assignment.num_layers.saturating_sub(1));
        if lo > hi {
            continue;
        }
        for layer in lo..=hi {
            by_layer[layer].push(id);
        }
    }
    by_layer
}

fn overhang_angle_deg(normal: (f64, f64, f64)) -> f64 {
    let len = (normal.0 * normal.0 + normal.1 * normal.1 + normal.2 * normal.2).sqrt();
    if len < 1e-12 {
        return 0.0;
    }
    let cos_theta = (-normal.2 / len).clamp(-1.0, 1.0);
    let angle_between = cos_theta.acos().to_degrees();
    90.0 - angle_between
}

fn facet_footprint(mesh: &Mesh, facet_id: crate::mesh::store::FacetId) -> Path2 {
    let facet = mesh.facets.get(facet_id);
    let p = [
        mesh.points.get(facet.v[0]).xy(),
        mesh.points.get(facet.v[1]).xy(),
        mesh.points.get(facet.v[2]).xy(),
    ];
    let mut path = vec![p[0], p[1], p[2], p[0]];
    orient_path(&mut path, true);
    path
}

/// Iterates layers top-down, accumulating a drop mask: overhanging facets
/// (`adds`) union in, facets within the overhang-angle threshold (`diffs`)
/// subtract back out. Returns the drop mask snapshot taken after processing
/// each layer.
fn top_down_drop_masks(
    mesh: &Mesh,
    facets_by_layer: &[Vec<crate::mesh::store::FacetId>],
    assignment: &LayerAssignment,
    threshold_deg: f64,
) -> Vec<Vec<Path2>> {
    let n = assignment.num_layers;
    let mut drop_mask: Vec<Path2> = Vec::new();
    let mut snapshots = vec![Vec::new(); n];
    for layer in (0..n).rev() {
        let mut adds: Vec<Path2> = Vec::new();
        let mut diffs: Vec<Path2> = Vec::new();
        for &facet_id in &facets_by_layer[layer] {
            let facet = mesh.facets.get(facet_id);
            let footprint = facet_footprint(mesh, facet_id);
            if overhang_angle_deg(facet.normal) >= threshold_deg {
                adds = union(&adds, &[footprint]);
            } else {
                diffs = union(&diffs, &[footprint]);
            }
        }
        drop_mask = union(&drop_mask, &adds);
        drop_mask = diff(&drop_mask, &diffs);
        snapshots[layer] = drop_mask.clone();
    }
    snapshots
}

/// Iterates layers bottom-up, computing each layer's printed-shadow mask.
/// In `External` mode, the shadow mask is the running cumulative union of
/// every shadow seen so far, so overhangs already inside prior model extent
/// never get support.
fn bottom_up_shadow_masks(layer_paths: &[Vec<Path2>], opts: &SupportOptions) -> Vec<Vec<Path2>> {
    let n = layer_paths.len();
    let mut result = vec![Vec::new(); n];
    let mut cumulative: Vec<Path2> = Vec::new();
    for layer in 0..n {
        let mut shadow = offset(&layer_paths[layer], opts.outset);
        if layer + 1 < n {
            shadow = union(&shadow, &layer_paths[layer + 1]);
        }
        if opts.support_type == SupportType::Everywhere && layer > 0 {
            shadow = union(&shadow, &layer_paths[layer - 1]);
        }
        if opts.support_type == SupportType::External {
            cumulative = union(&cumulative, &shadow);
            result[layer] = cumulative.clone();
        } else {
            result[layer] = shadow;
        }
    }
    result
}

/// Open-close morphology (`+w`, `-2w`, `+w`) to remove thin slivers from a
/// raw overhang region.
fn refine_overhang(overhang: &[Path2], w: f64) -> Vec<Path2> {
    let a = offset(overhang, w);
    let b = offset(&a, -2.0 * w);
    offset(&b, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_downward_facet_is_fully_overhanging() {
        assert!((overhang_angle_deg((0.0, 0.0, -1.0)) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_facet_has_zero_overhang_angle() {
        assert!(overhang_angle_deg((1.0, 0.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn support_none_yields_all_empty_layers() {
        let mesh = Mesh::new(1e-3);
        let assignment = crate::core::assign_facets_to_layers(&mesh, 0.2, 1e-3);
        let opts = SupportOptions {
            support_type: SupportType::None,
            overhang_angle_deg: 45.0,
            outset: 0.5,
            extrusion_width: 0.4,
            support_density: 0.2,
            infill_overlap: 0.2,
        };
        let out = build_support(&mesh, &assignment, &[], &opts);
        assert!(out.is_empty() || out.iter().all(|l| l.outline.is_empty()));
    }

    #[test]
    fn from_name_parses_known_variants() {
        assert_eq!(SupportType::from_name("External"), Some(SupportType::External));
        assert_eq!(SupportType::from_name("everywhere"), Some(SupportType::Everywhere));
        assert_eq!(SupportType::from_name("nope"), None);
    }
}
