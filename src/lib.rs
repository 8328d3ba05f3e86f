//! # FDM slicer
//!
//! Converts a triangulated solid model (STL) into Marlin-dialect G-code for
//! fused-deposition printing.
//!
//! ## Architecture
//!
//! - **mesh**: point/edge/facet interning, STL ingestion, manifold check
//! - **core**: facet/plane intersection and per-layer segment stitching
//! - **geometry**: 2D polygon boolean ops (offset/union/diff/clip) and point
//!   quantization shared by every later stage
//! - **perimeters / masks / infill / support / adhesion**: the shell,
//!   solid-region, fill, overhang, and bed-adhesion stages
//! - **chainer**: joins touching polylines into longer printed paths
//! - **gcode**: Marlin command formatting and the emitter itself
//! - **config**: the typed option schema and flat-text loader
//!
//! ## Pipeline
//!
//! 1. Read and validate the mesh ([`mesh::read_stl`], [`mesh::check_manifold`])
//! 2. Assign facets to layers and slice each one ([`core`])
//! 3. Build perimeters, solid masks, infill, support, and adhesion
//! 4. Chain each nozzle's polylines and emit G-code ([`chainer`], [`gcode`])
//!
//! ```no_run
//! use fdm_slicer::{Slicer, config::Config};
//! use fdm_slicer::progress::NoOpThermometer;
//!
//! # fn example() -> fdm_slicer::error::Result<()> {
//! let slicer = Slicer::new(Config::default());
//! let mut thermometer = NoOpThermometer;
//! let result = slicer.slice_file("model.stl", &mut thermometer)?;
//! println!("{} layers, {:.1}s estimated build time", result.stats.num_layers, result.stats.build_time_s);
//! # Ok(())
//! # }
//! ```

pub mod adhesion;
pub mod chainer;
pub mod config;
pub mod core;
pub mod error;
pub mod gcode;
pub mod geometry;
pub mod infill;
pub mod masks;
pub mod mesh;
pub mod perimeters;
pub mod progress;
pub mod support;

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::adhesion::{build_adhesion, AdhesionOptions, AdhesionType};
use crate::chainer::chain_layer;
use crate::config::Config;
use crate::core::{assign_facets_to_layers, slice_all_layers};
use crate::error::{Result, SlicerError};
use crate::gcode::{emit_gcode, EmitterConfig, LayerBuckets, NozzleBucket};
use crate::geometry::Point2;
use crate::infill::{build_infill, InfillOptions, InfillType};
use crate::masks::build_masks;
use crate::mesh::{check_manifold, read_stl, ManifoldReport};
use crate::perimeters::{build_perimeters, PerimeterOptions};
use crate::progress::TextThermometer;
use crate::support::{build_support, SupportOptions, SupportType};

/// Labels the pipeline stage currently reporting progress, in execution
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlicePhase {
    ReadMesh,
    SliceLayers,
    Perimeters,
    Masks,
    Infill,
    Support,
    Adhesion,
    Chain,
    Emit,
}

impl SlicePhase {
    fn label(&self) -> &'static str {
        match self {
            SlicePhase::ReadMesh => "reading mesh",
            SlicePhase::SliceLayers => "slicing layers",
            SlicePhase::Perimeters => "building perimeters",
            SlicePhase::Masks => "building solid masks",
            SlicePhase::Infill => "building infill",
            SlicePhase::Support => "building support",
            SlicePhase::Adhesion => "building adhesion",
            SlicePhase::Chain => "chaining paths",
            SlicePhase::Emit => "emitting g-code",
        }
    }
}

/// Everything downstream code might want to know about a completed slice.
#[derive(Debug, Clone)]
pub struct SliceStats {
    pub facets_read: usize,
    pub facets_skipped_degenerate: usize,
    pub facets_skipped_malformed: usize,
    pub manifold: ManifoldReport,
    pub num_layers: usize,
    pub build_time_s: f64,
    pub config_hash: String,
}

#[derive(Debug, Clone)]
pub struct SliceResult {
    pub gcode: String,
    pub stats: SliceStats,
}

/// Owns a resolved configuration and runs the full mesh-to-G-code pipeline.
pub struct Slicer {
    config: Config,
}

impl Slicer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Slices `path` end to end, returning the generated G-code as a string
    /// plus summary statistics. `thermometer` receives a `set_target`/
    /// `update`/`clear` call per stage; pass [`progress::NoOpThermometer`]
    /// if progress reporting isn't needed.
    pub fn slice_file(&self, path: impl AsRef<Path>, thermometer: &mut dyn TextThermometer) -> Result<SliceResult> {
        let cfg = &self.config;
        let z_quantum = cfg.get_float("z_quantum");
        let layer_height = cfg.get_float("layer_height");
        let w = cfg.get_float("extrusion_width");

        thermometer.set_target(SlicePhase::ReadMesh.label(), 1);
        let (mesh, read_stats) = read_stl(path.as_ref(), z_quantum)?;
        thermometer.update(1);
        if mesh.is_empty() {
            return Err(SlicerError::EmptyMesh);
        }
        let manifold = check_manifold(&mesh);
        thermometer.clear();

        thermometer.set_target(SlicePhase::SliceLayers.label(), 1);
        let assignment = assign_facets_to_layers(&mesh, layer_height, z_quantum);
        let layer_paths = slice_all_layers(&mesh, &assignment);
        thermometer.update(1);
        thermometer.clear();
        info!(num_layers = assignment.num_layers, "sliced layers");

        let perim_opts = PerimeterOptions {
            shell_count: cfg.get_int("shell_count").max(0) as usize,
            extrusion_width: w,
            random_starts: cfg.get_bool("random_starts"),
        };
        thermometer.set_target(SlicePhase::Perimeters.label(), 1);
        let perimeters = build_perimeters(&layer_paths, &perim_opts);
        thermometer.update(1);
        thermometer.clear();

        thermometer.set_target(SlicePhase::Masks.label(), 1);
        let masks = build_masks(&perimeters);
        thermometer.update(1);
        thermometer.clear();

        let infill_type = InfillType::from_name(cfg.get("infill_type").unwrap_or("grid")).unwrap_or(InfillType::Grid);
        let infill_opts = InfillOptions {
            top_layers: cfg.get_int("top_layers").max(0) as usize,
            bot_layers: cfg.get_int("bot_layers").max(0) as usize,
            extrusion_width: w,
            infill_overlap: cfg.get_float("infill_overlap"),
            pattern: infill_type,
            density: cfg.get_float("infill_density"),
        };
        thermometer.set_target(SlicePhase::Infill.label(), 1);
        let infill = build_infill(&perimeters, &masks, &infill_opts);
        thermometer.update(1);
        thermometer.clear();

        let support_type = SupportType::from_name(cfg.get("support_type").unwrap_or("none")).unwrap_or(SupportType::None);
        let support_opts = SupportOptions {
            support_type,
            overhang_angle_deg: cfg.get_float("overhang_angle"),
            outset: cfg.get_float("support_outset"),
            extrusion_width: w,
            support_density: cfg.get_float("support_density"),
            infill_overlap: cfg.get_float("infill_overlap"),
        };
        thermometer.set_target(SlicePhase::Support.label(), 1);
        let support = build_support(&mesh, &assignment, &layer_paths, &support_opts);
        thermometer.update(1);
        thermometer.clear();

        let adhesion_type = AdhesionType::from_name(cfg.get("adhesion_type").unwrap_or("none")).unwrap_or(AdhesionType::None);
        let adhesion_opts = AdhesionOptions {
            adhesion_type,
            skirt_outset: cfg.get_float("skirt_outset"),
            brim_width: cfg.get_float("brim_width"),
            raft_outset: cfg.get_float("raft_outset"),
            raft_layer_count: cfg.get_int("raft_layers").max(1) as usize,
            extrusion_width: w,
        };
        thermometer.set_target(SlicePhase::Adhesion.label(), 1);
        let first_support_outline: &[crate::geometry::Path2] =
            support.first().map(|s| s.outline.as_slice()).unwrap_or(&[]);
        let first_layer: &[crate::geometry::Path2] = layer_paths.first().map(Vec::as_slice).unwrap_or(&[]);
        let adhesion = build_adhesion(first_layer, first_support_outline, &adhesion_opts);
        thermometer.update(1);
        thermometer.clear();

        thermometer.set_target(SlicePhase::Chain.label(), 1);
        let mut layers: Vec<LayerBuckets> = Vec::with_capacity(adhesion.raft_layers.len() + perimeters.len());

        for raft_layer in &adhesion.raft_layers {
            let mut nozzle0_paths = raft_layer.infill.clone();
            if !adhesion.raft_outline.is_empty() {
                nozzle0_paths.extend(adhesion.raft_outline.iter().cloned());
            }
            layers.push(raft_bucket(nozzle0_paths, w));
        }

        for layer in 0..perimeters.len() {
            let mut nozzle0: Vec<Vec<Point2>> = perimeters[layer].iter().cloned().collect();
            nozzle0.extend(infill[layer].solid.iter().cloned());
            nozzle0.extend(infill[layer].sparse.iter().cloned());
            if layer == 0 {
                nozzle0.extend(adhesion.skirt.iter().cloned());
                nozzle0.extend(adhesion.brim.iter().cloned());
            }
            let nozzle0 = chain_layer(nozzle0);

            let mut buckets: LayerBuckets = Default::default();
            buckets[0] = Some(NozzleBucket { paths: nozzle0, width: w });

            if support_type != SupportType::None {
                let mut nozzle1: Vec<Vec<Point2>> = support[layer].outline.iter().cloned().collect();
                nozzle1.extend(support[layer].infill.iter().cloned());
                let nozzle1 = chain_layer(nozzle1);
                if !nozzle1.is_empty() {
                    buckets[1] = Some(NozzleBucket { paths: nozzle1, width: w });
                }
            }
            layers.push(buckets);
        }
        thermometer.update(1);
        thermometer.clear();

        let config_hash = hash_config(cfg);
        let emitter_cfg = EmitterConfig {
            layer_height,
            bed_temp: Some(cfg.get_float("bed_temp")).filter(|t| *t > 0.0),
            hotend_temp: Some(cfg.get_float("nozzle_0_hotend_temp")).filter(|t| *t > 0.0),
            filament_diameter: std::array::from_fn(|i| cfg.get_float(&format!("nozzle_{}_filament_diam", i))),
            retract_extruder: cfg.get_float("retract_extruder"),
            retract_dist: cfg.get_float("retract_dist"),
            retract_speed: cfg.get_float("retract_speed"),
            retract_lift: cfg.get_float("retract_lift"),
            travel_rate_xy: cfg.get_float("travel_rate_xy"),
            travel_rate_z: cfg.get_float("travel_rate_z"),
            feed_rate: cfg.get_float("feed_rate"),
            nozzle_max_speed: std::array::from_fn(|i| cfg.get_float(&format!("nozzle_{}_max_speed", i))),
            config_hash: config_hash.clone(),
        };

        thermometer.set_target(SlicePhase::Emit.label(), 1);
        let mut buf = Vec::new();
        let state = emit_gcode(&mut buf, &layers, &emitter_cfg)?;
        thermometer.update(1);
        thermometer.clear();

        let gcode = String::from_utf8(buf).map_err(|e| SlicerError::Other(e.into()))?;
        Ok(SliceResult {
            gcode,
            stats: SliceStats {
                facets_read: read_stats.facets_read,
                facets_skipped_degenerate: read_stats.facets_skipped_degenerate,
                facets_skipped_malformed: read_stats.facets_skipped_malformed,
                manifold,
                num_layers: layers.len(),
                build_time_s: state.build_time_s,
                config_hash,
            },
        })
    }
}

fn raft_bucket(paths: Vec<Vec<Point2>>, width: f64) -> LayerBuckets {
    let mut buckets: LayerBuckets = Default::default();
    if !paths.is_empty() {
        buckets[0] = Some(NozzleBucket { paths: chain_layer(paths), width });
    }
    buckets
}

/// Hashes the resolved configuration's text form so every emitted G-code
/// file records exactly which settings produced it.
fn hash_config(cfg: &Config) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cfg.to_text().as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_is_deterministic() {
        let a = hash_config(&Config::default());
        let b = hash_config(&Config::default());
        assert_eq!(a, b);
    }

    #[test]
    fn config_hash_changes_with_settings() {
        let mut cfg = Config::default();
        let a = hash_config(&cfg);
        cfg.set("layer_height", "0.3").unwrap();
        let b = hash_config(&cfg);
        assert_ne!(a, b);
    }
}
