//! Stage L: Marlin G-code synthesis from chained, width-annotated polylines.

use std::io::{self, Write};

use crate::error::{Result, SlicerError};
use crate::gcode::commands::*;
use crate::gcode::state::ExtrusionState;
use crate::geometry::Point2;

pub const NOZZLE_COUNT: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct NozzleBucket {
    pub paths: Vec<Vec<Point2>>,
    pub width: f64,
}

pub type LayerBuckets = [Option<NozzleBucket>; NOZZLE_COUNT];

#[derive(Debug, Clone)]
pub struct EmitterConfig {
    pub layer_height: f64,
    pub bed_temp: Option<f64>,
    pub hotend_temp: Option<f64>,
    /// Filament diameter per nozzle, fixed to read the filament (not
    /// nozzle) diameter key when computing extrusion volume.
    pub filament_diameter: [f64; NOZZLE_COUNT],
    pub retract_extruder: f64,
    pub retract_dist: f64,
    pub retract_speed: f64,
    pub retract_lift: f64,
    pub travel_rate_xy: f64,
    pub travel_rate_z: f64,
    pub feed_rate: f64,
    pub nozzle_max_speed: [f64; NOZZLE_COUNT],
    pub config_hash: String,
}

/// Computes the extrusion-length delta for a move of length `d` with bead
/// width `w`, layer height `h`, and filament diameter `fil_diam` — the
/// cross-sectional-area ratio between the deposited bead and the filament.
fn extrusion_delta(d: f64, w: f64, h: f64, fil_diam: f64) -> f64 {
    let bead_area = std::f64::consts::PI * (w / 2.0) * (h / 2.0);
    let filament_area = std::f64::consts::PI * (fil_diam / 2.0).powi(2);
    d * bead_area / filament_area
}

fn segment_len(a: Point2, b: Point2) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Emits the full program for `layers` (including any raft layers, already
/// folded into the sequence by the caller) to `out`.
pub fn emit_gcode<W: Write>(out: &mut W, layers: &[LayerBuckets], cfg: &EmitterConfig) -> Result<ExtrusionState> {
    let mut state = ExtrusionState::default();
    write_prelude(out, layers.len(), cfg)?;

    for (layer_idx, buckets) in layers.iter().enumerate() {
        writeln!(out, "{}", layer_marker(layer_idx)).map_err(SlicerError::OutputIo)?;
        let z = cfg.layer_height * (layer_idx as f64 + 1.0);

        for (nozzle, bucket) in buckets.iter().enumerate() {
            let bucket = match bucket {
                Some(b) if !b.paths.is_empty() => b,
                _ => continue,
            };

            if state.nozzle != nozzle {
                emit_tool_change(out, &mut state, nozzle, cfg)?;
            }

            for polyline in &bucket.paths {
                emit_polyline(out, &mut state, polyline, bucket.width, z, cfg)?;
            }
        }
    }

    Ok(state)
}

fn write_prelude<W: Write>(out: &mut W, num_layers: usize, cfg: &EmitterConfig) -> Result<()> {
    let write = |out: &mut W, line: &str| -> io::Result<()> { writeln!(out, "{}", line) };

    write(out, ";FLAVOR:Marlin").map_err(SlicerError::OutputIo)?;
    write(out, &format!("; config_hash:{}", cfg.config_hash)).map_err(SlicerError::OutputIo)?;
    write(out, "M82").map_err(SlicerError::OutputIo)?;
    write(out, "G21").map_err(SlicerError::OutputIo)?;
    write(out, "G90").map_err(SlicerError::OutputIo)?;
    write(out, "M107").map_err(SlicerError::OutputIo)?;
    if let Some(t) = cfg.bed_temp {
        write(out, &format!("M140 S{:.0}", t)).map_err(SlicerError::OutputIo)?;
        write(out, &format!("M190 S{:.0}", t)).map_err(SlicerError::OutputIo)?;
    }
    if let Some(t) = cfg.hotend_temp {
        write(out, &format!("M104 S{:.0}", t)).map_err(SlicerError::OutputIo)?;
        write(out, &format!("M109 S{:.0}", t)).map_err(SlicerError::OutputIo)?;
    }
    write(out, "G28 X0 Y0").map_err(SlicerError::OutputIo)?;
    write(out, "G28 Z0").map_err(SlicerError::OutputIo)?;
    write(out, &g0_z(15.0, cfg.travel_rate_z)).map_err(SlicerError::OutputIo)?;
    write(out, "G92 E0").map_err(SlicerError::OutputIo)?;
    write(out, &layer_count(num_layers)).map_err(SlicerError::OutputIo)?;
    Ok(())
}

fn emit_tool_change<W: Write>(
    out: &mut W,
    state: &mut ExtrusionState,
    nozzle: usize,
    cfg: &EmitterConfig,
) -> Result<()> {
    state.e -= cfg.retract_extruder;
    writeln!(out, "{}", g1_e(state.e, cfg.retract_speed)).map_err(SlicerError::OutputIo)?;
    writeln!(out, "{}", tool_change(nozzle)).map_err(SlicerError::OutputIo)?;
    state.e += cfg.retract_extruder;
    writeln!(out, "{}", g1_e(state.e, cfg.retract_speed)).map_err(SlicerError::OutputIo)?;
    state.nozzle = nozzle;
    Ok(())
}

fn emit_polyline<W: Write>(
    out: &mut W,
    state: &mut ExtrusionState,
    polyline: &[Point2],
    width: f64,
    z: f64,
    cfg: &EmitterConfig,
) -> Result<()> {
    if polyline.len() < 2 {
        return Ok(());
    }
    let start = polyline[0];
    let lifted = cfg.retract_lift > 0.0;
    let travel_z = if lifted { z + cfg.retract_lift } else { z };

    if lifted || (state.z - z).abs() > 1e-9 {
        writeln!(out, "{}", g0_z(travel_z, cfg.travel_rate_z)).map_err(SlicerError::OutputIo)?;
        state.build_time_s += (travel_z - state.z).abs() / cfg.travel_rate_z;
        state.z = travel_z;
    }

    let travel_dist = segment_len(state.pos_xy(), start);
    writeln!(out, "{}", g0_xy(start.0, start.1, cfg.travel_rate_xy)).map_err(SlicerError::OutputIo)?;
    state.build_time_s += travel_dist / cfg.travel_rate_xy;
    state.x = start.0;
    state.y = start.1;

    if lifted {
        writeln!(out, "{}", g0_z(z, cfg.travel_rate_z)).map_err(SlicerError::OutputIo)?;
        state.build_time_s += cfg.retract_lift / cfg.travel_rate_z;
        state.z = z;
    }

    state.e += cfg.retract_dist;
    writeln!(out, "{}", g1_e(state.e, cfg.retract_speed)).map_err(SlicerError::OutputIo)?;

    let fil_diam = cfg.filament_diameter[state.nozzle];
    let speed = cfg.feed_rate.min(cfg.nozzle_max_speed[state.nozzle]);
    for &(vx, vy) in &polyline[1..] {
        let d = segment_len(state.pos_xy(), (vx, vy));
        let delta_e = extrusion_delta(d, width, cfg.layer_height, fil_diam);
        state.e += delta_e;
        writeln!(out, "{}", g1_xye(vx, vy, state.e, speed)).map_err(SlicerError::OutputIo)?;
        state.build_time_s += d / cfg.feed_rate;
        state.x = vx;
        state.y = vy;
    }

    state.e -= cfg.retract_dist;
    writeln!(out, "{}", g1_e(state.e, cfg.retract_speed)).map_err(SlicerError::OutputIo)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> EmitterConfig {
        EmitterConfig {
            layer_height: 0.2,
            bed_temp: Some(60.0),
            hotend_temp: Some(200.0),
            filament_diameter: [1.75; NOZZLE_COUNT],
            retract_extruder: 4.0,
            retract_dist: 1.0,
            retract_speed: 35.0,
            retract_lift: 0.2,
            travel_rate_xy: 150.0,
            travel_rate_z: 10.0,
            feed_rate: 60.0,
            nozzle_max_speed: [80.0; NOZZLE_COUNT],
            config_hash: "deadbeef".to_string(),
        }
    }

    #[test]
    fn empty_layers_produce_only_prelude() {
        let mut buf = Vec::new();
        let cfg = test_cfg();
        emit_gcode::<Vec<u8>>(&mut buf, &[], &cfg).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(";FLAVOR:Marlin"));
        assert!(text.contains(";LAYER_COUNT:0"));
        assert!(!text.contains(";LAYER:"));
    }

    #[test]
    fn single_polyline_extrudes_monotonically() {
        let mut buf = Vec::new();
        let cfg = test_cfg();
        let mut bucket: LayerBuckets = Default::default();
        bucket[0] = Some(NozzleBucket {
            paths: vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]],
            width: 0.4,
        });
        let state = emit_gcode(&mut buf, &[bucket], &cfg).unwrap();
        // Retract/prime pairs sum to zero within a path: final E equals the
        // nonzero extrusion from real moves, not residual prime.
        assert!(state.e > 0.0);
    }

    #[test]
    fn extrusion_delta_scales_with_width_and_length() {
        let a = extrusion_delta(10.0, 0.4, 0.2, 1.75);
        let b = extrusion_delta(20.0, 0.4, 0.2, 1.75);
        assert!((b - 2.0 * a).abs() < 1e-9);
    }

    #[test]
    fn first_data_line_is_flavor_marker() {
        let mut buf = Vec::new();
        let cfg = test_cfg();
        emit_gcode::<Vec<u8>>(&mut buf, &[], &cfg).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ";FLAVOR:Marlin");
    }
}
