//! Compile-time-known configuration schema: six sections, each an ordered
//! list of typed option descriptors. Loading and setting both go through
//! the same validated path in [`crate::config::loader`].

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionType {
    Bool,
    Int,
    Float,
    Enum,
}

#[derive(Debug, Clone, Copy)]
pub enum OptionRange {
    IntRange(i64, i64),
    FloatRange(f64, f64),
    Enum(&'static [&'static str]),
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub section: &'static str,
    pub name: &'static str,
    pub kind: OptionType,
    pub default: &'static str,
    pub range: OptionRange,
    pub description: &'static str,
}

macro_rules! nozzle_keys {
    ($prefix:literal, $suffix:literal) => {
        [
            concat!($prefix, "0", $suffix),
            concat!($prefix, "1", $suffix),
            concat!($prefix, "2", $suffix),
            concat!($prefix, "3", $suffix),
        ]
    };
}

const NOZZLE_DIAM_KEYS: [&str; 4] = nozzle_keys!("nozzle_", "_diam");
const NOZZLE_FILAMENT_DIAM_KEYS: [&str; 4] = nozzle_keys!("nozzle_", "_filament_diam");
const NOZZLE_MAX_SPEED_KEYS: [&str; 4] = nozzle_keys!("nozzle_", "_max_speed");
const NOZZLE_HOTEND_TEMP_KEYS: [&str; 4] = nozzle_keys!("nozzle_", "_hotend_temp");

pub const SCHEMA: &[OptionSpec] = &[
    // --- Quality ---
    OptionSpec { section: "Quality", name: "layer_height", kind: OptionType::Float, default: "0.2", range: OptionRange::FloatRange(0.01, 0.50), description: "Layer height in mm" },
    OptionSpec { section: "Quality", name: "first_layer_height", kind: OptionType::Float, default: "0.2", range: OptionRange::FloatRange(0.01, 0.50), description: "First layer height in mm" },
    OptionSpec { section: "Quality", name: "z_quantum", kind: OptionType::Float, default: "0.001", range: OptionRange::FloatRange(0.0001, 0.01), description: "Z coordinate quantization step in mm" },
    OptionSpec { section: "Quality", name: "shell_count", kind: OptionType::Int, default: "2", range: OptionRange::IntRange(0, 20), description: "Number of perimeter shells" },
    OptionSpec { section: "Quality", name: "extrusion_width", kind: OptionType::Float, default: "0.45", range: OptionRange::FloatRange(0.05, 2.0), description: "Extrusion bead width in mm" },
    OptionSpec { section: "Quality", name: "top_layers", kind: OptionType::Int, default: "4", range: OptionRange::IntRange(0, 20), description: "Number of solid top layers" },
    OptionSpec { section: "Quality", name: "bot_layers", kind: OptionType::Int, default: "4", range: OptionRange::IntRange(0, 20), description: "Number of solid bottom layers" },
    OptionSpec { section: "Quality", name: "infill_density", kind: OptionType::Float, default: "0.2", range: OptionRange::FloatRange(0.0, 1.0), description: "Sparse infill density fraction" },
    OptionSpec { section: "Quality", name: "infill_type", kind: OptionType::Enum, default: "grid", range: OptionRange::Enum(&["lines", "triangles", "grid", "hexagons"]), description: "Sparse infill pattern" },
    OptionSpec { section: "Quality", name: "infill_overlap", kind: OptionType::Float, default: "0.15", range: OptionRange::FloatRange(-1.0, 1.0), description: "Infill-to-perimeter overlap in mm" },
    OptionSpec { section: "Quality", name: "random_starts", kind: OptionType::Bool, default: "true", range: OptionRange::None, description: "Randomize inner shell start vertex to hide seams" },
    OptionSpec { section: "Quality", name: "first_layer_speed_factor", kind: OptionType::Float, default: "0.5", range: OptionRange::FloatRange(0.05, 2.0), description: "First layer speed as a fraction of feed_rate" },
    OptionSpec { section: "Quality", name: "small_perimeter_factor", kind: OptionType::Float, default: "0.5", range: OptionRange::FloatRange(0.05, 2.0), description: "Speed factor applied to small perimeters" },
    OptionSpec { section: "Quality", name: "external_perimeter_speed_factor", kind: OptionType::Float, default: "0.8", range: OptionRange::FloatRange(0.05, 2.0), description: "Speed factor applied to the outermost shell" },
    OptionSpec { section: "Quality", name: "top_solid_infill_speed_factor", kind: OptionType::Float, default: "0.7", range: OptionRange::FloatRange(0.05, 2.0), description: "Speed factor applied to top solid infill" },
    OptionSpec { section: "Quality", name: "min_layer_time", kind: OptionType::Float, default: "5.0", range: OptionRange::FloatRange(0.0, 300.0), description: "Minimum time to spend per layer in seconds, slowing down if needed" },
    OptionSpec { section: "Quality", name: "cooling_enabled", kind: OptionType::Bool, default: "true", range: OptionRange::None, description: "Enable part-cooling fan control" },
    OptionSpec { section: "Quality", name: "fan_speed_initial", kind: OptionType::Float, default: "0.0", range: OptionRange::FloatRange(0.0, 100.0), description: "Part-cooling fan speed for the first few layers, percent" },
    OptionSpec { section: "Quality", name: "fan_speed_regular", kind: OptionType::Float, default: "100.0", range: OptionRange::FloatRange(0.0, 100.0), description: "Part-cooling fan speed for the remaining layers, percent" },

    // --- Support ---
    OptionSpec { section: "Support", name: "support_type", kind: OptionType::Enum, default: "none", range: OptionRange::Enum(&["none", "external", "everywhere"]), description: "Support generation mode" },
    OptionSpec { section: "Support", name: "overhang_angle", kind: OptionType::Float, default: "45.0", range: OptionRange::FloatRange(0.0, 90.0), description: "Overhang angle threshold in degrees" },
    OptionSpec { section: "Support", name: "support_outset", kind: OptionType::Float, default: "0.5", range: OptionRange::FloatRange(0.0, 10.0), description: "Horizontal gap between support and model in mm" },
    OptionSpec { section: "Support", name: "support_density", kind: OptionType::Float, default: "0.15", range: OptionRange::FloatRange(0.0, 1.0), description: "Support infill density fraction" },
    OptionSpec { section: "Support", name: "support_z_distance", kind: OptionType::Float, default: "0.2", range: OptionRange::FloatRange(0.0, 5.0), description: "Vertical gap between support and model in mm" },
    OptionSpec { section: "Support", name: "support_interface_layers", kind: OptionType::Int, default: "2", range: OptionRange::IntRange(0, 10), description: "Number of dense interface layers atop support" },
    OptionSpec { section: "Support", name: "support_interface_density", kind: OptionType::Float, default: "0.7", range: OptionRange::FloatRange(0.0, 1.0), description: "Infill density of support interface layers" },

    // --- Adhesion ---
    OptionSpec { section: "Adhesion", name: "adhesion_type", kind: OptionType::Enum, default: "none", range: OptionRange::Enum(&["none", "brim", "raft"]), description: "First-layer adhesion aid" },
    OptionSpec { section: "Adhesion", name: "skirt_outset", kind: OptionType::Float, default: "2.0", range: OptionRange::FloatRange(0.0, 50.0), description: "Skirt distance from model in mm" },
    OptionSpec { section: "Adhesion", name: "brim_width", kind: OptionType::Float, default: "4.0", range: OptionRange::FloatRange(0.0, 50.0), description: "Brim width in mm" },
    OptionSpec { section: "Adhesion", name: "raft_outset", kind: OptionType::Float, default: "3.0", range: OptionRange::FloatRange(0.0, 50.0), description: "Raft outward margin in mm" },
    OptionSpec { section: "Adhesion", name: "raft_layers", kind: OptionType::Int, default: "3", range: OptionRange::IntRange(1, 10), description: "Number of raft base layers" },

    // --- Retraction ---
    OptionSpec { section: "Retraction", name: "retract_dist", kind: OptionType::Float, default: "1.0", range: OptionRange::FloatRange(0.0, 10.0), description: "Retraction distance per travel move in mm" },
    OptionSpec { section: "Retraction", name: "retract_extruder", kind: OptionType::Float, default: "4.0", range: OptionRange::FloatRange(0.0, 20.0), description: "Retraction distance on tool change in mm" },
    OptionSpec { section: "Retraction", name: "retract_speed", kind: OptionType::Float, default: "35.0", range: OptionRange::FloatRange(1.0, 150.0), description: "Retraction speed in mm/s" },
    OptionSpec { section: "Retraction", name: "retract_lift", kind: OptionType::Float, default: "0.2", range: OptionRange::FloatRange(0.0, 5.0), description: "Z-hop height during travel in mm" },
    OptionSpec { section: "Retraction", name: "retract_min_travel", kind: OptionType::Float, default: "2.0", range: OptionRange::FloatRange(0.0, 50.0), description: "Minimum travel move length in mm that triggers a retraction" },
    OptionSpec { section: "Retraction", name: "wipe_distance", kind: OptionType::Float, default: "0.0", range: OptionRange::FloatRange(0.0, 20.0), description: "Nozzle wipe distance on retraction in mm" },
    OptionSpec { section: "Retraction", name: "travel_rate_xy", kind: OptionType::Float, default: "150.0", range: OptionRange::FloatRange(1.0, 500.0), description: "XY travel speed in mm/s" },
    OptionSpec { section: "Retraction", name: "travel_rate_z", kind: OptionType::Float, default: "10.0", range: OptionRange::FloatRange(0.5, 100.0), description: "Z travel speed in mm/s" },
    OptionSpec { section: "Retraction", name: "feed_rate", kind: OptionType::Float, default: "60.0", range: OptionRange::FloatRange(1.0, 300.0), description: "Nominal print speed in mm/s" },

    // --- Materials ---
    OptionSpec { section: "Materials", name: "bed_temp", kind: OptionType::Float, default: "60.0", range: OptionRange::FloatRange(0.0, 150.0), description: "Heated bed target temperature in C" },
    OptionSpec { section: "Materials", name: "flow_multiplier", kind: OptionType::Float, default: "1.0", range: OptionRange::FloatRange(0.5, 1.5), description: "Global extrusion flow multiplier" },
    OptionSpec { section: "Materials", name: "material_density", kind: OptionType::Float, default: "1.24", range: OptionRange::FloatRange(0.5, 8.0), description: "Filament density in g/cm^3, for mass estimates" },
    OptionSpec { section: "Materials", name: "material_shrinkage", kind: OptionType::Float, default: "0.0", range: OptionRange::FloatRange(-0.1, 0.1), description: "Expected linear shrinkage fraction on cooling" },
    OptionSpec { section: "Materials", name: "material_glass_transition_temp", kind: OptionType::Float, default: "60.0", range: OptionRange::FloatRange(0.0, 300.0), description: "Glass transition temperature in C, informs cooling strategy" },

    // --- Machine ---
    OptionSpec { section: "Machine", name: "bed_size_x", kind: OptionType::Float, default: "220.0", range: OptionRange::FloatRange(10.0, 2000.0), description: "Bed X size in mm" },
    OptionSpec { section: "Machine", name: "bed_size_y", kind: OptionType::Float, default: "220.0", range: OptionRange::FloatRange(10.0, 2000.0), description: "Bed Y size in mm" },
    OptionSpec { section: "Machine", name: "bed_size_z", kind: OptionType::Float, default: "250.0", range: OptionRange::FloatRange(10.0, 2000.0), description: "Maximum build height in mm" },
    OptionSpec { section: "Machine", name: "max_z_speed", kind: OptionType::Float, default: "10.0", range: OptionRange::FloatRange(0.5, 100.0), description: "Maximum Z axis speed in mm/s" },
    OptionSpec { section: "Machine", name: "max_z_acceleration", kind: OptionType::Float, default: "100.0", range: OptionRange::FloatRange(1.0, 5000.0), description: "Maximum Z axis acceleration in mm/s^2" },
    OptionSpec { section: "Machine", name: "z_steps_per_mm", kind: OptionType::Float, default: "400.0", range: OptionRange::FloatRange(1.0, 10000.0), description: "Z axis stepper resolution in steps/mm" },
    OptionSpec { section: "Machine", name: "z_lead_screw_pitch", kind: OptionType::Float, default: "2.0", range: OptionRange::FloatRange(0.1, 20.0), description: "Z axis lead screw pitch in mm" },
    OptionSpec { section: "Machine", name: "homing_speed_z", kind: OptionType::Float, default: "5.0", range: OptionRange::FloatRange(0.5, 50.0), description: "Z axis homing speed in mm/s" },
    OptionSpec { section: "Machine", name: "home_to_max", kind: OptionType::Bool, default: "false", range: OptionRange::None, description: "Home toward the maximum end of each axis instead of the minimum" },
    OptionSpec { section: "Machine", name: "home_at_startup", kind: OptionType::Bool, default: "true", range: OptionRange::None, description: "Run a homing cycle before the first print move" },
];

/// Per-nozzle option specs, generated from the fixed 4-nozzle key lists
/// above so each nozzle gets diameter, filament diameter, max speed, and
/// hotend temperature entries without hand-writing sixteen near-duplicates.
pub fn per_nozzle_schema() -> Vec<OptionSpec> {
    let mut out = Vec::with_capacity(16);
    for &key in NOZZLE_DIAM_KEYS.iter() {
        out.push(OptionSpec { section: "Machine", name: key, kind: OptionType::Float, default: "0.4", range: OptionRange::FloatRange(0.05, 2.0), description: "Nozzle orifice diameter in mm" });
    }
    for &key in NOZZLE_FILAMENT_DIAM_KEYS.iter() {
        out.push(OptionSpec { section: "Materials", name: key, kind: OptionType::Float, default: "1.75", range: OptionRange::FloatRange(1.0, 3.5), description: "Filament diameter loaded in this nozzle in mm" });
    }
    for &key in NOZZLE_MAX_SPEED_KEYS.iter() {
        out.push(OptionSpec { section: "Machine", name: key, kind: OptionType::Float, default: "80.0", range: OptionRange::FloatRange(1.0, 500.0), description: "Maximum print speed for this nozzle in mm/s" });
    }
    for &key in NOZZLE_HOTEND_TEMP_KEYS.iter() {
        out.push(OptionSpec { section: "Materials", name: key, kind: OptionType::Float, default: "200.0", range: OptionRange::FloatRange(0.0, 350.0), description: "Hotend target temperature in C" });
    }
    out
}

/// All option specs, static plus per-nozzle, in section order.
pub fn all_specs() -> Vec<OptionSpec> {
    let mut out = SCHEMA.to_vec();
    out.extend(per_nozzle_schema());
    out
}

pub fn find(name: &str) -> Option<OptionSpec> {
    all_specs().into_iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_roughly_seventy_options() {
        let n = all_specs().len();
        assert!((65..=75).contains(&n), "expected roughly 70 options, got {}", n);
    }

    #[test]
    fn layer_height_is_findable() {
        let spec = find("layer_height").unwrap();
        assert_eq!(spec.section, "Quality");
    }

    #[test]
    fn nozzle_keys_cover_all_four_nozzles() {
        for i in 0..4 {
            assert!(find(&format!("nozzle_{}_diam", i)).is_some());
            assert!(find(&format!("nozzle_{}_filament_diam", i)).is_some());
        }
    }
}
