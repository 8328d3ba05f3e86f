//! Small formatting helpers for Marlin command lines. Coordinates use 2
//! decimals, E values 3 decimals, feed rates mm/min.

pub fn g0_xy(x: f64, y: f64, feed_mm_s: f64) -> String {
    format!("G0 X{:.2} Y{:.2} F{:.0}", x, y, feed_mm_s * 60.0)
}

pub fn g0_z(z: f64, feed_mm_s: f64) -> String {
    format!("G0 Z{:.2} F{:.0}", z, feed_mm_s * 60.0)
}

pub fn g1_xye(x: f64, y: f64, e: f64, feed_mm_s: f64) -> String {
    format!("G1 X{:.2} Y{:.2} E{:.3} F{:.0}", x, y, e, feed_mm_s * 60.0)
}

pub fn g1_e(e: f64, feed_mm_s: f64) -> String {
    format!("G1 E{:.3} F{:.0}", e, feed_mm_s * 60.0)
}

pub fn tool_change(nozzle: usize) -> String {
    format!("T{}", nozzle)
}

pub fn layer_marker(layer: usize) -> String {
    format!(";LAYER:{}", layer)
}

pub fn layer_count(n: usize) -> String {
    format!(";LAYER_COUNT:{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_round_to_two_decimals() {
        assert_eq!(g0_xy(1.23456, 2.0, 10.0), "G0 X1.23 Y2.00 F600");
    }

    #[test]
    fn extrusion_rounds_to_three_decimals() {
        assert_eq!(g1_xye(0.0, 0.0, 1.23456, 5.0), "G1 X0.00 Y0.00 E1.235 F300");
    }
}
