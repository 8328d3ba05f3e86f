//! G-code synthesis: mutable emission state, command formatting, and the
//! Marlin-dialect emitter itself.

pub mod commands;
pub mod emitter;
pub mod state;

pub use emitter::{emit_gcode, EmitterConfig, LayerBuckets, NozzleBucket, NOZZLE_COUNT};
pub use state::ExtrusionState;
