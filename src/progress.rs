//! Progress reporting.
//!
//! A small `set_target` / `update` / `clear` interface. A no-op
//! implementation is the default so the pipeline never depends on a real
//! terminal being attached; the CLI installs a terminal thermometer instead.

use std::fmt;
use std::io::Write;

/// Abstract progress sink: a label, a current/total pair, and a way to
/// clear the line when a stage finishes.
pub trait TextThermometer: Send + Sync {
    fn set_target(&mut self, label: &str, total: u64);
    fn update(&mut self, current: u64);
    fn clear(&mut self);
}

/// No-op implementation; used by default and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpThermometer;

impl TextThermometer for NoOpThermometer {
    fn set_target(&mut self, _label: &str, _total: u64) {}
    fn update(&mut self, _current: u64) {}
    fn clear(&mut self) {}
}

/// Writes a simple `label: current/total` line to stderr, overwriting itself
/// with carriage returns. Used by the CLI when attached to a terminal.
pub struct TerminalThermometer {
    label: String,
    total: u64,
}

impl Default for TerminalThermometer {
    fn default() -> Self {
        Self {
            label: String::new(),
            total: 0,
        }
    }
}

impl TextThermometer for TerminalThermometer {
    fn set_target(&mut self, label: &str, total: u64) {
        self.label = label.to_string();
        self.total = total;
    }

    fn update(&mut self, current: u64) {
        eprint!("\r{}: {}/{}          ", self.label, current, self.total);
        let _ = std::io::stderr().flush();
    }

    fn clear(&mut self) {
        eprintln!();
    }
}

impl fmt::Debug for TerminalThermometer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalThermometer")
            .field("label", &self.label)
            .field("total", &self.total)
            .finish()
    }
}
