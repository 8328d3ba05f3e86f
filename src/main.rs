//! Command-line interface for the FDM slicer.
//!
//! ```bash
//! fdm-slicer model.stl -o model.gcode --support --brim
//! fdm-slicer model.stl --set-option layer_height=0.28 --set-option infill_density=0.3
//! fdm-slicer --show-configs
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fdm_slicer::config::{schema, Config};
use fdm_slicer::progress::{NoOpThermometer, TerminalThermometer, TextThermometer};
use fdm_slicer::Slicer;

/// Slices triangulated solid models (STL) into FDM toolpaths and Marlin G-code.
#[derive(Parser, Debug)]
#[command(name = "fdm-slicer", version, about)]
struct Cli {
    /// Input STL file(s) to slice
    files: Vec<PathBuf>,

    /// Output G-code file path (defaults to the first input with a .gcode extension)
    #[arg(short = 'o', long = "outfile", value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Skip the manifold check's validation gate; slice non-manifold meshes anyway
    #[arg(short = 'n', long = "no-validation")]
    no_validation: bool,

    /// Open a GUI viewer after slicing (not implemented in this build)
    #[arg(short = 'g', long = "gui-display")]
    gui_display: bool,

    /// Increase log verbosity; may be repeated
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long = "no-raft", conflicts_with_all = ["raft", "brim"])]
    no_raft: bool,
    #[arg(long = "raft", conflicts_with = "brim")]
    raft: bool,
    #[arg(long = "brim")]
    brim: bool,

    #[arg(long = "no-support", conflicts_with_all = ["support", "support_all"])]
    no_support: bool,
    #[arg(long = "support", conflicts_with = "support_all")]
    support: bool,
    #[arg(long = "support-all")]
    support_all: bool,

    /// Comma-separated material names, one per nozzle, e.g. "pla,petg"
    #[arg(long = "filament", value_name = "MAT,...")]
    filament: Option<String>,

    /// Set a configuration option: KEY=VALUE. May be repeated.
    #[arg(long = "set-option", value_name = "KEY=VALUE")]
    set_option: Vec<String>,

    /// Print the resolved value of a configuration option and exit. May be repeated.
    #[arg(long = "query-option", value_name = "KEY")]
    query_option: Vec<String>,

    /// Write the resolved configuration to this file
    #[arg(long = "write-configs", value_name = "FILE")]
    write_configs: Option<PathBuf>,

    /// Print every configuration option, its section, type, default, and description
    #[arg(long = "help-configs")]
    help_configs: bool,

    /// Print the resolved configuration in key=value form
    #[arg(long = "show-configs")]
    show_configs: bool,
}

/// Hotend/bed temperature pairs for the materials the `--filament` flag
/// recognizes. Not configurable from the schema itself since material
/// science, not printer geometry, decides these.
fn material_temps(name: &str) -> Option<(f64, f64)> {
    match name.to_ascii_lowercase().as_str() {
        "pla" => Some((200.0, 60.0)),
        "petg" => Some((235.0, 80.0)),
        "abs" => Some((245.0, 100.0)),
        "tpu" => Some((220.0, 50.0)),
        "nylon" => Some((250.0, 80.0)),
        _ => None,
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.help_configs {
        for spec in schema::all_specs() {
            println!("[{}] {} ({:?}, default={}) — {}", spec.section, spec.name, spec.kind, spec.default, spec.description);
        }
        return ExitCode::SUCCESS;
    }

    let mut config = Config::default();

    if let Some(filament) = &cli.filament {
        for (nozzle, name) in filament.split(',').map(str::trim).enumerate() {
            if nozzle >= 4 {
                break;
            }
            match material_temps(name) {
                Some((hotend, bed)) => {
                    let _ = config.set(&format!("nozzle_{}_hotend_temp", nozzle), &hotend.to_string());
                    let _ = config.set("bed_temp", &bed.to_string());
                }
                None => {
                    eprintln!("error: unknown material '{}'", name);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    if cli.raft {
        let _ = config.set("adhesion_type", "raft");
    } else if cli.brim {
        let _ = config.set("adhesion_type", "brim");
    } else if cli.no_raft {
        let _ = config.set("adhesion_type", "none");
    }

    if cli.support_all {
        let _ = config.set("support_type", "everywhere");
    } else if cli.support {
        let _ = config.set("support_type", "external");
    } else if cli.no_support {
        let _ = config.set("support_type", "none");
    }

    for assignment in &cli.set_option {
        let Some((key, value)) = assignment.split_once('=') else {
            eprintln!("error: --set-option expects KEY=VALUE, got '{}'", assignment);
            return ExitCode::FAILURE;
        };
        if let Err(e) = config.set(key.trim(), value.trim()) {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if !cli.query_option.is_empty() {
        for key in &cli.query_option {
            match config.get(key) {
                Some(v) => println!("{}={}", key, v),
                None => {
                    eprintln!("error: unknown option '{}'", key);
                    return ExitCode::FAILURE;
                }
            }
        }
        return ExitCode::SUCCESS;
    }

    if cli.show_configs {
        print!("{}", config.to_text());
        return ExitCode::SUCCESS;
    }

    if let Some(path) = &cli.write_configs {
        if let Err(e) = fs::write(path, config.to_text()) {
            eprintln!("error: failed to write configuration to {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    if cli.files.is_empty() {
        eprintln!("error: no input files given");
        return ExitCode::FAILURE;
    }

    if cli.gui_display {
        eprintln!("note: --gui-display was requested but this build has no GUI viewer");
    }

    let slicer = Slicer::new(config);
    let mut thermometer: Box<dyn TextThermometer> = if atty_stderr() {
        Box::new(TerminalThermometer::default())
    } else {
        Box::new(NoOpThermometer)
    };

    for input in &cli.files {
        let result = match slicer.slice_file(input, thermometer.as_mut()) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: failed to slice {}: {}", input.display(), e);
                return ExitCode::FAILURE;
            }
        };

        if !cli.no_validation && !result.stats.manifold.is_manifold() {
            eprintln!(
                "error: {} failed manifold validation ({} duplicate faces, {} hole edges, {} excess edges)",
                input.display(),
                result.stats.manifold.duplicate_faces.len(),
                result.stats.manifold.hole_edges.len(),
                result.stats.manifold.excess_edges.len(),
            );
            return ExitCode::FAILURE;
        }

        let outfile = cli.outfile.clone().unwrap_or_else(|| input.with_extension("gcode"));
        if let Err(e) = fs::write(&outfile, &result.gcode) {
            eprintln!("error: failed to write {}: {}", outfile.display(), e);
            return ExitCode::FAILURE;
        }

        eprintln!(
            "{} -> {}: {} layers, {:.1}s estimated build time",
            input.display(),
            outfile.display(),
            result.stats.num_layers,
            result.stats.build_time_s,
        );
    }

    ExitCode::SUCCESS
}

fn atty_stderr() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_materials_resolve() {
        assert!(material_temps("PLA").is_some());
        assert!(material_temps("petg").is_some());
        assert!(material_temps("unobtainium").is_none());
    }
}
