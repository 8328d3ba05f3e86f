//! Error types for the slicing pipeline.
//!
//! Fatal conditions that should abort the whole pipeline are modeled as
//! [`SlicerError`] variants (I/O failures, explicit validation failures).
//! Everything else recoverable — malformed STL blocks, zero-area facets,
//! incomplete polygons, bad config values — is logged via `tracing` at the
//! point of detection and never surfaces as an `Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlicerError {
    #[error("failed to read STL file: {0}")]
    StlIo(#[source] std::io::Error),

    #[error("input mesh is empty (no facets survived loading)")]
    EmptyMesh,

    #[error("mesh failed manifold validation: {0} duplicate faces, {1} hole edges, {2} excess edges")]
    NonManifold(usize, usize, usize),

    #[error("failed to write G-code output: {0}")]
    OutputIo(#[source] std::io::Error),

    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SlicerError>;
