//! Mesh ingestion: the point/edge/facet store, STL parsing, and the
//! manifold checker that inspects it once built.

pub mod manifold;
pub mod stl_reader;
pub mod store;

pub use manifold::{check_manifold, ManifoldReport};
pub use stl_reader::{read_stl, ReadStats};
pub use store::{Edge, EdgeCache, EdgeId, Facet, FacetCache, FacetId, Mesh};
