//! Declarative segment specs for kinechain.
//!
//! Provides the author-facing description of a segment chain (one
//! [`SegmentSpec`] per rigid segment, each naming its parent), JSON
//! loading, built-in presets, and the resolver that turns an unordered
//! set of specs into a parents-first build order.
//!
//! # Architecture
//!
//! ```text
//! JSON / presets ──► SegmentSet ──► resolve() ──► BuildOrder
//! ```

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod parser;
pub mod presets;
pub mod resolver;
pub mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::{SpecError, TopologyError};
pub use parser::{parse_file, parse_str, parse_value};
pub use resolver::{BuildOrder, resolve, resolve_with_limit};
pub use types::{ROOT_PARENT, SegmentSet, SegmentSpec};
