//! Version ordering and range overlap.
//!
//! Tokens are plain versions (`1.0.8`), bracketed intervals (`[1.0,2.0)`,
//! `(,1.0]`) or the empty string, which matches every version.

pub mod compare;
pub mod range;

pub use compare::compare_versions;
pub use range::{is_overlap, is_version_overlap, parse_version_spec, Bound, VersionError, VersionSpec};
