//! Version ordering and constraint evaluation for tvm.
//!
//! This crate holds the comparison rules every other part of tvm relies on:
//!
//! - [`version`] - parsing, normalisation and the total order over versions
//! - [`constraint`] - `operator version` clauses and their conjunctions
//! - [`requested`] - classification of a raw request into version, keyword,
//!   or constraint
//! - [`error`] - parse errors
//!
//! It performs no I/O.

pub mod constraint;
pub mod error;
pub mod requested;
pub mod version;

pub use constraint::{Constraint, ConstraintSet, Operator};
pub use error::VersionError;
pub use requested::{Keyword, RequestedVersion};
pub use version::{Version, compare, strip_tag_prefix};
