//! # compat-core
//!
//! Core types and grammars shared across the PEP 621 compatibility engine.
//!
//! This crate provides:
//! - VersionConstraint translation between caret/tilde shorthand and explicit
//!   PEP 440-style operator clauses
//! - A PEP 508 requirement-line parser and marker combinator
//! - DependencyDescriptor conversion between requirement lines and Poetry-style
//!   dependency values
//! - CompatError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Constraint, requirement, and descriptor types
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CompatError, CompatResult};
pub use types::{
    combine_markers, parse_dependency, render_requirement, translate, Clause, ConstraintOp,
    DependencyDescriptor, DependencyTable, Requirement, VersionConstraint,
};
