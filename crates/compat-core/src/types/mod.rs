//! Core data types for the compatibility engine.
//!
//! This module provides the leaf grammars everything else is built from:
//! - Version-constraint translation (caret/tilde shorthand to explicit clauses)
//! - PEP 508 requirement-line parsing and marker combination
//! - Dependency descriptors and their conversion to and from requirement lines

pub mod constraint;
pub mod descriptor;
pub mod requirement;

// Re-export all public types
pub use constraint::{translate, Clause, ConstraintOp, VersionConstraint};
pub use descriptor::{
    parse_dependency, render_requirement, DependencyDescriptor, DependencyTable,
};
pub use requirement::{combine_markers, Requirement};
