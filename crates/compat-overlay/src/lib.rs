//! # compat-overlay
//!
//! Read-through/write-through overlay presenting a Poetry-shaped metadata view
//! over a PEP 621 `[project]`-authoritative pyproject.toml document.
//!
//! Reads synthesize the view via a pure projection; writes compute a minimal
//! structural diff between the previously synthesized view and the caller's
//! new view, then replay only that difference onto the authoritative document
//! so untouched fields, ordering, and formatting survive.
//!
//! ## Modules
//!
//! - `document`: toml_edit-backed document collaborator and the injectable
//!   dev-dependency source
//! - `project`: pure projection from `[project]` metadata to the Poetry shape
//! - `diff`: generic structural diff between nested tables
//! - `replay`: translates diff entries into targeted document edits
//! - `overlay`: the `OverlayDocument` façade the host tool touches

pub mod diff;
pub mod document;
pub mod overlay;
pub mod project;
pub mod replay;

// Re-export main types
pub use diff::{diff, value_at, DiffEntry, DiffMap, DiffPath};
pub use document::{DevSource, PyProjectDocument};
pub use overlay::OverlayDocument;
pub use project::project;
pub use replay::{collapse_descriptor_paths, replay, ReplayOutcome};

/// Result type for overlay operations
pub type OverlayResult<T> = compat_core::CompatResult<T>;
