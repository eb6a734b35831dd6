//! Edit replay: translating a structural diff into targeted document edits.
//!
//! Each diff entry is matched against an explicit set of replayable paths;
//! anything else is dropped with a diagnostic and recorded in the outcome, so
//! a write never crashes and never corrupts untouched content.

use crate::diff::{value_at, DiffEntry, DiffMap, DiffPath};
use crate::document::{DevSource, PyProjectDocument};
use compat_core::{render_requirement, CompatError, CompatResult, DependencyDescriptor, Requirement};
use toml::Table;
use toml_edit::Array;
use tracing::{debug, warn};

/// Auditable record of one replay pass
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Number of edits applied to the authoritative document
    pub applied: usize,
    /// Edits dropped with their recoverable reason
    pub dropped: Vec<(DiffPath, CompatError)>,
}

impl ReplayOutcome {
    /// Whether every edit was replayed
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }

    fn drop_edit(&mut self, path: &[String], error: CompatError) {
        warn!(path = %path.join("."), %error, "dropping edit");
        self.dropped.push((path.to_vec(), error));
    }
}

/// Fold diff entries below a single dependency descriptor into one
/// whole-descriptor entry, so replay always rewrites a complete requirement
/// line instead of a fragment of one.
pub fn collapse_descriptor_paths(diff: DiffMap, before: &Table, after: &Table) -> DiffMap {
    let mut out = DiffMap::new();
    for (path, entry) in diff {
        let descriptor_len = if path.len() > 2 && path[0] == "dependencies" {
            Some(2)
        } else if path.len() > 4 && path[0] == "group" && path[2] == "dependencies" {
            Some(4)
        } else {
            None
        };
        let Some(descriptor_len) = descriptor_len else {
            out.insert(path, entry);
            continue;
        };

        let key: DiffPath = path[..descriptor_len].to_vec();
        if out.contains_key(&key) {
            continue;
        }
        match (value_at(before, &key), value_at(after, &key)) {
            (Some(old), Some(new)) if old != new => {
                out.insert(
                    key,
                    DiffEntry::Modified {
                        old: old.clone(),
                        new: new.clone(),
                    },
                );
            }
            (None, Some(new)) => {
                out.insert(key, DiffEntry::Added(new.clone()));
            }
            (Some(old), None) => {
                out.insert(key, DiffEntry::Deleted(old.clone()));
            }
            _ => {}
        }
    }
    out
}

/// Replay a diff onto the authoritative document.
///
/// Replayable paths: `dependencies.<name>` (except the `python`
/// pseudo-dependency, which is never rendered back),
/// `group.<bucket>.dependencies.<name>` via the dev source, and the top-level
/// `version` when it is not dynamically computed. Everything else is dropped.
/// Persistence is the caller's step.
pub fn replay(
    diff: &DiffMap,
    document: &mut PyProjectDocument,
    dev: &DevSource,
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();

    // Application order is irrelevant to the result; sort for stable diagnostics
    let mut entries: Vec<(&DiffPath, &DiffEntry)> = diff.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (path, entry) in entries {
        if path.len() == 2 && path[0] == "dependencies" {
            let name = &path[1];
            if name == "python" {
                debug!("skipping python pseudo-dependency");
                continue;
            }
            let create = matches!(entry, DiffEntry::Added(_));
            let Some(array) = document.dependencies_array_mut(create) else {
                outcome.drop_edit(
                    path,
                    CompatError::unsupported_edit(path, "no [project] dependencies array"),
                );
                continue;
            };
            match apply_list_edit(array, name, entry) {
                Ok(()) => outcome.applied += 1,
                Err(error) => outcome.drop_edit(path, error),
            }
        } else if path.len() == 4 && path[0] == "group" && path[2] == "dependencies" {
            let bucket = &path[1];
            let Some(array) = dev.bucket_array_mut(document.doc_mut(), bucket) else {
                outcome.drop_edit(
                    path,
                    CompatError::unsupported_edit(
                        path,
                        format!("no dev-dependency bucket '{}'", bucket),
                    ),
                );
                continue;
            };
            match apply_list_edit(array, &path[3], entry) {
                Ok(()) => outcome.applied += 1,
                Err(error) => outcome.drop_edit(path, error),
            }
        } else if path.len() == 1 && path[0] == "version" {
            if document.is_dynamic("version") {
                outcome.drop_edit(
                    path,
                    CompatError::unsupported_edit(path, "version is dynamically computed"),
                );
                continue;
            }
            match entry {
                DiffEntry::Added(new) | DiffEntry::Modified { new, .. } => {
                    if let Some(version) = new.as_str() {
                        document.set_version(version);
                        outcome.applied += 1;
                    } else {
                        outcome.drop_edit(
                            path,
                            CompatError::unsupported_edit(path, "version must be a string"),
                        );
                    }
                }
                DiffEntry::Deleted(_) => {
                    outcome.drop_edit(
                        path,
                        CompatError::unsupported_edit(path, "version cannot be deleted"),
                    );
                }
            }
        } else {
            outcome.drop_edit(
                path,
                CompatError::unsupported_edit(path, "no replay rule for this path"),
            );
        }
    }

    outcome
}

/// Apply one add/modify/delete against a requirement-line array
fn apply_list_edit(array: &mut Array, name: &str, entry: &DiffEntry) -> CompatResult<()> {
    match entry {
        DiffEntry::Added(value) => {
            let descriptor = DependencyDescriptor::from_value(value)?;
            array.push(render_requirement(name, &descriptor));
            Ok(())
        }
        DiffEntry::Modified { new, .. } => {
            let descriptor = DependencyDescriptor::from_value(new)?;
            let index = locate(array, name)?;
            let _ = array.replace(index, render_requirement(name, &descriptor));
            Ok(())
        }
        DiffEntry::Deleted(_) => {
            let index = locate(array, name)?;
            array.remove(index);
            Ok(())
        }
    }
}

/// Find the single array entry whose parsed requirement name matches exactly
fn locate(array: &Array, name: &str) -> CompatResult<usize> {
    let mut matches = Vec::new();
    for (index, item) in array.iter().enumerate() {
        let Some(line) = item.as_str() else { continue };
        if let Ok(req) = Requirement::parse(line) {
            if req.name == name {
                matches.push(index);
            }
        }
    }
    match matches.as_slice() {
        [index] => Ok(*index),
        _ => Err(CompatError::AmbiguousDependencyMatch {
            name: name.to_string(),
            count: matches.len(),
        }),
    }
}
