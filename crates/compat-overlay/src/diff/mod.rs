//! Generic structural diff between nested tables.
//!
//! Tables recurse; arrays and scalars compare by full value equality. The
//! result is a path-keyed map and traversal order is not load-bearing: tests
//! must assert on path-set membership, never iteration order.

use std::collections::HashMap;
use toml::{Table, Value};

/// Ordered sequence of string keys addressing one node in a table tree
pub type DiffPath = Vec<String>;

/// One difference between two table trees
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    Added(Value),
    Deleted(Value),
    Modified { old: Value, new: Value },
}

/// Diff result, keyed by path
pub type DiffMap = HashMap<DiffPath, DiffEntry>;

/// Compute the structural difference between two table trees
pub fn diff(before: &Table, after: &Table) -> DiffMap {
    let mut out = DiffMap::new();
    let mut path = Vec::new();
    diff_recursive(&mut out, &mut path, before, after);
    out
}

fn diff_recursive(out: &mut DiffMap, path: &mut DiffPath, before: &Table, after: &Table) {
    let keys = before
        .keys()
        .chain(after.keys().filter(|key| !before.contains_key(*key)));
    for key in keys {
        match (before.get(key), after.get(key)) {
            (None, Some(added)) => {
                out.insert(child(path, key), DiffEntry::Added(added.clone()));
            }
            (Some(deleted), None) => {
                out.insert(child(path, key), DiffEntry::Deleted(deleted.clone()));
            }
            (Some(Value::Table(old)), Some(Value::Table(new))) => {
                path.push(key.clone());
                diff_recursive(out, path, old, new);
                path.pop();
            }
            (Some(old), Some(new)) if old != new => {
                out.insert(
                    child(path, key),
                    DiffEntry::Modified {
                        old: old.clone(),
                        new: new.clone(),
                    },
                );
            }
            _ => {}
        }
    }
}

fn child(path: &DiffPath, key: &str) -> DiffPath {
    let mut child = path.clone();
    child.push(key.to_string());
    child
}

/// Look up the value at a path inside a table tree
pub fn value_at<'a>(table: &'a Table, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = table.get(first)?;
    for segment in rest {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}
