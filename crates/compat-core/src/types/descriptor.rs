//! Dependency descriptor conversion.
//!
//! Maps between PEP 508 requirement lines and Poetry-style dependency values:
//! either a plain specifier string or a table with version/markers/extras or
//! git/rev fields. The mapping is lossy-aware: ref kinds (branch vs. tag vs.
//! commit) and subdirectories are not distinguished, and non-git direct URLs
//! fall through to the table branch.

use crate::error::{CompatError, CompatResult};
use crate::types::constraint::{translate, Clause};
use crate::types::requirement::{combine_markers, Requirement};
use indexmap::IndexSet;
use tracing::debug;

/// Detailed dependency table (Poetry-style)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyTable {
    pub version: Option<String>,
    pub markers: Option<String>,
    /// Python-version constraint, rendered back as a `python_version` marker
    pub python: Option<String>,
    pub extras: Option<IndexSet<String>>,
    pub git: Option<String>,
    pub rev: Option<String>,
    pub optional: Option<bool>,
}

/// Dependency descriptor: a plain specifier string or a detailed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDescriptor {
    Plain(String),
    Table(DependencyTable),
}

impl DependencyDescriptor {
    /// Apply the wildcard invariant: a table whose only populated field is an
    /// empty version collapses to the plain sentinel `"*"`.
    pub fn collapse(self) -> Self {
        if let DependencyDescriptor::Table(ref table) = self {
            let only_empty_version = table.version.as_deref() == Some("")
                && table.markers.is_none()
                && table.python.is_none()
                && table.extras.is_none()
                && table.git.is_none()
                && table.rev.is_none()
                && table.optional.is_none();
            if only_empty_version {
                return DependencyDescriptor::Plain("*".to_string());
            }
        }
        self
    }

    /// Convert to the view's value representation
    pub fn to_value(&self) -> toml::Value {
        match self {
            DependencyDescriptor::Plain(spec) => toml::Value::String(spec.clone()),
            DependencyDescriptor::Table(table) => {
                let mut map = toml::Table::new();
                if let Some(git) = &table.git {
                    map.insert("git".to_string(), toml::Value::String(git.clone()));
                }
                if let Some(rev) = &table.rev {
                    map.insert("rev".to_string(), toml::Value::String(rev.clone()));
                }
                if let Some(version) = &table.version {
                    map.insert("version".to_string(), toml::Value::String(version.clone()));
                }
                if let Some(markers) = &table.markers {
                    map.insert("markers".to_string(), toml::Value::String(markers.clone()));
                }
                if let Some(python) = &table.python {
                    map.insert("python".to_string(), toml::Value::String(python.clone()));
                }
                if let Some(extras) = &table.extras {
                    let extras = extras
                        .iter()
                        .map(|extra| toml::Value::String(extra.clone()))
                        .collect();
                    map.insert("extras".to_string(), toml::Value::Array(extras));
                }
                if let Some(optional) = table.optional {
                    map.insert("optional".to_string(), toml::Value::Boolean(optional));
                }
                toml::Value::Table(map)
            }
        }
    }

    /// Parse a descriptor back out of a view value. Unknown table keys are
    /// ignored with a diagnostic; non-string/non-table values are rejected.
    pub fn from_value(value: &toml::Value) -> CompatResult<Self> {
        match value {
            toml::Value::String(spec) => Ok(DependencyDescriptor::Plain(spec.clone())),
            toml::Value::Table(map) => {
                let mut table = DependencyTable::default();
                let mut branch = None;
                let mut tag = None;
                for (key, entry) in map {
                    match key.as_str() {
                        "version" => table.version = entry.as_str().map(str::to_string),
                        "markers" => table.markers = entry.as_str().map(str::to_string),
                        "python" => table.python = entry.as_str().map(str::to_string),
                        "git" => table.git = entry.as_str().map(str::to_string),
                        "rev" => table.rev = entry.as_str().map(str::to_string),
                        "branch" => branch = entry.as_str().map(str::to_string),
                        "tag" => tag = entry.as_str().map(str::to_string),
                        "optional" => table.optional = entry.as_bool(),
                        "extras" => {
                            let extras: IndexSet<String> = entry
                                .as_array()
                                .into_iter()
                                .flatten()
                                .filter_map(|v| v.as_str().map(str::to_string))
                                .collect();
                            table.extras = (!extras.is_empty()).then_some(extras);
                        }
                        other => {
                            debug!(key = other, "ignoring unknown dependency descriptor key");
                        }
                    }
                }
                // ref kinds all render as `@<ref>`; an explicit rev wins over
                // a tag, which wins over a branch
                table.rev = table.rev.or(tag).or(branch);
                Ok(DependencyDescriptor::Table(table))
            }
            other => Err(CompatError::InvalidDescriptor {
                reason: format!("expected string or table, got {}", other.type_str()),
            }),
        }
    }
}

/// Parse a requirement line into its package name and descriptor.
///
/// Decision order: a plain specifier when no marker, extras, or URL is
/// involved; a git table for `git+` URLs; a detailed table otherwise, subject
/// to the wildcard collapse invariant.
pub fn parse_dependency(line: &str) -> CompatResult<(String, DependencyDescriptor)> {
    let req = Requirement::parse(line)?;

    let descriptor = if req.marker.is_none() && req.extras.is_empty() && !req.specifier.is_empty()
    {
        DependencyDescriptor::Plain(req.specifier)
    } else if let Some(url) = req.url.as_deref().and_then(|url| url.strip_prefix("git+")) {
        let (git, rev) = match url.split_once('@') {
            Some((git, rev)) => (git.to_string(), Some(rev.to_string())),
            None => (url.to_string(), None),
        };
        DependencyDescriptor::Table(DependencyTable {
            git: Some(git),
            rev,
            ..Default::default()
        })
    } else {
        if let Some(url) = &req.url {
            debug!(url = url.as_str(), "direct URL requirement not representable, keeping table form");
        }
        DependencyDescriptor::Table(DependencyTable {
            version: Some(req.specifier),
            markers: req.marker,
            extras: (!req.extras.is_empty()).then_some(req.extras),
            ..Default::default()
        })
        .collapse()
    };

    Ok((req.name, descriptor))
}

/// Render a descriptor back into a requirement line.
///
/// Specifiers are always emitted in explicit operator form via `translate`;
/// the wildcard sentinel renders as the bare package name.
pub fn render_requirement(name: &str, descriptor: &DependencyDescriptor) -> String {
    match descriptor {
        DependencyDescriptor::Plain(spec) if spec == "*" => name.to_string(),
        DependencyDescriptor::Plain(spec) => format!("{}{}", name, translate(spec)),
        DependencyDescriptor::Table(table) => {
            let marker = combine_markers(
                table
                    .markers
                    .iter()
                    .cloned()
                    .chain(table.python.as_deref().and_then(python_marker)),
            );
            if let Some(git) = &table.git {
                let mut line = format!("{} @ git+{}", name, git);
                if let Some(rev) = &table.rev {
                    line.push('@');
                    line.push_str(rev);
                }
                if let Some(marker) = &marker {
                    line.push_str("; ");
                    line.push_str(marker);
                }
                return line;
            }
            let mut line = name.to_string();
            if let Some(extras) = &table.extras {
                let extras: Vec<&str> = extras.iter().map(String::as_str).collect();
                line.push('[');
                line.push_str(&extras.join(","));
                line.push(']');
            }
            if let Some(version) = &table.version {
                if !version.is_empty() && version != "*" {
                    line.push_str(&translate(version).to_string());
                }
            }
            if let Some(marker) = &marker {
                line.push_str("; ");
                line.push_str(marker);
            }
            line
        }
    }
}

/// Express a Python-version constraint as a `python_version` marker clause.
/// Caret and tilde shorthands expand through `translate` first; a wildcard or
/// empty constraint has no marker equivalent.
fn python_marker(python: &str) -> Option<String> {
    let constraint = translate(python);
    if constraint.is_empty() {
        return None;
    }
    let render_branch = |clauses: &[Clause]| {
        clauses
            .iter()
            .map(|clause| format!("python_version {} '{}'", clause.op, clause.version))
            .collect::<Vec<_>>()
            .join(" and ")
    };
    let branches: Vec<String> = constraint
        .branches
        .iter()
        .filter(|clauses| !clauses.is_empty())
        .map(|clauses| render_branch(clauses))
        .collect();
    match branches.len() {
        0 => None,
        1 => branches.into_iter().next(),
        _ => Some(
            branches
                .iter()
                .map(|branch| {
                    if branch.contains(" and ") {
                        format!("({})", branch)
                    } else {
                        branch.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(" or "),
        ),
    }
}
