//! pyproject.toml document collaborator.
//!
//! Wraps a `toml_edit::DocumentMut` so edits touch only the targeted nodes and
//! everything else round-trips byte-identically (comments, ordering, spacing).
//! Also hosts `DevSource`, the injectable stand-in for an external
//! dev-dependency table such as `[tool.pdm.dev-dependencies]`.

use camino::{Utf8Path, Utf8PathBuf};
use compat_core::{CompatError, CompatResult};
use std::fs;
use toml_edit::{Array, DocumentMut, Item};

/// An authoritative pyproject.toml document with format preservation
#[derive(Debug, Clone)]
pub struct PyProjectDocument {
    path: Utf8PathBuf,
    doc: DocumentMut,
}

impl PyProjectDocument {
    /// Load and parse a document from disk
    pub fn load(path: impl AsRef<Utf8Path>) -> CompatResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CompatError::io(format!("Failed to read {}", path), e))?;
        Self::parse(&content, path)
    }

    /// Parse a document from a string, remembering the path used for saves
    pub fn parse(content: &str, path: impl AsRef<Utf8Path>) -> CompatResult<Self> {
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|e| CompatError::TomlParse {
                message: e.to_string(),
            })?;
        Ok(Self {
            path: path.as_ref().to_owned(),
            doc,
        })
    }

    /// Persist the document back to its path
    pub fn save(&self) -> CompatResult<()> {
        fs::write(&self.path, self.doc.to_string())
            .map_err(|e| CompatError::io(format!("Failed to write {}", self.path), e))
    }

    /// Current serialized form of the document
    pub fn content(&self) -> String {
        self.doc.to_string()
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn doc(&self) -> &DocumentMut {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut DocumentMut {
        &mut self.doc
    }

    /// Whether the document already declares a native `[tool.poetry]` table.
    /// This is an explicit existence check, never a probe-and-catch.
    pub fn has_native_config(&self) -> bool {
        self.doc
            .get("tool")
            .and_then(|tool| tool.get("poetry"))
            .is_some_and(Item::is_table_like)
    }

    /// The native `[tool.poetry]` table as a plain value tree, if present
    pub fn native_config(&self) -> Option<toml::Table> {
        let item = self.doc.get("tool")?.get("poetry")?;
        match item_to_value(item) {
            Some(toml::Value::Table(table)) => Some(table),
            _ => None,
        }
    }

    /// The whole document as a plain value tree
    pub fn to_table(&self) -> toml::Table {
        self.doc
            .iter()
            .filter_map(|(key, item)| item_to_value(item).map(|value| (key.to_string(), value)))
            .collect()
    }

    /// The `project.dependencies` array, optionally created when absent
    pub fn dependencies_array_mut(&mut self, create_missing: bool) -> Option<&mut Array> {
        let project = self.doc.get_mut("project")?.as_table_mut()?;
        if create_missing && !project.contains_key("dependencies") {
            project.insert(
                "dependencies",
                Item::Value(toml_edit::Value::Array(Array::new())),
            );
        }
        project.get_mut("dependencies")?.as_array_mut()
    }

    /// Whether `[project]` marks a field as dynamically computed
    pub fn is_dynamic(&self, field: &str) -> bool {
        self.doc
            .get("project")
            .and_then(|project| project.get("dynamic"))
            .and_then(Item::as_array)
            .is_some_and(|dynamic| dynamic.iter().any(|entry| entry.as_str() == Some(field)))
    }

    /// Set the static `project.version` value
    pub fn set_version(&mut self, version: &str) {
        if let Some(project) = self.doc.get_mut("project").and_then(Item::as_table_mut) {
            project.insert("version", toml_edit::value(version));
        }
    }
}

/// External dev-dependency source, keyed by named buckets under a fixed
/// table path in the same document
#[derive(Debug, Clone)]
pub struct DevSource {
    root: Vec<String>,
}

impl Default for DevSource {
    fn default() -> Self {
        Self::new(["tool", "pdm", "dev-dependencies"])
    }
}

impl DevSource {
    pub fn new<I, S>(root: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into_iter().map(Into::into).collect(),
        }
    }

    /// Requirement lines of one bucket, read from a plain value tree
    pub fn bucket_lines(&self, doc: &toml::Table, bucket: &str) -> Option<Vec<String>> {
        let (first, rest) = self.root.split_first()?;
        let mut current = doc.get(first)?;
        for segment in rest {
            current = current.as_table()?.get(segment)?;
        }
        let lines = current.as_table()?.get(bucket)?.as_array()?;
        Some(
            lines
                .iter()
                .filter_map(|line| line.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Mutable handle on one bucket's array in the authoritative document
    pub fn bucket_array_mut<'a>(
        &self,
        doc: &'a mut DocumentMut,
        bucket: &str,
    ) -> Option<&'a mut Array> {
        let (first, rest) = self.root.split_first()?;
        let mut item = doc.get_mut(first)?;
        for segment in rest {
            item = item.get_mut(segment)?;
        }
        item.get_mut(bucket)?.as_array_mut()
    }
}

/// Convert a toml_edit item into a plain toml value
pub(crate) fn item_to_value(item: &Item) -> Option<toml::Value> {
    match item {
        Item::None => None,
        Item::Value(value) => Some(edit_value_to_value(value)),
        Item::Table(table) => Some(toml::Value::Table(table_to_map(table))),
        Item::ArrayOfTables(tables) => Some(toml::Value::Array(
            tables
                .iter()
                .map(|table| toml::Value::Table(table_to_map(table)))
                .collect(),
        )),
    }
}

fn table_to_map(table: &toml_edit::Table) -> toml::Table {
    table
        .iter()
        .filter_map(|(key, item)| item_to_value(item).map(|value| (key.to_string(), value)))
        .collect()
}

fn edit_value_to_value(value: &toml_edit::Value) -> toml::Value {
    match value {
        toml_edit::Value::String(s) => toml::Value::String(s.value().clone()),
        toml_edit::Value::Integer(i) => toml::Value::Integer(*i.value()),
        toml_edit::Value::Float(f) => toml::Value::Float(*f.value()),
        toml_edit::Value::Boolean(b) => toml::Value::Boolean(*b.value()),
        toml_edit::Value::Datetime(d) => toml::Value::Datetime(*d.value()),
        toml_edit::Value::Array(array) => {
            toml::Value::Array(array.iter().map(edit_value_to_value).collect())
        }
        toml_edit::Value::InlineTable(table) => toml::Value::Table(
            table
                .iter()
                .map(|(key, value)| (key.to_string(), edit_value_to_value(value)))
                .collect(),
        ),
    }
}
