//! The overlay façade: read-through projection, write-through diff + replay.
//!
//! One `OverlayDocument` is scoped to a single command invocation. It owns the
//! authoritative document handle, the injectable dev-dependency source, and a
//! lazily built view cache; nothing is shared across invocations.

use crate::diff::diff;
use crate::document::{DevSource, PyProjectDocument};
use crate::project::project;
use crate::replay::{collapse_descriptor_paths, replay, ReplayOutcome};
use camino::Utf8Path;
use compat_core::{CompatError, CompatResult};
use toml::Table;
use tracing::info;

/// Poetry-shaped overlay over a PEP 621-authoritative pyproject document
#[derive(Debug)]
pub struct OverlayDocument {
    document: PyProjectDocument,
    dev_source: DevSource,
    view: Option<Table>,
    notice_emitted: bool,
}

impl OverlayDocument {
    pub fn new(document: PyProjectDocument) -> Self {
        Self {
            document,
            dev_source: DevSource::default(),
            view: None,
            notice_emitted: false,
        }
    }

    /// Load the authoritative document from disk
    pub fn load(path: impl AsRef<Utf8Path>) -> CompatResult<Self> {
        Ok(Self::new(PyProjectDocument::load(path)?))
    }

    /// Replace the default dev-dependency source
    pub fn with_dev_source(mut self, dev_source: DevSource) -> Self {
        self.dev_source = dev_source;
        self
    }

    pub fn document(&self) -> &PyProjectDocument {
        &self.document
    }

    /// Whether reads go through the synthesized view (no native config present)
    pub fn is_compat_active(&self) -> bool {
        !self.document.has_native_config()
    }

    /// Read the Poetry-shaped config table.
    ///
    /// A document that already declares `[tool.poetry]` is returned unchanged
    /// and no projection engages. Otherwise the view is synthesized on the
    /// first miss and cached for the rest of the invocation.
    pub fn read(&mut self) -> CompatResult<&Table> {
        let view = match self.view.take() {
            Some(view) => view,
            None => self.build_view()?,
        };
        Ok(self.view.insert(view))
    }

    /// Write a modified view back: diff against the cached baseline, replay
    /// the difference onto the authoritative document, persist, and keep the
    /// cache in sync with the new view.
    pub fn write(&mut self, new_view: Table) -> CompatResult<ReplayOutcome> {
        if !self.is_compat_active() {
            return Err(CompatError::UnsupportedEdit {
                path: "tool.poetry".to_string(),
                reason: "document is natively Poetry-shaped; the overlay is not engaged"
                    .to_string(),
            });
        }

        if self.view.is_none() {
            let view = self.build_view()?;
            self.view = Some(view);
        }
        let baseline = self.view.take().unwrap_or_default();

        let raw = diff(&baseline, &new_view);
        let collapsed = collapse_descriptor_paths(raw, &baseline, &new_view);
        let outcome = replay(&collapsed, &mut self.document, &self.dev_source);

        // the document is mutated at this point; the cache must track it
        // before the persist gets a chance to fail
        self.view = Some(new_view);
        self.document.save()?;
        Ok(outcome)
    }

    fn build_view(&mut self) -> CompatResult<Table> {
        if let Some(native) = self.document.native_config() {
            return Ok(native);
        }
        if !self.notice_emitted {
            info!("compatibility mode active: synthesizing Poetry view from [project] metadata");
            self.notice_emitted = true;
        }
        project(&self.document.to_table(), &self.dev_source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use toml::Value;

    const SAMPLE: &str = r#"
[project]
name = "demo"
version = "1.0.0"
requires-python = ">=3.9"
dependencies = [
    # keep requests pinned
    "requests>=2.28",
]

[tool.pdm.dev-dependencies]
dev = ["pytest>=7"]
"#;

    fn overlay_from(content: &str) -> OverlayDocument {
        OverlayDocument::new(PyProjectDocument::parse(content, "pyproject.toml").unwrap())
    }

    #[test]
    fn test_native_document_reads_unchanged() {
        let content = "[tool.poetry]\nname = \"native\"\nversion = \"0.1.0\"\n";
        let mut overlay = overlay_from(content);
        assert!(!overlay.is_compat_active());

        let view = overlay.read().unwrap();
        assert_eq!(view.get("name").and_then(Value::as_str), Some("native"));
        assert!(view.get("group").is_none());
    }

    #[test]
    fn test_compat_read_synthesizes_and_caches() {
        let mut overlay = overlay_from(SAMPLE);
        assert!(overlay.is_compat_active());

        let first = overlay.read().unwrap().clone();
        assert_eq!(first.get("name").and_then(Value::as_str), Some("demo"));
        let deps = first.get("dependencies").and_then(Value::as_table).unwrap();
        assert_eq!(deps.get("python").and_then(Value::as_str), Some(">=3.9,<4.0.0"));

        let second = overlay.read().unwrap();
        assert_eq!(&first, second);
    }

    #[test]
    fn test_read_on_unrecognized_schema_fails() {
        let mut overlay = overlay_from("[build-system]\nrequires = []\n");
        assert!(overlay.read().is_err());
    }

    #[test]
    fn test_write_on_native_document_is_rejected() {
        let mut overlay = overlay_from("[tool.poetry]\nname = \"native\"\n");
        let err = overlay.write(Table::new()).unwrap_err();
        assert!(matches!(err, CompatError::UnsupportedEdit { .. }));
    }

    #[test]
    fn test_write_replays_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("pyproject.toml")).unwrap();
        std::fs::write(&path, SAMPLE).unwrap();

        let mut overlay = OverlayDocument::load(&path).unwrap();
        let mut view = overlay.read().unwrap().clone();

        // add one dependency, leave everything else untouched
        if let Some(Value::Table(deps)) = view.get_mut("dependencies") {
            deps.insert("httpx".to_string(), Value::String("^0.27".to_string()));
        }
        let outcome = overlay.write(view.clone()).unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.applied, 1);

        let persisted = std::fs::read_to_string(&path).unwrap();
        assert!(persisted.contains("httpx>=0.27,<1.0"));
        assert!(persisted.contains("# keep requests pinned"));
        assert!(persisted.contains("\"requests>=2.28\""));
        assert!(persisted.contains("requires-python = \">=3.9\""));

        // subsequent reads observe the written view, not a re-projection
        let after = overlay.read().unwrap();
        assert_eq!(after, &view);
    }

    #[test]
    fn test_failed_persist_keeps_cache_coherent() {
        let mut overlay = OverlayDocument::new(
            PyProjectDocument::parse(SAMPLE, "/nonexistent/dir/pyproject.toml").unwrap(),
        );
        let mut view = overlay.read().unwrap().clone();
        if let Some(Value::Table(deps)) = view.get_mut("dependencies") {
            deps.insert("httpx".to_string(), Value::String("^0.27".to_string()));
        }

        let err = overlay.write(view.clone()).unwrap_err();
        assert!(matches!(err, CompatError::Io { .. }));

        // the in-memory document already carries the edit; reads stay in sync
        let after = overlay.read().unwrap();
        assert_eq!(after, &view);
    }

    #[test]
    fn test_write_drops_unsupported_edits_but_persists_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("pyproject.toml")).unwrap();
        std::fs::write(&path, SAMPLE).unwrap();

        let mut overlay = OverlayDocument::load(&path).unwrap();
        let mut view = overlay.read().unwrap().clone();

        view.insert(
            "description".to_string(),
            Value::String("edited in the view".to_string()),
        );
        if let Some(Value::Table(deps)) = view.get_mut("dependencies") {
            deps.remove("requests");
        }
        let outcome = overlay.write(view).unwrap();

        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.dropped.len(), 1);
        let persisted = std::fs::read_to_string(&path).unwrap();
        assert!(!persisted.contains("requests>=2.28"));
        assert!(!persisted.contains("edited in the view"));
    }

    #[test]
    fn test_write_through_dev_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("pyproject.toml")).unwrap();
        std::fs::write(&path, SAMPLE).unwrap();

        let mut overlay = OverlayDocument::load(&path).unwrap();
        let mut view = overlay.read().unwrap().clone();

        let dev_deps = view
            .get_mut("group")
            .and_then(|groups| groups.get_mut("dev"))
            .and_then(|dev| dev.as_table_mut())
            .and_then(|dev| dev.get_mut("dependencies"))
            .and_then(|deps| deps.as_table_mut())
            .unwrap();
        dev_deps.insert("ruff".to_string(), Value::String(">=0.4".to_string()));

        let outcome = overlay.write(view).unwrap();
        assert!(outcome.is_clean());
        let persisted = std::fs::read_to_string(&path).unwrap();
        assert!(persisted.contains("ruff>=0.4"));
        assert!(persisted.contains("\"pytest>=7\""));
    }
}
