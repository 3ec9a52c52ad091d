//! Metadata document stores.
//!
//! A store maps a key (the detector name) to the raw text of one document.
//! Parsing happens in the caller so every store shares the same error
//! reporting.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Serialization format of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Yaml,
    Json,
}

impl DocFormat {
    /// Guesses the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Raw document text plus its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub format: DocFormat,
}

impl Document {
    /// A YAML document.
    pub fn yaml(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: DocFormat::Yaml,
        }
    }

    /// A JSON document.
    pub fn json(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: DocFormat::Json,
        }
    }

    /// Deserializes the document.
    ///
    /// # Errors
    /// Returns the parser message on syntax or type errors.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, String> {
        match self.format {
            DocFormat::Yaml => serde_yml::from_str(&self.text).map_err(|e| e.to_string()),
            DocFormat::Json => serde_json::from_str(&self.text).map_err(|e| e.to_string()),
        }
    }
}

/// Key lookup over a collection of metadata documents.
pub trait DocumentStore {
    /// Human-readable store label used in error messages.
    fn label(&self) -> &str;

    /// Looks a document up by key.
    ///
    /// Returns `Ok(None)` if the store has no document for `key`.
    ///
    /// # Errors
    /// Returns an I/O error if a document exists but cannot be read.
    fn fetch(&self, key: &str) -> io::Result<Option<Document>>;
}

/// Documents stored as `<root>/<key>.{yaml,yml,json}`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    label: String,
    root: PathBuf,
}

impl DirectoryStore {
    const EXTENSIONS: [&'static str; 3] = ["yaml", "yml", "json"];

    /// Creates a store over a directory.
    pub fn new(label: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            root: root.into(),
        }
    }

    fn candidates<'a>(&'a self, key: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        Self::EXTENSIONS
            .iter()
            .map(move |ext| self.root.join(format!("{key}.{ext}")))
    }
}

impl DocumentStore for DirectoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch(&self, key: &str) -> io::Result<Option<Document>> {
        // keys are bare names, never paths
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Ok(None);
        }
        for path in self.candidates(key) {
            match fs::read_to_string(&path) {
                Ok(text) => {
                    log::debug!("{}: loaded {}", self.label, path.display());
                    return Ok(Some(Document {
                        text,
                        format: DocFormat::from_path(&path),
                    }));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

/// Documents held in memory, for fixtures and bundled data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    label: String,
    documents: HashMap<String, Document>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            documents: HashMap::new(),
        }
    }

    /// Adds a document, replacing any previous one with the same key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, document: Document) -> Self {
        self.insert(key, document);
        self
    }

    /// Adds a document, replacing any previous one with the same key.
    pub fn insert(&mut self, key: impl Into<String>, document: Document) {
        self.documents.insert(key.into(), document);
    }
}

impl DocumentStore for InMemoryStore {
    fn label(&self) -> &str {
        &self.label
    }

    fn fetch(&self, key: &str) -> io::Result<Option<Document>> {
        Ok(self.documents.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_directory_store_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("V01234A.yml"), "name: V01234A\n").unwrap();
        let mut file = fs::File::create(dir.path().join("B00000B.json")).unwrap();
        file.write_all(br#"{"name": "B00000B"}"#).unwrap();

        let store = DirectoryStore::new("diodes", dir.path());
        let yaml = store.fetch("V01234A").unwrap().unwrap();
        assert_eq!(yaml.format, DocFormat::Yaml);
        let json = store.fetch("B00000B").unwrap().unwrap();
        assert_eq!(json.format, DocFormat::Json);
        assert!(store.fetch("V99999Z").unwrap().is_none());
    }

    #[test]
    fn test_directory_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("secret.yaml"), "x: 1\n").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let store = DirectoryStore::new("diodes", &sub);
        assert!(store.fetch("../secret").unwrap().is_none());
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new("fixtures").with("a", Document::yaml("x: 1"));
        assert_eq!(store.label(), "fixtures");
        assert_eq!(store.fetch("a").unwrap().unwrap().text, "x: 1");
        assert!(store.fetch("b").unwrap().is_none());
    }
}
