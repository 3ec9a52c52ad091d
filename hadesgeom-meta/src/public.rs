//! Bundled public test metadata.
//!
//! Stands in for the collaboration-internal metadata repository. Any
//! detector name resolves to the bundled dummy with the same type letter;
//! crystal documents are renamed to the requested detector with production
//! order 0, slice `A`.

use crate::store::{Document, DocumentStore, InMemoryStore};
use serde_yml::Value;
use std::io;

const DIODE_V: &str = include_str!("../data/public/diodes/V99000A.yaml");
const DIODE_B: &str = include_str!("../data/public/diodes/B99000A.yaml");
const HADES_V: &str = include_str!("../data/public/hades/V99000A.yaml");
const HADES_B: &str = include_str!("../data/public/hades/B99000A.yaml");

/// Suffix of every bundled dummy detector name.
pub const DUMMY_SUFFIX: &str = "99000A";

/// Store over the bundled dummy documents.
#[derive(Debug, Clone)]
pub struct PublicStore {
    documents: InMemoryStore,
    rename: bool,
}

impl PublicStore {
    /// Public crystal documents.
    #[must_use]
    pub fn diodes() -> Self {
        Self {
            documents: InMemoryStore::new("public diode")
                .with(dummy_key('V'), Document::yaml(DIODE_V))
                .with(dummy_key('B'), Document::yaml(DIODE_B)),
            rename: true,
        }
    }

    /// Public holder/wrap documents.
    #[must_use]
    pub fn hades() -> Self {
        Self {
            documents: InMemoryStore::new("public holder/wrap")
                .with(dummy_key('V'), Document::yaml(HADES_V))
                .with(dummy_key('B'), Document::yaml(HADES_B)),
            rename: false,
        }
    }
}

fn dummy_key(letter: char) -> String {
    format!("{letter}{DUMMY_SUFFIX}")
}

fn rename_diode(text: &str, name: &str) -> Result<String, serde_yml::Error> {
    let mut value: Value = serde_yml::from_str(text)?;
    if let Some(map) = value.as_mapping_mut() {
        map.insert(Value::from("name"), Value::from(name));
        if let Some(production) = map.get_mut("production").and_then(Value::as_mapping_mut) {
            production.insert(Value::from("order"), Value::from(0));
            production.insert(Value::from("slice"), Value::from("A"));
        }
    }
    serde_yml::to_string(&value)
}

impl DocumentStore for PublicStore {
    fn label(&self) -> &str {
        self.documents.label()
    }

    fn fetch(&self, key: &str) -> io::Result<Option<Document>> {
        let Some(letter) = key.chars().next() else {
            return Ok(None);
        };
        let Some(dummy) = self.documents.fetch(&dummy_key(letter))? else {
            return Ok(None);
        };
        if !self.rename {
            return Ok(Some(dummy));
        }
        let text = rename_diode(&dummy.text, key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        Ok(Some(Document::yaml(text)))
    }
}
