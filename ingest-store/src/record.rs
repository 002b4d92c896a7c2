//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One source row: named raw values in column order plus its source position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Position in the source sequence; stable for the lifetime of a run.
    pub position: usize,
    pub fields: Vec<(String, String)>,
}

impl Record {
    pub fn new(position: usize, fields: Vec<(String, String)>) -> Self {
        Self { position, fields }
    }

    /// Raw value of `name` (first occurrence), if the column exists.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A record that passed normalization and waits for its embedding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingUnit {
    pub id: String,
    pub text: String,
}

/// The committed `(id, text, vector)` triple written to the index.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestUnit {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Stable string id for a source position, e.g. `book_37`.
pub fn record_id(prefix: &str, position: usize) -> String {
    format!("{prefix}_{position}")
}

/// Deterministic UUIDv5 from an arbitrary string id (Qdrant point ids must be UUIDs or integers).
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable() {
        assert_eq!(record_id("book", 37), "book_37");
        assert_eq!(stable_uuid("book_37"), stable_uuid("book_37"));
        assert_ne!(stable_uuid("book_37"), stable_uuid("book_38"));
    }

    #[test]
    fn get_returns_first_matching_column() {
        let r = Record::new(
            0,
            vec![
                ("Title".into(), "Dune".into()),
                ("Author".into(), "Herbert".into()),
            ],
        );
        assert_eq!(r.get("Author"), Some("Herbert"));
        assert_eq!(r.get("Year"), None);
    }
}
