//! Tabular input readers: CSV with a header row, or JSONL objects.
//!
//! - [`read_csv`] → strict; a malformed row fails the read (repair happens upstream).
//! - [`read_jsonl`] → tolerant; malformed lines are logged and skipped.
//! - [`read_records`] → dispatches on the file extension.
//!
//! Positions are assigned in read order starting at 0.

use crate::errors::IngestError;
use crate::record::Record;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read};
use std::{fs::File, path::Path};
use tracing::{debug, info, warn};

/// Reads records from `path`, choosing the format by extension.
///
/// # Errors
/// - [`IngestError::Config`] for unsupported extensions.
/// - [`IngestError::Io`] / [`IngestError::Csv`] on read failures.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>, IngestError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    info!("Reading records from {:?}", path);
    let file = File::open(path)?;
    match ext.as_str() {
        "csv" => read_csv(file),
        "jsonl" | "ndjson" => read_jsonl(BufReader::new(file)),
        other => Err(IngestError::Config(format!(
            "unsupported input extension '{other}' (expected csv, jsonl or ndjson)"
        ))),
    }
}

/// Reads CSV with a header row. A UTF-8 BOM on the first header is stripped.
///
/// # Errors
/// - [`IngestError::Csv`] on malformed rows or inconsistent column counts.
pub fn read_csv(reader: impl Read) -> Result<Vec<Record>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut out = Vec::new();
    for (position, row) in rdr.records().enumerate() {
        let row = row?;
        let fields = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        out.push(Record::new(position, fields));
    }

    debug!("Loaded {} CSV records", out.len());
    Ok(out)
}

/// Reads one JSON object per line into records.
///
/// Strings are kept as-is, numbers and booleans are rendered, `null` becomes
/// empty, nested values are rendered as JSON. Empty lines are skipped and do
/// not consume a position; malformed lines are logged and skipped.
///
/// # Errors
/// - [`IngestError::Io`] if the input cannot be read.
pub fn read_jsonl(reader: impl BufRead) -> Result<Vec<Record>, IngestError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&line) {
            Ok(Value::Object(map)) => {
                let fields = map
                    .into_iter()
                    .map(|(k, v)| (k, value_to_string(v)))
                    .collect();
                out.push(Record::new(out.len(), fields));
            }
            Ok(_) => warn!("Skipping non-object JSON on line {}", i + 1),
            Err(e) => warn!("Skipping malformed JSON on line {}: {}", i + 1, e),
        }
    }

    debug!("Loaded {} JSONL records", out.len());
    Ok(out)
}

fn value_to_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_keep_column_order_and_quotes() {
        let data = "\u{feff}Title,Author,Description\n\
                    Dune,Frank Herbert,\"Spice, sand and \"\"worms\"\"\"\n\
                    Emma,Jane Austen,\n";
        let recs = read_csv(data.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].position, 0);
        assert_eq!(recs[0].fields[0].0, "Title");
        assert_eq!(recs[0].get("Description"), Some("Spice, sand and \"worms\""));
        assert_eq!(recs[1].position, 1);
        assert_eq!(recs[1].get("Description"), Some(""));
    }

    #[test]
    fn csv_ragged_row_is_an_error() {
        let data = "Title,Author\nDune\n";
        assert!(matches!(
            read_csv(data.as_bytes()),
            Err(IngestError::Csv(_))
        ));
    }

    #[test]
    fn jsonl_is_tolerant() {
        let data = "{\"Title\":\"Dune\",\"Year\":1965,\"Author\":null}\n\
                    \n\
                    not json\n\
                    [1,2]\n\
                    {\"Title\":\"Emma\"}\n";
        let recs = read_jsonl(data.as_bytes()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].get("Year"), Some("1965"));
        assert_eq!(recs[0].get("Author"), Some(""));
        assert_eq!(recs[1].position, 1);
        assert_eq!(recs[1].get("Title"), Some("Emma"));
    }

    #[test]
    fn jsonl_keeps_source_column_order() {
        let data = "{\"Title\":\"Dune\",\"Author\":\"Herbert\",\"Subjects\":\"SF\"}\n";
        let recs = read_jsonl(data.as_bytes()).unwrap();
        let names: Vec<&str> = recs[0].fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["Title", "Author", "Subjects"]);
    }

    #[test]
    fn unknown_extension_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("books.xlsx");
        std::fs::write(&p, "x").unwrap();
        assert!(matches!(read_records(&p), Err(IngestError::Config(_))));
    }
}
