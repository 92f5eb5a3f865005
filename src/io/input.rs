use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::{ClaimRecord, QueryRecord, TranscriptDocument};

/// Failure to load a transcript or a JSONL artifact
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path:?} at line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transcript JSON missing doc_id.")]
    MissingDocId,

    #[error("Transcript JSON missing segments.")]
    MissingSegments,

    #[error("Transcript path must be a .json file: {0:?}")]
    NotJsonFile(PathBuf),

    #[error("No transcript JSON files found in directory: {0:?}")]
    NoTranscripts(PathBuf),

    #[error("Path does not exist: {0:?}")]
    NotFound(PathBuf),
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a transcript document, requiring a doc_id and at least one segment
pub fn parse_transcript_json(json: &str, path: &Path) -> Result<TranscriptDocument, LoadError> {
    let document: TranscriptDocument =
        serde_json::from_str(json).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })?;
    if document.doc_id.is_empty() {
        return Err(LoadError::MissingDocId);
    }
    if document.segments.is_empty() {
        return Err(LoadError::MissingSegments);
    }
    Ok(document)
}

/// Load a single normalized transcript JSON file
pub fn load_transcript(path: &Path) -> Result<TranscriptDocument, LoadError> {
    let content = read_file(path)?;
    parse_transcript_json(&content, path)
}

/// JSON objects from a JSONL file; blank and non-object lines are skipped
fn load_jsonl_objects(path: &Path) -> Result<Vec<(usize, Value)>, LoadError> {
    let content = read_file(path)?;
    let mut rows = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(stripped).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        if value.is_object() {
            rows.push((index + 1, value));
        }
    }
    Ok(rows)
}

fn load_typed_rows<T, F>(path: &Path, kind: &str, check: F) -> Result<Vec<T>, LoadError>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<(), &'static str>,
{
    let mut rows = Vec::new();
    for (line, value) in load_jsonl_objects(path)? {
        match serde_json::from_value(value) {
            Ok(row) => match check(&row) {
                Ok(()) => rows.push(row),
                Err(reason) => warn!("Skipped invalid {} row at line {}: {}", kind, line, reason),
            },
            Err(e) => warn!("Skipped invalid {} row at line {}: {}", kind, line, e),
        }
    }
    Ok(rows)
}

/// Load claim rows from JSONL
pub fn load_claims_jsonl(path: &Path) -> Result<Vec<ClaimRecord>, LoadError> {
    load_typed_rows(path, "claim", |_| Ok(()))
}

/// Rows that can take part in link checks: a claim_id, doc_id and claim_text,
/// and a seg_id on every evidence item
fn check_linked_claim(claim: &ClaimRecord) -> Result<(), &'static str> {
    if claim.id().is_empty() {
        return Err("missing claim_id");
    }
    if claim.doc_id.is_empty() {
        return Err("missing doc_id");
    }
    if claim.claim_text.is_empty() {
        return Err("missing claim_text");
    }
    if claim.evidence.iter().any(|e| e.seg_id.is_empty()) {
        return Err("evidence item missing seg_id");
    }
    Ok(())
}

/// Load claim rows for link diagnostics, skipping rows without the fields
/// the links depend on
pub fn load_linked_claims_jsonl(path: &Path) -> Result<Vec<ClaimRecord>, LoadError> {
    load_typed_rows(path, "claim", check_linked_claim)
}

/// Load query rows from JSONL
pub fn load_queries_jsonl(path: &Path) -> Result<Vec<QueryRecord>, LoadError> {
    load_typed_rows(path, "query", |_| Ok(()))
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

/// Transcript files under a path: the file itself, or every `*.json` below
/// a directory in sorted order
pub fn transcript_files(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if path.is_file() {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(LoadError::NotJsonFile(path.to_path_buf()));
        }
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        let mut files = Vec::new();
        collect_json_files(path, &mut files)?;
        files.sort();
        if files.is_empty() {
            return Err(LoadError::NoTranscripts(path.to_path_buf()));
        }
        return Ok(files);
    }
    Err(LoadError::NotFound(path.to_path_buf()))
}

/// Load every transcript under a file or directory, keyed by doc_id.
///
/// Unreadable, invalid, id-less and duplicate-id transcripts are skipped with
/// a warning; the first file seen for a doc_id wins.
pub fn load_transcripts_by_doc_id(
    path: &Path,
) -> Result<HashMap<String, TranscriptDocument>, LoadError> {
    let mut docs_by_id = HashMap::new();

    for file in transcript_files(path)? {
        let document = match read_file(&file).and_then(|content| {
            serde_json::from_str::<TranscriptDocument>(&content).map_err(|source| LoadError::Json {
                path: file.clone(),
                line: source.line(),
                source,
            })
        }) {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipped transcript {:?}: {}", file, e);
                continue;
            }
        };

        if document.doc_id.is_empty() {
            warn!("Skipped transcript {:?}: missing doc_id", file);
            continue;
        }
        if docs_by_id.contains_key(&document.doc_id) {
            warn!(
                "Skipped transcript {:?}: duplicate doc_id '{}' already loaded",
                file, document.doc_id
            );
            continue;
        }
        docs_by_id.insert(document.doc_id.clone(), document);
    }

    Ok(docs_by_id)
}
