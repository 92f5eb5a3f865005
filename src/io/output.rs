use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ClaimRecord, QueryRecord};

/// Write rows as JSONL: one compact JSON object per line, parent directories
/// created as needed
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row).context("Failed to write JSON")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a value as pretty-printed JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() { "unknown" } else { text }
}

/// One console line per claim: `claim_id | model | speaker | claim_type | claim_text`
pub fn format_claim_rows(rows: &[ClaimRecord]) -> String {
    let mut output = String::from("Extracted claims:\n");
    for row in rows {
        output.push_str(&format!(
            "{} | {} | {} | {} | {}\n",
            or_unknown(row.id()),
            or_unknown(&row.model),
            or_unknown(&row.speaker),
            row.claim_type,
            row.claim_text
        ));
    }
    output
}

/// One console line per query: `claim_id | query | why | sources`
pub fn format_query_rows(rows: &[QueryRecord]) -> String {
    let mut output = String::from("Validation queries:\n");
    for row in rows {
        output.push_str(&format!(
            "{} | {} | {} | {}\n",
            or_unknown(&row.claim_id),
            row.query,
            row.why_this_query,
            row.preferred_sources.join(", ")
        ));
    }
    output
}

pub fn print_claim_rows(rows: &[ClaimRecord]) {
    print!("{}", format_claim_rows(rows));
}

pub fn print_query_rows(rows: &[QueryRecord]) {
    print!("{}", format_query_rows(rows));
}
