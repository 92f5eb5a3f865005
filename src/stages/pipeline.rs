//! Glue between the CLI and the stages: parameter checks, model discovery
//! and the load-then-run helpers shared by every subcommand.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::io::{
    load_linked_claims_jsonl, load_queries_jsonl, load_transcript, load_transcripts_by_doc_id,
};
use crate::llm::{ChatGateway, OllamaClient};
use crate::models::{ChunkConfig, ChunkError, ClaimRecord, QueryRecord};
use crate::stages::{
    choose_query_model, compute_link_diagnostics, extract_claims_for_models,
    generate_validation_queries, ExtractionConfig, ExtractionResult, LinkDiagnostics, QueryConfig,
};

/// Split a comma-separated model list, dropping blanks
pub fn parse_model_list(models: &str) -> Vec<String> {
    models
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check chunk flags, naming the offending `--{label}-size`/`--{label}-overlap`
/// flag in the error
pub fn validate_chunk_flags(chunk_size: i64, chunk_overlap: i64, label: &str) -> Result<()> {
    match ChunkConfig::new(chunk_size, chunk_overlap).validate() {
        Ok(_) => Ok(()),
        Err(ChunkError::NonPositiveSize) => anyhow::bail!("--{label}-size must be > 0"),
        Err(ChunkError::NegativeOverlap) => anyhow::bail!("--{label}-overlap must be >= 0"),
        Err(ChunkError::OverlapTooLarge) => {
            anyhow::bail!("--{label}-overlap must be smaller than --{label}-size")
        }
    }
}

/// Fail early when a required input path is missing
pub fn validate_path_exists(path: &Path, flag: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{flag} path does not exist: {:?}", path);
    }
    Ok(())
}

/// Installed model names, or a fatal error naming the server
pub async fn fetch_available_models(client: &OllamaClient) -> Result<Vec<String>> {
    client
        .list_models()
        .await
        .with_context(|| format!("Could not connect to Ollama at {}", client.config().base_url))
}

/// Warn about requested models the server does not have; returns them
pub fn warn_missing_models(requested: &[String], available: &[String]) -> Vec<String> {
    let missing: Vec<String> = requested
        .iter()
        .filter(|m| !available.contains(m))
        .cloned()
        .collect();
    if !missing.is_empty() {
        warn!("Requested models not found in /api/tags: {:?}", missing);
    }
    missing
}

/// Validate inputs, load the transcript and run claim extraction
pub async fn run_claim_extraction<G: ChatGateway>(
    gateway: &G,
    transcript: &Path,
    models: &[String],
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    if models.is_empty() {
        anyhow::bail!("No models provided.");
    }
    validate_path_exists(transcript, "--transcript")?;
    validate_chunk_flags(config.chunk_size, config.chunk_overlap, "chunk")?;

    let document = load_transcript(transcript).context("Failed to load transcript")?;
    info!(
        "Loaded transcript {} with {} segments",
        document.doc_id,
        document.segments.len()
    );
    extract_claims_for_models(gateway, &document, models, config).await
}

/// Pick a query model and generate queries for the claims.
///
/// With no model available the step is skipped with a warning and yields no
/// queries.
pub async fn run_query_generation<G: ChatGateway>(
    gateway: &G,
    claims: &[ClaimRecord],
    query_model: Option<&str>,
    models: &[String],
    available_models: &[String],
    config: &QueryConfig,
) -> Result<Vec<QueryRecord>> {
    validate_chunk_flags(config.chunk_size, config.chunk_overlap, "query-chunk")?;
    let Some(selected) = choose_query_model(query_model, models, available_models) else {
        warn!(
            "Skipping query generation: no model available. \
             Use --query-model or install a local Ollama model."
        );
        return Ok(Vec::new());
    };

    info!("Generating validation queries with: {}", selected);
    let result = generate_validation_queries(gateway, claims, &selected, config).await?;
    info!(
        "Generated {} queries ({} from model, {} fallback, {} chunks failed)",
        result.queries.len(),
        result.stats.model_queries,
        result.stats.fallback_queries,
        result.stats.chunks_failed
    );
    Ok(result.queries)
}

/// Load claims, queries and transcripts from disk and check their links.
///
/// Claim rows missing a claim_id, doc_id, claim_text or evidence seg_id are
/// skipped, so queries pointing at them count as orphans.
pub fn run_link_diagnostics(
    claims: &Path,
    queries: &Path,
    transcripts: &Path,
) -> Result<LinkDiagnostics> {
    validate_path_exists(claims, "--claims")?;
    validate_path_exists(queries, "--queries")?;

    let claims = load_linked_claims_jsonl(claims).context("Failed to load claims")?;
    let queries = load_queries_jsonl(queries).context("Failed to load queries")?;
    let transcripts =
        load_transcripts_by_doc_id(transcripts).context("Failed to load transcripts")?;
    info!(
        "Loaded {} claims, {} queries, {} transcripts",
        claims.len(),
        queries.len(),
        transcripts.len()
    );

    Ok(compute_link_diagnostics(&claims, &queries, &transcripts))
}
