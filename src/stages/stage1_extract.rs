use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::{
    build_claim_prompt, build_segment_block, extract_json_object, normalize_claims, ChatGateway,
    Normalized,
};
use crate::models::{
    build_chunks, start_time_by_seg_id, ChunkConfig, ChunkError, ClaimRecord, TranscriptDocument,
    TranscriptSegment,
};
use crate::stages::dedupe_and_assign_claim_ids;

/// Configuration for claim extraction
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Transcript segments per model call
    pub chunk_size: i64,
    /// Segments shared between adjacent chunks
    pub chunk_overlap: i64,
    /// Cap on transcript segments to process (0 = all)
    pub max_segments: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 45,
            chunk_overlap: 12,
            max_segments: 0,
        }
    }
}

impl ExtractionConfig {
    /// Check the chunk parameters without building any chunks
    pub fn validate(&self) -> Result<(), ChunkError> {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
            .validate()
            .map(|_| ())
    }
}

/// Counters describing one extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractionStats {
    /// Model calls attempted (chunks x models)
    pub chunks_attempted: usize,
    /// Chunks skipped because the request or JSON parsing failed
    pub chunks_failed: usize,
    /// Chunks whose response had no `claims` list
    pub chunks_without_claims: usize,
    /// Claim rows rejected by validation
    pub rows_rejected: usize,
    /// Unique claims per model, in model order
    pub claims_per_model: Vec<(String, usize)>,
}

/// Result of claim extraction
#[derive(Debug)]
pub struct ExtractionResult {
    /// Deduplicated claims with final ids
    pub claims: Vec<ClaimRecord>,
    pub stats: ExtractionStats,
}

enum ChunkClaims {
    Rows(Normalized<ClaimRecord>),
    MissingList,
}

/// Run multi-model claim extraction over a transcript.
///
/// Every model sees every chunk, strictly one request at a time. Failed
/// chunks are logged and skipped. Claims are deduplicated per model and then
/// once more across models; only the final pass's ids survive.
///
/// Fails before any request when the model list is empty or the chunk
/// parameters are invalid.
pub async fn extract_claims_for_models<G: ChatGateway>(
    gateway: &G,
    document: &TranscriptDocument,
    models: &[String],
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    if models.is_empty() {
        anyhow::bail!("No models provided.");
    }
    let segments: &[TranscriptSegment] = if config.max_segments > 0 {
        &document.segments[..config.max_segments.min(document.segments.len())]
    } else {
        &document.segments
    };
    let chunks = build_chunks(segments, config.chunk_size, config.chunk_overlap)
        .context("Invalid chunk parameters")?;
    let start_times = start_time_by_seg_id(segments);

    info!(
        "Extracting claims from {} ({} segments, {} chunks, {} models)",
        document.doc_id,
        segments.len(),
        chunks.len(),
        models.len()
    );

    let mut stats = ExtractionStats::default();
    let mut all_rows = Vec::new();

    for model in models {
        info!("Running extraction with model: {}", model);
        let mut model_rows = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let label = format!("{}/{}", index + 1, chunks.len());
            stats.chunks_attempted += 1;

            match process_chunk(gateway, &document.doc_id, model, chunk, &label, &start_times).await {
                Ok(ChunkClaims::Rows(normalized)) => {
                    info!("{} chunk {}: {} claims", model, label, normalized.rows.len());
                    stats.rows_rejected += normalized.skipped;
                    model_rows.extend(normalized.rows);
                }
                Ok(ChunkClaims::MissingList) => {
                    warn!("Model {}, chunk {} returned no claims list.", model, label);
                    stats.chunks_without_claims += 1;
                }
                Err(e) => {
                    warn!("Model {}, chunk {} failed: {:#}", model, label, e);
                    stats.chunks_failed += 1;
                }
            }
        }

        let deduped = dedupe_and_assign_claim_ids(model_rows);
        info!(
            "Model {} produced {} unique claims across {} chunks.",
            model,
            deduped.len(),
            chunks.len()
        );
        stats.claims_per_model.push((model.clone(), deduped.len()));
        all_rows.extend(deduped);
    }

    let claims = dedupe_and_assign_claim_ids(all_rows);
    Ok(ExtractionResult { claims, stats })
}

/// Prompt one model with one chunk and normalize the claims it returns
async fn process_chunk<G: ChatGateway>(
    gateway: &G,
    doc_id: &str,
    model: &str,
    chunk: &[TranscriptSegment],
    label: &str,
    start_times: &HashMap<String, i64>,
) -> Result<ChunkClaims> {
    let segment_block = build_segment_block(chunk);
    let messages = build_claim_prompt(doc_id, &segment_block, label);

    let response = gateway
        .chat(model, &messages)
        .await
        .context("Model request failed")?;
    let payload = extract_json_object(&response).context("Could not parse JSON response")?;

    match payload.get("claims") {
        Some(Value::Array(raw_claims)) => Ok(ChunkClaims::Rows(normalize_claims(
            doc_id,
            model,
            raw_claims,
            start_times,
        ))),
        None => Ok(ChunkClaims::Rows(Normalized {
            rows: Vec::new(),
            skipped: 0,
        })),
        Some(_) => Ok(ChunkClaims::MissingList),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::ScriptedGateway;
    use crate::models::TimeRange;

    fn document() -> TranscriptDocument {
        TranscriptDocument {
            doc_id: "doc_1".to_string(),
            segments: (1..=5)
                .map(|i| {
                    TranscriptSegment::new(
                        format!("seg_{i:06}"),
                        "Host",
                        i * 10,
                        format!("segment {i}"),
                    )
                })
                .collect(),
        }
    }

    fn claims_response(claims: &[(&str, &str)]) -> String {
        let rows: Vec<Value> = claims
            .iter()
            .map(|(text, seg)| {
                serde_json::json!({
                    "speaker": "Host",
                    "claim_text": text,
                    "evidence": [{"seg_id": seg, "quote": text}],
                    "claim_type": "nutrition_claim"
                })
            })
            .collect();
        serde_json::json!({ "claims": rows }).to_string()
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extraction_config_default() {
        let config = ExtractionConfig::default();
        assert_eq!(config.chunk_size, 45);
        assert_eq!(config.chunk_overlap, 12);
        assert_eq!(config.max_segments, 0);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_dedupes_overlapping_chunks_and_models() {
        // 5 segments, size 3 overlap 1 -> chunks [1,2,3] and [3,4,5]
        let gateway = ScriptedGateway::new(vec![
            Ok(claims_response(&[("Fiber lowers LDL", "seg_000003")])),
            Ok(format!(
                "Sure! ```json\n{}\n```",
                claims_response(&[("Fiber lowers LDL.", "seg_000003"), ("Sleep matters", "seg_000005")])
            )),
            Ok(claims_response(&[("Fiber lowers LDL", "seg_000003")])),
            Ok(claims_response(&[])),
        ]);
        let config = ExtractionConfig {
            chunk_size: 3,
            chunk_overlap: 1,
            max_segments: 0,
        };

        let result = extract_claims_for_models(&gateway, &document(), &models(&["a", "b"]), &config)
            .await
            .unwrap();

        let summary: Vec<(&str, &str, &str)> = result
            .claims
            .iter()
            .map(|c| (c.id(), c.model.as_str(), c.claim_text.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("clm_000001", "a", "Fiber lowers LDL"),
                ("clm_000002", "a", "Sleep matters"),
                ("clm_000003", "b", "Fiber lowers LDL"),
            ]
        );
        assert_eq!(result.claims[0].time_range_s, TimeRange { start: 30, end: 30 });
        assert_eq!(result.stats.chunks_attempted, 4);
        assert_eq!(
            result.stats.claims_per_model,
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );

        let calls = gateway.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0, "a");
        assert_eq!(calls[2].0, "b");
        assert!(calls[1].1[1].content.contains("Chunk: 2/2"));
        assert!(calls[1].1[1].content.contains("seg_000005 | 50 | Host | segment 5"));
        assert!(!calls[1].1[1].content.contains("seg_000002"));
    }

    #[tokio::test]
    async fn test_bad_chunks_are_skipped() {
        let gateway = ScriptedGateway::new(vec![
            Err("connection refused".to_string()),
            Ok("I could not find any claims.".to_string()),
            Ok(r#"{"claims": "none"}"#.to_string()),
            Ok(claims_response(&[("Creatine is safe", "seg_000005"), ("", "seg_000005")])),
        ]);
        let config = ExtractionConfig {
            chunk_size: 2,
            chunk_overlap: 1,
            max_segments: 0,
        };

        let result = extract_claims_for_models(&gateway, &document(), &models(&["a"]), &config)
            .await
            .unwrap();

        assert_eq!(result.claims.len(), 1);
        assert_eq!(result.claims[0].id(), "clm_000001");
        assert_eq!(result.stats.chunks_attempted, 4);
        assert_eq!(result.stats.chunks_failed, 2);
        assert_eq!(result.stats.chunks_without_claims, 1);
        assert_eq!(result.stats.rows_rejected, 1);
    }

    #[tokio::test]
    async fn test_max_segments_truncates_input() {
        let gateway = ScriptedGateway::new(vec![Ok(claims_response(&[]))]);
        let config = ExtractionConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            max_segments: 2,
        };

        extract_claims_for_models(&gateway, &document(), &models(&["a"]), &config)
            .await
            .unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1[1].content.contains("seg_000002"));
        assert!(!calls[0].1[1].content.contains("seg_000003"));
    }

    #[tokio::test]
    async fn test_invalid_parameters_fail_before_any_request() {
        let gateway = ScriptedGateway::new(vec![]);
        let bad = ExtractionConfig {
            chunk_size: 4,
            chunk_overlap: 4,
            max_segments: 0,
        };

        assert!(
            extract_claims_for_models(&gateway, &document(), &models(&["a"]), &bad)
                .await
                .is_err()
        );
        assert!(
            extract_claims_for_models(&gateway, &document(), &[], &ExtractionConfig::default())
                .await
                .is_err()
        );
        assert!(gateway.calls().is_empty());
    }
}
