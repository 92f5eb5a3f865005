pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use heuristics::{generate_heuristic_queries, naturalize_query_question, NEAR_DUPLICATE_THRESHOLD};
pub use io::{
    load_claims_jsonl, load_linked_claims_jsonl, load_queries_jsonl, load_transcript,
    load_transcripts_by_doc_id, print_claim_rows, print_query_rows, write_json, write_jsonl,
    LoadError,
};
pub use llm::{
    extract_json_object, normalize_claims, normalize_query_rows, ChatGateway, ChatMessage,
    GatewayError, OllamaClient, OllamaConfig,
};
pub use models::{
    build_chunks, ClaimRecord, ClaimType, EvidenceItem, QueryRecord, TimeRange,
    TranscriptDocument, TranscriptSegment,
};
pub use stages::{
    choose_query_model, compute_link_diagnostics, dedupe_and_assign_claim_ids, dedupe_queries,
    extract_claims_for_models, fetch_available_models, generate_validation_queries,
    parse_model_list, run_claim_extraction, run_link_diagnostics, run_query_generation,
    validate_chunk_flags, validate_path_exists, warn_missing_models, ExtractionConfig,
    LinkDiagnostics, QueryConfig,
};
