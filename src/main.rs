use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use proofread::{
    fetch_available_models, load_claims_jsonl, parse_model_list, print_claim_rows,
    print_query_rows, run_claim_extraction, run_link_diagnostics, run_query_generation,
    validate_chunk_flags, validate_path_exists, warn_missing_models, write_json, write_jsonl,
    ClaimRecord, ExtractionConfig, OllamaClient, OllamaConfig, QueryConfig,
};

const DEFAULT_MODELS: &str = "gpt-oss:20b,qwen3:4b";

#[derive(Parser)]
#[command(name = "proofread")]
#[command(author, version, about = "Extract health claims from transcripts and generate validation queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract claims from transcript segments and write claims JSONL
    ExtractClaims {
        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        ollama: OllamaArgs,

        /// Skip printing extracted claims
        #[arg(long)]
        no_list_claims: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate validation queries from an existing claims JSONL file
    GenerateQueries {
        /// Existing claims JSONL used as input
        #[arg(long, default_value = "data/claims.jsonl")]
        claims_input: PathBuf,

        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        ollama: OllamaArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run extraction and query generation end-to-end
    RunPipeline {
        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        ollama: OllamaArgs,

        /// Skip printing extracted claims
        #[arg(long)]
        no_list_claims: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report broken links between claims, queries and transcripts
    Diagnose {
        /// Claims JSONL
        #[arg(long, default_value = "data/claims.jsonl")]
        claims: PathBuf,

        /// Queries JSONL
        #[arg(long, default_value = "data/claim_queries.jsonl")]
        queries: PathBuf,

        /// Transcript JSON file or directory of transcripts
        #[arg(long, default_value = "data/transcripts/norm")]
        transcripts: PathBuf,

        /// Also write the diagnostics as a JSON report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct OllamaArgs {
    /// Comma-separated model names for extraction and query-model fallback
    #[arg(long, default_value = DEFAULT_MODELS)]
    models: String,

    /// Ollama base URL [default: $OLLAMA_URL or http://127.0.0.1:11434]
    #[arg(long)]
    ollama_url: Option<String>,

    /// Request timeout in seconds [default: $OLLAMA_TIMEOUT or 180]
    #[arg(long, allow_negative_numbers = true)]
    timeout: Option<f64>,
}

#[derive(Args)]
struct ExtractArgs {
    /// Normalized transcript JSON with segments
    #[arg(long)]
    transcript: PathBuf,

    /// Output JSONL file for extracted claims
    #[arg(long, default_value = "data/claims.jsonl")]
    output: PathBuf,

    /// Cap on transcript segments to process (0 = all)
    #[arg(long, default_value = "0")]
    max_segments: usize,

    /// Transcript segments per model call
    #[arg(long, default_value = "45", allow_negative_numbers = true)]
    chunk_size: i64,

    /// Segment overlap between adjacent chunks
    #[arg(long, default_value = "12", allow_negative_numbers = true)]
    chunk_overlap: i64,
}

#[derive(Args)]
struct QueryArgs {
    /// Output JSONL file for validation queries
    #[arg(long, default_value = "data/claim_queries.jsonl")]
    queries_output: PathBuf,

    /// Model for query generation (default: first available model from --models)
    #[arg(long)]
    query_model: Option<String>,

    /// Claims per query-generation model call
    #[arg(long, default_value = "25", allow_negative_numbers = true)]
    query_chunk_size: i64,

    /// Claim overlap between query-generation chunks
    #[arg(long, default_value = "5", allow_negative_numbers = true)]
    query_chunk_overlap: i64,

    /// Skip printing generated queries
    #[arg(long)]
    no_list_queries: bool,
}

impl OllamaArgs {
    fn config(&self) -> Result<OllamaConfig> {
        let mut config = OllamaConfig::from_env()?;
        if let Some(url) = &self.ollama_url {
            config.base_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

impl ExtractArgs {
    fn config(&self) -> Result<ExtractionConfig> {
        validate_path_exists(&self.transcript, "--transcript")?;
        validate_chunk_flags(self.chunk_size, self.chunk_overlap, "chunk")?;
        Ok(ExtractionConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            max_segments: self.max_segments,
        })
    }
}

impl QueryArgs {
    fn config(&self) -> Result<QueryConfig> {
        validate_chunk_flags(self.query_chunk_size, self.query_chunk_overlap, "query-chunk")?;
        Ok(QueryConfig {
            chunk_size: self.query_chunk_size,
            chunk_overlap: self.query_chunk_overlap,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ExtractClaims {
            extract,
            ollama,
            no_list_claims,
            verbose,
        } => {
            setup_logging(verbose);
            extract_claims(&extract, &ollama, !no_list_claims).await
        }
        Commands::GenerateQueries {
            claims_input,
            query,
            ollama,
            verbose,
        } => {
            setup_logging(verbose);
            generate_queries(&claims_input, &query, &ollama).await
        }
        Commands::RunPipeline {
            extract,
            query,
            ollama,
            no_list_claims,
            verbose,
        } => {
            setup_logging(verbose);
            run_pipeline(&extract, &query, &ollama, !no_list_claims).await
        }
        Commands::Diagnose {
            claims,
            queries,
            transcripts,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            diagnose(&claims, &queries, &transcripts, report.as_deref())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Connect to Ollama and list its models, after every local check has passed
async fn connect(
    ollama: &OllamaArgs,
    config: OllamaConfig,
) -> Result<(OllamaClient, Vec<String>, Vec<String>)> {
    let models = parse_model_list(&ollama.models);
    let client = OllamaClient::new(config)?;
    let available = fetch_available_models(&client).await?;
    warn_missing_models(&models, &available);
    Ok((client, models, available))
}

async fn extract_claims(
    extract: &ExtractArgs,
    ollama: &OllamaArgs,
    list_claims: bool,
) -> Result<()> {
    if parse_model_list(&ollama.models).is_empty() {
        anyhow::bail!("No models provided.");
    }
    let extraction_config = extract.config()?;
    let ollama_config = ollama.config()?;
    let (client, models, _) = connect(ollama, ollama_config).await?;

    extract_and_write(&client, extract, &models, &extraction_config, list_claims).await?;
    Ok(())
}

async fn extract_and_write(
    client: &OllamaClient,
    extract: &ExtractArgs,
    models: &[String],
    config: &ExtractionConfig,
    list_claims: bool,
) -> Result<Vec<ClaimRecord>> {
    let result = run_claim_extraction(client, &extract.transcript, models, config).await?;
    info!(
        "Extraction: {} chunk calls, {} failed, {} rows rejected",
        result.stats.chunks_attempted, result.stats.chunks_failed, result.stats.rows_rejected
    );

    write_jsonl(&extract.output, &result.claims)?;
    info!("Wrote {} claims to {:?}", result.claims.len(), extract.output);
    if list_claims {
        print_claim_rows(&result.claims);
    }
    Ok(result.claims)
}

async fn generate_queries(claims_input: &Path, query: &QueryArgs, ollama: &OllamaArgs) -> Result<()> {
    validate_path_exists(claims_input, "--claims-input")?;
    let query_config = query.config()?;
    let ollama_config = ollama.config()?;

    let claims = load_claims_jsonl(claims_input)
        .with_context(|| format!("Failed to load claims from {:?}", claims_input))?;
    info!("Loaded {} claims from {:?}", claims.len(), claims_input);

    let (client, models, available) = connect(ollama, ollama_config).await?;
    generate_and_write(&client, &claims, query, &query_config, &models, &available).await
}

async fn generate_and_write(
    client: &OllamaClient,
    claims: &[ClaimRecord],
    query: &QueryArgs,
    config: &QueryConfig,
    models: &[String],
    available: &[String],
) -> Result<()> {
    let queries = run_query_generation(
        client,
        claims,
        query.query_model.as_deref(),
        models,
        available,
        config,
    )
    .await?;

    write_jsonl(&query.queries_output, &queries)?;
    info!(
        "Wrote {} validation queries to {:?}",
        queries.len(),
        query.queries_output
    );
    if !query.no_list_queries {
        print_query_rows(&queries);
    }
    Ok(())
}

async fn run_pipeline(
    extract: &ExtractArgs,
    query: &QueryArgs,
    ollama: &OllamaArgs,
    list_claims: bool,
) -> Result<()> {
    if parse_model_list(&ollama.models).is_empty() {
        anyhow::bail!("No models provided.");
    }
    let extraction_config = extract.config()?;
    let query_config = query.config()?;
    let ollama_config = ollama.config()?;
    let (client, models, available) = connect(ollama, ollama_config).await?;

    let claims = extract_and_write(&client, extract, &models, &extraction_config, list_claims).await?;
    generate_and_write(&client, &claims, query, &query_config, &models, &available).await
}

fn diagnose(claims: &Path, queries: &Path, transcripts: &Path, report: Option<&Path>) -> Result<()> {
    let diagnostics = run_link_diagnostics(claims, queries, transcripts)?;
    println!("Link Diagnostics");
    println!("================");
    print!("{}", diagnostics.format_summary());
    if diagnostics.is_clean() {
        info!("All links resolve.");
    } else {
        warn!("Link gaps found; see the summary above.");
    }

    if let Some(path) = report {
        write_json(path, &diagnostics.report())?;
        info!("Diagnostics report written to {:?}", path);
    }
    Ok(())
}
