//! RAGDEX CLI - build and query persisted document indexes
//!
//! # Commands
//!
//! ```bash
//! # Build a persisted index from a docs directory
//! ragdex index --docs docs/ --index-dir index/ --id rag_index
//!
//! # Ask a question against it
//! ragdex query --index-dir index/ --id rag_index \
//!     --mode compact --cutoff 0.40 --top-k 5 \
//!     "What is Artificial Intelligence?"
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ragdex_lib::{
    config::LlmConfig,
    embed::{BgeEmbedder, Embedder, OpenAiEmbedder},
    index,
    llm::OpenAiChat,
    query::{QueryEngine, QueryOptions, QueryResponse},
    store::{MemoryStore, MetadataFilter},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragdex")]
#[command(about = "Question answering over a persisted document index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a persisted index from every text file under a directory
    Index {
        /// Directory holding the documents to index
        #[arg(long, conflicts_with = "paths_config", required_unless_present = "paths_config")]
        docs: Option<PathBuf>,

        /// Directory to persist the index into
        #[arg(long, conflicts_with = "paths_config", required_unless_present = "paths_config")]
        index_dir: Option<PathBuf>,

        /// paths.yaml naming the docs and index directories, resolved
        /// relative to the file's own directory
        #[arg(long)]
        paths_config: Option<PathBuf>,

        /// Index identifier
        #[arg(long, default_value = "rag_index")]
        id: String,

        /// llm.yaml with model configuration (hosted embeddings); omit to
        /// embed locally with BGE
        #[arg(long)]
        llm_config: Option<PathBuf>,
    },

    /// Query a persisted index
    Query {
        /// The question to answer
        query: String,

        /// Directory holding the persisted index
        #[arg(long)]
        index_dir: PathBuf,

        /// Index identifier
        #[arg(long, default_value = "rag_index")]
        id: String,

        /// Response mode: no_text, refine, compact, simple_summarize,
        /// tree_summarize or accumulate
        #[arg(short, long, default_value = "compact")]
        mode: String,

        /// Minimum similarity score a fragment must meet
        #[arg(long)]
        cutoff: Option<f32>,

        /// Number of fragments to retrieve
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Metadata filter as key=value; repeatable
        #[arg(short, long)]
        filter: Vec<String>,

        /// llm.yaml with model configuration; omit to use OPENAI_API_KEY
        /// with --model directly
        #[arg(long)]
        llm_config: Option<PathBuf>,

        /// Answer model when no --llm-config is given
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index { docs, index_dir, paths_config, id, llm_config } => {
            let (docs, index_dir) = resolve_index_paths(docs, index_dir, paths_config.as_deref())?;
            match load_llm_config(llm_config.as_deref())? {
                Some(config) => {
                    let mut embedder = OpenAiEmbedder::from_config(&config.rag.embedding_llm)?;
                    build_index(&docs, &index_dir, &id, &mut embedder)
                }
                None => {
                    println!("Loading local embedding model (downloads on first run)...");
                    let mut embedder = BgeEmbedder::new()?;
                    build_index(&docs, &index_dir, &id, &mut embedder)
                }
            }
        }

        Commands::Query {
            query,
            index_dir,
            id,
            mode,
            cutoff,
            top_k,
            filter,
            llm_config,
            model,
        } => {
            let store = index::load_persisted_index(&index_dir, &id)
                .with_context(|| format!("loading index '{id}' from {}", index_dir.display()))?;

            let options = QueryOptions {
                similarity_cutoff: cutoff,
                top_k,
                filters: parse_filters(&filter)?,
                ..Default::default()
            };

            let llm_config = load_llm_config(llm_config.as_deref())?;
            let llm = if mode == "no_text" {
                None
            } else {
                Some(answer_model(llm_config.as_ref(), &model)?)
            };

            let response = match load_embedder(llm_config.as_ref())? {
                CliEmbedder::Hosted(embedder) => {
                    run_query(embedder, store, llm, &query, &mode, &options)?
                }
                CliEmbedder::Local(embedder) => {
                    run_query(embedder, store, llm, &query, &mode, &options)?
                }
            };

            print_response(&response);
            Ok(())
        }
    }
}

enum CliEmbedder {
    Local(BgeEmbedder),
    Hosted(OpenAiEmbedder),
}

fn resolve_index_paths(
    docs: Option<PathBuf>,
    index_dir: Option<PathBuf>,
    paths_config: Option<&std::path::Path>,
) -> Result<(PathBuf, PathBuf)> {
    match paths_config {
        Some(path) => {
            let config: ragdex_lib::config::PathsConfig = ragdex_lib::config::load_yaml(path)?;
            let base = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            Ok((
                ragdex_lib::config::resolve_path(&config.docs_to_index_path, base),
                ragdex_lib::config::resolve_path(&config.persisted_index_path, base),
            ))
        }
        // clap guarantees both are present when no paths config is given
        None => Ok((docs.expect("checked by clap"), index_dir.expect("checked by clap"))),
    }
}

fn load_llm_config(path: Option<&std::path::Path>) -> Result<Option<LlmConfig>> {
    match path {
        Some(p) => Ok(Some(ragdex_lib::config::load_yaml(p)?)),
        None => Ok(None),
    }
}

fn load_embedder(config: Option<&LlmConfig>) -> Result<CliEmbedder> {
    match config {
        Some(c) => Ok(CliEmbedder::Hosted(OpenAiEmbedder::from_config(
            &c.rag.embedding_llm,
        )?)),
        None => Ok(CliEmbedder::Local(BgeEmbedder::new()?)),
    }
}

fn answer_model(config: Option<&LlmConfig>, fallback_model: &str) -> Result<OpenAiChat> {
    match config {
        Some(c) => Ok(OpenAiChat::from_config(&c.rag.answer_question_llm)?),
        None => {
            let key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY is not set and no --llm-config was given")?;
            Ok(OpenAiChat::direct(fallback_model, key))
        }
    }
}

fn build_index<E: Embedder>(
    docs: &std::path::Path,
    index_dir: &std::path::Path,
    id: &str,
    embedder: &mut E,
) -> Result<()> {
    let store = index::create_persisted_index(docs, index_dir, id, embedder)?;
    println!(
        "Indexed {} fragment(s) into {} with id '{id}'",
        ragdex_lib::store::VectorStore::len(&store),
        index_dir.display()
    );
    Ok(())
}

fn run_query<E: Embedder>(
    embedder: E,
    store: MemoryStore,
    llm: Option<OpenAiChat>,
    query: &str,
    mode: &str,
    options: &QueryOptions,
) -> Result<QueryResponse> {
    let response = match llm {
        Some(llm) => QueryEngine::with_model(embedder, store, llm).query(query, mode, options)?,
        None => QueryEngine::new(embedder, store).query(query, mode, options)?,
    };
    Ok(response)
}

fn parse_filters(raw: &[String]) -> Result<Option<Vec<MetadataFilter>>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut filters = Vec::with_capacity(raw.len());
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("filter '{pair}' is not key=value");
        };
        filters.push(MetadataFilter::new(key, value));
    }
    Ok(Some(filters))
}

fn print_response(response: &QueryResponse) {
    println!("\nGenerated answer:\n");
    if response.answer.is_empty() {
        println!("(no matching context)");
    } else {
        println!("{}", response.answer);
    }

    println!("\nUnique documents used (with fragment counts):\n");
    for source in &response.sources {
        println!("- {}: {} fragment(s)", source.file_name, source.fragment_count);
    }

    println!("\nRetrieved fragments (ordered by score):\n");
    for (i, scored) in response.fragments.iter().enumerate() {
        let fragment = &scored.fragment;
        println!("Fragment {}", i + 1);
        println!("  File : {}", fragment.file_name.as_deref().unwrap_or("unknown file"));
        println!("  Path : {}", fragment.file_path.as_deref().unwrap_or("unknown path"));
        println!("  Score: {:.4}", scored.score);
        println!("  Range: chars {} to {}", fragment.start_char, fragment.end_char);
        println!();
    }
}
