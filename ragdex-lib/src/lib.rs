//! RAGDEX - retrieval-augmented question answering over a document corpus
//!
//! # Architecture
//!
//! ```text
//! Docs -> Chunker -> Embedder -> Store -> persist(index_dir)
//!
//! Query -> Embedder -> Retrieve -> Cutoff filter -> Synthesize -> Answer
//!                         |                             |            |
//!                       Store                    LanguageModel   Provenance
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ragdex_lib::{embed::BgeEmbedder, index, llm::OpenAiChat, query::QueryEngine};
//! use ragdex_lib::query::QueryOptions;
//!
//! // Build and persist an index
//! let mut embedder = BgeEmbedder::new()?;
//! index::create_persisted_index("docs/", "index/", "rag_index", &mut embedder)?;
//!
//! // Query it
//! let store = index::load_persisted_index("index/", "rag_index")?;
//! let llm = OpenAiChat::direct("gpt-4o-mini", api_key);
//! let mut engine = QueryEngine::with_model(embedder, store, llm);
//! let response = engine.query("What is Artificial Intelligence?", "compact", &QueryOptions::default())?;
//! println!("{}", response.answer);
//! ```

pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod index;
pub mod llm;
pub mod prompt;
pub mod provenance;
pub mod query;
pub mod store;
pub mod strategy;
pub mod synthesizer;

pub use error::{Error, Result};
