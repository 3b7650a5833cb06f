//! Index construction and loading
//!
//! Walks a documents directory, chunks every text file, embeds the chunks
//! and persists the resulting store under an index id. Loading gives back
//! the store for querying; the caller must embed queries with the same model
//! the index was built with.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use walkdir::WalkDir;

use crate::chunk::split_paragraphs;
use crate::embed::Embedder;
use crate::fragment::Fragment;
use crate::store::{self, MemoryStore, VectorStore};
use crate::{Error, Result};

/// Max chars per fragment when chunking indexed documents.
const FRAGMENT_MAX_CHARS: usize = 1_500;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "rst", "text"];

/// Build an index from every text file under `docs_dir` and persist it.
pub fn create_persisted_index<E: Embedder>(
    docs_dir: impl AsRef<Path>,
    index_dir: impl AsRef<Path>,
    index_id: &str,
    embedder: &mut E,
) -> Result<MemoryStore> {
    let docs_dir = docs_dir.as_ref();
    let mut store = MemoryStore::new();

    for entry in WalkDir::new(docs_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if !is_text_file(path) {
            continue;
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Retrieval(format!("cannot read {}: {e}", path.display())))?;
        let fragments = fragment_document(path, &content);
        if fragments.is_empty() {
            continue;
        }

        tracing::info!(path = %path.display(), fragments = fragments.len(), "indexing document");

        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        let embeddings = embedder.embed_documents(&texts)?;
        store.insert(&fragments, &embeddings)?;
    }

    store::persist(&store, index_dir.as_ref(), index_id, embedder.model_name())?;
    Ok(store)
}

/// Load a previously persisted index.
///
/// Fails with [`Error::Retrieval`] when the index is missing or was persisted
/// under a different id.
pub fn load_persisted_index(
    index_dir: impl AsRef<Path>,
    index_id: &str,
) -> Result<MemoryStore> {
    let (store, _model) = store::load(index_dir.as_ref(), index_id)?;
    Ok(store)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn fragment_document(path: &Path, content: &str) -> Vec<Fragment> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    let file_path = path.to_str().map(str::to_string);

    split_paragraphs(content, FRAGMENT_MAX_CHARS)
        .into_iter()
        .map(|chunk| Fragment {
            id: fragment_id(path, chunk.start_char, &chunk.text),
            text: chunk.text,
            start_char: chunk.start_char,
            end_char: chunk.end_char,
            file_name: file_name.clone(),
            file_path: file_path.clone(),
            extra: Default::default(),
        })
        .collect()
}

// Content-addressed so re-indexing an unchanged document reuses ids.
fn fragment_id(path: &Path, start: usize, text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    start.hash(&mut hasher);
    text.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}
