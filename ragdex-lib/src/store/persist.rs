//! Disk persistence for [`MemoryStore`]
//!
//! One JSON file per index, named by index id, holding the fragments, their
//! embeddings and the embedding model used to build them. Loading verifies
//! the id so a directory holding several indexes cannot serve the wrong one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::fragment::Fragment;
use crate::store::MemoryStore;
use crate::{Error, Result};

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    index_id: String,
    embedding_model: String,
    fragments: Vec<Fragment>,
    embeddings: Vec<Embedding>,
}

/// Write `store` under `index_dir` as `<index_id>.json`.
pub fn persist(
    store: &MemoryStore,
    index_dir: &Path,
    index_id: &str,
    embedding_model: &str,
) -> Result<()> {
    fs::create_dir_all(index_dir)
        .map_err(|e| Error::Retrieval(format!("cannot create {}: {e}", index_dir.display())))?;

    let (fragments, embeddings): (Vec<Fragment>, Vec<Embedding>) =
        store.records.iter().cloned().unzip();

    let persisted = PersistedIndex {
        index_id: index_id.to_string(),
        embedding_model: embedding_model.to_string(),
        fragments,
        embeddings,
    };

    let path = index_file(index_dir, index_id);
    let json = serde_json::to_string(&persisted)
        .map_err(|e| Error::Retrieval(format!("cannot serialize index: {e}")))?;
    fs::write(&path, json)
        .map_err(|e| Error::Retrieval(format!("cannot write {}: {e}", path.display())))?;

    tracing::info!(index_id, path = %path.display(), "persisted index");
    Ok(())
}

/// Load the index `index_id` from `index_dir`.
///
/// Returns the store and the name of the embedding model it was built with;
/// queries must embed with the same model.
pub fn load(index_dir: &Path, index_id: &str) -> Result<(MemoryStore, String)> {
    let path = index_file(index_dir, index_id);
    let json = fs::read_to_string(&path).map_err(|e| {
        Error::Retrieval(format!("no persisted index at {}: {e}", path.display()))
    })?;

    let persisted: PersistedIndex = serde_json::from_str(&json)
        .map_err(|e| Error::Retrieval(format!("corrupt index {}: {e}", path.display())))?;

    if persisted.index_id != index_id {
        return Err(Error::Retrieval(format!(
            "index id mismatch: wanted '{index_id}', file holds '{}'",
            persisted.index_id
        )));
    }
    if persisted.fragments.len() != persisted.embeddings.len() {
        return Err(Error::Retrieval(format!(
            "corrupt index {}: {} fragments with {} embeddings",
            path.display(),
            persisted.fragments.len(),
            persisted.embeddings.len()
        )));
    }

    let store = MemoryStore {
        records: persisted
            .fragments
            .into_iter()
            .zip(persisted.embeddings)
            .collect(),
    };

    tracing::info!(index_id, fragments = store.records.len(), "loaded index");
    Ok((store, persisted.embedding_model))
}

fn index_file(index_dir: &Path, index_id: &str) -> std::path::PathBuf {
    index_dir.join(format!("{index_id}.json"))
}
