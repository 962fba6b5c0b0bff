//! Optional persistence for the pixel dataset.

use crate::{
    Result,
    types::PaintRecord,
};
use std::{
    collections::HashMap,
    path::Path,
};

const DATASET_KEY: &[u8] = b"pixel_dataset";
const TREE_NAME: &str = "pixels";

/// Persistence policy for the cache. Implementations store the whole dataset
/// as one unit; the cache writes through after every reconcile.
pub trait PixelStore {
    fn load(&self) -> Result<HashMap<String, PaintRecord>>;
    fn persist(&self, dataset: &HashMap<String, PaintRecord>) -> Result<()>;
}

/// No persistence. The default for in-memory use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPixelStore;

impl PixelStore for NullPixelStore {
    fn load(&self) -> Result<HashMap<String, PaintRecord>> {
        Ok(HashMap::new())
    }

    fn persist(&self, _dataset: &HashMap<String, PaintRecord>) -> Result<()> {
        Ok(())
    }
}

/// Sled-backed store keeping the JSON-serialized dataset under a fixed key.
#[derive(Clone)]
pub struct SledPixelStore {
    tree: sled::Tree,
}

impl SledPixelStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Self::new(&db)
    }

    pub fn new(db: &sled::Db) -> Result<Self> {
        let tree = db.open_tree(TREE_NAME)?;
        Ok(Self { tree })
    }
}

impl PixelStore for SledPixelStore {
    fn load(&self) -> Result<HashMap<String, PaintRecord>> {
        match self.tree.get(DATASET_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(HashMap::new()),
        }
    }

    fn persist(&self, dataset: &HashMap<String, PaintRecord>) -> Result<()> {
        let bytes = serde_json::to_vec(dataset)?;
        self.tree.insert(DATASET_KEY, bytes)?;
        self.tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::types::{
        Address,
        PaintRecord,
    };
    use tempdir::TempDir;

    fn record(color: &str) -> PaintRecord {
        PaintRecord {
            color: color.to_owned(),
            painter: Address::new([3u8; 20]),
            timestamp: 1_700_000_000,
            tx_hash: None,
            contract: None,
        }
    }

    #[test]
    fn sled_store__round_trips_the_dataset() {
        // given
        let dir = TempDir::new("pixel-store-test").unwrap();
        let store = SledPixelStore::open(dir.path()).unwrap();
        let mut dataset = HashMap::new();
        dataset.insert("4-7".to_owned(), record("#00FF00"));

        // when
        store.persist(&dataset).unwrap();
        let loaded = store.load().unwrap();

        // then
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn sled_store__loads_empty_when_nothing_was_persisted() {
        let dir = TempDir::new("pixel-store-test").unwrap();
        let store = SledPixelStore::open(dir.path()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn sled_store__latest_persist_wins() {
        // given
        let dir = TempDir::new("pixel-store-test").unwrap();
        let store = SledPixelStore::open(dir.path()).unwrap();
        let mut dataset = HashMap::new();
        dataset.insert("4-7".to_owned(), record("#00FF00"));
        store.persist(&dataset).unwrap();

        // when
        dataset.insert("4-7".to_owned(), record("#0000FF"));
        store.persist(&dataset).unwrap();

        // then
        let loaded = store.load().unwrap();
        assert_eq!(loaded.get("4-7").unwrap().color, "#0000FF");
    }
}
