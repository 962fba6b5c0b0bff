//! Local pixel dataset and its reconciliation rules.

use crate::{
    Result,
    config::{
        CELL_COUNT,
        LOAD_BATCH_SIZE,
    },
    contract::PaintContract,
    error::Error,
    store::{
        NullPixelStore,
        PixelStore,
    },
    types::{
        BatchPage,
        Coordinate,
        PaintEvent,
        PaintRecord,
    },
};
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
    },
};
use tracing::{
    info,
    warn,
};

/// Cheaply cloneable view of the local pixel dataset. All mutation funnels
/// through [`LocalStateCache::reconcile`]: latest write wins, records are
/// never deleted, and the write-through store failure is never fatal.
#[derive(Clone)]
pub struct LocalStateCache<S: PixelStore = NullPixelStore> {
    pixels: Arc<Mutex<HashMap<String, PaintRecord>>>,
    store: S,
}

impl LocalStateCache<NullPixelStore> {
    pub fn in_memory() -> Self {
        Self {
            pixels: Arc::new(Mutex::new(HashMap::new())),
            store: NullPixelStore,
        }
    }
}

impl Default for LocalStateCache<NullPixelStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<S: PixelStore> LocalStateCache<S> {
    /// Build a cache backed by `store`, loading whatever dataset it holds.
    /// A failing load starts the cache empty rather than failing construction.
    pub fn with_store(store: S) -> Self {
        let pixels = match store.load() {
            Ok(dataset) => {
                info!(cells = dataset.len(), "loaded persisted pixel dataset");
                dataset
            }
            Err(err) => {
                warn!(%err, "failed to load persisted pixel dataset, starting empty");
                HashMap::new()
            }
        };
        Self {
            pixels: Arc::new(Mutex::new(pixels)),
            store,
        }
    }

    /// Upsert one cell. Conflicts resolve by overwrite; `Coordinate` already
    /// guarantees the cell is on the grid.
    pub fn reconcile(&self, coordinate: Coordinate, record: PaintRecord) {
        let snapshot = {
            let mut pixels = self.pixels.lock().unwrap();
            pixels.insert(coordinate.key(), record);
            pixels.clone()
        };
        if let Err(err) = self.store.persist(&snapshot) {
            warn!(%err, "failed to persist pixel dataset");
        }
    }

    /// Fold an externally observed paint event into the dataset. Event-driven
    /// records carry no transaction hash or contract address.
    pub fn apply_event(&self, event: &PaintEvent) {
        let record = PaintRecord {
            color: event.color.clone(),
            painter: event.painter,
            timestamp: Utc::now().timestamp(),
            tx_hash: None,
            contract: None,
        };
        self.reconcile(event.coordinate, record);
    }

    pub fn get(&self, coordinate: Coordinate) -> Option<PaintRecord> {
        self.pixels.lock().unwrap().get(&coordinate.key()).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, PaintRecord> {
        self.pixels.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.pixels.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.lock().unwrap().is_empty()
    }

    /// Read one page of cells from the contract and reconcile the painted
    /// ones. Returns how many cells were reconciled.
    pub async fn load_batch<C: PaintContract>(
        &self,
        contract: &C,
        coordinates: &[Coordinate],
    ) -> Result<usize> {
        let page = contract
            .pixels_batch(coordinates)
            .await
            .map_err(Error::classify)?;
        Ok(self.ingest_page(coordinates, &page))
    }

    /// Load the whole grid page by page. A failing page stops the scan but
    /// keeps everything loaded so far; there is no rollback and no retry.
    pub async fn load_all<C: PaintContract>(&self, contract: &C) -> Result<usize> {
        let mut loaded = 0;
        for start in (0..CELL_COUNT).step_by(LOAD_BATCH_SIZE) {
            let mut coordinates = Vec::with_capacity(LOAD_BATCH_SIZE);
            for index in start..(start + LOAD_BATCH_SIZE).min(CELL_COUNT) {
                coordinates.push(Coordinate::from_index(index)?);
            }
            match self.load_batch(contract, &coordinates).await {
                Ok(count) => loaded += count,
                Err(err) => {
                    warn!(%err, start, "batch load failed, keeping pages loaded so far");
                    break;
                }
            }
        }
        info!(loaded, "pixel grid load finished");
        Ok(loaded)
    }

    fn ingest_page(&self, coordinates: &[Coordinate], page: &BatchPage) -> usize {
        let mut count = 0;
        for (slot, coordinate) in coordinates.iter().enumerate() {
            let Some(color) = page.colors.get(slot) else {
                break;
            };
            // An empty color string marks an unpainted cell.
            if color.is_empty() {
                continue;
            }
            let record = PaintRecord {
                color: color.clone(),
                painter: page.painters.get(slot).copied().unwrap_or(crate::types::Address::ZERO),
                timestamp: page.timestamps.get(slot).copied().unwrap_or_default(),
                tx_hash: None,
                contract: None,
            };
            self.reconcile(*coordinate, record);
            count += 1;
        }
        count
    }
}
