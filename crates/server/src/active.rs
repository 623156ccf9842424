//! Build-then-swap holder for the live [`Recommender`].
//!
//! Readers grab an `Arc` to the current snapshot and query it without
//! holding any lock. A rebuild constructs the new snapshot off to the side
//! and only takes the write lock for the pointer swap, so a failed rebuild
//! leaves the previous snapshot serving.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, instrument, warn};

use data_loader::Dataset;
use similarity::SearchConfig;

use crate::error::Result;
use crate::orchestrator::Recommender;

#[derive(Debug)]
pub struct ActiveRecommender {
    current: RwLock<Arc<Recommender>>,
    config: SearchConfig,
}

impl ActiveRecommender {
    pub fn new(recommender: Recommender) -> Self {
        let config = recommender.index().config();
        Self {
            current: RwLock::new(Arc::new(recommender)),
            config,
        }
    }

    /// Load a data directory and build the first snapshot
    pub fn load(data_dir: &Path, config: SearchConfig) -> Result<Self> {
        let dataset = Dataset::load_from_dir(data_dir)?;
        let recommender = Recommender::from_dataset(&dataset, config)?;
        Ok(Self::new(recommender))
    }

    /// The snapshot serving queries right now
    pub fn current(&self) -> Arc<Recommender> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the live snapshot, returning the one it replaced
    pub fn swap(&self, recommender: Recommender) -> Arc<Recommender> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(recommender))
    }

    /// Rebuild from a dataset; on error the current snapshot stays live
    #[instrument(skip_all, fields(n_ratings = dataset.ratings.len()))]
    pub fn rebuild(&self, dataset: &Dataset) -> Result<Arc<Recommender>> {
        let recommender = match Recommender::from_dataset(dataset, self.config) {
            Ok(recommender) => recommender,
            Err(e) => {
                warn!(error = %e, "Rebuild failed, keeping the current index");
                return Err(e);
            }
        };
        self.swap(recommender);
        info!("Swapped in rebuilt index");
        Ok(self.current())
    }

    /// Reload a data directory and rebuild
    pub fn reload_from_dir(&self, data_dir: &Path) -> Result<Arc<Recommender>> {
        let dataset = Dataset::load_from_dir(data_dir)?;
        self.rebuild(&dataset)
    }
}
