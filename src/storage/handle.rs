//! Single-flight access to the local store.
//!
//! The composition root owns one [`StoreHandle`] and hands clones to every
//! component. However many callers ask for the store at the same time, the
//! database is opened once: concurrent callers wait on the same in-flight open
//! and all observe its outcome. A failed open is not cached, so the next
//! explicit call tries again.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::db::{LocalStorage, StoreLocation};
use crate::error::Result;

#[derive(Clone)]
pub struct StoreHandle {
    location: StoreLocation,
    cell: Arc<OnceCell<LocalStorage>>,
    open_attempts: Arc<AtomicUsize>,
}

impl StoreHandle {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            cell: Arc::new(OnceCell::new()),
            open_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the opened store, opening it on first use.
    pub async fn open(&self) -> Result<LocalStorage> {
        let storage = self
            .cell
            .get_or_try_init(|| async {
                self.open_attempts.fetch_add(1, Ordering::SeqCst);
                LocalStorage::open(self.location.clone()).await
            })
            .await?;
        Ok(storage.clone())
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of times the underlying database open actually ran.
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }
}
