use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docseal_types::DocumentId;
use tokio::sync::OwnedMutexGuard;

use crate::error::{LifecycleError, LifecycleResult};

/// Idle entries are pruned once the table grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-document async write locks.
///
/// The table lock is a plain mutex held only to look up an entry; waiting
/// happens on the per-document `tokio` mutex, bounded by `timeout`.
#[derive(Debug)]
pub struct DocumentLocks {
    table: Mutex<HashMap<DocumentId, Arc<tokio::sync::Mutex<()>>>>,
    timeout: Duration,
}

impl DocumentLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Take the write lock for `document`, failing with `Busy` after the
    /// timeout.
    pub async fn acquire(&self, document: &DocumentId) -> LifecycleResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut table = self
                .table
                .lock()
                .map_err(|_| LifecycleError::Internal("document lock table poisoned".into()))?;
            if table.len() > PRUNE_THRESHOLD {
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(*document).or_default())
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| LifecycleError::Busy(*document))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
