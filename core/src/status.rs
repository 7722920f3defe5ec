// orderflow/src/status.rs

//! The status directory: an explicit, injectable read-through cache of the
//! order status set.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::model::{Status, StatusKey};
use crate::store::StatusSource;

/// Loaded once at service start and shared by reference. Lookups never touch
/// the backing store; [`StatusDirectory::refresh`] is the only way to re-read it.
pub struct StatusDirectory {
  source: Arc<dyn StatusSource>,
  statuses: RwLock<Vec<Status>>,
}

impl StatusDirectory {
  /// Builds the directory and performs the initial load.
  ///
  /// A failing load is logged and leaves the directory empty, in which case
  /// every [`resolve`](Self::resolve) serves the `received` fallback.
  pub async fn load(source: Arc<dyn StatusSource>) -> Self {
    let directory = Self {
      source,
      statuses: RwLock::new(Vec::new()),
    };
    directory.refresh().await;
    directory
  }

  /// Re-reads the status set. Returns whether the backing store answered.
  #[instrument(name = "StatusDirectory::refresh", skip(self))]
  pub async fn refresh(&self) -> bool {
    match self.source.load_statuses().await {
      Ok(mut loaded) => {
        loaded.sort_by_key(|s| (s.position, s.id));
        info!(count = loaded.len(), "Order statuses loaded.");
        *self.statuses.write() = loaded;
        true
      }
      Err(e) => {
        warn!(error = %e, "Failed to load order statuses; keeping the previous snapshot.");
        false
      }
    }
  }

  /// Active statuses in display order.
  pub fn list_active_statuses(&self) -> Vec<Status> {
    self.statuses.read().iter().filter(|s| s.active).cloned().collect()
  }

  /// Looks a status up by name or id, falling back to the built-in `received`
  /// status on a miss. Never fails: missing metadata must not block ordering.
  pub fn resolve(&self, key: impl Into<StatusKey>) -> Status {
    let key = key.into();
    match self.find(key.clone()) {
      Some(status) => status,
      None => {
        debug!(%key, "Status not in directory; serving the 'received' fallback.");
        Status::fallback_received()
      }
    }
  }

  /// Strict lookup for callers that must not act on a substitute status.
  pub fn find(&self, key: impl Into<StatusKey>) -> Option<Status> {
    let key = key.into();
    self.statuses.read().iter().find(|s| key.matches(s)).cloned()
  }

  /// Strict lookup that re-reads the backing store once on a miss, so a
  /// directory that started empty recovers as soon as the store answers.
  pub async fn find_or_refresh(&self, key: impl Into<StatusKey>) -> Option<Status> {
    let key = key.into();
    if let Some(status) = self.find(key.clone()) {
      return Some(status);
    }
    debug!(%key, "Status not in directory; refreshing before giving up.");
    if self.refresh().await {
      self.find(key)
    } else {
      None
    }
  }
}

impl std::fmt::Debug for StatusDirectory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StatusDirectory")
      .field("loaded", &self.statuses.read().len())
      .finish()
  }
}
