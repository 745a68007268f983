use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use dashmap::DashMap;
use rusqlite::Connection;
use tokio::sync::{Mutex as TurnMutex, OwnedMutexGuard};

use crate::config::AppConfig;
use crate::services::ai::LlmProvider;
use crate::services::catalog::HotelCatalog;
use crate::services::extraction::BookingExtractor;
use crate::services::speech::SpeechProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub llm: Box<dyn LlmProvider>,
    pub speech: Box<dyn SpeechProvider>,
    pub extractor: Box<dyn BookingExtractor>,
    pub catalog: RwLock<Arc<HotelCatalog>>,
    pub session_locks: SessionLocks,
}

/// One turn lock per session id that currently has work in flight.
///
/// An entry lives only while some task holds or awaits its lock; the last
/// guard to drop removes it.
#[derive(Debug, Default)]
pub struct SessionLocks {
    slots: DashMap<String, Slot>,
}

#[derive(Debug, Default)]
struct Slot {
    lock: Arc<TurnMutex<()>>,
    /// Guards holding or awaiting `lock`. Only changed under the shard lock.
    users: usize,
}

impl SessionLocks {
    pub async fn lock(&self, session_id: &str) -> SessionGuard<'_> {
        let lock = {
            let mut slot = self.slots.entry(session_id.to_string()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };
        // built before the await so an abandoned wait still releases its slot
        let mut turn = SessionGuard {
            slots: &self.slots,
            session_id: session_id.to_string(),
            guard: None,
        };
        turn.guard = Some(lock.lock_owned().await);
        turn
    }

    /// Sessions with a turn running or waiting.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

pub struct SessionGuard<'a> {
    slots: &'a DashMap<String, Slot>,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.slots.remove_if_mut(&self.session_id, |_, slot| {
            slot.users = slot.users.saturating_sub(1);
            slot.users == 0
        });
    }
}

impl AppState {
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current catalog. Cheap; callers never see a
    /// half-reloaded catalog.
    pub fn catalog(&self) -> Arc<HotelCatalog> {
        let guard = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace_catalog(&self, catalog: HotelCatalog) {
        let mut guard = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(catalog);
    }

    /// Re-reads the catalog from its configured source.
    pub fn reload_catalog(&self) -> anyhow::Result<usize> {
        let catalog = HotelCatalog::load(self.config.hotels_path.as_deref())?;
        let count = catalog.len();
        self.replace_catalog(catalog);
        tracing::info!(hotels = count, "hotel catalog reloaded");
        Ok(count)
    }

    /// Serializes work on one session. Held for the whole of a turn.
    pub async fn lock_session(&self, session_id: &str) -> SessionGuard<'_> {
        self.session_locks.lock(session_id).await
    }
}
