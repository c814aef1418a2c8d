pub mod analytics;
pub mod conversations;
pub mod messages;
mod preview;
pub mod search;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use uuid::Uuid;

use loft_types::models::{AnalyticsEvent, Conversation, Message};

/// In-memory entity maps — the authoritative state for the process
/// lifetime. Kept distinct from the `Store` handle so that read paths
/// (search, preview recomputation) can be written against plain `&Tables`
/// and a durable backend can be swapped in behind the same accessors.
#[derive(Default)]
pub struct Tables {
    pub conversations: HashMap<Uuid, Conversation>,
    pub messages: HashMap<Uuid, Message>,
    /// Keyed by the client-generated `event_id` (idempotency key).
    pub events: HashMap<String, AnalyticsEvent>,
}

pub struct Store {
    tables: Mutex<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Read-only access. The lock is held for the duration of the closure,
    /// so a caller observes a consistent snapshot.
    pub fn with_tables<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Tables) -> Result<T>,
    {
        let tables = self
            .tables
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))?;
        f(&tables)
    }

    /// Mutating access. Every write operation takes the lock exactly once,
    /// so each operation is atomic with respect to all others and no caller
    /// ever observes a half-applied mutation.
    pub fn with_tables_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))?;
        f(&mut tables)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
