use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::form::store::FormStore;

/// One session's form, locked independently of every other session.
pub type SharedForm = Arc<Mutex<FormStore>>;

/// In-memory map of live sessions. Nothing is persisted.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SharedForm>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, SharedForm) {
        let id = Uuid::new_v4();
        let form = Arc::new(Mutex::new(FormStore::new()));
        let total = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id, form.clone());
            sessions.len()
        };
        info!("Created session {id} ({total} live)");
        (id, form)
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedForm> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Returns false if the session did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Removed session {id}");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
