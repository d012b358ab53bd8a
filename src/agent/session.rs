//! In-memory conversation threads.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::ModelMessage;

/// Thread id → ordered messages, shared across request handlers.
///
/// Cloning the store clones the handle, not the data.
#[derive(Debug, Default, Clone)]
pub struct ThreadStore {
    threads: Arc<RwLock<HashMap<String, Vec<ModelMessage>>>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a thread's messages.
    pub async fn get(&self, thread_id: &str) -> Option<Vec<ModelMessage>> {
        self.threads.read().await.get(thread_id).cloned()
    }

    /// Replace a thread's messages, creating the thread if needed.
    pub async fn replace(&self, thread_id: impl Into<String>, messages: Vec<ModelMessage>) {
        self.threads.write().await.insert(thread_id.into(), messages);
    }

    /// Remove a thread, returning its messages if it existed.
    pub async fn remove(&self, thread_id: &str) -> Option<Vec<ModelMessage>> {
        self.threads.write().await.remove(thread_id)
    }

    /// `(thread_id, message_count)` pairs sorted by id.
    pub async fn list(&self) -> Vec<(String, usize)> {
        let mut threads: Vec<(String, usize)> = self
            .threads
            .read()
            .await
            .iter()
            .map(|(id, messages)| (id.clone(), messages.len()))
            .collect();
        threads.sort();
        threads
    }

    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}
