use ace_application::{HistoryError, HistoryStore};
use ace_domain::Message;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type ScopeLog = Arc<Mutex<Vec<Message>>>;

/// Scope-keyed history kept in process memory.
///
/// The outer map lock is held only long enough to find or insert a scope;
/// each scope then serializes its own appends and reads.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    scopes: RwLock<HashMap<String, ScopeLog>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn scope(&self, scope: &str) -> Option<ScopeLog> {
        self.scopes.read().await.get(scope).cloned()
    }

    async fn scope_or_insert(&self, scope: &str) -> ScopeLog {
        if let Some(log) = self.scope(scope).await {
            return log;
        }
        self.scopes
            .write()
            .await
            .entry(scope.to_string())
            .or_default()
            .clone()
    }

    /// Number of scopes that have at least one message.
    pub async fn scope_count(&self) -> usize {
        self.scopes.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, scope: &str, message: Message) -> Result<(), HistoryError> {
        let log = self.scope_or_insert(scope).await;
        log.lock().await.push(message);
        Ok(())
    }

    async fn recent(&self, scope: &str, limit: usize) -> Result<Vec<Message>, HistoryError> {
        let Some(log) = self.scope(scope).await else {
            return Ok(Vec::new());
        };
        let messages = log.lock().await;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    fn describe(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recent_returns_tail_oldest_first() {
        let store = InMemoryHistoryStore::new();
        for i in 0..5 {
            store
                .append("s", Message::user(format!("m{}", i)))
                .await
                .unwrap();
        }

        let recent = store.recent("s", 2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4"]);

        assert_eq!(store.recent("s", 50).await.unwrap().len(), 5);
        assert!(store.recent("s", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = InMemoryHistoryStore::new();
        store.append("a", Message::user("for a")).await.unwrap();
        store.append("b", Message::user("for b")).await.unwrap();

        let a = store.recent("a", 10).await.unwrap();
        assert_eq!(a, vec![Message::user("for a")]);
        assert!(store.recent("missing", 10).await.unwrap().is_empty());
        assert_eq!(store.scope_count().await, 2);
    }

    #[tokio::test]
    async fn concurrent_appends_to_one_scope_are_all_kept() {
        let store = Arc::new(InMemoryHistoryStore::new());
        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store
                    .append("shared", Message::user(format!("{}", i)))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let all = store.recent("shared", 100).await.unwrap();
        assert_eq!(all.len(), 20);
        assert_eq!(store.scope_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn windows_read_during_appends_are_contiguous() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 50;
        const WINDOW: usize = 8;

        let store = Arc::new(InMemoryHistoryStore::new());

        let mut writers = Vec::new();
        for w in 0..WRITERS {
            let store = Arc::clone(&store);
            writers.push(tokio::spawn(async move {
                for i in 0..PER_WRITER {
                    store
                        .append("shared", Message::user(format!("{}-{}", w, i)))
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..WRITERS {
            let store = Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                let mut windows = Vec::new();
                for _ in 0..PER_WRITER {
                    windows.push(store.recent("shared", WINDOW).await.unwrap());
                    tokio::task::yield_now().await;
                }
                windows
            }));
        }

        for writer in writers {
            writer.await.unwrap();
        }
        let mut windows = Vec::new();
        for reader in readers {
            windows.extend(reader.await.unwrap());
        }

        let log = store.recent("shared", usize::MAX).await.unwrap();
        assert_eq!(log.len(), WRITERS * PER_WRITER);

        // Each writer's messages keep their relative order.
        for w in 0..WRITERS {
            let prefix = format!("{}-", w);
            let sequence: Vec<usize> = log
                .iter()
                .filter_map(|m| m.content.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(sequence, (0..PER_WRITER).collect::<Vec<_>>());
        }

        // Every window is an unbroken run of the final log.
        for window in windows.iter().filter(|w| !w.is_empty()) {
            let start = log.iter().position(|m| m == &window[0]).unwrap();
            assert_eq!(&log[start..start + window.len()], window.as_slice());
        }
    }
}
