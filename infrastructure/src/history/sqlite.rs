//! SQLite-backed history.
//!
//! Every scope shares one continuous stream of messages, ordered by
//! insertion id. Calls run on the blocking pool; the connection mutex
//! makes appends and window reads atomic with respect to each other.

use ace_application::{HistoryError, HistoryStore};
use ace_domain::{Message, Role};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "ace.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                HistoryError::Unavailable(format!(
                    "cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            HistoryError::Unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| HistoryError::Storage(format!("schema setup failed: {}", e)))?;

        info!("SQLite history at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Open `<data_dir>/ace.db`.
    pub fn open_in_data_dir(data_dir: impl AsRef<Path>) -> Result<Self, HistoryError> {
        Self::open(data_dir.as_ref().join(DATABASE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, HistoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, HistoryError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| HistoryError::Unavailable("connection lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| HistoryError::Unavailable(format!("history task failed: {}", e)))?
    }
}

fn insert(conn: &Connection, message: &Message) -> Result<(), HistoryError> {
    conn.execute(
        "INSERT INTO messages (role, content, created_at) VALUES (?1, ?2, ?3)",
        params![
            message.role.as_str(),
            message.content,
            Utc::now().to_rfc3339()
        ],
    )
    .map_err(|e| HistoryError::Storage(format!("insert failed: {}", e)))?;
    Ok(())
}

fn select_recent(conn: &Connection, limit: usize) -> Result<Vec<Message>, HistoryError> {
    let mut stmt = conn
        .prepare("SELECT role, content FROM messages ORDER BY id DESC LIMIT ?1")
        .map_err(|e| HistoryError::Storage(e.to_string()))?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| HistoryError::Storage(e.to_string()))?;

    let mut messages = Vec::new();
    for row in rows {
        let (role, content) = row.map_err(|e| HistoryError::Storage(e.to_string()))?;
        let role: Role = role
            .parse()
            .map_err(|e| HistoryError::Storage(format!("corrupt row: {}", e)))?;
        messages.push(Message { role, content });
    }
    messages.reverse();
    Ok(messages)
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, scope: &str, message: Message) -> Result<(), HistoryError> {
        debug!("Appending {} message (scope {} ignored)", message.role, scope);
        self.with_connection(move |conn| insert(conn, &message)).await
    }

    async fn recent(&self, _scope: &str, limit: usize) -> Result<Vec<Message>, HistoryError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.with_connection(move |conn| select_recent(conn, limit)).await
    }

    fn describe(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteHistoryStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteHistoryStore::open_in_data_dir(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn recent_returns_tail_in_insertion_order() {
        let (_dir, store) = open_temp();
        for i in 0..5 {
            let message = if i % 2 == 0 {
                Message::user(format!("m{}", i))
            } else {
                Message::assistant(format!("m{}", i))
            };
            store.append("s", message).await.unwrap();
        }

        let recent = store.recent("s", 3).await.unwrap();
        assert_eq!(
            recent,
            vec![
                Message::user("m2"),
                Message::assistant("m3"),
                Message::user("m4"),
            ]
        );
        assert_eq!(store.recent("s", 100).await.unwrap().len(), 5);
        assert!(store.recent("s", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scope_is_ignored() {
        let (_dir, store) = open_temp();
        store.append("a", Message::user("from a")).await.unwrap();
        store.append("b", Message::user("from b")).await.unwrap();

        let seen_by_a = store.recent("a", 10).await.unwrap();
        assert_eq!(seen_by_a.len(), 2);
        assert_eq!(seen_by_a, store.recent("other", 10).await.unwrap());
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteHistoryStore::open_in_data_dir(dir.path()).unwrap();
            store.append("s", Message::user("persisted")).await.unwrap();
            store.append("s", Message::assistant("")).await.unwrap();
        }

        let store = SqliteHistoryStore::open_in_data_dir(dir.path()).unwrap();
        assert_eq!(
            store.recent("s", 10).await.unwrap(),
            vec![Message::user("persisted"), Message::assistant("")]
        );
        assert_eq!(store.path(), dir.path().join(DATABASE_FILE));
    }

    #[tokio::test]
    async fn creates_missing_data_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested").join("data");
        let store = SqliteHistoryStore::open_in_data_dir(&nested).unwrap();
        store.append("s", Message::user("x")).await.unwrap();
        assert!(nested.join(DATABASE_FILE).exists());
    }

    #[tokio::test]
    async fn corrupt_role_is_storage_error() {
        let (_dir, store) = open_temp();
        store
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO messages (role, content, created_at) VALUES ('system', 'x', '')",
                    [],
                )
                .map_err(|e| HistoryError::Storage(e.to_string()))?;
                Ok(())
            })
            .await
            .unwrap();

        let result = store.recent("s", 10).await;
        assert!(matches!(result, Err(HistoryError::Storage(_))));
    }
}
