//! JSONL file writer for conversation events.
//!
//! Each [`ConversationEvent`] becomes one JSON line: its serialized form
//! (`type` plus the variant's fields) with a `timestamp` added. The file is opened for append, so a
//! restarted server keeps extending the same transcript.

use ace_application::{ConversationEvent, ConversationLogger};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Thread-safe via `Mutex<BufWriter<File>>`; every line is flushed.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationLogger {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn to_record(event: &ConversationEvent, timestamp: String) -> serde_json::Result<Value> {
    let mut record = serde_json::to_value(event)?;
    if let Value::Object(map) = &mut record {
        map.insert("timestamp".to_string(), Value::String(timestamp));
    }
    Ok(record)
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let line = match to_record(&event, timestamp) {
            Ok(record) => record.to_string(),
            Err(e) => {
                warn!("Could not encode {} event: {}", event.event_type(), e);
                return;
            }
        };

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!("Conversation log write to {} failed: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
