//! History backend selection

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which history discipline the server runs with.
///
/// | Backend  | Scoping                         | Survives restart |
/// |----------|---------------------------------|------------------|
/// | `memory` | one history per session id      | no               |
/// | `sqlite` | one global stream, ids ignored  | yes              |
///
/// This is chosen once at startup and never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Memory,
    #[default]
    Sqlite,
}

impl HistoryBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryBackend::Memory => "memory",
            HistoryBackend::Sqlite => "sqlite",
        }
    }

    /// Whether histories are partitioned by the client's session id
    pub fn is_scoped(&self) -> bool {
        matches!(self, HistoryBackend::Memory)
    }
}

impl fmt::Display for HistoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryBackend {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(HistoryBackend::Memory),
            "sqlite" | "durable" => Ok(HistoryBackend::Sqlite),
            _ => Err(DomainError::InvalidHistoryBackend(s.to_string())),
        }
    }
}
