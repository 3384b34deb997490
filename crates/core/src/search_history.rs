//! Recently used search queries, persisted as a JSON array on disk

use crate::error::CoreResult;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Maximum number of queries kept
pub const MAX_HISTORY_ITEMS: usize = 10;

/// File-backed search history, most recent query first
#[derive(Debug, Clone)]
pub struct SearchHistory {
    path: PathBuf,
}

impl SearchHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored queries. A missing or corrupt file reads as empty.
    pub fn entries(&self) -> Vec<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable search history {}: {e}", self.path.display());
            Vec::new()
        })
    }

    /// Record a query. Blank input is ignored; a repeated query moves to
    /// the front instead of appearing twice.
    pub fn add(&self, query: &str) -> CoreResult<()> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(());
        }

        let mut history: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|item| item != query)
            .collect();
        history.insert(0, query.to_string());
        history.truncate(MAX_HISTORY_ITEMS);

        self.write(&history)
    }

    /// Remove one exact query
    pub fn remove(&self, query: &str) -> CoreResult<()> {
        let history: Vec<String> = self
            .entries()
            .into_iter()
            .filter(|item| item != query)
            .collect();
        self.write(&history)
    }

    /// Forget every stored query
    pub fn clear(&self) -> CoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, history: &[String]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(history)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved {} search history entries", history.len());
        Ok(())
    }
}
