//! Persistent history of finished sessions, kept as one JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: u64,
    pub reps: u32,
    pub session_time: DateTime<Local>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct History {
    sessions: Vec<SessionRecord>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.load()?.sessions)
    }

    pub fn record(&self, reps: u32, at: DateTime<Local>) -> Result<SessionRecord> {
        let mut history = self.load()?;
        let id = history.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let record = SessionRecord {
            id,
            reps,
            session_time: at,
        };
        history.sessions.push(record.clone());
        self.save(&history)?;

        info!("stored session {} ({} reps) in {}", id, reps, self.path.display());
        Ok(record)
    }

    fn load(&self) -> Result<History> {
        if !self.path.exists() {
            return Ok(History::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading session history {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing session history {}", self.path.display()))
    }

    /// Writes a sibling temp file and renames it over the history, so an
    /// interrupted save leaves the previous history intact.
    fn save(&self, history: &History) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, history)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing session history {}", self.path.display()))?;
        Ok(())
    }
}
