use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::engine::{GameEngine, GameEngineOptions};
use crate::save::{decode_match, LoadError, SavedMatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid save slot name `{0}`")]
    InvalidSlot(String),
    #[error("no match in progress")]
    NoMatch,
    #[error("failed to write save slot {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode saved match: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
}

#[derive(Clone, Debug, Serialize)]
pub struct SaveSlot {
    pub name: String,
    pub level: u32,
    pub year: i32,
    #[serde(rename = "savedAt")]
    pub saved_at: Option<String>,
}

/// One JSON file per slot inside a directory.
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, slot: &str, engine: &GameEngine) -> Result<PathBuf, StoreError> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let mut saved = SavedMatch::from_engine(engine);
        saved.saved_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let text = serde_json::to_string_pretty(&saved)?;
        fs::write(&path, text).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(slot, path = %path.display(), "match saved");
        Ok(path)
    }

    pub fn load(&self, slot: &str, options: GameEngineOptions) -> Result<GameEngine, StoreError> {
        let path = self.slot_path(slot)?;
        let text = fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(decode_match(&text, options)?)
    }

    /// Readable slots sorted by name; unreadable files are skipped.
    pub fn list(&self) -> Vec<SaveSlot> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) => {
                if error.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(dir = %self.dir.display(), error = %error, "failed to list saves");
                }
                return Vec::new();
            }
        };

        let mut slots = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let parsed = fs::read_to_string(&path)
                .map_err(|source| LoadError::Read {
                    path: path.clone(),
                    source,
                })
                .and_then(|text| serde_json::from_str::<SavedMatch>(&text).map_err(LoadError::from));
            match parsed {
                Ok(saved) => slots.push(SaveSlot {
                    name: name.to_string(),
                    level: saved.level,
                    year: saved.year,
                    saved_at: saved.saved_at,
                }),
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "skipping unreadable save");
                }
            }
        }
        slots.sort_by(|a, b| a.name.cmp(&b.name));
        slots
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, StoreError> {
        let trimmed = slot.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 64
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StoreError::InvalidSlot(slot.to_string()));
        }
        Ok(self.dir.join(format!("{trimmed}.json")))
    }
}
