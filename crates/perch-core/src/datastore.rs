use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::category::Category;
use crate::task::Task;

/// Two-slot persistence adapter over the data directory. Each slot holds one
/// whole record sequence as JSON Lines; saves rewrite the slot atomically and
/// loads never fail the caller (a missing or corrupt slot reads as empty).
#[derive(Debug, Clone)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
    pub categories_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join("tasks.data");
        let categories_path = data_dir.join("categories.data");

        if !tasks_path.exists() {
            fs::write(&tasks_path, "")?;
        }
        if !categories_path.exists() {
            fs::write(&categories_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            categories = %categories_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            tasks_path,
            categories_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_tasks(&self) -> Vec<Task> {
        load_slot(&self.tasks_path)
    }

    #[tracing::instrument(skip(self))]
    pub fn load_categories(&self) -> Vec<Category> {
        load_slot(&self.categories_path)
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        save_slot_atomic(&self.tasks_path, tasks).context("failed to save tasks.data")
    }

    #[tracing::instrument(skip(self, categories))]
    pub fn save_categories(&self, categories: &[Category]) -> anyhow::Result<()> {
        save_slot_atomic(&self.categories_path, categories)
            .context("failed to save categories.data")
    }
}

/// Whole-slot read with the recovery contract: anything short of a clean
/// parse of every line yields an empty sequence, logged, never an error.
#[tracing::instrument(skip(path))]
fn load_slot<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    debug!(file = %path.display(), "loading slot");
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(file = %path.display(), "slot missing; starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(
                file = %path.display(),
                error = %err,
                "slot unreadable; substituting empty sequence"
            );
            return Vec::new();
        }
    };
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(
                    file = %path.display(),
                    error = %err,
                    "slot unreadable; substituting empty sequence"
                );
                return Vec::new();
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => out.push(record),
            Err(err) => {
                warn!(
                    file = %path.display(),
                    line = idx + 1,
                    error = %err,
                    "slot corrupt; substituting empty sequence"
                );
                return Vec::new();
            }
        }
    }

    debug!(count = out.len(), "loaded slot");
    out
}

#[tracing::instrument(skip(path, records))]
fn save_slot_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving slot atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for record in records {
        let serialized = serde_json::to_string(record)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
