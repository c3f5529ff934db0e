use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::error;
use uuid::Uuid;

use crate::model::{Group, MarksTable};

pub const GROUPS_FILE: &str = "groups.json";
pub const MARKS_FILE: &str = "marks.json";

/// Flat-file system of record: one pretty-printed JSON document for groups and
/// one for marks. Each document has its own lock, and every read-modify-write
/// holds it for the whole cycle.
pub struct Store {
    data_dir: PathBuf,
    groups_lock: Mutex<()>,
    marks_lock: Mutex<()>,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Store {
            data_dir: data_dir.into(),
            groups_lock: Mutex::new(()),
            marks_lock: Mutex::new(()),
        }
    }

    pub fn groups_path(&self) -> PathBuf {
        self.data_dir.join(GROUPS_FILE)
    }

    pub fn marks_path(&self) -> PathBuf {
        self.data_dir.join(MARKS_FILE)
    }

    pub fn ensure_data_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                self.data_dir.to_string_lossy()
            )
        })
    }

    /// `None` when the groups document has never been written.
    pub fn load_groups(&self) -> anyhow::Result<Option<Vec<Group>>> {
        let _guard = lock(&self.groups_lock, "groups")?;
        self.read_groups_unlocked()
    }

    /// Loads groups, calling `bootstrap` to produce them when no document exists
    /// yet. A non-empty bootstrap result is persisted.
    pub fn load_groups_or_else<F>(&self, bootstrap: F) -> anyhow::Result<Vec<Group>>
    where
        F: FnOnce() -> Vec<Group>,
    {
        let _guard = lock(&self.groups_lock, "groups")?;
        if let Some(groups) = self.read_groups_unlocked()? {
            return Ok(groups);
        }
        let groups = bootstrap();
        if !groups.is_empty() {
            self.write_json_atomic(&self.groups_path(), &groups)?;
        }
        Ok(groups)
    }

    pub fn save_groups(&self, groups: &[Group]) -> anyhow::Result<()> {
        let _guard = lock(&self.groups_lock, "groups")?;
        self.write_json_atomic(&self.groups_path(), &groups)
    }

    /// Full marks table; writes an empty document on first access.
    pub fn load_marks(&self) -> anyhow::Result<MarksTable> {
        let _guard = lock(&self.marks_lock, "marks")?;
        self.read_marks_unlocked()
    }

    /// Read-modify-write of the marks document under its lock. Nothing is
    /// written when `f` fails.
    pub fn update_marks<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut MarksTable) -> Result<R, E>,
        E: From<anyhow::Error>,
    {
        let _guard = lock(&self.marks_lock, "marks")?;
        let mut marks = self.read_marks_unlocked()?;
        let out = f(&mut marks)?;
        self.write_json_atomic(&self.marks_path(), &marks)?;
        Ok(out)
    }

    fn read_groups_unlocked(&self) -> anyhow::Result<Option<Vec<Group>>> {
        let path = self.groups_path();
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn read_marks_unlocked(&self) -> anyhow::Result<MarksTable> {
        let path = self.marks_path();
        if !path.is_file() {
            let empty = MarksTable::new();
            self.write_json_atomic(&path, &empty)?;
            return Ok(empty);
        }
        read_json(&path)
    }

    /// Replaces both documents together. Both are staged before either is
    /// renamed into place, and if the marks rename fails the previous groups
    /// document is put back.
    pub fn replace_all(&self, groups: &[Group], marks: &MarksTable) -> anyhow::Result<()> {
        let _groups_guard = lock(&self.groups_lock, "groups")?;
        let _marks_guard = lock(&self.marks_lock, "marks")?;
        let groups_path = self.groups_path();
        let marks_path = self.marks_path();

        let groups_tmp = self.stage_json(&groups_path, &groups)?;
        let marks_tmp = match self.stage_json(&marks_path, marks) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = std::fs::remove_file(&groups_tmp);
                return Err(e);
            }
        };

        let previous_groups = if groups_path.is_file() {
            Some(std::fs::read(&groups_path).with_context(|| {
                format!("failed to read {}", groups_path.to_string_lossy())
            })?)
        } else {
            None
        };
        if let Err(e) = commit(&groups_tmp, &groups_path) {
            let _ = std::fs::remove_file(&marks_tmp);
            return Err(e);
        }
        if let Err(e) = commit(&marks_tmp, &marks_path) {
            let restored = match previous_groups {
                Some(bytes) => std::fs::write(&groups_path, bytes),
                None => std::fs::remove_file(&groups_path),
            };
            if let Err(restore_err) = restored {
                error!(error = %restore_err, "failed to restore groups document");
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_json_atomic<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> anyhow::Result<()> {
        let tmp = self.stage_json(path, value)?;
        commit(&tmp, path)
    }

    /// Writes `value` to a uniquely named temp file next to `path`.
    fn stage_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> anyhow::Result<PathBuf> {
        self.ensure_data_dir()?;
        let text = serde_json::to_string_pretty(value).context("failed to serialize document")?;
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let tmp = self
            .data_dir
            .join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        std::fs::write(&tmp, text)
            .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
        Ok(tmp)
    }
}

fn commit(tmp: &Path, path: &Path) -> anyhow::Result<()> {
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(e).with_context(|| format!("failed to replace {}", path.to_string_lossy()));
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is invalid JSON", path.to_string_lossy()))
}

fn lock<'a>(m: &'a Mutex<()>, name: &str) -> anyhow::Result<MutexGuard<'a, ()>> {
    m.lock().map_err(|_| anyhow!("{} document lock poisoned", name))
}
