//! Opt-in ledger of already-transferred messages.
//!
//! Without a checkpoint every run re-transfers the whole group. With one,
//! messages recorded by an earlier run are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::media::MediaKind;

/// Transferred message ids for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLedger {
    #[serde(default)]
    pub photos: BTreeSet<i32>,
    #[serde(default)]
    pub videos: BTreeSet<i32>,
    #[serde(default)]
    pub documents: BTreeSet<i32>,
}

impl GroupLedger {
    fn ids(&self, kind: MediaKind) -> &BTreeSet<i32> {
        match kind {
            MediaKind::Photo => &self.photos,
            MediaKind::Video => &self.videos,
            MediaKind::Document => &self.documents,
        }
    }

    fn ids_mut(&mut self, kind: MediaKind) -> &mut BTreeSet<i32> {
        match kind {
            MediaKind::Photo => &mut self.photos,
            MediaKind::Video => &mut self.videos,
            MediaKind::Document => &mut self.documents,
        }
    }
}

/// Persistent checkpoint, saved after every recorded transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Keyed by group id (TOML keys must be strings).
    #[serde(default)]
    pub groups: BTreeMap<String, GroupLedger>,
}

impl Checkpoint {
    /// Default ledger location.
    ///
    /// Uses `STATE_DIRECTORY` (set by systemd when `StateDirectory=` is
    /// configured), falling back to `$XDG_DATA_HOME/tgdrive`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os("STATE_DIRECTORY")
            .map(PathBuf::from)
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tgdrive")
            .join("checkpoint.toml")
    }

    /// Opens the ledger at `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut checkpoint = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Self>(&contents).map_err(|e| {
                Error::Config(format!("corrupt checkpoint {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        checkpoint.path = path;
        Ok(checkpoint)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `message_id` was already transferred for this group and kind.
    #[must_use]
    pub fn contains(&self, group_id: i64, kind: MediaKind, message_id: i32) -> bool {
        self.groups
            .get(&group_id.to_string())
            .is_some_and(|ledger| ledger.ids(kind).contains(&message_id))
    }

    /// Records a transferred message and saves the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be written.
    pub fn record(&mut self, group_id: i64, kind: MediaKind, message_id: i32) -> Result<()> {
        self.groups
            .entry(group_id.to_string())
            .or_default()
            .ids_mut(kind)
            .insert(message_id);
        self.updated = Some(Utc::now());
        self.save()
    }

    /// Saves the ledger atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp_path = self.path.with_extension("toml.tmp");
        let toml_str = toml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&tmp_path, toml_str)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
