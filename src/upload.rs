//! Pushes downloaded files to remote storage.

use std::path::Path;

use crate::error::{Error, Result};
use crate::media::mime_for_path;
use crate::storage::{ObjectMetadata, RemoteObject, RemoteStore};

/// Creates one remote object per local file, optionally under a folder.
#[derive(Debug, Clone, Default)]
pub struct Uploader {
    folder_id: Option<String>,
}

impl Uploader {
    /// Creates an uploader targeting `folder_id`, or the storage root if `None`.
    ///
    /// An empty folder id also means the root.
    #[must_use]
    pub fn new(folder_id: Option<String>) -> Self {
        Self {
            folder_id: folder_id.filter(|id| !id.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
    }

    /// Builds the creation request for `local_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no file name component.
    pub fn metadata_for(&self, local_path: &Path) -> Result<ObjectMetadata> {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} has no file name", local_path.display()),
                ))
            })?;
        Ok(ObjectMetadata {
            name,
            parents: self.folder_id.iter().cloned().collect(),
            mime_type: mime_for_path(local_path).to_string(),
        })
    }

    /// Uploads `local_path` as a new object named after its base name.
    ///
    /// Never checks for an existing object of the same name, so repeated runs
    /// leave duplicates behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no file name or the store rejects
    /// the upload.
    pub async fn upload<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        local_path: &Path,
    ) -> Result<RemoteObject> {
        let metadata = self.metadata_for(local_path)?;
        let created = store.create_object(&metadata, local_path).await?;
        log::debug!("Uploaded {} as {}", metadata.name, created.id);
        Ok(created)
    }
}
