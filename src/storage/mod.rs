//! Cloud storage contract and the Google Drive implementation.

pub mod auth;
pub mod google;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use auth::{
    Authenticated, Credential, CredentialSource, OAuthFlow, StorageAuthenticator, TokenSource,
};
pub use google::{DriveStore, GoogleOAuth};

/// Metadata for a remote object about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    pub name: String,
    /// Parent folder ids. Empty means the account root.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// A remote object as reported by the store after the upload commits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteObject {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An authenticated handle permitting object creation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Creates a new object described by `metadata` and streams the contents
    /// of `source` into it.
    ///
    /// Always creates a new object, even if one with the same name exists.
    async fn create_object(&self, metadata: &ObjectMetadata, source: &Path) -> Result<RemoteObject>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_uploads_omit_parents() {
        let meta = ObjectMetadata {
            name: "a.jpg".to_string(),
            parents: vec![],
            mime_type: "image/jpeg".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({"name": "a.jpg", "mimeType": "image/jpeg"}));
    }

    #[test]
    fn folder_uploads_list_parent() {
        let meta = ObjectMetadata {
            name: "a.jpg".to_string(),
            parents: vec!["F1".to_string()],
            mime_type: "image/jpeg".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["parents"], serde_json::json!(["F1"]));
    }
}
