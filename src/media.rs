//! Core media and group types shared by the pipeline and its adapters.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The three content kinds swept by the pipeline, one pass each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

impl MediaKind {
    /// Pass order: photos, then videos, then documents.
    pub const ALL: [Self; 3] = [Self::Photo, Self::Video, Self::Document];

    /// Lowercase name used in logs, file names and the checkpoint ledger.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The flavour of group a reference resolved to.
///
/// Adapters need this to address the peer again when enumerating messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Legacy small group. Never carries an access hash.
    BasicGroup,
    /// Supergroup.
    Megagroup,
    /// Broadcast channel.
    Broadcast,
    /// Broadcast group.
    Gigagroup,
}

/// A resolved group, read-only for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub group_id: i64,
    pub title: String,
    /// Present only for entity kinds that expose one.
    pub access_hash: Option<i64>,
    pub kind: GroupKind,
}

/// A message yielded by one enumeration pass.
pub trait MediaMessage: Send + Sync {
    /// Remote message id.
    fn id(&self) -> i32;

    /// The kind of attachment this message carries, if any.
    fn payload_kind(&self) -> Option<MediaKind>;
}

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("video/webm", "webm"),
    ("video/x-matroska", "mkv"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("audio/mp4", "m4a"),
    ("application/pdf", "pdf"),
    ("application/zip", "zip"),
    ("application/x-tgsticker", "tgs"),
    ("text/plain", "txt"),
];

/// Fallback content type for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns the conventional extension (without dot) for a MIME type.
#[must_use]
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.split(';').next().unwrap_or(mime).trim();
    MIME_EXTENSIONS
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(mime))
        .map(|(_, ext)| *ext)
}

/// Guesses the MIME type of a local file from its extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| if ext.eq_ignore_ascii_case("jpeg") { "jpg" } else { ext })
        .and_then(|ext| {
            MIME_EXTENSIONS
                .iter()
                .find(|(_, e)| e.eq_ignore_ascii_case(ext))
                .map(|(mime, _)| *mime)
        })
        .unwrap_or(OCTET_STREAM)
}

/// Builds the deterministic local file name for a message's attachment.
///
/// Re-running against the same group yields the same names, so local files
/// are overwritten rather than duplicated. Photos have no file name on the
/// platform and are always stored as JPEG.
#[must_use]
pub fn local_file_name(
    kind: MediaKind,
    message_id: i32,
    original_name: Option<&str>,
    mime: Option<&str>,
) -> String {
    if kind != MediaKind::Photo
        && let Some(name) = original_name.and_then(base_name)
    {
        return name;
    }
    let ext = match kind {
        MediaKind::Photo => Some("jpg"),
        _ => mime.and_then(extension_for_mime),
    };
    match ext {
        Some(ext) => format!("{kind}_{message_id}.{ext}"),
        None => format!("{kind}_{message_id}"),
    }
}

/// Strips any directory components a remote file name may carry.
fn base_name(name: &str) -> Option<String> {
    let name = name.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_order_is_fixed() {
        assert_eq!(
            MediaKind::ALL,
            [MediaKind::Photo, MediaKind::Video, MediaKind::Document]
        );
    }

    #[test]
    fn photos_are_named_by_message_id() {
        assert_eq!(
            local_file_name(MediaKind::Photo, 17, Some("ignored.png"), None),
            "photo_17.jpg"
        );
    }

    #[test]
    fn documents_keep_their_own_name() {
        assert_eq!(
            local_file_name(MediaKind::Document, 3, Some("report.pdf"), None),
            "report.pdf"
        );
    }

    #[test]
    fn remote_names_cannot_escape_download_dir() {
        assert_eq!(
            local_file_name(MediaKind::Document, 3, Some("../../etc/passwd"), None),
            "passwd"
        );
        assert_eq!(
            local_file_name(MediaKind::Video, 9, Some("..\\"), Some("video/mp4")),
            "video_9.mp4"
        );
    }

    #[test]
    fn unnamed_video_uses_mime_extension() {
        assert_eq!(
            local_file_name(MediaKind::Video, 8, Some(""), Some("video/mp4")),
            "video_8.mp4"
        );
        assert_eq!(
            local_file_name(MediaKind::Document, 8, None, Some("application/x-unknown")),
            "document_8"
        );
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(mime_for_path(Path::new("a/b.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("clip.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_for_path(Path::new("noext")), OCTET_STREAM);
        assert_eq!(extension_for_mime("text/plain; charset=utf-8"), Some("txt"));
    }
}
