//! The messaging-platform contract the pipeline and resolver depend on.
//!
//! The production implementation lives in [`crate::telegram`]; tests drive the
//! pipeline through in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::media::{GroupInfo, GroupKind, MediaKind, MediaMessage};
use crate::resolver::ReferenceKind;

/// An entity returned by a platform lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntity {
    /// A group or channel the account can read.
    Group {
        id: i64,
        title: String,
        access_hash: Option<i64>,
        kind: GroupKind,
    },
    /// A user or bot. Not a valid transfer source.
    User { id: i64 },
    /// An invite to a group the account has not joined.
    Unjoined { title: String },
}

/// Remote operations needed to enumerate and fetch group media.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Message type yielded by enumeration.
    type Message: MediaMessage;
    /// Lazy cursor over one filtered pass.
    type Cursor: MessageCursor<Self::Message>;

    /// Looks up the entity behind a parsed group reference.
    ///
    /// Returns `Ok(None)` when nothing matches.
    async fn lookup(&self, reference: &ReferenceKind) -> Result<Option<ResolvedEntity>>;

    /// Starts one enumeration pass over `group`, filtered to `kind`.
    ///
    /// Messages are yielded in the platform's native order.
    fn messages(&self, group: &GroupInfo, kind: MediaKind) -> Self::Cursor;

    /// Downloads the attachment of `message` into `dir` and returns the file path.
    async fn download(
        &self,
        message: &Self::Message,
        kind: MediaKind,
        dir: &Path,
    ) -> Result<PathBuf>;
}

/// A lazy, finite sequence of messages.
#[async_trait]
pub trait MessageCursor<M: MediaMessage>: Send {
    /// Fetches the next message, or `None` once the pass is exhausted.
    async fn next(&mut self) -> Result<Option<M>>;
}
