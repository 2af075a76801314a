//! Group reference parsing and resolution.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::media::GroupInfo;
use crate::messaging::{MessagingClient, ResolvedEntity};

static INVITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?(?:t|telegram)\.me/(?:\+|joinchat/)([A-Za-z0-9_-]+)/?$")
        .expect("valid regex")
});

static TG_JOIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^tg://join\?invite=([A-Za-z0-9_-]+)$").expect("valid regex")
});

static LINK_USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?(?:t|telegram)\.me/([A-Za-z][A-Za-z0-9_]{3,31})/?$")
        .expect("valid regex")
});

static BARE_USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?([A-Za-z][A-Za-z0-9_]{3,31})$").expect("valid regex"));

/// A parsed group reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A public handle, without the leading `@`.
    Username(String),
    /// The hash part of a private invite link.
    InviteHash(String),
}

/// User-supplied invite link or handle identifying a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReference(String);

impl GroupReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies the reference as a username or an invite hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if the reference matches no known form.
    pub fn parse(&self) -> Result<ReferenceKind> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return Err(Error::resolution(raw, "empty group reference"));
        }

        let capture = |re: &Regex| {
            re.captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        if let Some(hash) = capture(&INVITE_RE).or_else(|| capture(&TG_JOIN_RE)) {
            return Ok(ReferenceKind::InviteHash(hash));
        }
        if let Some(name) = capture(&LINK_USERNAME_RE).or_else(|| capture(&BARE_USERNAME_RE)) {
            return Ok(ReferenceKind::Username(name));
        }
        Err(Error::resolution(raw, "not an invite link or username"))
    }
}

impl std::fmt::Display for GroupReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves `reference` to the group it names.
///
/// The client must already be connected.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if the reference is malformed, names nothing,
/// names a user, or points at a group the account has not joined. Lookup
/// failures from the client propagate unchanged.
pub async fn resolve<C: MessagingClient + ?Sized>(
    client: &C,
    reference: &GroupReference,
) -> Result<GroupInfo> {
    let parsed = reference.parse()?;
    log::debug!("Resolving {parsed:?}");

    match client.lookup(&parsed).await? {
        Some(ResolvedEntity::Group {
            id,
            title,
            access_hash,
            kind,
        }) => Ok(GroupInfo {
            group_id: id,
            title,
            access_hash,
            kind,
        }),
        Some(ResolvedEntity::User { id }) => Err(Error::resolution(
            reference.as_str(),
            format!("entity {id} is a user, not a group"),
        )),
        Some(ResolvedEntity::Unjoined { title }) => Err(Error::resolution(
            reference.as_str(),
            format!("account is not a member of {title:?}"),
        )),
        None => Err(Error::resolution(reference.as_str(), "not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{GroupKind, MediaKind, MediaMessage};
    use crate::messaging::MessageCursor;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    fn parse(s: &str) -> Result<ReferenceKind> {
        GroupReference::new(s).parse()
    }

    fn username(s: &str) -> ReferenceKind {
        ReferenceKind::Username(s.to_string())
    }

    fn invite(s: &str) -> ReferenceKind {
        ReferenceKind::InviteHash(s.to_string())
    }

    #[test]
    fn parses_usernames() {
        assert_eq!(parse("@rustlang").unwrap(), username("rustlang"));
        assert_eq!(parse("rustlang").unwrap(), username("rustlang"));
        assert_eq!(parse("t.me/rustlang").unwrap(), username("rustlang"));
        assert_eq!(parse("https://t.me/rustlang/").unwrap(), username("rustlang"));
        assert_eq!(parse("  https://telegram.me/rust_lang ").unwrap(), username("rust_lang"));
    }

    #[test]
    fn parses_invite_links() {
        assert_eq!(parse("https://t.me/+AbC-d_1").unwrap(), invite("AbC-d_1"));
        assert_eq!(parse("t.me/joinchat/XyZ123").unwrap(), invite("XyZ123"));
        assert_eq!(parse("tg://join?invite=XyZ123").unwrap(), invite("XyZ123"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse(""), Err(Error::Resolution { .. })));
        assert!(matches!(parse("   "), Err(Error::Resolution { .. })));
        assert!(matches!(parse("https://example.com/x"), Err(Error::Resolution { .. })));
        assert!(matches!(parse("@ab"), Err(Error::Resolution { .. })));
        assert!(matches!(parse("1group"), Err(Error::Resolution { .. })));
    }

    struct NoMessage;

    impl MediaMessage for NoMessage {
        fn id(&self) -> i32 {
            0
        }

        fn payload_kind(&self) -> Option<MediaKind> {
            None
        }
    }

    struct EmptyCursor;

    #[async_trait]
    impl MessageCursor<NoMessage> for EmptyCursor {
        async fn next(&mut self) -> Result<Option<NoMessage>> {
            Ok(None)
        }
    }

    /// A directory that answers every lookup with the same entity.
    struct FixedDirectory(Option<ResolvedEntity>);

    #[async_trait]
    impl MessagingClient for FixedDirectory {
        type Message = NoMessage;
        type Cursor = EmptyCursor;

        async fn lookup(&self, _reference: &ReferenceKind) -> Result<Option<ResolvedEntity>> {
            Ok(self.0.clone())
        }

        fn messages(&self, _group: &GroupInfo, _kind: MediaKind) -> EmptyCursor {
            EmptyCursor
        }

        async fn download(&self, _m: &NoMessage, _k: MediaKind, _d: &Path) -> Result<PathBuf> {
            unreachable!("resolver never downloads")
        }
    }

    #[tokio::test]
    async fn channel_carries_access_hash() {
        let dir = FixedDirectory(Some(ResolvedEntity::Group {
            id: 123_456,
            title: "Test Group".to_string(),
            access_hash: Some(987),
            kind: GroupKind::Megagroup,
        }));
        let info = resolve(&dir, &GroupReference::new("@testgroup")).await.unwrap();
        assert_eq!(info.group_id, 123_456);
        assert_eq!(info.title, "Test Group");
        assert_eq!(info.access_hash, Some(987));
    }

    #[tokio::test]
    async fn basic_group_has_no_access_hash() {
        let dir = FixedDirectory(Some(ResolvedEntity::Group {
            id: 55,
            title: "Family".to_string(),
            access_hash: None,
            kind: GroupKind::BasicGroup,
        }));
        let info = resolve(&dir, &GroupReference::new("t.me/+hash")).await.unwrap();
        assert_eq!(info.access_hash, None);
        assert_eq!(info.kind, GroupKind::BasicGroup);
    }

    #[tokio::test]
    async fn unresolvable_references_fail() {
        let reference = GroupReference::new("@missing_group");
        for entity in [
            None,
            Some(ResolvedEntity::User { id: 1 }),
            Some(ResolvedEntity::Unjoined {
                title: "Private".to_string(),
            }),
        ] {
            let err = resolve(&FixedDirectory(entity), &reference).await.unwrap_err();
            assert!(matches!(err, Error::Resolution { .. }), "{err}");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(s in ".*") {
                let _ = GroupReference::new(s).parse();
            }

            #[test]
            fn valid_handles_round_trip(name in "[A-Za-z][A-Za-z0-9_]{3,31}") {
                let at = format!("@{name}");
                prop_assert_eq!(
                    GroupReference::new(at).parse().unwrap(),
                    ReferenceKind::Username(name)
                );
            }
        }
    }
}
