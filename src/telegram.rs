//! Telegram adapter built on grammers.
//!
//! [`TelegramConnector`] logs in and persists the session file.
//! [`grammers_client::Client`] implements [`MessagingClient`] so the resolver
//! and pipeline can drive it directly.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use grammers_client::client::auth::InvocationError;
use grammers_client::client::messages::SearchIter;
use grammers_client::grammers_tl_types as tl;
use grammers_client::types::{Chat, Downloadable, Media, Message};
use grammers_client::{Client, Config, InitParams, SignInError};
use grammers_session::{PackedChat, PackedType, Session};

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::media::{GroupInfo, GroupKind, MediaKind, MediaMessage, local_file_name};
use crate::messaging::{MessageCursor, MessagingClient, ResolvedEntity};
use crate::resolver::ReferenceKind;
use crate::session::Connector;

fn telegram_err(e: impl std::fmt::Display) -> Error {
    Error::Telegram(e.to_string())
}

/// Opens authenticated grammers clients from a [`TelegramConfig`].
#[derive(Debug, Clone)]
pub struct TelegramConnector {
    config: TelegramConfig,
}

impl TelegramConnector {
    #[must_use]
    pub const fn new(config: TelegramConfig) -> Self {
        Self { config }
    }

    fn save_session(client: &Client, path: &Path) -> Result<()> {
        client.session().save_to_file(path)?;
        Ok(())
    }

    async fn sign_in(&self, client: &Client) -> Result<()> {
        let phone = match &self.config.phone {
            Some(phone) => phone.clone(),
            None => prompt("Enter your phone number (international format): ").await?,
        };
        let token = client
            .request_login_code(phone.trim())
            .await
            .map_err(telegram_err)?;
        let code = prompt("Enter the code you received: ").await?;

        match client.sign_in(&token, code.trim()).await {
            Ok(_) => Ok(()),
            Err(SignInError::PasswordRequired(password_token)) => {
                let password = match &self.config.password {
                    Some(password) => password.clone(),
                    None => prompt("Enter your two-step verification password: ").await?,
                };
                client
                    .check_password(password_token, password.trim())
                    .await
                    .map_err(telegram_err)?;
                Ok(())
            }
            Err(e) => Err(telegram_err(e)),
        }
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    type Handle = Client;

    async fn connect(&self) -> Result<Client> {
        let session = Session::load_file_or_create(&self.config.session_path)?;
        let client = Client::connect(Config {
            session,
            api_id: self.config.api_id,
            api_hash: self.config.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(telegram_err)?;

        if !client.is_authorized().await.map_err(telegram_err)? {
            log::info!("Session is not authorized, signing in");
            self.sign_in(&client).await?;
            Self::save_session(&client, &self.config.session_path)?;
            log::info!("Signed in, session saved to {}", self.config.session_path.display());
        }
        Ok(client)
    }

    fn release(&self, handle: Client) {
        if let Err(e) = Self::save_session(&handle, &self.config.session_path) {
            log::warn!("Failed to save session {}: {e}", self.config.session_path.display());
        }
        drop(handle);
        log::debug!("Telegram client disconnected");
    }
}

fn read_answer(mut input: impl BufRead, mut output: impl Write, message: &str) -> std::io::Result<String> {
    output.write_all(message.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Asks on the terminal without blocking the runtime's worker threads.
async fn prompt(message: &str) -> Result<String> {
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        read_answer(std::io::stdin().lock(), std::io::stdout(), &message)
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(answer)
}

/// A message yielded by a filtered search, tagged with the pass it came from.
pub struct TelegramMessage {
    inner: Message,
    pass: MediaKind,
}

impl TelegramMessage {
    #[must_use]
    pub const fn inner(&self) -> &Message {
        &self.inner
    }
}

/// Classifies an attachment against the pass that found it.
///
/// Videos are documents too, so a video also satisfies the document pass.
fn payload_for(pass: MediaKind, is_photo: bool, mime: Option<&str>) -> Option<MediaKind> {
    let is_video = mime.is_some_and(|m| m.starts_with("video/"));
    match pass {
        MediaKind::Photo if is_photo => Some(MediaKind::Photo),
        MediaKind::Video if !is_photo && is_video => Some(MediaKind::Video),
        MediaKind::Document if !is_photo && mime.is_some() => Some(MediaKind::Document),
        _ if is_photo => Some(MediaKind::Photo),
        _ if is_video => Some(MediaKind::Video),
        _ if mime.is_some() => Some(MediaKind::Document),
        _ => None,
    }
}

impl MediaMessage for TelegramMessage {
    fn id(&self) -> i32 {
        self.inner.id()
    }

    fn payload_kind(&self) -> Option<MediaKind> {
        match self.inner.media()? {
            Media::Photo(_) => payload_for(self.pass, true, None),
            Media::Document(doc) => {
                payload_for(self.pass, false, Some(doc.mime_type().unwrap_or("")))
            }
            // Stickers are documents and only the document pass lists them
            Media::Sticker(sticker) => payload_for(
                self.pass,
                false,
                Some(sticker.document.mime_type().unwrap_or("")),
            ),
            _ => None,
        }
    }
}

/// Lazy cursor over one filtered search.
pub struct TelegramCursor {
    iter: SearchIter,
    pass: MediaKind,
}

#[async_trait]
impl MessageCursor<TelegramMessage> for TelegramCursor {
    async fn next(&mut self) -> Result<Option<TelegramMessage>> {
        let message = self.iter.next().await.map_err(telegram_err)?;
        Ok(message.map(|inner| TelegramMessage {
            inner,
            pass: self.pass,
        }))
    }
}

const fn search_filter(kind: MediaKind) -> tl::enums::MessagesFilter {
    match kind {
        MediaKind::Photo => tl::enums::MessagesFilter::InputMessagesFilterPhotos,
        MediaKind::Video => tl::enums::MessagesFilter::InputMessagesFilterVideo,
        MediaKind::Document => tl::enums::MessagesFilter::InputMessagesFilterDocument,
    }
}

/// Rebuilds the peer address of a resolved group.
#[must_use]
pub const fn packed_group(group: &GroupInfo) -> PackedChat {
    let ty = match group.kind {
        GroupKind::BasicGroup => PackedType::Chat,
        GroupKind::Megagroup => PackedType::Megagroup,
        GroupKind::Broadcast => PackedType::Broadcast,
        GroupKind::Gigagroup => PackedType::Gigagroup,
    };
    PackedChat {
        ty,
        id: group.group_id,
        access_hash: group.access_hash,
    }
}

/// Maps a resolved peer to an entity.
#[must_use]
pub fn entity_from_packed(packed: PackedChat, title: &str) -> ResolvedEntity {
    let kind = match packed.ty {
        PackedType::User | PackedType::Bot => return ResolvedEntity::User { id: packed.id },
        PackedType::Chat => GroupKind::BasicGroup,
        PackedType::Megagroup => GroupKind::Megagroup,
        PackedType::Broadcast => GroupKind::Broadcast,
        PackedType::Gigagroup => GroupKind::Gigagroup,
    };
    ResolvedEntity::Group {
        id: packed.id,
        title: title.to_string(),
        access_hash: packed.access_hash,
        kind,
    }
}

/// Maps a raw chat returned by an invite check.
fn entity_from_raw(chat: tl::enums::Chat) -> Option<ResolvedEntity> {
    match chat {
        tl::enums::Chat::Chat(c) => Some(ResolvedEntity::Group {
            id: c.id,
            title: c.title,
            access_hash: None,
            kind: GroupKind::BasicGroup,
        }),
        tl::enums::Chat::Channel(c) => {
            let kind = if c.megagroup {
                GroupKind::Megagroup
            } else if c.gigagroup {
                GroupKind::Gigagroup
            } else {
                GroupKind::Broadcast
            };
            Some(ResolvedEntity::Group {
                id: c.id,
                title: c.title,
                access_hash: c.access_hash,
                kind,
            })
        }
        tl::enums::Chat::Forbidden(c) => Some(ResolvedEntity::Unjoined { title: c.title }),
        tl::enums::Chat::ChannelForbidden(c) => Some(ResolvedEntity::Unjoined { title: c.title }),
        tl::enums::Chat::Empty(_) => None,
    }
}

fn is_not_found(error: &InvocationError) -> bool {
    matches!(
        error,
        InvocationError::Rpc(rpc) if rpc.name.starts_with("USERNAME_")
            || rpc.name.starts_with("INVITE_HASH_")
    )
}

#[async_trait]
impl MessagingClient for Client {
    type Message = TelegramMessage;
    type Cursor = TelegramCursor;

    async fn lookup(&self, reference: &ReferenceKind) -> Result<Option<ResolvedEntity>> {
        match reference {
            ReferenceKind::Username(name) => match self.resolve_username(name).await {
                Ok(Some(chat)) => {
                    let title = match &chat {
                        Chat::User(user) => user.full_name(),
                        _ => chat.name().to_string(),
                    };
                    Ok(Some(entity_from_packed(chat.pack(), &title)))
                }
                Ok(None) => Ok(None),
                Err(e) if is_not_found(&e) => Ok(None),
                Err(e) => Err(telegram_err(e)),
            },
            ReferenceKind::InviteHash(hash) => {
                let request = tl::functions::messages::CheckChatInvite { hash: hash.clone() };
                match self.invoke(&request).await {
                    Ok(tl::enums::ChatInvite::Already(already)) => Ok(entity_from_raw(already.chat)),
                    Ok(tl::enums::ChatInvite::Peek(peek)) => Ok(entity_from_raw(peek.chat)),
                    Ok(tl::enums::ChatInvite::Invite(invite)) => {
                        Ok(Some(ResolvedEntity::Unjoined { title: invite.title }))
                    }
                    Err(e) if is_not_found(&e) => Ok(None),
                    Err(e) => Err(telegram_err(e)),
                }
            }
        }
    }

    fn messages(&self, group: &GroupInfo, kind: MediaKind) -> TelegramCursor {
        TelegramCursor {
            iter: self
                .search_messages(packed_group(group))
                .filter(search_filter(kind)),
            pass: kind,
        }
    }

    async fn download(
        &self,
        message: &TelegramMessage,
        kind: MediaKind,
        dir: &Path,
    ) -> Result<PathBuf> {
        let media = message
            .inner
            .media()
            .ok_or_else(|| Error::Telegram(format!("message {} has no media", message.id())))?;

        let name = match &media {
            Media::Document(doc) => {
                let original = Some(doc.name()).filter(|n| !n.is_empty());
                local_file_name(kind, message.id(), original, doc.mime_type())
            }
            _ => local_file_name(kind, message.id(), None, None),
        };
        let path = dir.join(name);

        self.download_media(&Downloadable::Media(media), &path)
            .await
            .map_err(telegram_err)?;
        log::debug!("Downloaded message {} to {}", message.id(), path.display());
        Ok(path)
    }
}
