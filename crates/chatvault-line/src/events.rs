//! Serde model of inbound LINE webhook payloads.
//!
//! Every event struct keeps unrecognized fields in a flattened map so the
//! archiver can persist the inbound JSON verbatim, not just the fields this
//! crate happens to know about.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level webhook body: the bot destination plus a batch of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRequest {
    pub destination: String,
    pub events: Vec<WebhookEvent>,
}

/// One webhook event, discriminated by its `type` field.
///
/// Kinds the bot does not archive (unfollow, leave, postback, ...) collapse
/// into [`WebhookEvent::Other`] and are skipped by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebhookEvent {
    Follow(FollowEvent),
    Join(JoinEvent),
    MemberJoined(MemberJoinedEvent),
    MemberLeft(MemberLeftEvent),
    Message(MessageEvent),
    #[serde(other)]
    Other,
}

/// A user added the bot as a friend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEvent {
    pub reply_token: String,
    pub timestamp: i64,
    pub source: EventSource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The bot was invited into a group or room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    pub reply_token: String,
    pub timestamp: i64,
    pub source: EventSource,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One or more users joined a group the bot is in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinedEvent {
    pub timestamp: i64,
    pub source: EventSource,
    pub joined: MemberList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One or more users left a group the bot is in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeftEvent {
    pub timestamp: i64,
    pub source: EventSource,
    pub left: MemberList,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message was sent in a conversation the bot is part of.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub reply_token: String,
    pub timestamp: i64,
    pub source: EventSource,
    pub message: MessagePayload,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Membership delta carried by memberJoined / memberLeft events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberList {
    pub members: Vec<MemberRef>,
}

/// Reference to a single user inside a membership delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    pub user_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where an event came from: a 1:1 chat, a group, or a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventSource {
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    #[serde(rename_all = "camelCase")]
    Group {
        group_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Room {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
}

impl EventSource {
    /// The user who triggered the event, when the platform discloses one.
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            EventSource::User { user_id } => Some(user_id),
            EventSource::Group { user_id, .. } | EventSource::Room { user_id, .. } => {
                user_id.as_deref()
            }
        }
    }

    /// Stable key identifying the conversation this event belongs to,
    /// e.g. `user-U123` / `group-G456` / `room-R789`.
    pub fn scope_key(&self) -> String {
        match self {
            EventSource::User { user_id } => format!("user-{user_id}"),
            EventSource::Group { group_id, .. } => format!("group-{group_id}"),
            EventSource::Room { room_id, .. } => format!("room-{room_id}"),
        }
    }
}

/// Discriminant of a message payload.
///
/// Kinds this bot has no special handling for (and any kind the platform
/// adds later) map to [`MessageKind::Other`] and are archived as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    File,
    Sticker,
    Location,
    Other,
}

impl From<String> for MessageKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            "video" => MessageKind::Video,
            "audio" => MessageKind::Audio,
            "file" => MessageKind::File,
            "sticker" => MessageKind::Sticker,
            "location" => MessageKind::Location,
            _ => MessageKind::Other,
        }
    }
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Video => "video",
            MessageKind::Audio => "audio",
            MessageKind::File => "file",
            MessageKind::Sticker => "sticker",
            MessageKind::Location => "location",
            MessageKind::Other => "other",
        }
    }
}

/// The message body of a [`MessageEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagePayload {
    /// File extension for archived binary content, or `None` when the
    /// message carries no downloadable media.
    ///
    /// Image, video, and audio use the platform's fixed container formats;
    /// generic files keep the extension of the uploaded filename.
    pub fn media_extension(&self) -> Option<String> {
        match self.kind {
            MessageKind::Image => Some(".png".to_string()),
            MessageKind::Video => Some(".mp4".to_string()),
            MessageKind::Audio => Some(".m4a".to_string()),
            MessageKind::File => {
                let ext = self
                    .file_name
                    .as_deref()
                    .and_then(|name| Path::new(name).extension())
                    .and_then(|ext| ext.to_str())
                    .map(|ext| format!(".{ext}"))
                    .unwrap_or_default();
                Some(ext)
            }
            _ => None,
        }
    }
}
