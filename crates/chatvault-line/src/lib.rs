//! # chatvault-line
//!
//! LINE Messaging API layer for chatvault: the serde model of inbound
//! webhook events, webhook signature verification, and a thin typed client
//! for the outbound Messaging API calls the bot consumes (replies, profile
//! lookups, member enumeration, message content download).

pub mod client;
pub mod events;
pub mod signature;

mod error;

pub use client::LineClient;
pub use error::{ApiErrorBody, ApiErrorDetail, LineError};
pub use events::{
    EventSource, FollowEvent, JoinEvent, MemberLeftEvent, MemberJoinedEvent, MemberRef,
    MessageEvent, MessageKind, MessagePayload, WebhookEvent, WebhookRequest,
};
pub use signature::{sign, verify_signature};
