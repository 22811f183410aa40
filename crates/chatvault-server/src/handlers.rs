//! The five per-event-kind archival behaviors.
//!
//! Handlers return `Err` freely; the dispatcher decides what a failure
//! means for the HTTP response (see `webhook.rs`).

use serde_json::Value;
use tracing::{debug, info, warn};

use chatvault_line::events::{
    EventSource, FollowEvent, JoinEvent, MemberLeftEvent, MemberJoinedEvent, MessageEvent,
    WebhookEvent,
};
use chatvault_store::collections;

use crate::error::ServerError;
use crate::media::MediaStore;
use crate::normalize;
use crate::webhook::AppState;

/// Greeting sent when the bot is followed or joins a conversation.
pub const GREETING_TEXT: &str = "您好～我是您的智慧助理：）";

/// Acknowledgment sent for every archived message.
pub const MESSAGE_ACK_TEXT: &str = "收到訊息~";

/// Route one webhook event to its handler.
pub async fn handle_event(state: &AppState, event: &WebhookEvent) -> Result<(), ServerError> {
    match event {
        WebhookEvent::Follow(ev) => on_follow(state, ev).await,
        WebhookEvent::Join(ev) => on_join(state, ev).await,
        WebhookEvent::MemberJoined(ev) => on_member_joined(state, ev).await,
        WebhookEvent::MemberLeft(ev) => on_member_left(state, ev).await,
        WebhookEvent::Message(ev) => on_message(state, ev).await,
        WebhookEvent::Other => {
            debug!("ignoring webhook event kind with no archival behavior");
            Ok(())
        }
    }
}

/// A user friended the bot: greet them and archive their profile.
async fn on_follow(state: &AppState, event: &FollowEvent) -> Result<(), ServerError> {
    state.line.reply(&event.reply_token, GREETING_TEXT).await?;

    let Some(user_id) = event.source.sender_id() else {
        warn!("follow event without a user id");
        return Ok(());
    };

    let profile = state.line.get_profile(user_id).await?;
    state
        .store
        .lock()
        .await
        .save_profile_if_absent(collections::USER_PROFILES, user_id, &profile)?;

    info!(user = %user_id, "archived follower profile");
    Ok(())
}

/// The bot was invited into a group: greet and archive the member roster.
async fn on_join(state: &AppState, event: &JoinEvent) -> Result<(), ServerError> {
    state.line.reply(&event.reply_token, GREETING_TEXT).await?;

    let EventSource::Group { group_id, .. } = &event.source else {
        debug!("joined a non-group conversation, no roster to archive");
        return Ok(());
    };

    // Member enumeration requires a verified account tier; its absence
    // must not fail the webhook.
    let member_ids = match state.line.get_group_member_ids(group_id).await {
        Ok(ids) => ids,
        Err(e) => {
            warn!(
                group = %group_id,
                error = %e,
                "member enumeration unavailable, skipping roster archive"
            );
            return Ok(());
        }
    };

    let collection = collections::group_profiles(group_id);
    for member_id in &member_ids {
        let profile = state
            .line
            .get_group_member_profile(group_id, member_id)
            .await?;
        state
            .store
            .lock()
            .await
            .save_profile_if_absent(&collection, member_id, &profile)?;
    }

    info!(group = %group_id, members = member_ids.len(), "archived group roster");
    Ok(())
}

/// Users joined a group the bot is in: archive their profiles.
async fn on_member_joined(state: &AppState, event: &MemberJoinedEvent) -> Result<(), ServerError> {
    let EventSource::Group { group_id, .. } = &event.source else {
        return Ok(());
    };

    let collection = collections::group_profiles(group_id);
    for member in &event.joined.members {
        let profile = state
            .line
            .get_group_member_profile(group_id, &member.user_id)
            .await?;
        state
            .store
            .lock()
            .await
            .save_profile_if_absent(&collection, &member.user_id, &profile)?;

        info!(group = %group_id, user = %member.user_id, "archived joined member profile");
    }
    Ok(())
}

/// Users left a group: apply the configured departure policy.
async fn on_member_left(state: &AppState, event: &MemberLeftEvent) -> Result<(), ServerError> {
    let EventSource::Group { group_id, .. } = &event.source else {
        return Ok(());
    };

    let collection = collections::group_profiles(group_id);
    let policy = state.config.left_member_policy;
    for member in &event.left.members {
        state
            .store
            .lock()
            .await
            .mark_member_left(&collection, &member.user_id, policy)?;

        info!(group = %group_id, user = %member.user_id, ?policy, "processed member departure");
    }
    Ok(())
}

/// A message arrived: acknowledge, normalize, archive media and record,
/// and keep the sender's profile current.
async fn on_message(state: &AppState, event: &MessageEvent) -> Result<(), ServerError> {
    state.line.reply(&event.reply_token, MESSAGE_ACK_TEXT).await?;

    let mut record = normalize::merged_record(event)?;

    if let Some(ext) = event.message.media_extension() {
        let file_url = archive_media(state, event, &ext).await?;
        record.insert("fileURL".to_string(), Value::String(file_url));
    }

    let scope_key = event.source.scope_key();
    let text = event.message.text.as_deref().unwrap_or("");

    if state.config.case_tagging {
        if let Some(case) = normalize::parse_case_start(text) {
            record.insert(
                "publisher".to_string(),
                Value::String(case.publisher.to_string()),
            );
            state
                .store
                .lock()
                .await
                .set_active_case(&scope_key, case.case_name)?;
        }

        // The marker message itself already carries the case it opened.
        if let Some(case_name) = state.store.lock().await.active_case(&scope_key)? {
            record.insert("case_name".to_string(), Value::String(case_name));
        }
    }

    let (message_collection, profile_collection) = scope_collections(&event.source);

    state
        .store
        .lock()
        .await
        .upsert(&message_collection, &event.message.id, &Value::Object(record))?;

    info!(
        collection = %message_collection,
        message = %event.message.id,
        kind = event.message.kind.as_str(),
        "archived message"
    );

    if let Some(user_id) = event.source.sender_id() {
        let already_known = state
            .store
            .lock()
            .await
            .profile_exists(&profile_collection, user_id)?;
        if !already_known {
            let profile = fetch_scoped_profile(state, &event.source, user_id).await?;
            state
                .store
                .lock()
                .await
                .save_profile_if_absent(&profile_collection, user_id, &profile)?;

            info!(collection = %profile_collection, user = %user_id, "archived first-contact profile");
        }

        if state.config.case_tagging {
            if let Some(intro) = normalize::parse_self_intro(text) {
                state
                    .store
                    .lock()
                    .await
                    .enrich_profile(&profile_collection, user_id, &intro)?;

                info!(collection = %profile_collection, user = %user_id, "applied self-introduction");
            }
        }
    }

    Ok(())
}

/// Message and profile collection names for an event's scope.
fn scope_collections(source: &EventSource) -> (String, String) {
    match source {
        EventSource::User { user_id } => (
            collections::user_messages(user_id),
            collections::USER_PROFILES.to_string(),
        ),
        EventSource::Group { group_id, .. } => (
            collections::group_messages(group_id),
            collections::group_profiles(group_id),
        ),
        EventSource::Room { room_id, .. } => (
            collections::room_messages(room_id),
            collections::room_profiles(room_id),
        ),
    }
}

/// Fetch the sender's profile through the API matching the event scope.
async fn fetch_scoped_profile(
    state: &AppState,
    source: &EventSource,
    user_id: &str,
) -> Result<Value, ServerError> {
    let profile = match source {
        EventSource::User { .. } => state.line.get_profile(user_id).await?,
        EventSource::Group { group_id, .. } => {
            state.line.get_group_member_profile(group_id, user_id).await?
        }
        EventSource::Room { room_id, .. } => {
            state.line.get_room_member_profile(room_id, user_id).await?
        }
    };
    Ok(profile)
}

/// Download message content and hand it to the media store.
///
/// The spool file is unique per request and removed on drop, so neither
/// concurrent messages nor failures leave anything behind.
async fn archive_media(
    state: &AppState,
    event: &MessageEvent,
    ext: &str,
) -> Result<String, ServerError> {
    let content = state.line.get_message_content(&event.message.id).await?;

    let spool = tempfile::NamedTempFile::new()
        .map_err(|e| ServerError::MediaStorage(format!("Failed to create spool file: {e}")))?;
    tokio::fs::write(spool.path(), &content)
        .await
        .map_err(|e| ServerError::MediaStorage(format!("Failed to write spool file: {e}")))?;

    let object_path = MediaStore::object_path(
        event.timestamp,
        &event.message.id,
        event.message.kind.as_str(),
        ext,
    );
    let file_url = state.media.store(&object_path, spool.path()).await?;

    info!(message = %event.message.id, path = %object_path, "archived media content");
    Ok(file_url)
}
