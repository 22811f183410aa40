//! Collection naming conventions for the archive.
//!
//! Profiles live in `UserID-*` collections, messages in `Message-*`
//! collections, one pair per conversation scope.

/// Profiles of users who friended the bot directly.
pub const USER_PROFILES: &str = "UserID-user";

/// Per-conversation active-case markers.
pub const CASE_MARKERS: &str = "CaseMarker";

/// Profiles of a group's members.
pub fn group_profiles(group_id: &str) -> String {
    format!("UserID-group-{group_id}")
}

/// Profiles of a room's members.
pub fn room_profiles(room_id: &str) -> String {
    format!("UserID-room-{room_id}")
}

/// Messages of a 1:1 conversation.
pub fn user_messages(user_id: &str) -> String {
    format!("Message-user-{user_id}")
}

/// Messages of a group conversation.
pub fn group_messages(group_id: &str) -> String {
    format!("Message-group-{group_id}")
}

/// Messages of a room conversation.
pub fn room_messages(room_id: &str) -> String {
    format!("Message-room-{room_id}")
}
