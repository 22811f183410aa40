//! Per-conversation active-case markers.
//!
//! The marker is keyed by the conversation's scope key (`user-<id>`,
//! `group-<id>`, `room-<id>`), so concurrent conversations cannot clobber
//! each other's case assignment. A conversation with no marker simply has
//! no active case.

use chrono::Utc;
use serde_json::json;

use crate::collections::CASE_MARKERS;
use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Record `case_name` as the active case for a conversation,
    /// replacing any previous assignment.
    pub fn set_active_case(&self, scope_key: &str, case_name: &str) -> Result<()> {
        self.upsert(
            CASE_MARKERS,
            scope_key,
            &json!({
                "case_name": case_name,
                "updated_at": Utc::now().to_rfc3339(),
            }),
        )?;

        tracing::info!(scope = %scope_key, case = %case_name, "case marker updated");
        Ok(())
    }

    /// The active case for a conversation, or `None` if none was ever set.
    pub fn active_case(&self, scope_key: &str) -> Result<Option<String>> {
        match self.get(CASE_MARKERS, scope_key) {
            Ok(marker) => Ok(marker
                .get("case_name")
                .and_then(|v| v.as_str())
                .map(str::to_string)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
