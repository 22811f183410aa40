//! Profile document helpers.
//!
//! Profiles are written once on first contact and only ever supplemented
//! afterwards: the self-introduction command enriches an existing document,
//! and membership departures flip its status (or remove it, under the hard
//! policy).

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// What to do with a member's profile document when they leave a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeftMemberPolicy {
    /// Keep the document and patch `{"status": "left"}` into it.
    #[default]
    Soft,
    /// Delete the document outright.
    Hard,
}

impl FromStr for LeftMemberPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "soft" => Ok(LeftMemberPolicy::Soft),
            "hard" => Ok(LeftMemberPolicy::Hard),
            other => Err(StoreError::InvalidPolicy(other.to_string())),
        }
    }
}

/// Fields parsed from a self-introduction command message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIntroduction {
    pub real_name: String,
    pub job_title: String,
    pub organization: String,
    pub email: String,
}

impl Database {
    /// Whether a profile document exists for `user_id`.
    pub fn profile_exists(&self, collection: &str, user_id: &str) -> Result<bool> {
        self.exists(collection, user_id)
    }

    /// First-write-wins profile creation.
    ///
    /// Returns `true` when the profile was written, `false` when a document
    /// already existed (and was left untouched, preserving any enrichment).
    pub fn save_profile_if_absent(
        &self,
        collection: &str,
        user_id: &str,
        profile: &Value,
    ) -> Result<bool> {
        if self.exists(collection, user_id)? {
            return Ok(false);
        }
        self.upsert(collection, user_id, profile)?;
        Ok(true)
    }

    /// Apply self-introduction fields to an existing profile document,
    /// stamped with the current time.
    pub fn enrich_profile(
        &self,
        collection: &str,
        user_id: &str,
        intro: &SelfIntroduction,
    ) -> Result<()> {
        self.patch(
            collection,
            user_id,
            &json!({
                "add_timestamp": Utc::now().timestamp(),
                "real_name": intro.real_name,
                "job_title": intro.job_title,
                "organization": intro.organization,
                "email": intro.email,
            }),
        )
    }

    /// Apply the configured departure policy to a member's profile.
    pub fn mark_member_left(
        &self,
        collection: &str,
        user_id: &str,
        policy: LeftMemberPolicy,
    ) -> Result<()> {
        match policy {
            LeftMemberPolicy::Soft => self.patch(collection, user_id, &json!({"status": "left"})),
            LeftMemberPolicy::Hard => {
                self.delete(collection, user_id)?;
                Ok(())
            }
        }
    }
}
