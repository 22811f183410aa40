//! # chatvault-store
//!
//! Persistence layer for chatvault, backed by SQLite.
//!
//! The store models the archive as schemaless JSON documents grouped into
//! named collections, mirroring the layout conventions of the hosted
//! document database it stands in for (`UserID-user`, `Message-group-<id>`,
//! ...). The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection` plus typed helpers for profiles and per-
//! conversation case markers.

pub mod cases;
pub mod collections;
pub mod database;
pub mod documents;
pub mod migrations;
pub mod profiles;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use profiles::{LeftMemberPolicy, SelfIntroduction};
