//! Shared test fixtures: a mock Messaging API and a fully wired
//! [`AppState`] backed by an in-memory store and a temp media directory.

use std::sync::{Arc, Mutex as StdMutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use chatvault_line::LineClient;
use chatvault_store::Database;

use crate::config::ServerConfig;
use crate::media::MediaStore;
use crate::webhook::AppState;

/// Bytes served by the mock content-download endpoint.
pub const MEDIA_BYTES: &[u8] = b"\x89PNG mock media bytes";

/// Captured outbound traffic of the mock platform.
#[derive(Clone, Default)]
pub struct MockLine {
    pub replies: Arc<StdMutex<Vec<Value>>>,
}

fn mock_router(mock: MockLine) -> Router {
    Router::new()
        .route(
            "/v2/bot/message/reply",
            post(|State(m): State<MockLine>, Json(body): Json<Value>| async move {
                m.replies.lock().unwrap().push(body);
                Json(json!({}))
            }),
        )
        .route(
            "/v2/bot/profile/:user_id",
            get(|Path(user_id): Path<String>| async move {
                if user_id == "uerr" {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"message": "profile backend down"})),
                    );
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "userId": user_id,
                        "displayName": format!("user-{user_id}"),
                        "pictureUrl": "https://example.com/pic.png",
                    })),
                )
            }),
        )
        .route(
            "/v2/bot/group/:group_id/members/ids",
            get(|Path(group_id): Path<String>| async move {
                if group_id == "gdenied" {
                    return (
                        StatusCode::FORBIDDEN,
                        Json(json!({"message": "Not available for this account tier"})),
                    );
                }
                (StatusCode::OK, Json(json!({"memberIds": ["ua", "ub"]})))
            }),
        )
        .route(
            "/v2/bot/group/:group_id/member/:user_id",
            get(
                |Path((group_id, user_id)): Path<(String, String)>| async move {
                    Json(json!({
                        "userId": user_id,
                        "displayName": format!("member-{user_id}-of-{group_id}"),
                    }))
                },
            ),
        )
        .route(
            "/v2/bot/room/:room_id/member/:user_id",
            get(
                |Path((room_id, user_id)): Path<(String, String)>| async move {
                    Json(json!({
                        "userId": user_id,
                        "displayName": format!("member-{user_id}-of-{room_id}"),
                    }))
                },
            ),
        )
        .route(
            "/v2/bot/message/:id/content",
            get(|| async { MEDIA_BYTES.to_vec() }),
        )
        .with_state(mock)
}

pub struct Harness {
    pub state: AppState,
    pub mock: MockLine,
    pub media_dir: tempfile::TempDir,
}

pub async fn harness() -> Harness {
    harness_with(|_| {}).await
}

pub async fn harness_with(tweak: impl FnOnce(&mut ServerConfig)) -> Harness {
    let mock = MockLine::default();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = mock_router(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    let base = format!("http://{addr}");

    let media_dir = tempfile::TempDir::new().unwrap();

    let mut config = ServerConfig {
        channel_secret: "test-secret".to_string(),
        access_token: "test-token".to_string(),
        api_base: base.clone(),
        data_base: base,
        media_storage_path: media_dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    tweak(&mut config);

    let line = LineClient::with_bases(
        config.access_token.clone(),
        config.api_base.clone(),
        config.data_base.clone(),
    );
    let media = MediaStore::new(
        config.media_storage_path.clone(),
        config.media_bucket.clone(),
        config.media_public_base_url.clone(),
    )
    .await
    .unwrap();
    let store = Database::open_in_memory().unwrap();

    let state = AppState {
        config: Arc::new(config),
        line: Arc::new(line),
        store: Arc::new(Mutex::new(store)),
        media: Arc::new(media),
    };

    Harness {
        state,
        mock,
        media_dir,
    }
}
