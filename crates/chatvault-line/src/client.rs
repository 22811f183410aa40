//! Typed client for the outbound Messaging API calls the bot consumes.
//!
//! The API and content-download bases are injectable so tests (and regional
//! gateways) can point the client at a different host.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::LineError;

/// Default Messaging API base.
pub const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Default base for message content downloads.
pub const DEFAULT_DATA_BASE: &str = "https://api-data.line.me";

/// Client for the LINE Messaging API.
#[derive(Debug, Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base: String,
    data_base: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberIdsPage {
    member_ids: Vec<String>,
    #[serde(default)]
    next: Option<String>,
}

impl LineClient {
    /// Client against the production LINE endpoints.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_bases(access_token, DEFAULT_API_BASE, DEFAULT_DATA_BASE)
    }

    /// Client against custom endpoint bases.
    pub fn with_bases(
        access_token: impl Into<String>,
        api_base: impl Into<String>,
        data_base: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            data_base: data_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Send a text reply to the conversation that issued `reply_token`.
    pub async fn reply(&self, reply_token: &str, text: &str) -> Result<(), LineError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let body = json!({
            "replyToken": reply_token,
            "messages": [{"type": "text", "text": text}],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        debug!(reply_token = %reply_token, "sent reply");
        Ok(())
    }

    /// Profile of a user who friended the bot, as raw JSON.
    pub async fn get_profile(&self, user_id: &str) -> Result<Value, LineError> {
        self.get(format!("{}/v2/bot/profile/{user_id}", self.api_base))
            .await
    }

    /// Group-scoped profile of a member.
    pub async fn get_group_member_profile(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<Value, LineError> {
        self.get(format!(
            "{}/v2/bot/group/{group_id}/member/{user_id}",
            self.api_base
        ))
        .await
    }

    /// Room-scoped profile of a member.
    pub async fn get_room_member_profile(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Value, LineError> {
        self.get(format!(
            "{}/v2/bot/room/{room_id}/member/{user_id}",
            self.api_base
        ))
        .await
    }

    /// Enumerate all member ids of a group, following pagination.
    ///
    /// The platform restricts this endpoint to verified/premium bot
    /// accounts; other tiers receive an API error the caller should treat
    /// as a soft condition.
    pub async fn get_group_member_ids(&self, group_id: &str) -> Result<Vec<String>, LineError> {
        let mut ids = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let mut url = format!("{}/v2/bot/group/{group_id}/members/ids", self.api_base);
            if let Some(token) = &start {
                url.push_str("?start=");
                url.push_str(token);
            }

            let page: MemberIdsPage = self.get(url).await?;
            ids.extend(page.member_ids);

            match page.next {
                Some(token) => start = Some(token),
                None => break,
            }
        }

        debug!(group = %group_id, count = ids.len(), "enumerated group members");
        Ok(ids)
    }

    /// Download the binary content attached to a message.
    pub async fn get_message_content(&self, message_id: &str) -> Result<Bytes, LineError> {
        let url = format!("{}/v2/bot/message/{message_id}/content", self.data_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;

        Ok(response.bytes().await?)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T, LineError> {
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Turn a non-success response into [`LineError::Api`], keeping the
    /// platform's error body for logging.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, LineError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(LineError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        replies: Arc<Mutex<Vec<Value>>>,
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn mock_router(captured: Captured) -> Router {
        #[derive(serde::Deserialize)]
        struct PageQuery {
            start: Option<String>,
        }

        Router::new()
            .route(
                "/v2/bot/message/reply",
                post(|State(c): State<Captured>, Json(body): Json<Value>| async move {
                    c.replies.lock().unwrap().push(body);
                    Json(serde_json::json!({}))
                }),
            )
            .route(
                "/v2/bot/profile/:user_id",
                get(|Path(user_id): Path<String>| async move {
                    Json(serde_json::json!({
                        "userId": user_id,
                        "displayName": "Alice",
                        "pictureUrl": "https://example.com/a.png",
                    }))
                }),
            )
            .route(
                "/v2/bot/group/:group_id/members/ids",
                get(|Query(q): Query<PageQuery>| async move {
                    match q.start.as_deref() {
                        None => Json(serde_json::json!({"memberIds": ["ua", "ub"], "next": "t2"})),
                        Some("t2") => Json(serde_json::json!({"memberIds": ["uc"]})),
                        Some(other) => panic!("unexpected page token {other}"),
                    }
                }),
            )
            .route(
                "/v2/bot/message/:id/content",
                get(|| async { (StatusCode::OK, vec![1u8, 2, 3, 4]) }),
            )
            .route(
                "/v2/bot/room/:room_id/member/:user_id",
                get(|| async {
                    (
                        StatusCode::FORBIDDEN,
                        Json(serde_json::json!({
                            "message": "Access denied",
                            "details": [{"property": "roomId", "message": "not joined"}],
                        })),
                    )
                }),
            )
            .with_state(captured)
    }

    async fn test_client(captured: Captured) -> LineClient {
        let base = spawn(mock_router(captured)).await;
        LineClient::with_bases("test-token", base.clone(), base)
    }

    #[tokio::test]
    async fn reply_posts_token_and_text() {
        let captured = Captured::default();
        let client = test_client(captured.clone()).await;

        client.reply("rt-1", "hello").await.unwrap();

        let replies = captured.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["replyToken"], "rt-1");
        assert_eq!(replies[0]["messages"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn profile_returns_raw_json() {
        let client = test_client(Captured::default()).await;
        let profile = client.get_profile("u1").await.unwrap();
        assert_eq!(profile["userId"], "u1");
        assert_eq!(profile["displayName"], "Alice");
    }

    #[tokio::test]
    async fn member_ids_follow_pagination() {
        let client = test_client(Captured::default()).await;
        let ids = client.get_group_member_ids("g1").await.unwrap();
        assert_eq!(ids, ["ua", "ub", "uc"]);
    }

    #[tokio::test]
    async fn message_content_downloads_bytes() {
        let client = test_client(Captured::default()).await;
        let bytes = client.get_message_content("m1").await.unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn api_rejection_carries_status_and_detail() {
        let client = test_client(Captured::default()).await;
        let err = client.get_room_member_profile("r1", "u1").await.unwrap_err();

        let LineError::Api { status, .. } = &err else {
            panic!("expected an API error, got {err}");
        };
        assert_eq!(*status, 403);

        let detail = err.api_detail().unwrap();
        assert_eq!(detail.message, "Access denied");
        assert_eq!(detail.details[0].property.as_deref(), Some("roomId"));
    }
}
