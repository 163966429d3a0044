use std::time::Duration;

use macrocoach_core::chat::{ChatReply, ChatTurnRequest};
use macrocoach_core::error::{ChatError, ChatErrorBody, SessionError};
use macrocoach_core::profile::UserProfile;
use url::Url;

use crate::chat::ChatBackend;
use crate::profile::ProfileApi;

/// HTTP client for the profile and chat endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// `timeout` bounds every request, connect to last byte.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, String> {
        let base_url = Url::parse(api_url).map_err(|e| format!("Invalid API URL '{api_url}': {e}"))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("Invalid API URL '{api_url}': not a base URL"));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{path}", self.base_url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url
    }
}

impl ProfileApi for ApiClient {
    async fn fetch_profile(&self, user_id: i64) -> Result<UserProfile, SessionError> {
        let mut url = self.endpoint("/api/profile");
        url.query_pairs_mut()
            .append_pair("id", &user_id.to_string());

        let resp = self.http.get(url).send().await.map_err(|e| {
            tracing::warn!(user_id, error = %e, "profile request failed");
            SessionError::ProfileNotFound { user_id }
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(user_id, status = %status, "profile request returned non-success status");
            return Err(SessionError::ProfileNotFound { user_id });
        }

        let body = resp.bytes().await.map_err(|e| {
            tracing::warn!(user_id, error = %e, "profile body could not be read");
            SessionError::ProfileNotFound { user_id }
        })?;
        serde_json::from_slice::<UserProfile>(&body).map_err(|e| SessionError::ProfileMalformed {
            user_id,
            reason: e.to_string(),
        })
    }
}

impl ChatBackend for ApiClient {
    async fn send_turn(&self, request: ChatTurnRequest) -> Result<ChatReply, ChatError> {
        let resp = self
            .http
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<ChatReply>()
                .await
                .map_err(|e| ChatError::Transport(format!("unreadable reply: {e}")));
        }

        let body = resp
            .json::<ChatErrorBody>()
            .await
            .map_err(|e| ChatError::Transport(format!("{status} with unreadable body: {e}")))?;
        Err(ChatError::Server(body.error))
    }
}
