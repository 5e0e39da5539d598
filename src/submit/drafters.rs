//! Contest-service entry endpoint.
//!
//! The real `EntrySubmitter`: JSON POST of the entry payload with the
//! same browser user agent and auth header the props feed uses. Every
//! failure mode on the wire — connect error, non-2xx, unparseable body —
//! is a `ProplineError::Transport`; whether the service *accepted* the
//! entry is the driver's call, made from the parsed response.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::submit::{EntryPayload, EntryResponse, EntrySubmitter};
use crate::types::ProplineError;

const ENTRY_URL: &str = "https://node.drafters.com/props-game/join-props-game";

/// HTTP client for placing contest entries.
pub struct DraftersClient {
    http: Client,
    auth_token: String,
}

impl DraftersClient {
    pub fn new(auth_token: String) -> Result<Self, ProplineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
            )
            .build()
            .map_err(|e| ProplineError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, auth_token })
    }
}

#[async_trait::async_trait]
impl EntrySubmitter for DraftersClient {
    async fn submit_entry(&self, payload: &EntryPayload) -> Result<EntryResponse, ProplineError> {
        let resp = self
            .http
            .post(ENTRY_URL)
            .header("Authorization", &self.auth_token)
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| ProplineError::Transport(format!("Entry request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ProplineError::Transport(format!("Failed to read entry response: {e}")))?;

        if !status.is_success() {
            return Err(ProplineError::Transport(format!(
                "Entry API error {status}: {body}"
            )));
        }

        debug!(%status, body = %body, "Entry response received");

        serde_json::from_str::<EntryResponse>(&body).map_err(|e| {
            ProplineError::Transport(format!("Failed to parse entry response: {e} ({body})"))
        })
    }
}
