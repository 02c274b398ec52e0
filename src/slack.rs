use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use crate::error::SlackError;
use crate::models::ChannelSummary;

pub const SLACK_API_BASE: &str = "https://slack.com/api";

// 20 pages x 200 channels is plenty for a single workspace
const MAX_CHANNEL_PAGES: usize = 20;
const CHANNEL_PAGE_SIZE: u32 = 200;

/// Messaging backend seen by the reply pipeline and the HTTP layer.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError>;
    async fn list_channels(&self) -> Result<Vec<ChannelSummary>, SlackError>;
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ConversationsListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<ChannelSummary>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

// Slack Web API client authenticated with the bot token
#[derive(Clone)]
pub struct SlackClient {
    http: HttpClient,
    api_base: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(http: HttpClient, api_base: &str, bot_token: String) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }
}

#[async_trait]
impl Messenger for SlackClient {
    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackError> {
        let body: ApiResponse = self
            .http
            .post(self.url("chat.postMessage"))
            .bearer_auth(&self.bot_token)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(SlackError::Transport)?
            .json()
            .await
            .map_err(SlackError::Decode)?;

        if !body.ok {
            return Err(SlackError::Api(
                body.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSummary>, SlackError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1..=MAX_CHANNEL_PAGES {
            let mut url = format!(
                "{}?exclude_archived=true&limit={}",
                self.url("conversations.list"),
                CHANNEL_PAGE_SIZE
            );
            if let Some(next) = &cursor {
                url.push_str("&cursor=");
                url.push_str(next);
            }

            let body: ConversationsListResponse = self
                .http
                .get(url)
                .bearer_auth(&self.bot_token)
                .send()
                .await
                .map_err(SlackError::Transport)?
                .json()
                .await
                .map_err(SlackError::Decode)?;

            if !body.ok {
                return Err(SlackError::Api(
                    body.error.unwrap_or_else(|| "unknown".to_string()),
                ));
            }
            channels.extend(body.channels);

            cursor = body
                .response_metadata
                .and_then(|m| m.next_cursor)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());

            if cursor.is_none() {
                break;
            }
            if page == MAX_CHANNEL_PAGES {
                tracing::warn!(
                    pages = MAX_CHANNEL_PAGES,
                    "conversations.list reached page limit; channel list may be incomplete"
                );
            }
        }

        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversations_list_keeps_only_id_and_name() {
        let body: ConversationsListResponse = serde_json::from_str(
            r#"{
                "ok": true,
                "channels": [
                    {"id": "C1", "name": "general", "is_channel": true, "num_members": 4},
                    {"id": "C2", "name": "random"}
                ],
                "response_metadata": {"next_cursor": ""}
            }"#,
        )
        .unwrap();

        assert!(body.ok);
        assert_eq!(
            body.channels,
            vec![
                ChannelSummary { id: "C1".into(), name: "general".into() },
                ChannelSummary { id: "C2".into(), name: "random".into() },
            ]
        );
    }

    #[test]
    fn api_failure_carries_error_code() {
        let body: ApiResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!body.ok);
        assert_eq!(body.error.as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn url_joins_method_without_double_slash() {
        let client = SlackClient::new(HttpClient::new(), "https://slack.test/api/", "t".into());
        assert_eq!(client.url("chat.postMessage"), "https://slack.test/api/chat.postMessage");
    }
}
