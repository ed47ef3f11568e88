//! Minimal read-only Gmail client: refresh an access token, search, fetch one attachment.

use std::time::Duration;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use log::{debug, warn};
use serde::Deserialize;

use super::FeedError;

/// Gmail hands out base64url, sometimes padded and sometimes not.
const ATTACHMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    credentials: OAuthCredentials,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    #[serde(default)]
    pub attachment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentBody {
    data: String,
}

/// A downloadable attachment found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub attachment_id: String,
}

impl Message {
    /// Every part carrying an attachment, nested multiparts included.
    pub fn attachments(&self) -> Vec<AttachmentRef> {
        fn walk(part: &MessagePart, out: &mut Vec<AttachmentRef>) {
            let id = part.body.as_ref().and_then(|b| b.attachment_id.clone());
            if let (Some(filename), Some(attachment_id)) = (part.filename.clone(), id) {
                if !filename.is_empty() {
                    out.push(AttachmentRef {
                        filename,
                        attachment_id,
                    });
                }
            }
            part.parts.iter().for_each(|p| walk(p, out));
        }
        let mut out = Vec::new();
        if let Some(payload) = &self.payload {
            walk(payload, &mut out);
        }
        out
    }
}

impl GmailClient {
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        credentials: OAuthCredentials,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Gmail client built without a timeout: {}", e);
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into(),
            token_url: token_url.into(),
            credentials,
        }
    }

    fn api(&self, path: &str) -> String {
        format!(
            "{}/gmail/v1/users/me/{}",
            self.base_url.trim_end_matches('/'),
            path
        )
    }

    /// Exchanges the stored refresh token for a short lived access token.
    pub async fn access_token(&self) -> Result<String, FeedError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Auth(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FeedError::Auth(format!(
                "token endpoint answered {}",
                response.status().as_u16()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Auth(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
        url: &str,
        query: &[(&str, &str)],
        endpoint: &'static str,
    ) -> Result<T, FeedError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|source| FeedError::Http { endpoint, source })?;
        if !response.status().is_success() {
            return Err(FeedError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        response
            .json()
            .await
            .map_err(|source| FeedError::Http { endpoint, source })
    }

    /// Ids of messages matching a Gmail search query, newest first.
    pub async fn search(&self, token: &str, query: &str) -> Result<Vec<String>, FeedError> {
        debug!("Searching mailbox: {}", query);
        let list: MessageList = self
            .get_json(token, &self.api("messages"), &[("q", query)], "gmail search")
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    pub async fn message(&self, token: &str, id: &str) -> Result<Message, FeedError> {
        self.get_json(token, &self.api(&format!("messages/{id}")), &[], "gmail message")
            .await
    }

    pub async fn attachment(
        &self,
        token: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, FeedError> {
        let body: AttachmentBody = self
            .get_json(
                token,
                &self.api(&format!("messages/{message_id}/attachments/{attachment_id}")),
                &[],
                "gmail attachment",
            )
            .await?;
        Ok(ATTACHMENT_ENGINE.decode(body.data.trim())?)
    }
}
