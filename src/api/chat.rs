//! Chat endpoints: SSE streaming, one-shot chat, conversation history.
//!
//! Unlike the rest of the API these three return raw bodies with no
//! `{code, message, data}` envelope.

use anyhow::Result;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::sse::ChatStream;
use super::ApiClient;
use crate::timestamp::RawTimestamp;

/// One record from the conversation history endpoint.
///
/// Every field is tolerated missing; the session layer fills in defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoryMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "coerce_bool")]
    pub is_user: bool,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

/// Raw body of `GET /ai/conversation/{id}/messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationMessagesResponse {
    #[serde(default)]
    pub messages: Vec<RawHistoryMessage>,
}

/// Accepts bool, number, or string truthiness for `isUser`.
fn coerce_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) != 0.0,
        Some(Value::String(s)) => !(s.is_empty() || s == "false" || s == "0"),
        _ => false,
    })
}

impl ApiClient {
    /// Opens a streaming chat connection.
    ///
    /// Returns the handle immediately; reply text arrives as
    /// [`ChatStreamEvent`](super::ChatStreamEvent)s on the handle. No timeout
    /// is applied so the stream can stay open for the whole reply.
    ///
    /// `memoryId` duplicates the conversation ID for older backend versions.
    pub async fn stream_chat(
        &self,
        conversation_id: &str,
        message: &str,
        user_id: &str,
    ) -> Result<ChatStream> {
        let request = self
            .http()
            .get(self.url("/ai/chat"))
            .query(&[
                ("memoryId", conversation_id),
                ("conversationId", conversation_id),
                ("userId", user_id),
                ("message", message),
            ])
            .header("accept", "text/event-stream");

        let response = request.send().await.map_err(|e| {
            let err = super::ApiError::from_reqwest(&e);
            tracing::error!(error = %err, "stream chat request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = super::ApiError::http_status(status.as_u16(), &body);
            tracing::error!(error = %err, "stream chat request failed");
            return Err(err.into());
        }

        Ok(ChatStream::from_bytes(response.bytes_stream()))
    }

    /// One-shot chat without streaming. Raw, implementation-defined payload.
    pub async fn chat_sync(
        &self,
        conversation_id: &str,
        message: &str,
        user_id: &str,
    ) -> Result<Value> {
        let request = self.http().post(self.url("/ai/chat")).json(&serde_json::json!({
            "conversationId": conversation_id,
            "message": message,
            "userId": user_id,
        }));
        self.fetch_raw(request, "sync chat").await
    }

    /// Fetches the message history for a conversation.
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<ConversationMessagesResponse> {
        let request = self
            .http()
            .get(self.url(&format!("/ai/conversation/{}/messages", conversation_id)))
            .query(&[("userId", user_id)]);
        self.fetch_raw(request, "conversation history").await
    }
}
