//! Conversation CRUD endpoints. All envelope-wrapped.

use anyhow::Result;
use serde::Deserialize;

use super::{ApiClient, Envelope};

/// A persisted chat thread as listed by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub conversation_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationResponse {
    pub conversation_id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationListResponse {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

impl ApiClient {
    /// Creates a new conversation for the user.
    pub async fn create_conversation(
        &self,
        user_id: &str,
        title: &str,
    ) -> Result<Envelope<CreateConversationResponse>> {
        let request = self
            .http()
            .post(self.url("/ai/conversation"))
            .json(&serde_json::json!({ "userId": user_id, "title": title }));
        self.fetch_enveloped(request, "create conversation").await
    }

    /// Lists the user's conversations, newest first, paginated.
    pub async fn list_conversations(
        &self,
        user_id: &str,
        page: u32,
        size: u32,
    ) -> Result<Envelope<ConversationListResponse>> {
        let request = self.http().get(self.url("/ai/conversations")).query(&[
            ("userId", user_id),
            ("page", &page.to_string()),
            ("size", &size.to_string()),
        ]);
        self.fetch_enveloped(request, "list conversations").await
    }

    /// Deletes a conversation (soft delete on the server).
    pub async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Envelope<bool>> {
        let request = self
            .http()
            .delete(self.url(&format!("/ai/conversation/{}", conversation_id)))
            .query(&[("userId", user_id)]);
        self.fetch_enveloped(request, "delete conversation").await
    }

    /// Renames a conversation.
    pub async fn rename_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<Envelope<bool>> {
        let request = self
            .http()
            .put(self.url(&format!("/ai/conversation/{}", conversation_id)))
            .query(&[("userId", user_id)])
            .json(&serde_json::json!({ "title": title }));
        self.fetch_enveloped(request, "rename conversation").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_decodes_camel_case() {
        let conv: Conversation = serde_json::from_str(
            r#"{"conversationId":"c1","title":"Notes","createTime":"2024-03-05T09:30:00"}"#,
        )
        .unwrap();
        assert_eq!(conv.conversation_id, "c1");
        assert_eq!(conv.title, "Notes");
        assert_eq!(conv.create_time.as_deref(), Some("2024-03-05T09:30:00"));
    }

    #[test]
    fn test_conversation_title_defaults_empty() {
        let conv: Conversation = serde_json::from_str(r#"{"conversationId":"c2"}"#).unwrap();
        assert!(conv.title.is_empty());
        assert!(conv.create_time.is_none());
    }

    #[test]
    fn test_list_response_tolerates_missing_list() {
        let list: ConversationListResponse = serde_json::from_str("{}").unwrap();
        assert!(list.conversations.is_empty());
    }
}
