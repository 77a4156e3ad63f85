//! Chat session state machine.
//!
//! Owns the message list, the current conversation identity, the streaming
//! buffer, and the single live stream handle. UI code calls the operations
//! here; network I/O goes through [`ApiClient`] and stream events are folded
//! back into this state.
//!
//! Lifecycle of an assistant turn: `idle` -> awaiting response (typing, with
//! the streaming buffer accumulating chunks) -> `idle` again once the turn is
//! finalized. Finalization is idempotent and appends the trimmed buffer as an
//! assistant message only when it is non-empty.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::api::chat::RawHistoryMessage;
use crate::api::{ApiClient, ChatStream, ChatStreamEvent, Conversation};
use crate::config::{Settings, SettingsPatch};
use crate::timestamp::parse_timestamp;
use crate::util;

/// Title shown when the backend has none for a conversation.
pub const UNTITLED_CONVERSATION: &str = "Untitled conversation";

/// How long the transient connection-error flag stays raised.
const CONNECTION_ERROR_TTL: Duration = Duration::from_secs(5);

/// One entry in the visible transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, true)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(content, false)
    }

    fn new(content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            is_user,
            timestamp: Local::now(),
        }
    }
}

/// Derived backend connectivity, shown in the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    #[default]
    Unknown,
}

impl ConnectionStatus {
    /// Display string for the status line.
    pub fn text(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "connection lost",
            ConnectionStatus::Unknown => "connection status unknown",
        }
    }
}

/// State machine for one chat session.
pub struct ChatSession {
    client: ApiClient,
    settings: Settings,
    settings_path: PathBuf,

    messages: Vec<Message>,
    current_conversation_id: Option<String>,
    current_conversation_title: String,

    typing: bool,
    streaming: bool,
    /// Accumulator for the in-flight assistant reply.
    pending_reply: String,
    /// The single live stream handle; closed before being replaced.
    stream: Option<ChatStream>,

    /// When the transient connection-error flag was raised, if at all.
    connection_error_at: Option<Instant>,
    loading_messages: bool,
    status: ConnectionStatus,
}

impl ChatSession {
    pub fn new(client: ApiClient, settings: Settings, settings_path: PathBuf) -> Self {
        Self {
            client,
            settings,
            settings_path,
            messages: Vec::new(),
            current_conversation_id: None,
            current_conversation_title: String::new(),
            typing: false,
            streaming: false,
            pending_reply: String::new(),
            stream: None,
            connection_error_at: None,
            loading_messages: false,
            status: ConnectionStatus::Unknown,
        }
    }

    /// Appends the user's message and starts the assistant turn.
    pub async fn send_message(&mut self, text: &str) {
        self.messages.push(Message::user(text));
        self.start_assistant_turn(text).await;
    }

    /// Opens a new assistant turn for `user_text`.
    ///
    /// Closes any previous stream handle first, so at most one connection is
    /// live at any instant. Generates a local conversation ID when none is
    /// selected. Only the streaming branch opens a connection; with stream
    /// mode off the turn has nothing to fold and finalizes empty.
    pub async fn start_assistant_turn(&mut self, user_text: &str) {
        self.typing = true;
        self.streaming = self.settings.stream_mode;
        self.pending_reply.clear();
        self.connection_error_at = None;

        if let Some(mut previous) = self.stream.take() {
            previous.close();
        }

        let conversation_id = self
            .current_conversation_id
            .get_or_insert_with(util::new_conversation_id)
            .clone();
        tracing::debug!(conversation = %conversation_id, "assistant turn opened");

        if self.settings.stream_mode {
            match self
                .client
                .stream_chat(&conversation_id, user_text, &self.settings.user_id)
                .await
            {
                Ok(stream) => self.stream = Some(stream),
                // Open failures surface exactly like a mid-stream error.
                Err(e) => {
                    tracing::error!(error = %e, "failed to open assistant stream");
                    self.stream_error();
                }
            }
        }
    }

    /// Waits for the next event on the live stream, if any.
    pub async fn next_stream_event(&mut self) -> Option<ChatStreamEvent> {
        let stream = self.stream.as_mut()?;
        Some(stream.next_event().await)
    }

    /// Folds one stream event into the session.
    ///
    /// Returns `true` while the turn is still open.
    pub fn on_stream_event(&mut self, event: ChatStreamEvent) -> bool {
        match event {
            ChatStreamEvent::Chunk(text) => {
                self.apply_chunk(&text);
                true
            }
            ChatStreamEvent::Error(message) => {
                tracing::error!(error = %message, "assistant stream failed");
                self.stream_error();
                false
            }
            ChatStreamEvent::Closed => {
                self.finish_turn();
                false
            }
        }
    }

    /// Appends reply text to the streaming buffer.
    pub fn apply_chunk(&mut self, text: &str) {
        self.pending_reply.push_str(text);
    }

    /// Handles an abnormal stream end: finalizes the turn, marks the backend
    /// disconnected, and raises the transient error flag. The flag expires
    /// after a few seconds unless a later turn clears it sooner.
    pub fn stream_error(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        self.finish_turn();
        self.connection_error_at = Some(Instant::now());
    }

    /// Finalizes the assistant turn. Idempotent.
    ///
    /// The trimmed buffer becomes an assistant message only when non-empty;
    /// flags and buffer are reset and the stream handle is released.
    pub fn finish_turn(&mut self) {
        self.streaming = false;

        let reply = self.pending_reply.trim();
        if !reply.is_empty() {
            self.messages.push(Message::assistant(reply));
        }

        self.typing = false;
        self.pending_reply.clear();
        self.connection_error_at = None;

        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }

    /// Switches to another conversation, or resets with `None`.
    ///
    /// The message list is cleared before history loads; a history response
    /// for a conversation that is no longer current is discarded.
    pub async fn select_conversation(&mut self, conversation: Option<Conversation>) {
        let Some(conversation) = conversation else {
            self.current_conversation_id = None;
            self.current_conversation_title.clear();
            self.messages.clear();
            return;
        };

        if conversation.conversation_id.is_empty() {
            return;
        }

        self.current_conversation_id = Some(conversation.conversation_id.clone());
        self.current_conversation_title = if conversation.title.is_empty() {
            UNTITLED_CONVERSATION.to_string()
        } else {
            conversation.title
        };
        self.messages.clear();

        let conversation_id = conversation.conversation_id;
        self.load_history(&conversation_id).await;
    }

    /// Loads the history for `conversation_id` and applies it if that
    /// conversation is still the current one. Failures are logged, never
    /// propagated; the loading flag clears on every path.
    pub async fn load_history(&mut self, conversation_id: &str) {
        if conversation_id.is_empty() {
            return;
        }

        self.loading_messages = true;
        match self
            .client
            .conversation_messages(conversation_id, &self.settings.user_id)
            .await
        {
            Ok(response) => {
                let mapped = map_history(conversation_id, response.messages);
                tracing::debug!(conversation = %conversation_id, count = mapped.len(), "history loaded");
                self.apply_history(conversation_id, mapped);
            }
            Err(e) => tracing::error!(error = %e, "failed to load conversation history"),
        }
        self.loading_messages = false;
    }

    /// Applies a loaded history only if its conversation is still current.
    pub fn apply_history(&mut self, conversation_id: &str, messages: Vec<Message>) {
        if self.current_conversation_id.as_deref() == Some(conversation_id) {
            self.messages = messages;
        }
    }

    /// Merges a partial settings update and persists the merged object.
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<()> {
        self.settings.apply(patch);
        self.settings.save_to(&self.settings_path)
    }

    /// Adopts an explicit status, or probes the backend to derive one.
    /// Never fails; an unreachable backend reads as disconnected.
    pub async fn refresh_connection_status(&mut self, explicit: Option<ConnectionStatus>) {
        self.status = match explicit {
            Some(status) => status,
            None => {
                if self.client.check_health().await {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Disconnected
                }
            }
        };
    }

    /// Whether the transient connection-error flag is currently raised.
    pub fn connection_error(&self) -> bool {
        self.connection_error_at
            .is_some_and(|at| at.elapsed() < CONNECTION_ERROR_TTL)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn current_conversation_id(&self) -> Option<&str> {
        self.current_conversation_id.as_deref()
    }

    pub fn current_conversation_title(&self) -> &str {
        &self.current_conversation_title
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn pending_reply(&self) -> &str {
        &self.pending_reply
    }

    pub fn is_loading_messages(&self) -> bool {
        self.loading_messages
    }

    pub fn has_active_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn status_text(&self) -> &'static str {
        self.status.text()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

/// Maps raw history records into transcript messages.
///
/// Missing IDs are synthesized from the conversation ID, missing content
/// becomes empty, and timestamps follow the lenient parsing contract.
fn map_history(conversation_id: &str, raw: Vec<RawHistoryMessage>) -> Vec<Message> {
    raw.into_iter()
        .map(|record| Message {
            id: record
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("{}-{}", conversation_id, Uuid::new_v4())),
            content: record.content.unwrap_or_default(),
            is_user: record.is_user,
            timestamp: parse_timestamp(record.timestamp.as_ref()),
        })
        .collect()
}
