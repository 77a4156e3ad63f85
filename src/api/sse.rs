//! Streaming transport for assistant replies.
//!
//! Wraps the SSE byte stream from `GET /ai/chat` into a typed event stream
//! with three variants: chunk, error, closed. The handle supports explicit
//! close, which suppresses all further events; stream end without a transport
//! error is a normal close, not an error.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};

/// One event on an open chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    /// Incremental reply text.
    Chunk(String),
    /// Abnormal termination; the stream is dead after this.
    Error(String),
    /// Normal end of the reply.
    Closed,
}

/// Handle to one live streaming connection.
///
/// At most one of these exists per chat session; the session closes the old
/// handle before opening a new one.
pub struct ChatStream {
    events: Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>,
    done: bool,
}

impl ChatStream {
    /// Builds a handle over an already-typed event stream.
    ///
    /// Used by tests to script exact delivery sequences.
    pub fn new<S>(events: S) -> Self
    where
        S: Stream<Item = ChatStreamEvent> + Send + 'static,
    {
        Self {
            events: Box::pin(events),
            done: false,
        }
    }

    /// Builds a handle over a raw SSE byte stream.
    pub(crate) fn from_bytes<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = Result<bytes::Bytes, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let events = bytes.eventsource().filter_map(|item| {
            futures_util::future::ready(match item {
                Ok(event) if event.event == "close" => Some(ChatStreamEvent::Closed),
                Ok(event) if event.data.trim().is_empty() => None,
                Ok(event) => Some(ChatStreamEvent::Chunk(event.data)),
                Err(e) => Some(ChatStreamEvent::Error(format!("SSE stream error: {}", e))),
            })
        });
        Self::new(events)
    }

    /// Waits for the next event. Terminal events (error, closed) latch: after
    /// one is delivered, or after [`close`](Self::close), every further call
    /// returns `Closed` without touching the transport.
    pub async fn next_event(&mut self) -> ChatStreamEvent {
        if self.done {
            return ChatStreamEvent::Closed;
        }

        match self.events.next().await {
            Some(ChatStreamEvent::Chunk(text)) => ChatStreamEvent::Chunk(text),
            Some(ChatStreamEvent::Error(message)) => {
                self.done = true;
                ChatStreamEvent::Error(message)
            }
            Some(ChatStreamEvent::Closed) | None => {
                self.done = true;
                ChatStreamEvent::Closed
            }
        }
    }

    /// Closes the handle; further events have no effect.
    pub fn close(&mut self) {
        self.done = true;
    }

    pub fn is_closed(&self) -> bool {
        self.done
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").field("done", &self.done).finish()
    }
}
