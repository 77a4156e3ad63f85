//! Interactive chat loop.
//!
//! Provides a REPL-style interface over a [`ChatSession`]. Assistant replies
//! are streamed token-by-token; a small set of `:` commands drives the
//! auxiliary panels and settings.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::api::ChatStreamEvent;
use crate::config::SettingsPatch;
use crate::session::ChatSession;
use crate::ui_state::{DialogState, SidebarState};
use crate::util::format_relative_time;

const QUIT_COMMAND: &str = ":q";
const PROMPT_PREFIX: &str = "you> ";
const ASSISTANT_PREFIX: &str = "assistant> ";

/// Runs the interactive chat loop.
///
/// Reads user input from `input`, writes responses to `output`.
/// Exits on `:q` command or EOF.
pub async fn run_chat<R, W>(input: R, output: &mut W, session: &mut ChatSession) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut dialogs = DialogState::default();
    let mut sidebar = SidebarState::default();

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed == QUIT_COMMAND {
            writeln!(output, "Goodbye!")?;
            break;
        }

        if trimmed.is_empty() {
            write!(output, "{}", PROMPT_PREFIX)?;
            output.flush()?;
            continue;
        }

        if trimmed.starts_with(':') {
            run_command(trimmed, output, session, &mut dialogs, &mut sidebar).await?;
            write!(output, "{}", PROMPT_PREFIX)?;
            output.flush()?;
            continue;
        }

        session.send_message(trimmed).await;

        if session.settings().stream_mode {
            stream_reply(output, session).await?;
        } else {
            session.finish_turn();
            writeln!(
                output,
                "Streaming is off. Use `ragchat ask` for one-shot replies, or :stream to turn it back on."
            )?;
        }

        write!(output, "{}", PROMPT_PREFIX)?;
        output.flush()?;
    }

    Ok(())
}

/// Pumps the live stream, echoing chunks as they arrive.
async fn stream_reply<W: Write>(output: &mut W, session: &mut ChatSession) -> Result<()> {
    let mut printed_prefix = false;

    while let Some(event) = session.next_stream_event().await {
        match &event {
            ChatStreamEvent::Chunk(text) => {
                if !text.is_empty() {
                    // Print prefix before first text
                    if !printed_prefix {
                        write!(output, "{}", ASSISTANT_PREFIX)?;
                        printed_prefix = true;
                    }
                    write!(output, "{}", text)?;
                    output.flush()?;
                }
            }
            ChatStreamEvent::Error(message) => {
                writeln!(output, "Error: {}", message)?;
            }
            ChatStreamEvent::Closed => {}
        }

        if !session.on_stream_event(event) {
            break;
        }
    }

    // Final newline after streaming completes
    if printed_prefix {
        writeln!(output)?;
    }
    if session.connection_error() {
        writeln!(output, "Connection to the assistant was lost. Please retry.")?;
    }

    Ok(())
}

/// Dispatches a `:` command. Unknown commands print the help text.
async fn run_command<W: Write>(
    command: &str,
    output: &mut W,
    session: &mut ChatSession,
    dialogs: &mut DialogState,
    sidebar: &mut SidebarState,
) -> Result<()> {
    match command {
        ":new" => {
            session.select_conversation(None).await;
            writeln!(output, "Started a new conversation")?;
        }
        ":history" => {
            if session.messages().is_empty() {
                writeln!(output, "No messages yet")?;
            }
            let show_timestamp = session.settings().show_timestamp;
            for message in session.messages() {
                let prefix = if message.is_user { "you" } else { "assistant" };
                if show_timestamp {
                    writeln!(
                        output,
                        "[{}] {}: {}",
                        format_relative_time(message.timestamp),
                        prefix,
                        message.content
                    )?;
                } else {
                    writeln!(output, "{}: {}", prefix, message.content)?;
                }
            }
        }
        ":docs" => {
            if dialogs.show_document_manager {
                dialogs.close_document_manager();
                writeln!(output, "Closed document manager")?;
            } else {
                dialogs.open_document_manager();
                let user_id = session.settings().user_id.clone();
                match session.client().list_documents(&user_id).await {
                    Ok(response) => {
                        writeln!(output, "Documents ({}):", response.data.len())?;
                        for doc in &response.data {
                            writeln!(output, "  {}", doc)?;
                        }
                    }
                    Err(e) => writeln!(output, "Error: {:#}", e)?,
                }
            }
        }
        ":settings" => {
            if dialogs.show_settings {
                dialogs.close_settings();
                writeln!(output, "Closed settings")?;
            } else {
                dialogs.open_settings();
                let settings = session.settings();
                writeln!(output, "user_id:        {}", settings.user_id)?;
                writeln!(output, "user_name:      {}", settings.user_name)?;
                writeln!(output, "stream_mode:    {}", settings.stream_mode)?;
                writeln!(output, "auto_scroll:    {}", settings.auto_scroll)?;
                writeln!(output, "show_timestamp: {}", settings.show_timestamp)?;
                writeln!(output, "api_base_url:   {}", settings.api_base_url)?;
                writeln!(output, "timeout_secs:   {}", settings.timeout_secs)?;
            }
        }
        ":sidebar" => {
            sidebar.toggle();
            let state = if sidebar.collapsed { "collapsed" } else { "expanded" };
            writeln!(output, "Sidebar {}", state)?;
        }
        ":stream" => {
            let enabled = !session.settings().stream_mode;
            session.update_settings(SettingsPatch {
                stream_mode: Some(enabled),
                ..Default::default()
            })?;
            let state = if enabled { "on" } else { "off" };
            writeln!(output, "Streaming {}", state)?;
        }
        ":status" => {
            session.refresh_connection_status(None).await;
            writeln!(output, "Backend: {}", session.status_text())?;
        }
        _ => {
            writeln!(output, "Unknown command: {}", command)?;
            writeln!(
                output,
                "Commands: :new :history :docs :settings :sidebar :stream :status :q"
            )?;
        }
    }

    Ok(())
}

/// Runs the chat loop over stdin/stdout.
pub async fn run_interactive_chat(session: &mut ChatSession) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    writeln!(stdout, "ragchat (type :q to quit)")?;
    if let Some(id) = session.current_conversation_id() {
        writeln!(stdout, "Conversation: {}", id)?;
    }
    write!(stdout, "{}", PROMPT_PREFIX)?;
    stdout.flush()?;

    run_chat(stdin.lock(), &mut stdout, session).await
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::api::ApiClient;
    use crate::config::Settings;

    use super::*;

    fn offline_session(stream_mode: bool) -> ChatSession {
        let client = ApiClient::new("http://127.0.0.1:1/api", Duration::from_secs(1));
        let settings = Settings {
            stream_mode,
            ..Default::default()
        };
        ChatSession::new(client, settings, PathBuf::from("/nonexistent/settings.toml"))
    }

    #[tokio::test]
    async fn test_quit_command_exits() {
        let mut session = offline_session(false);
        let input = Cursor::new(":q\n");
        let mut output = Vec::new();

        run_chat(input, &mut output, &mut session).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Goodbye!"));
    }

    #[tokio::test]
    async fn test_non_streaming_turn_points_at_ask() {
        let mut session = offline_session(false);
        let input = Cursor::new("hello\n:q\n");
        let mut output = Vec::new();

        run_chat(input, &mut output, &mut session).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Streaming is off"));
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_typing());
    }

    #[tokio::test]
    async fn test_sidebar_command_toggles() {
        let mut session = offline_session(false);
        let input = Cursor::new(":sidebar\n:sidebar\n:q\n");
        let mut output = Vec::new();

        run_chat(input, &mut output, &mut session).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Sidebar collapsed"));
        assert!(text.contains("Sidebar expanded"));
    }

    #[tokio::test]
    async fn test_unknown_command_prints_help() {
        let mut session = offline_session(false);
        let input = Cursor::new(":bogus\n:q\n");
        let mut output = Vec::new();

        run_chat(input, &mut output, &mut session).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Unknown command: :bogus"));
        assert!(text.contains(":status"));
    }

    #[tokio::test]
    async fn test_history_command_lists_messages() {
        let mut session = offline_session(false);
        session.send_message("first question").await;
        session.finish_turn();

        let input = Cursor::new(":history\n:q\n");
        let mut output = Vec::new();
        run_chat(input, &mut output, &mut session).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("you: first question"));
        assert!(text.contains("just now"));
    }
}
