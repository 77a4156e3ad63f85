//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::api::{ApiClient, Conversation};
use crate::chat;
use crate::config::{self, Settings, SettingsPatch};
use crate::session::{ChatSession, UNTITLED_CONVERSATION};
use crate::timestamp::parse_create_time;
use crate::util::format_relative_time;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version = "0.1")]
#[command(about = "Chat client for a RAG knowledge assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the API base URL from settings
    #[arg(long, env = "RAGCHAT_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Override the user ID from settings
    #[arg(long)]
    user: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// One-shot question without streaming
    Ask {
        /// The message to send
        message: String,

        /// Conversation to continue (a new one is generated if omitted)
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
    },

    /// Manage conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },

    /// Manage knowledge-base documents
    Docs {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Check backend availability
    Health,

    /// Manage local and remote settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConversationCommands {
    /// Lists conversations for the current user
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Creates a conversation
    New {
        /// Title for the new conversation
        #[arg(value_name = "TITLE")]
        title: String,
    },
    /// Deletes a conversation
    Delete {
        /// The ID of the conversation to delete
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
    /// Renames a conversation
    Rename {
        /// The ID of the conversation to rename
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
        /// New title for the conversation
        #[arg(value_name = "TITLE")]
        title: String,
    },
}

#[derive(clap::Subcommand)]
enum DocCommands {
    /// Lists uploaded documents
    List,
    /// Uploads a local file
    Add {
        /// The file to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Registers a file by server-side path
    AddPath {
        /// The path on the server
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Removes a document
    Remove {
        /// The ID of the document to remove
        #[arg(value_name = "DOCUMENT_ID")]
        id: String,
    },
    /// Rebuilds the retrieval index
    Reload,
}

#[derive(clap::Subcommand)]
enum SettingsCommands {
    /// Shows the effective settings and where they live
    Show,
    /// Updates local settings
    Set {
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        user_name: Option<String>,

        #[arg(long)]
        stream_mode: Option<bool>,

        #[arg(long)]
        auto_scroll: Option<bool>,

        #[arg(long)]
        show_timestamp: Option<bool>,

        #[arg(long)]
        api_base_url: Option<String>,

        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Replaces local settings with the server-side copy
    Pull,
    /// Uploads local settings to the server
    Push,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let settings_path = config::paths::settings_path();
    let mut settings = Settings::load().context("load settings")?;

    if let Some(url) = cli.api_base_url.as_deref() {
        settings.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(user) = cli.user {
        settings.user_id = user;
    }

    let client = ApiClient::from_settings(&settings);

    // default to chat mode
    let Some(command) = cli.command else {
        let mut session = ChatSession::new(client, settings, settings_path);
        return chat::run_interactive_chat(&mut session).await;
    };

    match command {
        Commands::Ask {
            message,
            conversation,
        } => {
            let conversation_id =
                conversation.unwrap_or_else(crate::util::new_conversation_id);
            let reply = client
                .chat_sync(&conversation_id, &message, &settings.user_id)
                .await?;
            match reply.as_str() {
                Some(text) => println!("{}", text),
                None => println!("{}", serde_json::to_string_pretty(&reply)?),
            }
            Ok(())
        }

        Commands::Conversations { command } => match command {
            ConversationCommands::List { page, size } => {
                let response = client
                    .list_conversations(&settings.user_id, page, size)
                    .await?;
                let conversations = response.data.conversations;
                if conversations.is_empty() {
                    println!("No conversations");
                    return Ok(());
                }
                for conversation in conversations {
                    print_conversation(&conversation);
                }
                Ok(())
            }
            ConversationCommands::New { title } => {
                let response = client.create_conversation(&settings.user_id, &title).await?;
                println!("Created {}", response.data.conversation_id);
                Ok(())
            }
            ConversationCommands::Delete { id } => {
                client.delete_conversation(&id, &settings.user_id).await?;
                println!("Deleted {}", id);
                Ok(())
            }
            ConversationCommands::Rename { id, title } => {
                client
                    .rename_conversation(&id, &settings.user_id, &title)
                    .await?;
                println!("Renamed {}", id);
                Ok(())
            }
        },

        Commands::Docs { command } => match command {
            DocCommands::List => {
                let response = client.list_documents(&settings.user_id).await?;
                if response.data.is_empty() {
                    println!("No documents");
                    return Ok(());
                }
                for doc in response.data {
                    println!("{}", doc);
                }
                Ok(())
            }
            DocCommands::Add { file } => {
                client.upload_document(&file, &settings.user_id).await?;
                println!("Uploaded {}", file.display());
                Ok(())
            }
            DocCommands::AddPath { path } => {
                client.add_document_by_path(&path).await?;
                println!("Added {}", path);
                Ok(())
            }
            DocCommands::Remove { id } => {
                client.delete_document(&id, &settings.user_id).await?;
                println!("Removed {}", id);
                Ok(())
            }
            DocCommands::Reload => {
                client.reload_rag_index().await?;
                println!("Index reload requested");
                Ok(())
            }
        },

        Commands::Health => {
            if client.check_health().await {
                println!("ok");
                Ok(())
            } else {
                println!("unreachable");
                std::process::exit(1);
            }
        }

        Commands::Settings { command } => match command {
            SettingsCommands::Show => {
                println!("# {}", settings_path.display());
                print!("{}", toml::to_string_pretty(&settings)?);
                Ok(())
            }
            SettingsCommands::Set {
                user_id,
                user_name,
                stream_mode,
                auto_scroll,
                show_timestamp,
                api_base_url,
                timeout_secs,
            } => {
                let patch = SettingsPatch {
                    user_id,
                    user_name,
                    stream_mode,
                    auto_scroll,
                    show_timestamp,
                    api_base_url,
                    timeout_secs,
                };
                settings.apply(patch);
                settings.save_to(&settings_path)?;
                println!("Settings updated");
                Ok(())
            }
            SettingsCommands::Pull => {
                let response = client.get_user_settings(&settings.user_id).await?;
                let remote: Settings = response.data.into();
                remote.save_to(&settings_path)?;
                println!("Settings pulled");
                Ok(())
            }
            SettingsCommands::Push => {
                client
                    .save_user_settings(&settings.user_id, &settings)
                    .await?;
                println!("Settings pushed");
                Ok(())
            }
        },
    }
}

fn print_conversation(conversation: &Conversation) {
    let title = if conversation.title.is_empty() {
        UNTITLED_CONVERSATION
    } else {
        &conversation.title
    };
    match parse_create_time(conversation.create_time.as_deref()) {
        Some(created) => println!(
            "{}  {}  ({})",
            conversation.conversation_id,
            title,
            format_relative_time(created)
        ),
        None => println!("{}  {}", conversation.conversation_id, title),
    }
}
