//! Command-line interface parsing and handling
//!
//! `genie` with no subcommand starts the chat interface. The other
//! subcommands read or edit persisted state without the TUI.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::auth::AuthManager;
use crate::core::app::{App, AppInit};
use crate::core::completion::CompletionClient;
use crate::core::config::{path_display, Config};
use crate::core::conversation::{ConversationId, ConversationStore};
use crate::core::message::Role;
use crate::core::route::Route;
use crate::core::settings::{AppearanceMode, Settings};
use crate::core::storage::{FileStore, KeyValueStore};
use crate::ui::appearance::detect_preferred_appearance;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_logging, LOG_FILE_NAME};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\ndescribe: ",
    env!("VERGEN_GIT_DESCRIBE"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_DATE"),
    "\nrustc: ",
    env!("VERGEN_RUSTC_SEMVER"),
);

#[derive(Parser)]
#[command(name = "genie")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client for Groq-hosted models")]
#[command(
    long_about = "Genie is a full-screen terminal chat client. Conversations are saved \
locally and titled automatically after the first reply.\n\n\
Authentication:\n\
  Use 'genie auth' to store your Groq API key in the system keyring.\n\n\
Environment Variables:\n\
  GROQ_API_KEY      API key (takes precedence over the keyring)\n\
  GROQ_BASE_URL     Custom API base URL (defaults to https://api.groq.com/openai/v1)\n\
  GENIE_LOG         Log filter, e.g. 'debug' or 'genie=trace' (defaults to info)\n\n\
Controls:\n\
  Enter             Send the message (Alt+Enter for a newline)\n\
  Esc               Stop the reply animation, cancel a request, or close a panel\n\
  Tab               Move focus between the input and the sidebar\n\
  Ctrl+B            Show or hide the sidebar\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+O            Open settings\n\
  Ctrl+Y            Copy the last reply\n\
  PageUp/PageDown   Scroll the transcript (End jumps to the bottom)\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session only
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Conversation to open at startup (`/ID` or a bare id)
    #[arg(short = 'o', long, global = true, value_name = "ROUTE", value_parser = parse_route)]
    pub open: Option<Route>,

    /// Directory holding saved chats and settings
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List saved conversations, most recent first
    List,
    /// Print a saved conversation
    Show {
        /// Conversation id, as printed by `genie list`
        id: String,
    },
    /// Set a persisted setting (color, appearance or model)
    Set {
        key: String,
        value: String,
    },
    /// Print the persisted settings and configuration
    Settings,
    /// Store the API key in the system keyring
    Auth,
    /// Remove the API key from the system keyring
    Deauth,
}

fn parse_route(raw: &str) -> Result<Route, String> {
    Route::parse(raw).ok_or_else(|| format!("'{raw}' is not a conversation route"))
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Auth => {
            if let Err(e) = AuthManager::new().interactive_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth => {
            if let Err(e) = AuthManager::new().interactive_deauth() {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::List => {
            let store = open_store(&config, args.data_dir)?;
            list_conversations(store.as_ref());
            Ok(())
        }
        Commands::Show { id } => {
            let store = open_store(&config, args.data_dir)?;
            if !show_conversation(store.as_ref(), &id) {
                eprintln!("❌ No conversation with id '{id}'");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let store = open_store(&config, args.data_dir)?;
            let mut settings = Settings::load(store.as_ref());
            if let Err(e) = apply_setting(&mut settings, &key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            settings.save(store.as_ref());
            println!("✅ Set {key} to: {}", value.trim());
            Ok(())
        }
        Commands::Settings => {
            let store = open_store(&config, args.data_dir)?;
            Settings::load(store.as_ref()).print_all();
            println!();
            config.print_all();
            Ok(())
        }
        Commands::Chat => {
            let data_dir = config
                .data_dir(args.data_dir)
                .ok_or("cannot determine a data directory; pass --data-dir")?;
            let log_path = args
                .log
                .unwrap_or_else(|| data_dir.join(LOG_FILE_NAME));
            if let Err(e) = init_logging(&log_path) {
                eprintln!("⚠️  Logging disabled: {e}");
            }

            let (api_key, source) = match AuthManager::new().resolve_api_key() {
                Ok(found) => found,
                Err(e) => {
                    eprintln!("❌ {e}");
                    eprintln!();
                    eprintln!("Run 'genie auth' to store a Groq API key, or set GROQ_API_KEY.");
                    std::process::exit(1);
                }
            };

            let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(data_dir.clone()));
            info!(
                data_dir = %path_display(&data_dir),
                key_source = ?source,
                "Starting chat"
            );

            let client = CompletionClient::new(reqwest::Client::new(), config.base_url(), api_key);
            let app = App::new(AppInit {
                store,
                system_appearance: detect_preferred_appearance(),
                model_override: args.model,
                initial_route: args.open.unwrap_or_default(),
            });
            run_chat(app, Arc::new(client), config.title_model()).await
        }
    }
}

fn open_store(
    config: &Config,
    cli_override: Option<PathBuf>,
) -> Result<Arc<dyn KeyValueStore>, Box<dyn Error>> {
    let dir = config
        .data_dir(cli_override)
        .ok_or("cannot determine a data directory; pass --data-dir")?;
    Ok(Arc::new(FileStore::new(dir)))
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<(), String> {
    match key {
        "color" => settings.set_color(value),
        "appearance" => {
            settings.appearance = value.parse::<AppearanceMode>()?;
            Ok(())
        }
        "model" => settings.set_model(value),
        other => Err(format!(
            "unknown setting '{other}' (expected color, appearance or model)"
        )),
    }
}

fn conversation_listing(store: &dyn KeyValueStore) -> Vec<String> {
    let mut conversations = ConversationStore::load_all(store);
    conversations.reverse();
    conversations
        .iter()
        .map(|c| {
            let when = c
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{}  {when}  {}", c.id, c.title)
        })
        .collect()
}

fn list_conversations(store: &dyn KeyValueStore) {
    let lines = conversation_listing(store);
    if lines.is_empty() {
        println!("No saved conversations.");
        return;
    }
    for line in lines {
        println!("{line}");
    }
}

fn transcript(store: &dyn KeyValueStore, id: &str) -> Option<String> {
    let id = ConversationId::from(id.trim().trim_start_matches('/'));
    let conversation = ConversationStore::load_all(store)
        .into_iter()
        .find(|c| c.id == id)?;
    let mut out = format!("# {}\n", conversation.title);
    for message in &conversation.messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Genie",
        };
        out.push_str(&format!("\n{speaker}:\n{}\n", message.content));
    }
    Some(out)
}

fn show_conversation(store: &dyn KeyValueStore, id: &str) -> bool {
    match transcript(store, id) {
        Some(text) => {
            print!("{text}");
            true
        }
        None => false,
    }
}
