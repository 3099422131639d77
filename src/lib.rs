//! Genie is a terminal chat client for Groq-hosted, OpenAI-compatible
//! chat-completion APIs.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime state: the conversation store, settings,
//!   completion requests, the typed reveal of replies, and the
//!   action-driven chat orchestration in [`core::app`].
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input, timers, and display updates.
//! - [`api`] defines the chat payloads sent to and read from the endpoint.
//! - [`auth`] resolves the API key from the environment or system keyring.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which initializes and dispatches into
//! [`core::app`] and [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
