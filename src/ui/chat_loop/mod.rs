//! Main chat event loop and its helpers.

mod event_loop;
mod keybindings;
mod lifecycle;
mod timers;

pub use event_loop::run_chat;
