//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the event loop that turns keys, completion results and
//!   timer ticks into [`crate::core::app::AppAction`]s.
//! - [`renderer`] and [`markdown`]: frame output.
//! - [`theme`] and [`appearance`]: color policy, including the platform
//!   light/dark preference.
//!
//! State lives in [`crate::core`]; this layer only presents and captures
//! interaction.

pub mod appearance;
pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;
