pub mod app;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod message;
pub mod reveal;
pub mod route;
pub mod settings;
pub mod storage;
