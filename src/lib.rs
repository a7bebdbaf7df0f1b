pub mod chat;
pub mod client;
pub mod config;
pub mod dirs;
pub mod display;
pub mod logs;
pub mod prompt;
pub mod stomp;
pub mod store;
pub mod transport;
pub mod types;
