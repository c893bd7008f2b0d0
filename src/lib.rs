pub mod agent;
pub mod app;
pub mod config;
pub mod handler;
pub mod message;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use agent::AgentClient;
pub use config::Config;
pub use message::{ChatMessage, ChatRequest, Greeting, Sender};
