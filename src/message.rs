//! UI-agnostic chat types
//!
//! Wire and transcript types shared between the TUI client, the HTTP
//! client, and the stand-in backend binary.

use serde::{Deserialize, Serialize};

/// A single entry in the chat transcript. Also the reply body of
/// `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// Body of `GET /`. The backend may omit the field entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greeting {
    pub message: Option<String>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}
