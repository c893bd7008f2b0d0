use reqwest::Client;
use anyhow::{Result, anyhow};

use crate::message::{ChatMessage, ChatRequest, Greeting};

/// Greeting shown when the backend answers `GET /` without a message field
pub const DEFAULT_GREETING: &str = "Agent ready.";

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the initial agent greeting from `GET /`.
    pub async fn greeting(&self) -> Result<String> {
        let url = format!("{}/", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "agent greeting failed with status: {}",
                response.status()
            ));
        }

        let greeting: Greeting = response.json().await?;
        Ok(greeting
            .message
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()))
    }

    /// Send one user message to `POST /chat` and return the agent's reply.
    pub async fn chat(&self, message: &str) -> Result<ChatMessage> {
        let url = format!("{}/chat", self.base_url);

        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "agent request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatMessage = response.json().await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn greeting_returns_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Hello World from the Agent Backend!"})),
            )
            .mount(&server)
            .await;

        let client = AgentClient::new(&server.uri());
        let greeting = client.greeting().await.unwrap();
        assert_eq!(greeting, "Hello World from the Agent Backend!");
    }

    #[tokio::test]
    async fn greeting_falls_back_when_message_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = AgentClient::new(&server.uri());
        let greeting = client.greeting().await.unwrap();
        assert_eq!(greeting, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn chat_posts_message_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_json(json!({"message": "hi there"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"sender": "agent", "text": "Agent received: hi there"})),
            )
            .mount(&server)
            .await;

        let client = AgentClient::new(&server.uri());
        let reply = client.chat("hi there").await.unwrap();
        assert_eq!(reply.sender, Sender::Agent);
        assert_eq!(reply.text, "Agent received: hi there");
    }

    #[tokio::test]
    async fn chat_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AgentClient::new(&server.uri());
        let err = client.chat("hi").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn chat_fails_when_backend_unreachable() {
        // Port 9 (discard) is never serving HTTP
        let client = AgentClient::new("http://127.0.0.1:9");
        assert!(client.chat("hi").await.is_err());
    }
}
