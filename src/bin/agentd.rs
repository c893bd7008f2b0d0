//! Stand-in agent backend
//!
//! Serves the two routes the chat client consumes: a greeting on `GET /`
//! and an echo reply on `POST /chat`. Any real agent service honoring the
//! same routes can take its place.

use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_chat::message::{ChatMessage, ChatRequest, Greeting, Sender};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "agentd=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr =
        std::env::var("AGENT_BACKEND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "agent backend v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    axum::serve(listener, router()).await?;
    Ok(())
}

fn router() -> Router {
    // Browser frontends call this backend from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .layer(cors)
}

async fn root() -> Json<Greeting> {
    Json(Greeting {
        message: Some("Hello World from the Agent Backend!".to_string()),
    })
}

async fn chat(Json(request): Json<ChatRequest>) -> Json<ChatMessage> {
    tracing::info!("received message: {}", request.message);

    Json(ChatMessage {
        sender: Sender::Agent,
        text: format!("Agent received: {}", request.message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn root_serves_a_greeting() {
        let Json(greeting) = root().await;
        assert_eq!(
            greeting.message.as_deref(),
            Some("Hello World from the Agent Backend!")
        );
    }

    #[tokio::test]
    async fn chat_echoes_the_received_message() {
        let Json(reply) = chat(Json(ChatRequest {
            message: "hi".to_string(),
        }))
        .await;

        assert_eq!(reply.sender, Sender::Agent);
        assert_eq!(reply.text, "Agent received: hi");
    }
}
