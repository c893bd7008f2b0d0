use tokio::task::JoinHandle;

use crate::agent::AgentClient;
use crate::config::{Config, DEFAULT_BACKEND_URL};
use crate::message::{ChatMessage, Sender};

/// Shown in place of the greeting when `GET /` fails
pub const CONNECT_FALLBACK: &str = "Could not connect to agent.";
/// Shown in place of a reply when `POST /chat` fails
pub const REPLY_FALLBACK: &str = "Error: Could not get response from agent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Transcript state (append-only; display order is send order)
    pub messages: Vec<ChatMessage>,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner chat pane size, updated during render
    pub chat_width: u16,

    // Input state
    pub input: String,
    pub cursor: usize, // char index into input

    // In-flight request state
    pub greeting_task: Option<JoinHandle<anyhow::Result<String>>>,
    pub reply_task: Option<JoinHandle<anyhow::Result<ChatMessage>>>,
    pub loading: bool,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub agent: AgentClient,
}

impl App {
    pub fn new() -> Self {
        let config = Config::load().unwrap_or_else(|_| Config::new());

        // Backend URL - check env var first, then config, then default
        let backend_url = std::env::var("AGENT_BACKEND_URL")
            .ok()
            .or(config.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        Self::with_backend(&backend_url)
    }

    pub fn with_backend(backend_url: &str) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            messages: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            input: String::new(),
            cursor: 0,

            greeting_task: None,
            reply_task: None,
            loading: false,
            animation_frame: 0,

            agent: AgentClient::new(backend_url),
        }
    }

    /// Kick off the initial `GET /` so the first transcript entry is the
    /// agent's greeting.
    pub fn start_greeting(&mut self) {
        let agent = self.agent.clone();
        self.loading = true;
        self.greeting_task = Some(tokio::spawn(async move { agent.greeting().await }));
    }

    /// Send the current input line to the agent. A blank line is a no-op,
    /// and only one request may be in flight at a time so replies always
    /// land directly after their own user message.
    pub fn submit_message(&mut self) {
        if self.input.trim().is_empty() {
            return;
        }
        if self.greeting_task.is_some() || self.reply_task.is_some() {
            return;
        }

        let text = self.input.clone();
        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: text.clone(),
        });

        self.input.clear();
        self.cursor = 0;
        self.loading = true;
        self.scroll_to_bottom();

        let agent = self.agent.clone();
        self.reply_task = Some(tokio::spawn(async move { agent.chat(&text).await }));
    }

    /// Non-blocking check of the in-flight request. On completion the
    /// agent message (or its fixed fallback) is appended.
    pub async fn poll_pending(&mut self) {
        let greeting_done = self
            .greeting_task
            .as_ref()
            .map_or(false, |task| task.is_finished());
        if greeting_done {
            if let Some(task) = self.greeting_task.take() {
                let text = match task.await {
                    Ok(Ok(greeting)) => greeting,
                    _ => CONNECT_FALLBACK.to_string(),
                };
                self.finish_request(ChatMessage {
                    sender: Sender::Agent,
                    text,
                });
            }
        }

        let reply_done = self
            .reply_task
            .as_ref()
            .map_or(false, |task| task.is_finished());
        if reply_done {
            if let Some(task) = self.reply_task.take() {
                let message = match task.await {
                    Ok(Ok(reply)) => reply,
                    _ => ChatMessage {
                        sender: Sender::Agent,
                        text: REPLY_FALLBACK.to_string(),
                    },
                };
                self.finish_request(message);
            }
        }
    }

    fn finish_request(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(self.chat_height.max(2) / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(self.chat_height.max(2) / 2);
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Scroll so the newest message (and the loading indicator) is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.transcript_lines().saturating_sub(self.visible_height());
    }

    /// Keep manual scrolling from running past the end of the transcript
    pub fn clamp_scroll(&mut self) {
        let max_scroll = self.transcript_lines().saturating_sub(self.visible_height());
        if self.chat_scroll > max_scroll {
            self.chat_scroll = max_scroll;
        }
    }

    /// Number of terminal lines the rendered transcript occupies
    fn transcript_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "Agent:")
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1; // Empty line still takes one line
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.loading {
            total_lines += 2; // Role line + animated ellipsis
        }

        total_lines
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Backend that is never listening
    const DEAD_BACKEND: &str = "http://127.0.0.1:9";

    async fn poll_until_idle(app: &mut App) {
        for _ in 0..200 {
            app.poll_pending().await;
            if app.greeting_task.is_none() && app.reply_task.is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("request never completed");
    }

    #[tokio::test]
    async fn blank_input_is_a_noop() {
        let mut app = App::with_backend(DEAD_BACKEND);
        app.input = "   ".to_string();
        app.submit_message();

        assert!(app.messages.is_empty());
        assert!(app.reply_task.is_none());
        assert!(!app.loading);
        assert_eq!(app.input, "   ");
    }

    #[tokio::test]
    async fn greeting_becomes_first_agent_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Agent online."})),
            )
            .mount(&server)
            .await;

        let mut app = App::with_backend(&server.uri());
        app.start_greeting();
        assert!(app.loading);

        poll_until_idle(&mut app).await;

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::Agent);
        assert_eq!(app.messages[0].text, "Agent online.");
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn unreachable_backend_yields_connect_fallback() {
        let mut app = App::with_backend(DEAD_BACKEND);
        app.start_greeting();
        poll_until_idle(&mut app).await;

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].text, CONNECT_FALLBACK);
    }

    #[tokio::test]
    async fn submit_appends_user_then_agent_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"sender": "agent", "text": "Agent received: hello"}),
            ))
            .mount(&server)
            .await;

        let mut app = App::with_backend(&server.uri());
        app.input = "hello".to_string();
        app.submit_message();

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);
        assert_eq!(app.messages[0].text, "hello");
        assert!(app.input.is_empty());
        assert!(app.loading);

        poll_until_idle(&mut app).await;

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Agent);
        assert_eq!(app.messages[1].text, "Agent received: hello");
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn failed_reply_yields_fixed_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut app = App::with_backend(&server.uri());
        app.input = "hello".to_string();
        app.submit_message();
        poll_until_idle(&mut app).await;

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Agent);
        assert_eq!(app.messages[1].text, REPLY_FALLBACK);
    }

    #[tokio::test]
    async fn submit_is_held_while_a_request_is_in_flight() {
        let mut app = App::with_backend(DEAD_BACKEND);
        app.greeting_task = Some(tokio::spawn(async {
            std::future::pending::<anyhow::Result<String>>().await
        }));

        app.input = "hello".to_string();
        app.submit_message();

        assert!(app.messages.is_empty());
        assert!(app.reply_task.is_none());
        assert_eq!(app.input, "hello");

        app.greeting_task.take().expect("still pending").abort();
    }

    #[tokio::test]
    async fn tick_animation_only_advances_while_loading() {
        let mut app = App::with_backend(DEAD_BACKEND);

        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.loading = true;
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0); // wrapped around 0 -> 1 -> 2 -> 0
    }
}
