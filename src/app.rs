use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use crate::backend::{BackendClient, BackendError};
use crate::state::ChatSession;
use crate::tui::AppEvent;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub session: ChatSession,

    // Chat list scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of chat area, updated during render
    pub chat_width: u16,  // Inner width of chat area for wrap calculations
    follow_bottom: bool,  // Keep the newest line in view across re-wraps and resizes

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Backend
    pub backend: BackendClient,
    events: UnboundedSender<AppEvent>,
    reply_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(backend: BackendClient, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            // The input box has focus when the view opens
            input_mode: InputMode::Editing,
            session: ChatSession::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_bottom: true,

            animation_frame: 0,

            chat_area: None,

            backend,
            events,
            reply_task: None,
        }
    }

    /// Send the current draft to the backend.
    ///
    /// The user turn is appended right away; the reply arrives later as an
    /// `AppEvent::Reply` on the event channel.
    pub fn send_message(&mut self) {
        let Some(message) = self.session.begin_send() else {
            if self.session.is_pending() {
                tracing::debug!("send ignored, a request is already in flight");
            }
            return;
        };

        tracing::debug!(chars = message.chars().count(), "sending message");
        self.animation_frame = 0;
        self.scroll_to_bottom();

        let backend = self.backend.clone();
        let events = self.events.clone();
        self.reply_task = Some(tokio::spawn(async move {
            let result = backend.send(&message).await;
            // Receiver is gone only when the app is shutting down
            let _ = events.send(AppEvent::Reply(result));
        }));
    }

    /// Apply the outcome of the in-flight request
    pub fn finish_reply(&mut self, result: Result<String, BackendError>) {
        self.reply_task = None;

        let reply = match result {
            Ok(reply) => {
                tracing::debug!(chars = reply.chars().count(), "received reply");
                Some(reply)
            }
            Err(e) => {
                tracing::error!(endpoint = self.backend.endpoint(), "error contacting backend: {}", e);
                None
            }
        };

        self.session.finish_send(reply);
        self.scroll_to_bottom();
    }

    /// Quit, dropping any request still in flight
    pub fn quit(&mut self) {
        self.should_quit = true;
        if let Some(task) = self.reply_task.take() {
            tracing::info!("aborting in-flight request on exit");
            task.abort();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Number of rendered lines in the chat list, including the typing indicator.
    /// Counted with the same wrapping the renderer uses.
    pub fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        ui::chat_line_count(self, wrap_width)
    }

    fn visible_chat_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn max_chat_scroll(&self) -> u16 {
        self.total_chat_lines().saturating_sub(self.visible_chat_height())
    }

    /// Scroll chat to bottom so the newest turn (or typing indicator) is visible
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
        self.follow_bottom = true;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_bottom = self.max_chat_scroll() == 0;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_bottom = self.chat_scroll == max;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = self.chat_scroll == self.max_chat_scroll();
    }

    /// Re-apply the scroll bounds after the chat geometry changed (called from render)
    pub fn clamp_chat_scroll(&mut self) {
        let max = self.max_chat_scroll();
        self.chat_scroll = if self.follow_bottom { max } else { self.chat_scroll.min(max) };
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.visible_chat_height() / 2).max(1);
        self.scroll_down(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.visible_chat_height() / 2).max(1);
        self.scroll_up(half);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Turn, BACKEND_ERROR_REPLY};
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_app(endpoint: &str) -> (App, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(BackendClient::new(endpoint), tx), rx)
    }

    fn type_draft(app: &mut App, text: &str) {
        for c in text.chars() {
            app.session.insert_char(c);
        }
    }

    /// Wait for the reply event and apply it
    async fn apply_reply(app: &mut App, rx: &mut UnboundedReceiver<AppEvent>) {
        match rx.recv().await {
            Some(AppEvent::Reply(result)) => app.finish_reply(result),
            other => panic!("expected reply event, got {:?}", other),
        }
    }

    async fn echo_server() -> MockServer {
        let server = MockServer::start().await;
        for msg in ["hello", "a", "b"] {
            Mock::given(method("POST"))
                .and(path("/chat"))
                .and(body_json(json!({ "message": msg })))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(json!({ "response": format!("R({})", msg) })),
                )
                .mount(&server)
                .await;
        }
        server
    }

    #[tokio::test]
    async fn test_whitespace_draft_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));
        type_draft(&mut app, "   ");
        app.send_message();

        assert!(app.session.turns().is_empty());
        assert!(!app.session.is_pending());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_user_turn_appears_before_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "Hi there!" }))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));
        type_draft(&mut app, "hello");
        app.send_message();

        assert_eq!(app.session.turns(), &[Turn::user("hello")]);
        assert!(app.session.is_pending());
        assert_eq!(app.session.draft(), "");

        apply_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.turns()[1], Turn::agent("Hi there!"));
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_second_send_ignored_while_pending() {
        let server = echo_server().await;
        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));

        type_draft(&mut app, "hello");
        app.send_message();
        type_draft(&mut app, "again");
        app.send_message();

        assert_eq!(app.session.turns().len(), 1);
        assert_eq!(app.session.draft(), "again");

        apply_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.turns().len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_reply_shows_error_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));
        type_draft(&mut app, "hello");
        app.send_message();
        apply_reply(&mut app, &mut rx).await;

        assert_eq!(app.session.turns()[1], Turn::agent(BACKEND_ERROR_REPLY));
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_unreachable_backend_shows_error_turn() {
        let (mut app, mut rx) = test_app("http://127.0.0.1:1/chat");
        type_draft(&mut app, "hello");
        app.send_message();
        apply_reply(&mut app, &mut rx).await;

        assert_eq!(app.session.turns()[1], Turn::agent(BACKEND_ERROR_REPLY));
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_sequential_sends_keep_order() {
        let server = echo_server().await;
        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));

        for msg in ["a", "b"] {
            type_draft(&mut app, msg);
            app.send_message();
            apply_reply(&mut app, &mut rx).await;
        }

        assert_eq!(
            app.session.turns(),
            &[
                Turn::user("a"),
                Turn::agent("R(a)"),
                Turn::user("b"),
                Turn::agent("R(b)"),
            ]
        );
    }

    #[tokio::test]
    async fn test_quit_aborts_in_flight_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late" }))
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let (mut app, mut rx) = test_app(&format!("{}/chat", server.uri()));
        type_draft(&mut app, "hello");
        app.send_message();
        app.quit();
        drop(app);

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scrolling_is_clamped() {
        let (mut app, _rx) = test_app("http://127.0.0.1:1/chat");
        app.chat_height = 4;
        app.chat_width = 20;
        for i in 0..5 {
            type_draft(&mut app, &format!("message {}", i));
            app.session.begin_send();
            app.session.finish_send(Some("ok".to_string()));
        }

        // 5 exchanges x (role + content + blank) x 2 turns
        assert_eq!(app.total_chat_lines(), 30);

        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, 26);
        app.scroll_down(10);
        assert_eq!(app.chat_scroll, 26);
        app.scroll_half_page_up();
        assert_eq!(app.chat_scroll, 24);
        app.scroll_to_top();
        app.scroll_up(3);
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_long_lines_wrap_in_line_count() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(BackendClient::new("http://127.0.0.1:1/chat"), tx);
        app.chat_width = 10;
        type_draft(&mut app, &"x".repeat(25));
        app.session.begin_send();

        // role line + 3 wrapped lines + blank + typing indicator
        assert_eq!(app.total_chat_lines(), 6);
    }
}
