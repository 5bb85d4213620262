//! Spirit card web server
//!
//! Axum server for the quiz pages and the JSON generation API.

pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/generate-card", post(routes::api::generate_card))
        .route("/generate-image", post(routes::api::generate_image))
        .with_state(state.clone());

    let quiz_routes = Router::new()
        .route("/quiz/{id}", get(routes::quiz::page))
        .route("/quiz/{id}/unlock", post(routes::quiz::unlock))
        .route("/quiz/{id}/answer", post(routes::quiz::answer))
        .route("/quiz/{id}/back", post(routes::quiz::back))
        .route("/quiz/{id}/reset", post(routes::quiz::reset))
        .route("/quiz/{id}/image", get(routes::quiz::image))
        .route("/quiz/{id}/export", get(routes::quiz::export))
        .route("/quiz/{id}/ws", get(websocket::ws_handler))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::quiz::index))
        .route("/health", get(routes::health::health))
        .nest("/api", api_routes)
        .merge(quiz_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use spirit_core::card::{Card, SpecialMove, Stats};
    use spirit_core::provider::{CardGenerator, ImageGenerator, RenderedImage};
    use spirit_core::quiz::model::{AnswerSet, QuizStep};
    use spirit_core::session::{Generators, SessionSettings};
    use spirit_core::{SpiritError, SpiritResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[derive(Default)]
    struct StubCards {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CardGenerator for StubCards {
        async fn generate_card(&self, answers: &AnswerSet) -> SpiritResult<Card> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SpiritError::MalformedResponse("No text response from Claude".to_string()));
            }
            Ok(Card {
                name: "Tide Pup".to_string(),
                element: answers.element.clone(),
                personality: "Splashes first, asks later".to_string(),
                backstory: "Born in a tide pool under a rainbow.".to_string(),
                stats: Stats {
                    courage: 9,
                    kindness: 10,
                    magic: 8,
                },
                special_move: SpecialMove {
                    name: "Bubble Hug".to_string(),
                    description: "Wraps friends in a shimmering bubble.".to_string(),
                },
                rarity: "Ultra Rare".to_string(),
                image_prompt: "a tiny otter pup surfing a wave".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct StubImages {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageGenerator for StubImages {
        async fn generate_image(&self, _image_prompt: &str) -> SpiritResult<RenderedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SpiritError::Transport("HTTP 500".to_string()));
            }
            Ok(RenderedImage::png(PNG_STUB.to_vec()))
        }
    }

    fn test_state(cards: Arc<StubCards>, images: Arc<StubImages>) -> AppState {
        test_state_with_delay(cards, images, Duration::from_millis(10))
    }

    fn test_state_with_delay(
        cards: Arc<StubCards>,
        images: Arc<StubImages>,
        failure_reset_delay: Duration,
    ) -> AppState {
        AppState::new(
            Generators { cards, images },
            SessionSettings {
                passcode: "sloan".to_string(),
                failure_reset_delay,
            },
            Duration::from_secs(3600),
        )
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        create_router(state.clone()).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION].to_str().unwrap().to_string()
    }

    async fn new_session(state: &AppState) -> String {
        let response = send(state, get("/")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        location(&response)
    }

    async fn wait_for_step(state: &AppState, path: &str, step: QuizStep) {
        let id = path.trim_start_matches("/quiz/");
        for _ in 0..200 {
            if state.session(id).await.map(|s| s.step()) == Some(step) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {}", step);
    }

    const ANSWERS: &str =
        r#"{"style":"Girl","color":"Blue","personality":"Silly","place":"Ocean","element":"Water"}"#;

    #[tokio::test]
    async fn test_health() {
        let state = test_state(Arc::default(), Arc::default());
        let response = send(&state, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn test_generate_card_returns_card_json() {
        let state = test_state(Arc::default(), Arc::default());
        let response = send(&state, json_post("/api/generate-card", ANSWERS)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let card: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(card["name"], "Tide Pup");
        assert_eq!(card["element"], "Water");
        assert_eq!(card["special_move"]["name"], "Bubble Hug");
        assert_eq!(card["imagePrompt"], "a tiny otter pup surfing a wave");
    }

    #[tokio::test]
    async fn test_generate_card_failure_body() {
        let cards = Arc::new(StubCards {
            fail: true,
            ..StubCards::default()
        });
        let state = test_state(cards, Arc::default());
        let response = send(&state, json_post("/api/generate-card", ANSWERS)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Failed to generate spirit animal card");
        assert!(body["details"].as_str().unwrap().contains("No text response"));
    }

    #[tokio::test]
    async fn test_generate_card_bad_body_is_500() {
        let cards = Arc::new(StubCards::default());
        let state = test_state(cards.clone(), Arc::default());
        let response = send(&state, json_post("/api/generate-card", "{not json")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("Failed to generate spirit animal card"));
        assert_eq!(cards.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_image_returns_png() {
        let state = test_state(Arc::default(), Arc::default());
        let response = send(
            &state,
            json_post("/api/generate-image", r#"{"imagePrompt":"a glowing fox"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_LENGTH],
            PNG_STUB.len().to_string().as_str()
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], PNG_STUB);
    }

    #[tokio::test]
    async fn test_generate_image_failure_body() {
        let images = Arc::new(StubImages {
            fail: true,
            ..StubImages::default()
        });
        let state = test_state(Arc::default(), images);
        let response = send(
            &state,
            json_post("/api/generate-image", r#"{"imagePrompt":"a glowing fox"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Failed to generate spirit animal image");
    }

    #[tokio::test]
    async fn test_new_session_shows_gate() {
        let state = test_state(Arc::default(), Arc::default());
        let path = new_session(&state).await;
        assert!(path.starts_with("/quiz/"));

        let response = send(&state, get(&path)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Enter the secret passcode to begin"));
        assert!(html.contains(&format!("{}/ws", path)));
    }

    #[tokio::test]
    async fn test_unknown_session_redirects_home() {
        let state = test_state(Arc::default(), Arc::default());
        let response = send(&state, get("/quiz/does-not-exist")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_wrong_passcode_rerenders_gate() {
        let state = test_state(Arc::default(), Arc::default());
        let path = new_session(&state).await;

        let response = send(&state, form_post(&format!("{}/unlock", path), "passcode=hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("s not it! Try again."));

        let response = send(&state, form_post(&format!("{}/unlock", path), "passcode=SLOAN")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Who are you?"));
        assert!(!html.contains("Go Back"));
    }

    #[tokio::test]
    async fn test_back_and_invalid_answer() {
        let state = test_state(Arc::default(), Arc::default());
        let path = new_session(&state).await;
        send(&state, form_post(&format!("{}/unlock", path), "passcode=sloan")).await;
        send(&state, form_post(&format!("{}/answer", path), "value=Boy")).await;

        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Go Back"));

        let response = send(&state, form_post(&format!("{}/answer", path), "value=Plaid")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&state, form_post(&format!("{}/back", path), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Who are you?"));
        assert!(html.contains("option selected"));
    }

    #[tokio::test]
    async fn test_full_quiz_flow_and_export() {
        let cards = Arc::new(StubCards::default());
        let images = Arc::new(StubImages::default());
        let state = test_state(cards.clone(), images.clone());
        let path = new_session(&state).await;

        let response = send(&state, get(&format!("{}/image", path))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        send(&state, form_post(&format!("{}/unlock", path), "passcode=Sloan")).await;
        for value in ["Girl", "Blue", "Silly", "Ocean", "Water"] {
            let response = send(&state, form_post(&format!("{}/answer", path), &format!("value={}", value))).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
        }

        wait_for_step(&state, &path, QuizStep::Display).await;
        let id = path.trim_start_matches("/quiz/").to_string();
        for _ in 0..200 {
            if state.session(&id).await.and_then(|s| s.image()).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(cards.calls.load(Ordering::SeqCst), 1);
        assert_eq!(images.calls.load(Ordering::SeqCst), 1);

        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Tide Pup"));
        assert!(html.contains("Bubble Hug"));
        assert!(html.contains("💧"));
        assert!(html.contains(&format!("{}/image?run=", path)));

        let response = send(&state, get(&format!("{}/image", path))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&state, get(&format!("{}/export", path))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Tide Pup-card.png\""
        );

        let response = send(&state, form_post(&format!("{}/reset", path), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Who are you?"));
    }

    #[tokio::test]
    async fn test_card_failure_returns_to_start() {
        let cards = Arc::new(StubCards {
            fail: true,
            ..StubCards::default()
        });
        let images = Arc::new(StubImages::default());
        let state = test_state(cards, images.clone());
        let path = new_session(&state).await;

        send(&state, form_post(&format!("{}/unlock", path), "passcode=sloan")).await;
        for value in ["Boy", "Gold", "Brave", "Sky", "Fire"] {
            send(&state, form_post(&format!("{}/answer", path), &format!("value={}", value))).await;
        }

        wait_for_step(&state, &path, QuizStep::Style).await;
        assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_message_shown_until_reset() {
        let cards = Arc::new(StubCards {
            fail: true,
            ..StubCards::default()
        });
        let state = test_state_with_delay(cards, Arc::default(), Duration::from_secs(30));
        let path = new_session(&state).await;

        send(&state, form_post(&format!("{}/unlock", path), "passcode=sloan")).await;
        for value in ["Boy", "Gold", "Brave", "Sky", "Fire"] {
            send(&state, form_post(&format!("{}/answer", path), &format!("value={}", value))).await;
        }

        let id = path.trim_start_matches("/quiz/").to_string();
        for _ in 0..200 {
            if state.session(&id).await.is_some_and(|s| s.with_machine(|m| m.failed())) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains("Oh no! Something went wrong. Try again!"));
        assert!(html.contains(r#"data-step="generating""#));
        assert!(html.contains(r#"data-failed="true""#));
        assert!(!html.contains("Summoning your spirit animal"));
    }

    #[tokio::test]
    async fn test_late_socket_sees_finished_generation() {
        let state = test_state(Arc::default(), Arc::default());
        let path = new_session(&state).await;
        send(&state, form_post(&format!("{}/unlock", path), "passcode=sloan")).await;
        for value in ["Girl", "Blue", "Silly", "Ocean", "Water"] {
            send(&state, form_post(&format!("{}/answer", path), &format!("value={}", value))).await;
        }

        // The page was rendered while generation was still running.
        let id = path.trim_start_matches("/quiz/").to_string();
        let session = state.session(&id).await.unwrap();
        for _ in 0..200 {
            if session.image().is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let (first_frame, mut rx) = websocket::attach(&session).unwrap();
        let frame: serde_json::Value = serde_json::from_str(&first_frame).unwrap();
        assert_eq!(frame["type"], "Snapshot");
        assert_eq!(frame["data"]["step"], "display");
        assert_eq!(frame["data"]["image_pending"], false);
        assert_eq!(frame["data"]["failed"], false);
        assert!(rx.try_recv().is_err());

        // A fresh page render carries the same markers, so it would not reload.
        let html = body_text(send(&state, get(&path)).await).await;
        assert!(html.contains(r#"data-step="display""#));
        assert!(html.contains(&format!(r#"data-run="{}""#, frame["data"]["run"])));
        assert!(html.contains(r#"data-image-pending="false""#));
    }

    #[tokio::test]
    async fn test_export_without_card_is_no_content() {
        let state = test_state(Arc::default(), Arc::default());
        let path = new_session(&state).await;
        let response = send(&state, get(&format!("{}/export", path))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
