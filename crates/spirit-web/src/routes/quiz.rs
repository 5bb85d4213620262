//! Quiz page route handlers.
//!
//! Every mutation is a form POST answered with a redirect back to the quiz
//! page, which renders whatever step the session is in. Asynchronous progress
//! reaches the browser over the session WebSocket.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use spirit_core::export::{export_file_name, export_png};
use spirit_core::present::CardView;
use spirit_core::quiz::model::{Question, QuizStep};
use spirit_core::quiz::{Selection, PAINTING_MESSAGE, SUMMONING_MESSAGE};
use spirit_core::session::{QuizSession, SessionSnapshot};
use spirit_core::SpiritError;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::state::AppState;

const WRONG_PASSCODE: &str = "Hmm, that's not it! Try again.";

// ============================================================
// TEMPLATES
// ============================================================

#[derive(Template)]
#[template(path = "gate.html")]
struct GateTemplate {
    session_id: String,
    snapshot: SessionSnapshot,
    error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "question.html")]
struct QuestionTemplate {
    session_id: String,
    snapshot: SessionSnapshot,
    title: &'static str,
    icon: &'static str,
    progress: Vec<ProgressDot>,
    options: Vec<OptionView>,
    can_go_back: bool,
}

#[derive(Template)]
#[template(path = "generating.html")]
struct GeneratingTemplate {
    session_id: String,
    snapshot: SessionSnapshot,
    message: &'static str,
    failed: bool,
}

#[derive(Template)]
#[template(path = "display.html")]
struct DisplayTemplate {
    session_id: String,
    snapshot: SessionSnapshot,
    card: CardView,
    image_pending: bool,
    painting_message: &'static str,
}

struct ProgressDot {
    done: bool,
    current: bool,
}

struct OptionView {
    value: &'static str,
    selected: bool,
}

fn progress(current: Question) -> Vec<ProgressDot> {
    Question::ALL
        .iter()
        .map(|q| ProgressDot {
            done: q.index() < current.index(),
            current: q.index() == current.index(),
        })
        .collect()
}

// ============================================================
// REQUEST TYPES
// ============================================================

#[derive(Deserialize)]
pub struct UnlockForm {
    pub passcode: String,
}

#[derive(Deserialize)]
pub struct AnswerForm {
    pub value: String,
}

// ============================================================
// HANDLERS
// ============================================================

/// GET / - Start a new quiz session.
pub async fn index(State(state): State<AppState>) -> Response {
    let session = state.create_session().await;
    info!(session = %session.id(), "Quiz session created");
    Redirect::to(&quiz_path(session.id())).into_response()
}

/// GET /quiz/{id} - Render the page for the session's current step.
pub async fn page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let session = match find(&state, &id).await {
        Ok(s) => s,
        Err(r) => return r,
    };
    render_page(&session, None)
}

/// POST /quiz/{id}/unlock - Check the shared passcode.
pub async fn unlock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<UnlockForm>,
) -> Response {
    let session = match find(&state, &id).await {
        Ok(s) => s,
        Err(r) => return r,
    };

    match session.unlock(&form.passcode) {
        Ok(()) => Redirect::to(&quiz_path(&id)).into_response(),
        Err(SpiritError::WrongPasscode) => {
            debug!(session = %id, "Wrong passcode");
            render_page(&session, Some(WRONG_PASSCODE))
        }
        Err(e) => (StatusCode::BAD_REQUEST, Html(format!("Error: {}", e))).into_response(),
    }
}

/// POST /quiz/{id}/answer - Answer the current question.
pub async fn answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AnswerForm>,
) -> Response {
    let session = match find(&state, &id).await {
        Ok(s) => s,
        Err(r) => return r,
    };

    match session.select(&form.value) {
        Ok(Selection::Advanced(_)) => {}
        Ok(Selection::Generate(ticket)) => {
            let session = session.clone();
            tokio::spawn(async move {
                let outcome = session.generate(ticket).await;
                debug!(session = %session.id(), ?outcome, "Generation finished");
            });
        }
        Err(e) => return (StatusCode::BAD_REQUEST, Html(format!("Error: {}", e))).into_response(),
    }

    Redirect::to(&quiz_path(&id)).into_response()
}

/// POST /quiz/{id}/back - Return to the previous question.
pub async fn back(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let session = match find(&state, &id).await {
        Ok(s) => s,
        Err(r) => return r,
    };

    if let Err(e) = session.back() {
        return (StatusCode::BAD_REQUEST, Html(format!("Error: {}", e))).into_response();
    }
    Redirect::to(&quiz_path(&id)).into_response()
}

/// POST /quiz/{id}/reset - Create another card.
pub async fn reset(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let session = match find(&state, &id).await {
        Ok(s) => s,
        Err(r) => return r,
    };

    if let Err(e) = session.reset() {
        return (StatusCode::BAD_REQUEST, Html(format!("Error: {}", e))).into_response();
    }
    Redirect::to(&quiz_path(&id)).into_response()
}

/// GET /quiz/{id}/image - The card illustration, once painted.
pub async fn image(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.session(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match session.image() {
        Some(image) => (
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            image.bytes,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /quiz/{id}/export - Download the card as a PNG snapshot.
///
/// Export failures are only logged; the browser gets `204 No Content`.
pub async fn export(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.session(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let Some(card) = session.with_machine(|m| m.card().cloned()) else {
        warn!(session = %id, "Export requested without a card");
        return StatusCode::NO_CONTENT.into_response();
    };
    let image = session.image();
    let file_name = export_file_name(&card);

    let rendered = tokio::task::spawn_blocking(move || export_png(&card, image.as_ref())).await;

    match rendered {
        Ok(Ok(png)) => {
            info!(session = %id, file = %file_name, size = png.len(), "Card exported");
            (
                [
                    (header::CONTENT_TYPE, "image/png".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file_name),
                    ),
                ],
                png,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            warn!(session = %id, error = %e, "Download failed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!(session = %id, error = %e, "Export task failed");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

// ============================================================
// HELPERS
// ============================================================

fn quiz_path(id: &str) -> String {
    format!("/quiz/{}", id)
}

/// Unknown or expired sessions start over.
async fn find(state: &AppState, id: &str) -> Result<Arc<QuizSession>, Response> {
    match state.session(id).await {
        Some(session) => Ok(session),
        None => {
            debug!(session = %id, "Unknown session, starting over");
            Err(Redirect::to("/").into_response())
        }
    }
}

fn render_page(session: &QuizSession, gate_error: Option<&'static str>) -> Response {
    let session_id = session.id().to_string();

    let rendered = session.with_machine(|m| {
        let snapshot = SessionSnapshot {
            step: m.step(),
            run: m.run(),
            image_pending: m.image_pending(),
            failed: m.failed(),
        };
        match m.step() {
            QuizStep::Locked => GateTemplate {
                session_id,
                snapshot,
                error: gate_error,
            }
            .render(),
            QuizStep::Generating => GeneratingTemplate {
                session_id,
                snapshot,
                message: m.message().unwrap_or(SUMMONING_MESSAGE),
                failed: m.failed(),
            }
            .render(),
            QuizStep::Display => match m.card() {
                Some(card) => {
                    let image_src = m
                        .image()
                        .map(|_| format!("/quiz/{}/image?run={}", session_id, m.run()));
                    DisplayTemplate {
                        card: CardView::new(card, image_src),
                        image_pending: m.image_pending(),
                        painting_message: PAINTING_MESSAGE,
                        session_id,
                        snapshot,
                    }
                    .render()
                }
                None => Ok(String::new()),
            },
            step => match step.question() {
                Some(question) => QuestionTemplate {
                    session_id,
                    snapshot,
                    title: question.title(),
                    icon: question.icon(),
                    progress: progress(question),
                    options: question
                        .options()
                        .iter()
                        .map(|&value| OptionView {
                            value,
                            selected: m.answers().get(question) == Some(value),
                        })
                        .collect(),
                    can_go_back: question.index() > 0,
                }
                .render(),
                None => Ok(String::new()),
            },
        }
    });

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("Template error: {}", e))).into_response(),
    }
}
