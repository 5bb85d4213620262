//! JSON API route handlers.
//!
//! Thin proxies in front of the provider adapters. Any failure, including an
//! unreadable request body, answers 500 with `{error, details}`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use spirit_core::quiz::model::AnswerSet;
use tracing::{error, info};

use crate::state::AppState;

const CARD_ERROR: &str = "Failed to generate spirit animal card";
const IMAGE_ERROR: &str = "Failed to generate spirit animal image";

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[derive(Deserialize)]
pub struct GenerateImageRequest {
    #[serde(rename = "imagePrompt")]
    pub image_prompt: String,
}

fn failure(error: &str, details: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// POST /api/generate-card - Generate card content from five answers.
pub async fn generate_card(
    State(state): State<AppState>,
    body: Result<Json<AnswerSet>, JsonRejection>,
) -> Response {
    let Json(answers) = match body {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Error generating card: bad request body");
            return failure(CARD_ERROR, e.body_text());
        }
    };

    match state.generators.cards.generate_card(&answers).await {
        Ok(card) => {
            info!(name = %card.name, element = %card.element, "Card generated");
            Json(card).into_response()
        }
        Err(e) => {
            error!(error = %e, "Error generating card");
            failure(CARD_ERROR, e.to_string())
        }
    }
}

/// POST /api/generate-image - Generate a PNG illustration for a card prompt.
pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<GenerateImageRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Error generating image: bad request body");
            return failure(IMAGE_ERROR, e.body_text());
        }
    };

    match state.generators.images.generate_image(&req.image_prompt).await {
        Ok(image) => {
            let length = image.bytes.len();
            info!(size = length, "Image generated");
            (
                [
                    (header::CONTENT_TYPE, image.content_type),
                    (header::CONTENT_LENGTH, length.to_string()),
                ],
                image.bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Error generating image");
            failure(IMAGE_ERROR, e.to_string())
        }
    }
}
