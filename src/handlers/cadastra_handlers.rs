use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value as JsonValue};

use crate::error::{AppError, Result};
use crate::models::CadastraForm;
use crate::services::cadastra_service;
use crate::AppState;

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Validate a clicked polygon and echo its coordinates back as a JSON string.
pub async fn save_polygon(
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<JsonValue>> {
    let body = json_body(body)?;
    let coordinates = body.get("geom").unwrap_or(&JsonValue::Null);
    let echoed = cadastra_service::echo_polygon(coordinates)?;

    Ok(Json(json!({
        "message": "Polygon coordinates received",
        "coordinates": echoed,
    })))
}

pub async fn save_cadastra(
    State(state): State<AppState>,
    body: std::result::Result<Json<CadastraForm>, JsonRejection>,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let form = json_body(body)?;
    let cadastra = state.cadastra_service.create_cadastra(form).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Cadastra entry saved successfully",
            "cadastra_id": cadastra.id,
        })),
    ))
}
