use std::collections::HashMap;

use axum::{
    extract::{rejection::PathRejection, Multipart, Path, State},
    http::{header, HeaderMap},
    Json,
};
use serde_json::{json, Value as JsonValue};

use crate::error::{AppError, Result};
use crate::models::{Plot, PlotForm};
use crate::services::upload_service;
use crate::AppState;

/// Text fields plus the optional `image` file of a plot form.
struct PlotSubmission {
    form: PlotForm,
    image: Option<(String, Vec<u8>)>,
}

async fn read_submission(mut multipart: Multipart) -> Result<PlotSubmission> {
    let mut fields = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid image upload: {}", e)))?;

            // Browsers send an empty part when no file was chosen
            if !file_name.is_empty() && !bytes.is_empty() {
                image = Some((file_name, bytes.to_vec()));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid field '{}': {}", name, e)))?;
        fields.insert(name, value);
    }

    Ok(PlotSubmission {
        form: PlotForm::from_fields(fields),
        image,
    })
}

/// Ids that are not integers match no plot.
fn plot_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("Not Found".to_string()))
}

/// Scheme and host the client used, unless a public base URL is configured.
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    format!("{}://{}", scheme, host)
}

async fn store_image(
    state: &AppState,
    headers: &HeaderMap,
    image: Option<(String, Vec<u8>)>,
) -> Result<Option<String>> {
    let Some((file_name, bytes)) = image else {
        return Ok(None);
    };

    let stored = state.upload_store.save(&file_name, &bytes).await?;
    Ok(stored.map(|name| upload_service::public_url(&base_url(state, headers), &name)))
}

pub async fn list_plots(State(state): State<AppState>) -> Result<Json<Vec<Plot>>> {
    Ok(Json(state.plot_service.list_plots().await?))
}

pub async fn create_plot(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<JsonValue>> {
    let submission = read_submission(multipart).await?;
    let image_path = store_image(&state, &headers, submission.image).await?;

    let plot = state
        .plot_service
        .create_plot(submission.form, image_path)
        .await?;

    Ok(Json(json!({
        "message": "Plot created successfully",
        "plot_id": plot.id,
        "plot_number": plot.plot_number,
    })))
}

pub async fn get_plot(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Plot>> {
    let id = plot_id(path)?;
    Ok(Json(state.plot_service.get_plot(id).await?))
}

pub async fn update_plot(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<JsonValue>> {
    let id = plot_id(path)?;
    let submission = read_submission(multipart).await?;

    // Missing plots are reported before anything is written to disk
    state.plot_service.get_plot(id).await?;

    let image_path = store_image(&state, &headers, submission.image).await?;
    let plot = state
        .plot_service
        .update_plot(id, submission.form, image_path)
        .await?;

    Ok(Json(json!({
        "message": "Plot updated successfully",
        "plot": plot,
    })))
}

pub async fn delete_plot(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<JsonValue>> {
    let id = plot_id(path)?;
    state.plot_service.delete_plot(id).await?;
    Ok(Json(json!({ "message": "Plot deleted successfully" })))
}
