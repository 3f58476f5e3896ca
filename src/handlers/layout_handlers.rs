use axum::{extract::State, Json};
use geojson::FeatureCollection;

use crate::error::Result;
use crate::AppState;

/// Reference layout as a WGS84 FeatureCollection. Public.
pub async fn bibiani_layout(State(state): State<AppState>) -> Result<Json<FeatureCollection>> {
    let collection = state.layout_service.load().await?;
    Ok(Json(collection))
}
