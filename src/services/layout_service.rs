use crate::geometry::{self, ProjectionError, Reprojector, ShapeIoError, SourceCrs};
use geojson::FeatureCollection;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Shapefile not found")]
    NotFound(PathBuf),
    #[error("Shapefile is empty")]
    Empty(PathBuf),
    #[error("Failed to read shapefile: {0}")]
    Read(#[from] ShapeIoError),
    #[error("Failed to reproject layout: {0}")]
    Projection(#[from] ProjectionError),
    #[error("Failed to read projection file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Layout task failed: {0}")]
    Task(String),
}

/// Serves the reference layout shapefile as WGS84 GeoJSON.
#[derive(Debug, Clone)]
pub struct LayoutService {
    shapefile_path: PathBuf,
    source_proj: Option<String>,
}

impl LayoutService {
    pub fn new(shapefile_path: impl Into<PathBuf>, source_proj: Option<String>) -> Self {
        Self {
            shapefile_path: shapefile_path.into(),
            source_proj,
        }
    }

    pub fn shapefile_path(&self) -> &Path {
        &self.shapefile_path
    }

    pub async fn load(&self) -> Result<FeatureCollection, LayoutError> {
        let path = self.shapefile_path.clone();
        let source_proj = self.source_proj.clone();

        tokio::task::spawn_blocking(move || load_layout(&path, source_proj))
            .await
            .map_err(|e| LayoutError::Task(e.to_string()))?
    }
}

fn load_layout(path: &Path, source_proj: Option<String>) -> Result<FeatureCollection, LayoutError> {
    if !path.is_file() {
        tracing::warn!("Layout shapefile missing at {}", path.display());
        return Err(LayoutError::NotFound(path.to_path_buf()));
    }

    let mut features = geometry::read_layer(path)?;
    if features.is_empty() {
        return Err(LayoutError::Empty(path.to_path_buf()));
    }

    let source = resolve_source_crs(path, source_proj)?;
    let reprojector = Reprojector::new(&source)?;

    for feature in features.iter_mut() {
        if let Some(geometry) = feature.geometry.as_mut() {
            reprojector.reproject_value(&mut geometry.value)?;
        }
    }

    tracing::debug!(
        "Loaded {} layout features from {}",
        features.len(),
        path.display()
    );

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Configured PROJ string first, then the `.prj` sidecar, then WGS84.
fn resolve_source_crs(path: &Path, source_proj: Option<String>) -> Result<SourceCrs, LayoutError> {
    if let Some(definition) = source_proj.filter(|d| !d.trim().is_empty()) {
        return Ok(SourceCrs::Proj(definition));
    }

    let prj_path = path.with_extension("prj");
    if !prj_path.is_file() {
        return Ok(SourceCrs::Wgs84);
    }

    let wkt = std::fs::read_to_string(&prj_path)?;
    Ok(SourceCrs::from_prj_wkt(&wkt)?)
}
