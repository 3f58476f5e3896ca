use crate::geometry::{self, Attribute, GeometryError, ShapeIoError};
use crate::models::cadastra::{Cadastra, CadastraDraft, CadastraForm};
use crate::models::plot::{
    ADDRESS_MAX_LEN, COMPLIANCE_STATUS_MAX_LEN, DEVELOPMENT_STATUS_MAX_LEN, LAND_USE_MAX_LEN,
    OWNER_NAME_MAX_LEN, PLOT_NUMBER_MAX_LEN,
};
use crate::repositories::{CadastraRepository, RepositoryError};
use crate::services::validation::{self, FieldError};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CadastraServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Cadastra entry {0} not found")]
    NotFound(i64),
    #[error("Shapefile export failed: {0}")]
    Export(#[from] ShapeIoError),
    #[error("Export task failed: {0}")]
    Task(String),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<FieldError> for CadastraServiceError {
    fn from(err: FieldError) -> Self {
        CadastraServiceError::Validation(err.0)
    }
}

impl From<GeometryError> for CadastraServiceError {
    fn from(err: GeometryError) -> Self {
        CadastraServiceError::Validation(err.to_string())
    }
}

pub type CadastraServiceResult<T> = Result<T, CadastraServiceError>;

/// Validate a polygon click list and return it re-encoded as compact JSON.
/// Nothing is stored.
pub fn echo_polygon(coordinates: &JsonValue) -> Result<String, GeometryError> {
    let items = geometry::ensure_min_coordinates(coordinates)?;
    Ok(JsonValue::Array(items.clone()).to_string())
}

pub struct CadastraService {
    repository: Arc<dyn CadastraRepository>,
}

impl CadastraService {
    pub fn new(repository: Arc<dyn CadastraRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_cadastra(&self, form: CadastraForm) -> CadastraServiceResult<Cadastra> {
        let draft = validate_form(form)?;
        let cadastra = self.repository.create(&draft).await?;
        tracing::info!(
            "Cadastra entry {} saved for plot {}",
            cadastra.id,
            cadastra.plot_number
        );
        Ok(cadastra)
    }

    pub async fn get_cadastra(&self, id: i64) -> CadastraServiceResult<Cadastra> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CadastraServiceError::NotFound(id))
    }

    pub async fn list_cadastra(&self) -> CadastraServiceResult<Vec<Cadastra>> {
        Ok(self.repository.list().await?)
    }

    /// Write one entry to `<dir>/cadastra_<id>.shp` with its sidecars.
    pub async fn export_shapefile(&self, id: i64, dir: &Path) -> CadastraServiceResult<PathBuf> {
        let cadastra = self.get_cadastra(id).await?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(ShapeIoError::from)?;
        let path = dir.join(format!("cadastra_{}.shp", cadastra.id));

        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            let attributes = export_attributes(&cadastra);
            geometry::write_polygon(&target, &cadastra.geom, &attributes)
        })
        .await
        .map_err(|e| CadastraServiceError::Task(e.to_string()))??;

        tracing::info!("Exported cadastra {} to {}", id, path.display());
        Ok(path)
    }
}

/// dBase field names are limited to ten characters.
fn export_attributes(cadastra: &Cadastra) -> Vec<(&'static str, Attribute)> {
    vec![
        ("plot_num", Attribute::Text(Some(cadastra.plot_number.clone()))),
        ("owner_name", Attribute::Text(Some(cadastra.owner_name.clone()))),
        ("address", Attribute::Text(Some(cadastra.address.clone()))),
        ("area_sqm", Attribute::Number(cadastra.area_sqm)),
        ("compliance", Attribute::Text(Some(cadastra.compliance_status.clone()))),
        ("land_use", Attribute::Text(cadastra.land_use.clone())),
        ("dev_status", Attribute::Text(cadastra.development_status.clone())),
        ("add_info", Attribute::Text(cadastra.additional_info.clone())),
    ]
}

/// Coordinates are checked before any other field.
fn validate_form(form: CadastraForm) -> CadastraServiceResult<CadastraDraft> {
    let geom = geometry::polygon_from_lat_lng_pairs(&form.geom)?;

    let plot_number = validation::required(form.plot_number, "plot_number", PLOT_NUMBER_MAX_LEN)?;
    let owner_name = validation::required(form.owner_name, "owner_name", OWNER_NAME_MAX_LEN)?;
    let address = validation::required(form.address, "address", ADDRESS_MAX_LEN)?;
    let area_sqm = validation::area_from_json(&form.area_sqm)?;
    let compliance_status = validation::required(
        form.compliance_status,
        "compliance_status",
        COMPLIANCE_STATUS_MAX_LEN,
    )?;
    let land_use = validation::optional(form.land_use, "land_use", Some(LAND_USE_MAX_LEN))?;
    let development_status = validation::optional(
        form.development_status,
        "development_status",
        Some(DEVELOPMENT_STATUS_MAX_LEN),
    )?;
    let additional_info = validation::optional(form.additional_info, "additional_info", None)?;

    Ok(CadastraDraft {
        plot_number,
        owner_name,
        address,
        area_sqm,
        compliance_status,
        land_use,
        development_status,
        additional_info,
        geom,
        custom_coordinates: form.geom.to_string(),
    })
}
