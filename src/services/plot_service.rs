use crate::geometry;
use crate::models::plot::{
    Plot, PlotDraft, PlotForm, ADDRESS_MAX_LEN, COMPLIANCE_STATUS_MAX_LEN,
    DEVELOPMENT_STATUS_MAX_LEN, LAND_USE_MAX_LEN, OWNER_NAME_MAX_LEN, PLOT_NUMBER_MAX_LEN,
};
use crate::repositories::{PlotRepository, RepositoryError};
use crate::services::plot_number::{PlotNumberError, PlotNumberGenerator};
use crate::services::validation::{self, FieldError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PlotServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Plot {0} not found")]
    NotFound(i64),
    #[error("Plot number already exists")]
    PlotNumberTaken { suggested: String },
    #[error("Plot numbering failed: {0}")]
    Numbering(#[from] PlotNumberError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<FieldError> for PlotServiceError {
    fn from(err: FieldError) -> Self {
        PlotServiceError::Validation(err.0)
    }
}

impl From<geometry::GeometryError> for PlotServiceError {
    fn from(err: geometry::GeometryError) -> Self {
        PlotServiceError::Validation(err.to_string())
    }
}

pub type PlotServiceResult<T> = Result<T, PlotServiceError>;

pub struct PlotService {
    repository: Arc<dyn PlotRepository>,
    numbering: PlotNumberGenerator,
}

impl PlotService {
    pub fn new(repository: Arc<dyn PlotRepository>) -> Self {
        let numbering = PlotNumberGenerator::new(repository.clone());
        Self {
            repository,
            numbering,
        }
    }

    pub async fn list_plots(&self) -> PlotServiceResult<Vec<Plot>> {
        Ok(self.repository.list().await?)
    }

    pub async fn get_plot(&self, id: i64) -> PlotServiceResult<Plot> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(PlotServiceError::NotFound(id))
    }

    /// Create a plot. A blank or missing plot number is generated.
    pub async fn create_plot(
        &self,
        form: PlotForm,
        image_path: Option<String>,
    ) -> PlotServiceResult<Plot> {
        let plot_number = match non_blank(&form.plot_number) {
            Some(number) => number,
            None => self.numbering.generate().await?,
        };

        let draft = validate_form(form, plot_number)?;

        match self.repository.create(&draft, image_path).await {
            Ok(plot) => {
                tracing::info!("Plot created successfully: {}", plot.plot_number);
                Ok(plot)
            }
            Err(RepositoryError::AlreadyExists) => Err(self.conflict(&draft.plot_number).await?),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite every field of an existing plot. `image_path` of `None`
    /// keeps the current image.
    pub async fn update_plot(
        &self,
        id: i64,
        form: PlotForm,
        image_path: Option<String>,
    ) -> PlotServiceResult<Plot> {
        self.get_plot(id).await?;

        let plot_number = non_blank(&form.plot_number)
            .ok_or_else(|| PlotServiceError::Validation("plot_number is required".to_string()))?;
        let draft = validate_form(form, plot_number)?;

        match self.repository.update(id, &draft, image_path).await {
            Ok(plot) => {
                tracing::info!("Plot updated successfully: {}", plot.plot_number);
                Ok(plot)
            }
            Err(RepositoryError::NotFound) => Err(PlotServiceError::NotFound(id)),
            Err(RepositoryError::AlreadyExists) => Err(self.conflict(&draft.plot_number).await?),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete_plot(&self, id: i64) -> PlotServiceResult<String> {
        match self.repository.delete(id).await {
            Ok(plot_number) => {
                tracing::info!("Plot deleted successfully: {}", plot_number);
                Ok(plot_number)
            }
            Err(RepositoryError::NotFound) => Err(PlotServiceError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn suggest_plot_number(&self) -> PlotServiceResult<String> {
        Ok(self.numbering.generate().await?)
    }

    async fn conflict(&self, plot_number: &str) -> PlotServiceResult<PlotServiceError> {
        let suggested = self.suggest_plot_number().await?;
        tracing::warn!(
            "Plot number {} already exists, suggesting {}",
            plot_number,
            suggested
        );
        Ok(PlotServiceError::PlotNumberTaken { suggested })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_form(form: PlotForm, plot_number: String) -> PlotServiceResult<PlotDraft> {
    let plot_number = validation::required(Some(plot_number), "plot_number", PLOT_NUMBER_MAX_LEN)?;
    let owner_name = validation::required(form.owner_name, "owner_name", OWNER_NAME_MAX_LEN)?;
    let address = validation::required(form.address, "address", ADDRESS_MAX_LEN)?;
    let area_sqm = validation::area_from_text(form.area_sqm.as_deref())?;
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

    let raw_geom = form
        .geom
        .filter(|g| !g.trim().is_empty())
        .ok_or_else(|| PlotServiceError::Validation("geom is required".to_string()))?;
    let geom = geometry::polygon_from_geojson_str(&raw_geom)?;

    Ok(PlotDraft {
        plot_number,
        owner_name,
        address,
        area_sqm,
        compliance_status,
        land_use,
        development_status,
        additional_info,
        geom,
    })
}
