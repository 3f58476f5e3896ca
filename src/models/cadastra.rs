use crate::geometry::{self, GeometryError};
use geo_types::Polygon;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// A cadastral entry captured from map clicks.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Cadastra {
    pub id: i64,
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    #[serde(serialize_with = "geometry::serialize_polygon")]
    pub geom: Polygon<f64>,
    /// Submitted `[lat, lng]` list, kept verbatim as JSON text.
    pub custom_coordinates: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct CadastraRow {
    pub id: i64,
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    pub geom: String,
    pub custom_coordinates: Option<String>,
}

impl TryFrom<CadastraRow> for Cadastra {
    type Error = GeometryError;

    fn try_from(row: CadastraRow) -> Result<Self, Self::Error> {
        Ok(Cadastra {
            geom: geometry::from_ewkt(&row.geom)?,
            id: row.id,
            plot_number: row.plot_number,
            owner_name: row.owner_name,
            address: row.address,
            area_sqm: row.area_sqm,
            compliance_status: row.compliance_status,
            land_use: row.land_use,
            development_status: row.development_status,
            additional_info: row.additional_info,
            custom_coordinates: row.custom_coordinates,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CadastraDraft {
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    pub geom: Polygon<f64>,
    pub custom_coordinates: String,
}

/// JSON body of `POST /save_cadastra`.
///
/// `area_sqm` is kept raw because the map client sends it as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CadastraForm {
    pub plot_number: Option<String>,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub area_sqm: JsonValue,
    pub compliance_status: Option<String>,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    #[serde(default)]
    pub geom: JsonValue,
}
