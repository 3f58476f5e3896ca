use crate::geometry::{self, GeometryError};
use geo_types::Polygon;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

pub const PLOT_NUMBER_MAX_LEN: usize = 100;
pub const OWNER_NAME_MAX_LEN: usize = 100;
pub const ADDRESS_MAX_LEN: usize = 200;
pub const COMPLIANCE_STATUS_MAX_LEN: usize = 50;
pub const LAND_USE_MAX_LEN: usize = 100;
pub const DEVELOPMENT_STATUS_MAX_LEN: usize = 100;

/// A land parcel as returned by the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Plot {
    pub id: i64,
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub image_path: Option<String>,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    #[serde(serialize_with = "geometry::serialize_polygon")]
    pub geom: Polygon<f64>,
}

#[derive(Debug, FromRow)]
pub struct PlotRow {
    pub id: i64,
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub image_path: Option<String>,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    pub geom: String,
}

impl TryFrom<PlotRow> for Plot {
    type Error = GeometryError;

    fn try_from(row: PlotRow) -> Result<Self, Self::Error> {
        Ok(Plot {
            geom: geometry::from_ewkt(&row.geom)?,
            id: row.id,
            plot_number: row.plot_number,
            owner_name: row.owner_name,
            address: row.address,
            area_sqm: row.area_sqm,
            compliance_status: row.compliance_status,
            image_path: row.image_path,
            land_use: row.land_use,
            development_status: row.development_status,
            additional_info: row.additional_info,
        })
    }
}

/// Validated field values written on create and on full update.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotDraft {
    pub plot_number: String,
    pub owner_name: String,
    pub address: String,
    pub area_sqm: f64,
    pub compliance_status: String,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    pub geom: Polygon<f64>,
}

/// Text fields of a submitted plot form, before validation.
#[derive(Debug, Clone, Default)]
pub struct PlotForm {
    pub plot_number: Option<String>,
    pub owner_name: Option<String>,
    pub address: Option<String>,
    pub area_sqm: Option<String>,
    pub compliance_status: Option<String>,
    pub land_use: Option<String>,
    pub development_status: Option<String>,
    pub additional_info: Option<String>,
    /// GeoJSON geometry object serialized as text.
    pub geom: Option<String>,
}

impl PlotForm {
    pub fn from_fields(mut fields: HashMap<String, String>) -> Self {
        let mut take = |key: &str| fields.remove(key);

        PlotForm {
            plot_number: take("plot_number"),
            owner_name: take("owner_name"),
            address: take("address"),
            area_sqm: take("area_sqm"),
            compliance_status: take("compliance_status"),
            land_use: take("land_use"),
            development_status: take("development_status"),
            additional_info: take("additional_info"),
            geom: take("geom"),
        }
    }
}
