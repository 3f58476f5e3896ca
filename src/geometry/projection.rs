use once_cell::sync::Lazy;
use proj4rs::Proj;
use regex::Regex;

/// PROJ definition of the output CRS (EPSG:4326).
pub const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// ESRI WKT written next to exported shapefiles.
pub const WGS84_PRJ_WKT: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]";

// Hardcoded pattern, valid at compile time
#[allow(clippy::unwrap_used)]
static UTM_ZONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)UTM[_ ]zone[_ ](\d{1,2})\s*([NS])").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Invalid projection definition: {0}")]
    Definition(String),
    #[error("Unsupported coordinate reference system: {0}")]
    Unsupported(String),
    #[error("Coordinate transform failed: {0}")]
    Transform(String),
}

/// Coordinate reference system a layer is stored in.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCrs {
    Wgs84,
    Proj(String),
}

impl SourceCrs {
    /// Interpret the ESRI WKT found in a `.prj` sidecar.
    ///
    /// Only WGS84 datums are understood: geographic WGS84 is served as is and
    /// projected WGS84 UTM zones are reprojected. Anything else needs an
    /// explicit PROJ string from configuration.
    pub fn from_prj_wkt(wkt: &str) -> Result<Self, ProjectionError> {
        let wkt = wkt.trim();

        let on_wgs84 = wkt.contains("WGS_1984") || wkt.contains("WGS 84") || wkt.contains("WGS84");

        if wkt.starts_with("GEOGCS") {
            if on_wgs84 {
                return Ok(SourceCrs::Wgs84);
            }
            return Err(ProjectionError::Unsupported(format!(
                "{} (set LAYOUT_SOURCE_PROJ)",
                summarize(wkt)
            )));
        }

        if !wkt.starts_with("PROJCS") {
            return Err(ProjectionError::Unsupported(summarize(wkt)));
        }

        let zone = UTM_ZONE_PATTERN.captures(wkt);

        match (on_wgs84, zone) {
            (true, Some(caps)) => {
                let south = caps[2].eq_ignore_ascii_case("S");
                Ok(SourceCrs::Proj(format!(
                    "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
                    &caps[1],
                    if south { " +south" } else { "" }
                )))
            }
            _ => Err(ProjectionError::Unsupported(format!(
                "{} (set LAYOUT_SOURCE_PROJ)",
                summarize(wkt)
            ))),
        }
    }
}

/// Converts layer coordinates to WGS84 longitude/latitude in degrees.
pub struct Reprojector {
    source: Option<Proj>,
    source_is_geographic: bool,
    target: Proj,
}

impl Reprojector {
    pub fn new(source: &SourceCrs) -> Result<Self, ProjectionError> {
        let target = Proj::from_proj_string(WGS84_PROJ)
            .map_err(|e| ProjectionError::Definition(e.to_string()))?;

        let (source, source_is_geographic) = match source {
            SourceCrs::Wgs84 => (None, true),
            SourceCrs::Proj(definition) => {
                let proj = Proj::from_proj_string(definition)
                    .map_err(|e| ProjectionError::Definition(format!("{}: {}", definition, e)))?;
                let geographic =
                    definition.contains("+proj=longlat") || definition.contains("+proj=latlong");
                (Some(proj), geographic)
            }
        };

        Ok(Self {
            source,
            source_is_geographic,
            target,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.source.is_none()
    }

    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let Some(source) = &self.source else {
            return Ok((x, y));
        };

        // proj4rs works in radians for geographic systems
        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(source, &self.target, &mut point)
            .map_err(|e| ProjectionError::Transform(e.to_string()))?;

        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }

    /// Reproject every position of a GeoJSON geometry in place.
    pub fn reproject_value(&self, value: &mut geojson::Value) -> Result<(), ProjectionError> {
        if self.is_identity() {
            return Ok(());
        }

        match value {
            geojson::Value::Point(position) => self.reproject_position(position),
            geojson::Value::MultiPoint(positions) | geojson::Value::LineString(positions) => {
                self.reproject_positions(positions)
            }
            geojson::Value::MultiLineString(lines) | geojson::Value::Polygon(lines) => lines
                .iter_mut()
                .try_for_each(|line| self.reproject_positions(line)),
            geojson::Value::MultiPolygon(polygons) => polygons
                .iter_mut()
                .flat_map(|polygon| polygon.iter_mut())
                .try_for_each(|ring| self.reproject_positions(ring)),
            geojson::Value::GeometryCollection(geometries) => geometries
                .iter_mut()
                .try_for_each(|geometry| self.reproject_value(&mut geometry.value)),
        }
    }

    fn reproject_positions(&self, positions: &mut [Vec<f64>]) -> Result<(), ProjectionError> {
        positions
            .iter_mut()
            .try_for_each(|position| self.reproject_position(position))
    }

    fn reproject_position(&self, position: &mut Vec<f64>) -> Result<(), ProjectionError> {
        if position.len() < 2 {
            return Err(ProjectionError::Transform(
                "position has fewer than two ordinates".to_string(),
            ));
        }
        let (lng, lat) = self.transform(position[0], position[1])?;
        position[0] = lng;
        position[1] = lat;
        Ok(())
    }
}

fn summarize(wkt: &str) -> String {
    wkt.chars().take(60).collect()
}
