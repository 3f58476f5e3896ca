use geo_types::{Coord, LineString, Polygon};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use wkt::{ToWkt, TryFromWkt};

/// WGS84 geographic coordinates. Every stored geometry uses this SRID.
pub const SRID_WGS84: i32 = 4326;

const MIN_VERTICES: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),
    #[error("Unsupported geometry type '{0}', expected Polygon")]
    UnsupportedType(String),
    #[error("At least three coordinates are required.")]
    TooFewCoordinates,
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("Unsupported SRID {0}")]
    UnsupportedSrid(i32),
    #[error("Stored geometry is unreadable: {0}")]
    Storage(String),
}

pub type GeometryResult<T> = Result<T, GeometryError>;

/// Parse a GeoJSON geometry object submitted as text (multipart form field).
pub fn polygon_from_geojson_str(raw: &str) -> GeometryResult<Polygon<f64>> {
    let value: JsonValue =
        serde_json::from_str(raw).map_err(|e| GeometryError::InvalidGeoJson(e.to_string()))?;
    polygon_from_geojson(&value)
}

/// Build a polygon from a GeoJSON geometry object in `[lng, lat]` order.
pub fn polygon_from_geojson(value: &JsonValue) -> GeometryResult<Polygon<f64>> {
    let kind = value
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| GeometryError::InvalidGeoJson("missing \"type\" member".to_string()))?;

    if kind != "Polygon" {
        return Err(GeometryError::UnsupportedType(kind.to_string()));
    }

    let geometry: geojson::Geometry = serde_json::from_value(value.clone())
        .map_err(|e| GeometryError::InvalidGeoJson(e.to_string()))?;

    match geometry.value {
        geojson::Value::Polygon(rings) => polygon_from_rings(&rings),
        _ => Err(GeometryError::UnsupportedType(kind.to_string())),
    }
}

/// Build a polygon from a flat list of `[lat, lng]` pairs.
///
/// The pairs arrive latitude first (map-click order) and are swapped into
/// `[lng, lat]` before the ring is built. Extra elements in a pair are
/// ignored.
pub fn polygon_from_lat_lng_pairs(value: &JsonValue) -> GeometryResult<Polygon<f64>> {
    let pairs = ensure_min_coordinates(value)?;

    let coords = pairs
        .iter()
        .enumerate()
        .map(|(index, pair)| {
            let items = pair.as_array().filter(|items| items.len() >= 2).ok_or_else(|| {
                GeometryError::InvalidCoordinate(format!(
                    "entry {} is not a [lat, lng] pair",
                    index
                ))
            })?;
            let lat = finite_number(&items[0], index)?;
            let lng = finite_number(&items[1], index)?;
            Ok(Coord { x: lng, y: lat })
        })
        .collect::<GeometryResult<Vec<_>>>()?;

    let exterior = LineString::from(coords);
    if distinct_vertices(&exterior) < MIN_VERTICES {
        return Err(GeometryError::TooFewCoordinates);
    }

    Ok(Polygon::new(exterior, vec![]))
}

/// Check that a submitted coordinate list holds at least three entries.
pub fn ensure_min_coordinates(value: &JsonValue) -> GeometryResult<&Vec<JsonValue>> {
    match value {
        JsonValue::Array(items) if items.len() >= MIN_VERTICES => Ok(items),
        JsonValue::Array(_) | JsonValue::Null => Err(GeometryError::TooFewCoordinates),
        _ => Err(GeometryError::InvalidCoordinate(
            "expected a list of coordinates".to_string(),
        )),
    }
}

/// Serialize a polygon into the column format: `SRID=4326;POLYGON((...))`.
pub fn to_ewkt(polygon: &Polygon<f64>) -> String {
    format!("SRID={};{}", SRID_WGS84, polygon.wkt_string())
}

/// Parse a stored column value. A bare WKT string is read as SRID 4326.
pub fn from_ewkt(raw: &str) -> GeometryResult<Polygon<f64>> {
    let (srid, body) = match raw.split_once(';') {
        Some((prefix, body)) if prefix.starts_with("SRID=") => {
            let srid = prefix["SRID=".len()..]
                .trim()
                .parse::<i32>()
                .map_err(|e| GeometryError::Storage(e.to_string()))?;
            (srid, body)
        }
        _ => (SRID_WGS84, raw),
    };

    if srid != SRID_WGS84 {
        return Err(GeometryError::UnsupportedSrid(srid));
    }

    Polygon::<f64>::try_from_wkt_str(body).map_err(|e| GeometryError::Storage(e.to_string()))
}

pub fn to_geojson(polygon: &Polygon<f64>) -> geojson::Geometry {
    let rings = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
        .collect();

    geojson::Geometry::new(geojson::Value::Polygon(rings))
}

/// `serialize_with` adapter so records render their geometry as GeoJSON.
pub fn serialize_polygon<S>(polygon: &Polygon<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    to_geojson(polygon).serialize(serializer)
}

fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> GeometryResult<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| line_string_from_positions(ring));

    let exterior = rings.next().ok_or(GeometryError::TooFewCoordinates)??;
    let interiors = rings.collect::<GeometryResult<Vec<_>>>()?;

    if distinct_vertices(&exterior) < MIN_VERTICES {
        return Err(GeometryError::TooFewCoordinates);
    }

    Ok(Polygon::new(exterior, interiors))
}

fn line_string_from_positions(positions: &[Vec<f64>]) -> GeometryResult<LineString<f64>> {
    positions
        .iter()
        .enumerate()
        .map(|(index, position)| match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::InvalidCoordinate(format!(
                "position {} must hold two finite numbers",
                index
            ))),
        })
        .collect::<GeometryResult<Vec<_>>>()
        .map(LineString::from)
}

fn finite_number(value: &JsonValue, index: usize) -> GeometryResult<f64> {
    value
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or_else(|| GeometryError::InvalidCoordinate(format!("entry {} is not numeric", index)))
}

// Closing vertex is not counted.
fn distinct_vertices(ring: &LineString<f64>) -> usize {
    let coords = &ring.0;
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => coords.len() - 1,
        _ => coords.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> JsonValue {
        json!({
            "type": "Polygon",
            "coordinates": [[[-2.3, 6.1], [-2.3, 6.2], [-2.4, 6.2], [-2.4, 6.1], [-2.3, 6.1]]]
        })
    }

    #[test]
    fn test_polygon_round_trips_through_ewkt() {
        let polygon = polygon_from_geojson(&square()).unwrap();
        let stored = to_ewkt(&polygon);
        assert!(stored.starts_with("SRID=4326;POLYGON"));

        let restored = from_ewkt(&stored).unwrap();
        assert_eq!(restored, polygon);

        let geometry = serde_json::to_value(to_geojson(&restored)).unwrap();
        assert_eq!(geometry["type"], "Polygon");
        assert_eq!(geometry["coordinates"], square()["coordinates"]);
    }

    #[test]
    fn test_unclosed_ring_is_closed() {
        let polygon = polygon_from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
        }))
        .unwrap();

        assert_eq!(polygon.exterior().0.len(), 4);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn test_rejects_degenerate_ring() {
        let result = polygon_from_geojson(&json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
        }));
        assert_eq!(result, Err(GeometryError::TooFewCoordinates));
    }

    #[test]
    fn test_rejects_other_geometry_types() {
        let result = polygon_from_geojson(&json!({"type": "Point", "coordinates": [1.0, 2.0]}));
        assert_eq!(
            result,
            Err(GeometryError::UnsupportedType("Point".to_string()))
        );
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = polygon_from_geojson_str("{not json");
        assert!(matches!(result, Err(GeometryError::InvalidGeoJson(_))));
    }

    #[test]
    fn test_lat_lng_pairs_are_swapped() {
        let polygon = polygon_from_lat_lng_pairs(&json!([
            [6.1, -2.3],
            [6.2, -2.3],
            [6.2, -2.4],
            [6.1, -2.4]
        ]))
        .unwrap();

        let first = polygon.exterior().0[0];
        assert_eq!((first.x, first.y), (-2.3, 6.1));
        let third = polygon.exterior().0[2];
        assert_eq!((third.x, third.y), (-2.4, 6.2));
    }

    #[test]
    fn test_lat_lng_pairs_need_three_entries() {
        let result = polygon_from_lat_lng_pairs(&json!([[6.1, -2.3], [6.2, -2.3]]));
        assert_eq!(result, Err(GeometryError::TooFewCoordinates));

        let result = polygon_from_lat_lng_pairs(&JsonValue::Null);
        assert_eq!(result, Err(GeometryError::TooFewCoordinates));
    }

    #[test]
    fn test_lat_lng_pairs_reject_non_numeric() {
        let result = polygon_from_lat_lng_pairs(&json!([[6.1, "x"], [6.2, -2.3], [6.2, -2.4]]));
        assert!(matches!(result, Err(GeometryError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_from_ewkt_rejects_foreign_srid() {
        let result = from_ewkt("SRID=32630;POLYGON((0 0,1 0,1 1,0 0))");
        assert_eq!(result, Err(GeometryError::UnsupportedSrid(32630)));
    }

    #[test]
    fn test_from_ewkt_accepts_bare_wkt() {
        let polygon = from_ewkt("POLYGON((0 0,1 0,1 1,0 0))").unwrap();
        assert_eq!(polygon.exterior().0.len(), 4);
    }
}
