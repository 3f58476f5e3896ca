use geo_types::Polygon;
use serde_json::{Map, Number, Value as JsonValue};
use shapefile::dbase::{self, FieldName, FieldValue, TableWriterBuilder};
use shapefile::{Point, PointM, PointZ, PolygonRing, Shape};
use std::path::Path;

use super::projection::WGS84_PRJ_WKT;

/// dBase character fields cannot exceed 254 bytes.
const MAX_CHARACTER_LEN: usize = 254;

#[derive(Debug, thiserror::Error)]
pub enum ShapeIoError {
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid attribute '{0}': {1}")]
    Attribute(String, String),
}

/// Attribute value written into the dBase table of an exported shapefile.
#[derive(Debug, Clone)]
pub enum Attribute {
    Text(Option<String>),
    Number(f64),
}

/// Read every shape of a layer as GeoJSON features (source coordinates,
/// no reprojection). Null shapes become features without geometry.
pub fn read_layer(path: &Path) -> Result<Vec<geojson::Feature>, ShapeIoError> {
    let shapes_and_records = shapefile::read(path)?;

    Ok(shapes_and_records
        .into_iter()
        .map(|(shape, record)| geojson::Feature {
            bbox: None,
            geometry: shape_to_value(&shape).map(geojson::Geometry::new),
            id: None,
            properties: Some(record_to_properties(record)),
            foreign_members: None,
        })
        .collect())
}

/// Write a single WGS84 polygon with its attributes to `path` (`.shp`),
/// alongside the `.shx`, `.dbf` and `.prj` files.
pub fn write_polygon(
    path: &Path,
    polygon: &Polygon<f64>,
    attributes: &[(&str, Attribute)],
) -> Result<(), ShapeIoError> {
    let mut table = TableWriterBuilder::new();
    let mut record = dbase::Record::default();

    for (name, attribute) in attributes {
        let field_name = FieldName::try_from(*name)
            .map_err(|e| ShapeIoError::Attribute(name.to_string(), e.to_string()))?;

        match attribute {
            Attribute::Text(text) => {
                table = table.add_character_field(field_name, MAX_CHARACTER_LEN as u8);
                let text = text
                    .as_deref()
                    .map(|t| truncate_bytes(t, MAX_CHARACTER_LEN).to_string());
                record.insert(name.to_string(), FieldValue::Character(text));
            }
            Attribute::Number(number) => {
                table = table.add_numeric_field(field_name, 18, 4);
                record.insert(name.to_string(), FieldValue::Numeric(Some(*number)));
            }
        }
    }

    let shape = to_shapefile_polygon(polygon);

    let mut writer = shapefile::Writer::from_path(path, table)?;
    writer.write_shape_and_record(&shape, &record)?;
    drop(writer);

    std::fs::write(path.with_extension("prj"), WGS84_PRJ_WKT)?;
    Ok(())
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a
/// character.
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let end = (0..=max)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    &text[..end]
}

fn to_shapefile_polygon(polygon: &Polygon<f64>) -> shapefile::Polygon {
    let ring_points = |ring: &geo_types::LineString<f64>| -> Vec<Point> {
        ring.coords().map(|c| Point::new(c.x, c.y)).collect()
    };

    let mut rings = vec![PolygonRing::Outer(ring_points(polygon.exterior()))];
    rings.extend(
        polygon
            .interiors()
            .iter()
            .map(|ring| PolygonRing::Inner(ring_points(ring))),
    );

    shapefile::Polygon::with_rings(rings)
}

trait Planar {
    fn position(&self) -> Vec<f64>;
}

impl Planar for Point {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl Planar for PointM {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl Planar for PointZ {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

fn shape_to_value(shape: &Shape) -> Option<geojson::Value> {
    match shape {
        Shape::Point(p) => Some(geojson::Value::Point(p.position())),
        Shape::PointM(p) => Some(geojson::Value::Point(p.position())),
        Shape::PointZ(p) => Some(geojson::Value::Point(p.position())),
        Shape::Polyline(line) => Some(lines_value(line.parts())),
        Shape::PolylineM(line) => Some(lines_value(line.parts())),
        Shape::PolylineZ(line) => Some(lines_value(line.parts())),
        Shape::Polygon(polygon) => Some(polygon_value(polygon.rings())),
        Shape::PolygonM(polygon) => Some(polygon_value(polygon.rings())),
        Shape::PolygonZ(polygon) => Some(polygon_value(polygon.rings())),
        Shape::Multipoint(points) => Some(points_value(points.points())),
        Shape::MultipointM(points) => Some(points_value(points.points())),
        Shape::MultipointZ(points) => Some(points_value(points.points())),
        _ => None,
    }
}

fn points_value<P: Planar>(points: &[P]) -> geojson::Value {
    geojson::Value::MultiPoint(points.iter().map(Planar::position).collect())
}

fn lines_value<P: Planar>(parts: &[Vec<P>]) -> geojson::Value {
    let mut lines: Vec<Vec<Vec<f64>>> = parts
        .iter()
        .map(|part| part.iter().map(Planar::position).collect())
        .collect();

    if lines.len() == 1 {
        geojson::Value::LineString(lines.remove(0))
    } else {
        geojson::Value::MultiLineString(lines)
    }
}

// Every outer ring opens a new polygon; inner rings attach to the latest one.
fn polygon_value<P: Planar>(rings: &[PolygonRing<P>]) -> geojson::Value {
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();

    for ring in rings {
        let positions: Vec<Vec<f64>> = ring.points().iter().map(Planar::position).collect();
        match ring {
            PolygonRing::Inner(_) if !polygons.is_empty() => {
                if let Some(last) = polygons.last_mut() {
                    last.push(positions);
                }
            }
            _ => polygons.push(vec![positions]),
        }
    }

    if polygons.len() == 1 {
        geojson::Value::Polygon(polygons.remove(0))
    } else {
        geojson::Value::MultiPolygon(polygons)
    }
}

fn record_to_properties(record: dbase::Record) -> Map<String, JsonValue> {
    record
        .into_iter()
        .map(|(name, value)| (name, field_to_json(value)))
        .collect()
}

fn field_to_json(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Character(Some(text)) => JsonValue::String(text.trim_end().to_string()),
        FieldValue::Memo(text) => JsonValue::String(text),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
            number(n)
        }
        FieldValue::Float(Some(n)) => number(f64::from(n)),
        FieldValue::Integer(n) => JsonValue::from(n),
        FieldValue::Logical(Some(flag)) => JsonValue::Bool(flag),
        FieldValue::Date(Some(date)) => JsonValue::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        _ => JsonValue::Null,
    }
}

fn number(n: f64) -> JsonValue {
    Number::from_f64(n)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}
