//! Spatial helpers: GeoJSON <-> stored geometry, reprojection and shapefile I/O.

pub mod bridge;
pub mod projection;
pub mod shapes;

pub use bridge::{
    ensure_min_coordinates, from_ewkt, polygon_from_geojson, polygon_from_geojson_str,
    polygon_from_lat_lng_pairs, serialize_polygon, to_ewkt, to_geojson, GeometryError,
    SRID_WGS84,
};
pub use projection::{ProjectionError, Reprojector, SourceCrs};
pub use shapes::{read_layer, write_polygon, Attribute, ShapeIoError};
