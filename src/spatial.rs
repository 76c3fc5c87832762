//! Projection of incident rows to WGS84 point geometries.

use geo::{Coord, Point, Rect};
use polars::prelude::*;

use crate::Result;

/// A locatable incident: the cleaned-frame row index and its position
/// (x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentPoint {
    pub row: usize,
    pub location: Point<f64>,
}

/// Keep the rows whose latitude and longitude are present, numeric, and
/// finite. Missing location is an expected condition, so offending rows are
/// skipped rather than failing the run.
pub fn project_points(df: &DataFrame) -> Result<Vec<IncidentPoint>> {
    let latitudes = df.column("Latitude")?.cast(&DataType::Float64)?;
    let longitudes = df.column("Longitude")?.cast(&DataType::Float64)?;

    let mut points = Vec::new();
    for (row, (latitude, longitude)) in latitudes
        .f64()?
        .into_iter()
        .zip(longitudes.f64()?.into_iter())
        .enumerate()
    {
        if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
            if latitude.is_finite() && longitude.is_finite() {
                points.push(IncidentPoint {
                    row,
                    location: Point::new(longitude, latitude),
                });
            }
        }
    }
    log::debug!("{} of {} rows carry usable coordinates", points.len(), df.height());
    Ok(points)
}

/// Extent of the projected points, for the external basemap collaborator.
pub fn bounding_box(points: &[IncidentPoint]) -> Option<Rect<f64>> {
    let first = points.first()?;
    let (mut west, mut south) = (first.location.x(), first.location.y());
    let (mut east, mut north) = (west, south);
    for point in points {
        west = west.min(point.location.x());
        east = east.max(point.location.x());
        south = south.min(point.location.y());
        north = north.max(point.location.y());
    }
    Some(Rect::new(
        Coord { x: west, y: south },
        Coord { x: east, y: north },
    ))
}
