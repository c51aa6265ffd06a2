use anyhow::Result;
use serde::Deserialize;

use crate::ShapeID;

/// One row of shapes.txt. The polyline order is the file order; `shape_pt_sequence` is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapePoint {
    pub shape_id: ShapeID,
    pub lat: f64,
    pub lon: f64,
}

impl ShapePoint {
    pub fn new<I: Into<ShapeID>>(shape_id: I, lat: f64, lon: f64) -> Self {
        Self {
            shape_id: shape_id.into(),
            lat,
            lon,
        }
    }
}

pub fn load<R: std::io::Read>(reader: R) -> Result<Vec<ShapePoint>> {
    let mut points = Vec::new();
    for rec in crate::csv_reader(reader).deserialize() {
        let rec: Record = rec?;
        crate::check_coordinates(rec.shape_pt_lat, rec.shape_pt_lon)?;
        points.push(ShapePoint {
            shape_id: rec.shape_id,
            lat: rec.shape_pt_lat,
            lon: rec.shape_pt_lon,
        });
    }
    Ok(points)
}

#[derive(Deserialize)]
struct Record {
    shape_id: ShapeID,
    shape_pt_lat: f64,
    shape_pt_lon: f64,
}
