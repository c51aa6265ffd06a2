use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use super::{RouteID, ServiceID, ShapeID, TripID};

#[derive(Clone, Debug, PartialEq)]
pub struct Trip {
    pub trip_id: TripID,
    pub route_id: RouteID,
    pub service_id: ServiceID,
    /// Empty if the feed doesn't give one. Such trips can't be matched to a shape.
    pub shape_id: ShapeID,
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<TripID, Trip>> {
    let mut trips = BTreeMap::new();
    for rec in crate::csv_reader(reader).deserialize() {
        let rec: Record = rec?;
        if trips.contains_key(&rec.trip_id) {
            bail!("Duplicate {:?}", rec.trip_id);
        }
        trips.insert(
            rec.trip_id.clone(),
            Trip {
                trip_id: rec.trip_id,
                route_id: rec.route_id,
                service_id: rec.service_id,
                shape_id: rec.shape_id.unwrap_or_else(|| ShapeID::new("")),
            },
        );
    }
    Ok(trips)
}

#[derive(Deserialize)]
struct Record {
    route_id: RouteID,
    service_id: ServiceID,
    trip_id: TripID,
    shape_id: Option<ShapeID>,
}
