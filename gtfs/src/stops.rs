use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use crate::StopID;

#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub stop_id: StopID,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<StopID, Stop>> {
    let mut stops = BTreeMap::new();
    for rec in crate::csv_reader(reader).deserialize() {
        let rec: Record = rec?;
        if stops.contains_key(&rec.stop_id) {
            bail!("Duplicate {:?}", rec.stop_id);
        }
        crate::check_coordinates(rec.stop_lat, rec.stop_lon)
            .map_err(|err| anyhow!("{:?}: {err}", rec.stop_id))?;
        stops.insert(
            rec.stop_id.clone(),
            Stop {
                stop_id: rec.stop_id,
                name: rec.stop_name,
                lat: rec.stop_lat,
                lon: rec.stop_lon,
            },
        );
    }
    Ok(stops)
}

/// Groups stop IDs by name. Stations often have one stop per platform, all sharing a name.
pub fn by_name(stops: &BTreeMap<StopID, Stop>) -> BTreeMap<String, Vec<StopID>> {
    let mut result: BTreeMap<String, Vec<StopID>> = BTreeMap::new();
    for stop in stops.values() {
        result
            .entry(stop.name.clone().unwrap_or_default())
            .or_insert_with(Vec::new)
            .push(stop.stop_id.clone());
    }
    result
}

#[derive(Deserialize)]
struct Record {
    stop_id: StopID,
    stop_name: Option<String>,
    stop_lat: f64,
    stop_lon: f64,
}
