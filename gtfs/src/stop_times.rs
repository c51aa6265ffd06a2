use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use crate::{ServiceTime, StopID, Trip, TripID};

#[derive(Clone, Debug, PartialEq)]
pub struct StopTime {
    pub arrival_time: ServiceTime,
    pub departure_time: ServiceTime,
    pub stop_id: StopID,
}

/// Everything read from stop_times.txt
pub struct StopTimes {
    /// Per trip, in file order. `stop_sequence` is ignored; the file order is the visiting order.
    pub per_trip: BTreeMap<TripID, Vec<StopTime>>,
    /// Every departure from a stop, in file order, in GTFS form (`24:06:00` for the next day).
    /// This includes rows for trips not in trips.txt.
    pub departures: BTreeMap<StopID, Vec<(TripID, String)>>,
}

pub fn load<R: std::io::Read>(reader: R, trips: &BTreeMap<TripID, Trip>) -> Result<StopTimes> {
    let mut per_trip: BTreeMap<TripID, Vec<StopTime>> = BTreeMap::new();
    let mut departures: BTreeMap<StopID, Vec<(TripID, String)>> = BTreeMap::new();
    let mut orphans = 0;
    for rec in crate::csv_reader(reader).deserialize() {
        let rec: Record = rec?;
        let arrival_time = ServiceTime::parse(&rec.arrival_time)?;
        let departure_time = ServiceTime::parse(&rec.departure_time)?;

        departures
            .entry(rec.stop_id.clone())
            .or_insert_with(Vec::new)
            .push((rec.trip_id.clone(), departure_time.to_gtfs_string()));

        if !trips.contains_key(&rec.trip_id) {
            orphans += 1;
            continue;
        }
        per_trip
            .entry(rec.trip_id)
            .or_insert_with(Vec::new)
            .push(StopTime {
                arrival_time,
                departure_time,
                stop_id: rec.stop_id,
            });
    }

    if orphans > 0 {
        warn!("{orphans} stop times reference trips not in trips.txt");
    }

    Ok(StopTimes {
        per_trip,
        departures,
    })
}

#[derive(Deserialize)]
struct Record {
    trip_id: TripID,
    arrival_time: String,
    departure_time: String,
    stop_id: StopID,
}
