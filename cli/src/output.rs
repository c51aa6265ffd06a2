use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use gtfs::{RouteID, ServiceID, ServiceTime, StopID, TripID, DATE_FORMAT, GTFS};
use model::export;
use model::{EdgeGraph, Network};

/// Writes every JSON file into `dir`
pub fn write_all(dir: &Path, gtfs: &GTFS, network: &Network) -> Result<()> {
    fs_err::create_dir_all(dir)?;

    write_json(
        dir,
        "edges_for_graph.json",
        &export::edges_for_graph(&network.graph),
    )?;
    write_json(
        dir,
        "trips_with_stops_and_times.json",
        &export::trip_patterns(network),
    )?;
    write_json(
        dir,
        "map_hash_to_edge_id_to_trip_segment_id.json",
        &export::pattern_table(network),
    )?;
    write_json(
        dir,
        "shape_id_to_trip_service_route_ids.json",
        &export::trips_by_shape(&network.graph, &gtfs.trips),
    )?;

    write_json(dir, "route_id_to_route_information.json", &routes(gtfs))?;
    write_json(
        dir,
        "service_id_to_service_information.json",
        &services(gtfs),
    )?;
    write_json(dir, "stop_id_to_stop_information.json", &stops(gtfs))?;
    write_json(
        dir,
        "stop_name_to_list_of_stop_ids.json",
        &gtfs.stops_by_name,
    )?;
    write_json(
        dir,
        "stop_id_to_trips_with_departure_time.json",
        &gtfs.departures,
    )?;
    write_json(
        dir,
        "trip_id_to_route_id_and_list_of_stop_times_and_stop_id.json",
        &trip_stop_times(gtfs),
    )?;
    Ok(())
}

/// One LineString per edge, with its ID and length
pub fn write_geojson(dir: &Path, graph: &EdgeGraph) -> Result<()> {
    use geojson::{Feature, FeatureCollection, GeoJson};

    let mut features = Vec::new();
    for (idx, edge) in graph.edges.iter().enumerate() {
        let mut feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::LineString(vec![
                vec![edge.start.lon, edge.start.lat],
                vec![edge.end.lon, edge.end.lat],
            ]))),
            id: None,
            properties: None,
            foreign_members: None,
        };
        feature.set_property("edge_id", idx);
        feature.set_property("length_meters", edge.length_meters());
        features.push(feature);
    }

    let gj = GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    });
    let path = dir.join("edges.geojson");
    fs_err::write(&path, serde_json::to_string_pretty(&gj)?)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let path = dir.join(name);
    let file = fs_err::File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .map_err(|err| anyhow!("{}: {err}", path.display()))?;
    writer
        .flush()
        .map_err(|err| anyhow!("{}: {err}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// route_id -> `[short_name, route_type, color, text_color]`. A missing name is `""`.
fn routes(gtfs: &GTFS) -> BTreeMap<&RouteID, (&str, u16, &str, &str)> {
    gtfs.routes
        .iter()
        .map(|(id, route)| {
            (
                id,
                (
                    route.short_name.as_deref().unwrap_or(""),
                    route.route_type,
                    route.color.as_str(),
                    route.text_color.as_str(),
                ),
            )
        })
        .collect()
}

type ServiceInfo = (Vec<u8>, String, String, Vec<String>, Vec<String>);

/// service_id -> `[[weekdays, Monday = 0], start_date, end_date, [extra days], [removed days]]`
fn services(gtfs: &GTFS) -> BTreeMap<&ServiceID, ServiceInfo> {
    gtfs.calendar
        .services
        .iter()
        .map(|(id, service)| {
            (
                id,
                (
                    service.days_of_week.indices(),
                    format_date(&service.start_date),
                    format_date(&service.end_date),
                    service.extra_days.iter().map(format_date).collect(),
                    service.removed_days.iter().map(format_date).collect(),
                ),
            )
        })
        .collect()
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// stop_id -> `[name, lat, lon]`. A missing name is `""`, like in the name index.
fn stops(gtfs: &GTFS) -> BTreeMap<&StopID, (&str, f64, f64)> {
    gtfs.stops
        .iter()
        .map(|(id, stop)| (id, (stop.name.as_deref().unwrap_or(""), stop.lat, stop.lon)))
        .collect()
}

type Visit<'a> = (ServiceTime, ServiceTime, &'a StopID);

/// trip_id -> `[route_id, [[arrival, departure, stop_id], ...]]`
fn trip_stop_times(gtfs: &GTFS) -> BTreeMap<&TripID, (&RouteID, Vec<Visit>)> {
    let mut result = BTreeMap::new();
    for (trip_id, stop_times) in &gtfs.stop_times {
        let trip = match gtfs.trips.get(trip_id) {
            Some(x) => x,
            None => continue,
        };
        let visits = stop_times
            .iter()
            .map(|st| (st.arrival_time, st.departure_time, &st.stop_id))
            .collect();
        result.insert(trip_id, (&trip.route_id, visits));
    }
    result
}

#[cfg(test)]
mod tests {
    use gtfs::MemorySource;
    use model::SnapConfig;
    use serde_json::json;

    use super::*;

    fn feed() -> GTFS {
        let mut source = MemorySource::new();
        source.insert(
            "routes.txt",
            "route_id,route_short_name,route_type,route_color\nr1,1,3,FF0000\nr2,,0,\n",
        );
        source.insert(
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             weekday,1,1,1,1,1,0,0,20220101,20221231\n",
        );
        source.insert(
            "calendar_dates.txt",
            "service_id,date,exception_type\nweekday,20220102,1\nweekday,20220103,2\n",
        );
        source.insert(
            "shapes.txt",
            "shape_id,shape_pt_lat,shape_pt_lon\nsh,0.0,0.0\nsh,0.0,1.0\nsh,0.0,2.0\n",
        );
        source.insert(
            "trips.txt",
            "route_id,service_id,trip_id,shape_id\nr1,weekday,t1,sh\n",
        );
        source.insert(
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\na,Main St,0.0,0.0\nb,Main St,0.0,2.0\nc,,0.0,3.0\n",
        );
        source.insert(
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id\n\
             t1,23:58:00,23:59:00,a\n\
             t1,24:05:00,24:06:00,b\n",
        );
        GTFS::load(&mut source).unwrap()
    }

    #[test]
    fn auxiliary_layouts() {
        let gtfs = feed();

        assert_eq!(
            serde_json::to_value(routes(&gtfs)).unwrap(),
            json!({
                "r1": ["1", 3, "FF0000", "FFFFFF"],
                "r2": ["", 0, "777777", "FFFFFF"],
            })
        );
        assert_eq!(
            serde_json::to_value(services(&gtfs)).unwrap(),
            json!({
                "weekday": [[0, 1, 2, 3, 4], "20220101", "20221231", ["20220102"], ["20220103"]],
            })
        );
        assert_eq!(
            serde_json::to_value(stops(&gtfs)).unwrap(),
            json!({
                "a": ["Main St", 0.0, 0.0],
                "b": ["Main St", 0.0, 2.0],
                "c": ["", 0.0, 3.0],
            })
        );
        assert_eq!(
            serde_json::to_value(&gtfs.stops_by_name).unwrap(),
            json!({ "": ["c"], "Main St": ["a", "b"] })
        );
        assert_eq!(
            serde_json::to_value(&gtfs.departures).unwrap(),
            json!({
                "a": [["t1", "23:59:00"]],
                "b": [["t1", "24:06:00"]],
            })
        );
        assert_eq!(
            serde_json::to_value(trip_stop_times(&gtfs)).unwrap(),
            json!({
                "t1": ["r1", [
                    [["23:58:00", false], ["23:59:00", false], "a"],
                    [["00:05:00", true], ["00:06:00", true], "b"],
                ]],
            })
        );
    }

    #[test]
    fn writes_every_file() {
        let gtfs = feed();
        let network = Network::build(&gtfs, &SnapConfig::default());
        let dir = std::env::temp_dir().join(format!("gtfs_graph_test_{}", std::process::id()));

        write_all(&dir, &gtfs, &network).unwrap();
        write_geojson(&dir, &network.graph).unwrap();

        let trips: serde_json::Value = serde_json::from_str(
            &fs_err::read_to_string(dir.join("trips_with_stops_and_times.json")).unwrap(),
        )
        .unwrap();
        let hash = network.trips[&TripID::from("t1")].pattern.0;
        assert_eq!(trips, json!({ "t1": [hash, "weekday"] }));

        for name in [
            "edges_for_graph.json",
            "map_hash_to_edge_id_to_trip_segment_id.json",
            "route_id_to_route_information.json",
            "service_id_to_service_information.json",
            "stop_id_to_stop_information.json",
            "stop_name_to_list_of_stop_ids.json",
            "stop_id_to_trips_with_departure_time.json",
            "trip_id_to_route_id_and_list_of_stop_times_and_stop_id.json",
            "shape_id_to_trip_service_route_ids.json",
            "edges.geojson",
        ] {
            assert!(dir.join(name).is_file(), "{name} missing");
        }
        fs_err::remove_dir_all(&dir).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_is_an_error() {
        let dir = std::env::temp_dir().join(format!("gtfs_graph_full_{}", std::process::id()));
        fs_err::create_dir_all(&dir).unwrap();
        let path = dir.join("small.json");
        let _ = fs_err::remove_file(&path);
        // Every write to /dev/full fails with ENOSPC
        std::os::unix::fs::symlink("/dev/full", &path).unwrap();

        let err = write_json(&dir, "small.json", &vec![1, 2, 3])
            .err()
            .unwrap();
        assert!(err.to_string().contains("small.json"), "{err}");
        fs_err::remove_dir_all(&dir).unwrap();
    }
}
