//! The serialized forms of a Network. These are consumed by other tools, so the layouts are
//! fixed: mostly positional arrays, and map keys that aren't strings are written as decimal
//! strings.

use std::collections::BTreeMap;

use gtfs::{RouteID, ServiceID, ShapeID, Trip, TripID};
use serde::Serialize;

use crate::graph::{Edge, EdgeGraph, Provenance};
use crate::network::Network;
use crate::patterns::PatternKey;
use crate::snap::TripSegment;

/// `[[start_lat, start_lon, end_lat, end_lon], length_meters, [[shape_id, sequence], ...]]`
#[derive(Serialize)]
pub struct GraphEdge<'a>(pub &'a Edge, pub f64, pub &'a [Provenance]);

/// Indexed by EdgeID
pub fn edges_for_graph(graph: &EdgeGraph) -> Vec<GraphEdge> {
    graph
        .edges
        .iter()
        .zip(graph.provenance.iter())
        .map(|(edge, provenance)| GraphEdge(edge, edge.length_meters(), provenance))
        .collect()
}

/// trip_id -> `[pattern_hash, service_id]`
pub fn trip_patterns(network: &Network) -> BTreeMap<&TripID, (PatternKey, &ServiceID)> {
    network
        .trips
        .iter()
        .map(|(trip_id, trip)| (trip_id, (trip.pattern, &trip.service_id)))
        .collect()
}

/// `[{edge_id: [segment index, ...]}, [segment polyline, ...]]`
#[derive(Serialize)]
pub struct PatternEntry<'a>(pub BTreeMap<String, &'a [usize]>, pub &'a [TripSegment]);

/// pattern_hash -> PatternEntry
pub fn pattern_table(network: &Network) -> BTreeMap<String, PatternEntry> {
    network
        .patterns
        .patterns()
        .iter()
        .map(|(key, result)| {
            let edges = result
                .edge_to_segments
                .iter()
                .map(|(edge, segments)| (edge.0.to_string(), segments.as_slice()))
                .collect();
            (
                key.0.to_string(),
                PatternEntry(edges, result.segments.as_slice()),
            )
        })
        .collect()
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ShapeEntry<'a> {
    FirstEdge(&'a Edge),
    Trip(&'a TripID, &'a ServiceID, &'a RouteID),
}

/// shape_id -> `[first edge, [trip_id, service_id, route_id], ...]`. Trips whose shape has no
/// edges are left out.
pub fn trips_by_shape<'a>(
    graph: &'a EdgeGraph,
    trips: &'a BTreeMap<TripID, Trip>,
) -> BTreeMap<&'a ShapeID, Vec<ShapeEntry<'a>>> {
    let mut result: BTreeMap<&ShapeID, Vec<ShapeEntry>> = BTreeMap::new();
    for trip in trips.values() {
        let first_edge = match graph.shapes.get(&trip.shape_id).and_then(|ids| ids.first()) {
            Some(id) => graph.edge(*id),
            None => continue,
        };
        result
            .entry(&trip.shape_id)
            .or_insert_with(|| vec![ShapeEntry::FirstEdge(first_edge)])
            .push(ShapeEntry::Trip(
                &trip.trip_id,
                &trip.service_id,
                &trip.route_id,
            ));
    }
    result
}

#[cfg(test)]
mod tests {
    use gtfs::ShapePoint;
    use serde_json::json;

    use super::*;

    #[test]
    fn graph_layout() {
        let graph = EdgeGraph::build(&[
            ShapePoint::new("a", 0.0, 0.0),
            ShapePoint::new("a", 0.0, 0.0),
            ShapePoint::new("b", 0.0, 0.0),
            ShapePoint::new("b", 0.0, 0.0),
        ]);
        let value = serde_json::to_value(edges_for_graph(&graph)).unwrap();
        assert_eq!(
            value,
            json!([[[0.0, 0.0, 0.0, 0.0], 0.0, [["a", 1], ["b", 1]]]])
        );
    }

    #[test]
    fn shape_layout() {
        let graph = EdgeGraph::build(&[
            ShapePoint::new("s", 1.0, 2.0),
            ShapePoint::new("s", 3.0, 4.0),
        ]);
        let mut trips = BTreeMap::new();
        for (trip_id, shape_id) in [("t1", "s"), ("t2", "s"), ("t3", "nope")] {
            trips.insert(
                TripID::from(trip_id),
                Trip {
                    trip_id: TripID::from(trip_id),
                    route_id: RouteID::from("r"),
                    service_id: ServiceID::from("daily"),
                    shape_id: ShapeID::from(shape_id),
                },
            );
        }
        let value = serde_json::to_value(trips_by_shape(&graph, &trips)).unwrap();
        assert_eq!(
            value,
            json!({
                "s": [[1.0, 2.0, 3.0, 4.0], ["t1", "daily", "r"], ["t2", "daily", "r"]]
            })
        );
    }
}
