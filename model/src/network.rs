use std::collections::BTreeMap;

use anyhow::Result;
use gtfs::{ServiceID, ShapePoint, Stop, StopID, StopTime, Trip, TripID, GTFS};

use crate::geometry::LatLon;
use crate::graph::EdgeGraph;
use crate::patterns::{PatternCache, PatternKey};
use crate::snap::STOP_OFFSET_SLACK;

#[derive(Clone, Debug)]
pub struct SnapConfig {
    /// See `STOP_OFFSET_SLACK`
    pub stop_slack: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            stop_slack: STOP_OFFSET_SLACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripPattern {
    pub pattern: PatternKey,
    pub service_id: ServiceID,
}

/// Everything derived from one feed: the shared edges, every distinct pattern, and which pattern
/// each trip follows
pub struct Network {
    pub graph: EdgeGraph,
    pub patterns: PatternCache,
    pub trips: BTreeMap<TripID, TripPattern>,
    /// Trips that couldn't be matched, with the reason
    pub skipped: Vec<(TripID, String)>,
}

impl Network {
    pub fn build(gtfs: &GTFS, config: &SnapConfig) -> Self {
        Self::from_parts(
            &gtfs.shape_points,
            &gtfs.trips,
            &gtfs.stop_times,
            &gtfs.stops,
            config,
        )
    }

    pub fn from_parts(
        shape_points: &[ShapePoint],
        trips: &BTreeMap<TripID, Trip>,
        stop_times: &BTreeMap<TripID, Vec<StopTime>>,
        stops: &BTreeMap<StopID, Stop>,
        config: &SnapConfig,
    ) -> Self {
        let graph = EdgeGraph::build(shape_points);
        info!(
            "{} shape points became {} edges across {} shapes",
            shape_points.len(),
            graph.edges.len(),
            graph.shapes.len()
        );

        let stop_locations: BTreeMap<StopID, LatLon> = stops
            .values()
            .map(|stop| (stop.stop_id.clone(), LatLon::new(stop.lat, stop.lon)))
            .collect();

        let mut network = Self {
            graph,
            patterns: PatternCache::new(config.stop_slack),
            trips: BTreeMap::new(),
            skipped: Vec::new(),
        };

        // Pattern contents don't depend on the order, but keep logs and cache counters
        // reproducible
        let mut order: Vec<&Trip> = trips.values().collect();
        order.sort_by(|a, b| a.trip_id.cmp(&b.trip_id));

        let total = order.len();
        let step = (total / 10).max(1);
        for (idx, trip) in order.into_iter().enumerate() {
            if idx > 0 && idx % step == 0 {
                info!("Matched {idx}/{total} trips ({}%)", idx * 100 / total);
            }
            match network.match_trip(trip, stop_times.get(&trip.trip_id), &stop_locations) {
                Ok(pattern) => {
                    network.trips.insert(
                        trip.trip_id.clone(),
                        TripPattern {
                            pattern,
                            service_id: trip.service_id.clone(),
                        },
                    );
                }
                Err(err) => {
                    warn!("Skipping trip {}: {}", trip.trip_id, err);
                    network.skipped.push((trip.trip_id.clone(), err.to_string()));
                }
            }
        }

        info!(
            "{} trips follow {} patterns ({} reused), {} skipped",
            network.trips.len(),
            network.patterns.len(),
            network.patterns.hits(),
            network.skipped.len()
        );
        network
    }

    fn match_trip(
        &mut self,
        trip: &Trip,
        stop_times: Option<&Vec<StopTime>>,
        stop_locations: &BTreeMap<StopID, LatLon>,
    ) -> Result<PatternKey> {
        let stop_times = match stop_times {
            Some(x) if !x.is_empty() => x,
            _ => bail!("no stop times"),
        };
        let (polyline, edge_ids) = match self.graph.polyline(&trip.shape_id) {
            Some(x) => x,
            None => bail!("shape {:?} has no edges", trip.shape_id.as_str()),
        };
        let stop_ids: Vec<StopID> = stop_times.iter().map(|st| st.stop_id.clone()).collect();
        self.patterns.lookup_or_compute(
            &trip.shape_id,
            &stop_ids,
            stop_locations,
            &polyline,
            edge_ids,
        )
    }
}
