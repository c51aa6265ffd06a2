//! Matches the stops of a trip to the edges of its shape, then cuts the shape into one segment
//! between every pair of consecutive stops.
//!
//! Distances here are planar, measured in raw coordinate units, unlike edge lengths.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::geometry::{distance_point_to_segment, project_point_on_segment, LatLon};
use crate::graph::{Edge, EdgeID};

/// How much farther than its closest edge a stop may be while still being matched, in coordinate
/// degrees. About 11 meters at the equator.
pub const STOP_OFFSET_SLACK: f64 = 0.00010;

/// The part of a shape between two consecutive stops. Always has at least 2 points.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TripSegment {
    pub points: Vec<LatLon>,
}

/// How one stop sequence lies on one shape
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatternResult {
    /// For every edge the trip passes, the indices of the segments using it. Segment `i` runs from
    /// stop `i` to stop `i + 1`.
    pub edge_to_segments: BTreeMap<EdgeID, Vec<usize>>,
    pub segments: Vec<TripSegment>,
}

/// `polyline` and `edge_ids` describe the same shape, edge by edge. Trips with fewer than 2 stops
/// have no segments.
pub fn snap_stops(
    stops: &[LatLon],
    polyline: &[Edge],
    edge_ids: &[EdgeID],
    slack: f64,
) -> PatternResult {
    debug_assert_eq!(polyline.len(), edge_ids.len());

    let mut result = PatternResult::default();
    if stops.len() < 2 || polyline.is_empty() {
        return result;
    }

    // A shape may loop back close to itself. A stop only stops the forward scan once the scan has
    // come about as close as the stop ever gets to the shape.
    let thresholds: Vec<f64> = stops
        .iter()
        .map(|stop| closest_distance(polyline, *stop) + slack)
        .collect();

    let mut cursor = ForwardCursor::new();
    let mut prev: Option<StopMatch> = None;
    for (stop_idx, stop) in stops.iter().enumerate() {
        let threshold = if stop_idx == 0 {
            None
        } else {
            Some(thresholds[stop_idx])
        };
        let edge_idx = cursor.advance(polyline, *stop, threshold);
        let current = StopMatch::new(polyline, edge_idx, *stop);

        if let Some(prev) = prev {
            let segment_idx = stop_idx - 1;
            for idx in covered_edges(&prev, &current) {
                let segments = result
                    .edge_to_segments
                    .entry(edge_ids[idx])
                    .or_insert_with(Vec::new);
                // A looping shape may pass the same edge twice in one segment
                if segments.last() != Some(&segment_idx) {
                    segments.push(segment_idx);
                }
            }
            result
                .segments
                .push(segment_polyline(polyline, &prev, &current));
        }
        prev = Some(current);
    }
    result
}

/// Scans the polyline for stops in order. A vehicle never moves backwards along its shape, so
/// `last_matched` never decreases: each stop's scan starts at the edge where the previous stop
/// was matched.
struct ForwardCursor {
    last_matched: usize,
}

impl ForwardCursor {
    fn new() -> Self {
        Self { last_matched: 0 }
    }

    /// Returns the index of the edge matching this stop. The scan continues while the distance
    /// doesn't increase. With a threshold, it also continues while the last accepted distance is
    /// still above the threshold. The match is the last accepted edge.
    fn advance(&mut self, polyline: &[Edge], stop: LatLon, threshold: Option<f64>) -> usize {
        let mut last_distance = f64::INFINITY;
        let mut matched = polyline.len() - 1;
        for idx in self.last_matched..polyline.len() {
            let distance = stop_distance(&polyline[idx], stop);
            let too_far = threshold.map(|t| last_distance > t).unwrap_or(false);
            if distance <= last_distance || too_far {
                last_distance = distance;
            } else {
                matched = idx.saturating_sub(1).max(self.last_matched);
                break;
            }
        }
        self.last_matched = matched;
        matched
    }
}

struct StopMatch {
    edge_idx: usize,
    projected: LatLon,
    // Whether the projection sits exactly on the first or last vertex of a non-degenerate edge
    at_start: bool,
    at_end: bool,
}

impl StopMatch {
    fn new(polyline: &[Edge], edge_idx: usize, stop: LatLon) -> Self {
        let edge = &polyline[edge_idx];
        let (lat, lon) = project_point_on_segment(
            edge.start.lat,
            edge.start.lon,
            edge.end.lat,
            edge.end.lon,
            stop.lat,
            stop.lon,
        );
        let projected = LatLon::new(lat, lon);
        let degenerate = edge.start == edge.end;
        Self {
            edge_idx,
            projected,
            at_start: !degenerate && projected == edge.start,
            at_end: !degenerate && projected == edge.end,
        }
    }
}

/// Indices into the polyline of the edges a segment travels along. An edge only touched at the
/// vertex shared with its neighbor isn't included.
fn covered_edges(prev: &StopMatch, current: &StopMatch) -> RangeInclusive<usize> {
    if prev.edge_idx == current.edge_idx {
        return current.edge_idx..=current.edge_idx;
    }
    let first = if prev.at_end {
        prev.edge_idx + 1
    } else {
        prev.edge_idx
    };
    let last = if current.at_start {
        current.edge_idx - 1
    } else {
        current.edge_idx
    };
    if first > last {
        // Both stops project onto the same vertex
        return current.edge_idx..=current.edge_idx;
    }
    first..=last
}

fn segment_polyline(polyline: &[Edge], prev: &StopMatch, current: &StopMatch) -> TripSegment {
    let mut points = vec![prev.projected];
    for edge in &polyline[prev.edge_idx..current.edge_idx] {
        push_distinct(&mut points, edge.end);
    }
    push_distinct(&mut points, current.projected);
    if points.len() == 1 {
        points.push(current.projected);
    }
    TripSegment { points }
}

fn push_distinct(points: &mut Vec<LatLon>, pt: LatLon) {
    if points.last() != Some(&pt) {
        points.push(pt);
    }
}

fn stop_distance(edge: &Edge, stop: LatLon) -> f64 {
    distance_point_to_segment(
        edge.start.lat,
        edge.start.lon,
        edge.end.lat,
        edge.end.lon,
        stop.lat,
        stop.lon,
    )
}

fn closest_distance(polyline: &[Edge], stop: LatLon) -> f64 {
    polyline
        .iter()
        .map(|edge| stop_distance(edge, stop))
        .fold(f64::INFINITY, f64::min)
}
