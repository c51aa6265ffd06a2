use std::collections::BTreeMap;

use anyhow::Result;
use gtfs::{ShapeID, StopID};
use serde::Serialize;

use crate::geometry::LatLon;
use crate::graph::{Edge, EdgeID};
use crate::snap::{snap_stops, PatternResult};

/// Identifies a pattern: one shape visited by one sequence of stops. Trips sharing a pattern
/// share the snapping result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PatternKey(pub u64);

impl PatternKey {
    /// Hashes the shape ID followed by every stop ID. The IDs are concatenated without any
    /// separator, so shape "A1" with stop "23" has the same key as shape "A" with stop "123".
    /// Existing output depends on these values, so don't change the encoding.
    pub fn new(shape_id: &ShapeID, stop_ids: &[StopID]) -> Self {
        let mut input = shape_id.as_str().to_string();
        for stop_id in stop_ids {
            input.push_str(stop_id.as_str());
        }
        Self(seahash::hash(input.as_bytes()))
    }
}

/// Snaps every distinct pattern once
pub struct PatternCache {
    slack: f64,
    patterns: BTreeMap<PatternKey, PatternResult>,
    hits: usize,
    misses: usize,
}

impl PatternCache {
    pub fn new(slack: f64) -> Self {
        Self {
            slack,
            patterns: BTreeMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the key of this pattern, snapping the stops if the pattern hasn't been seen yet.
    /// Fails if a stop has no known location.
    pub fn lookup_or_compute(
        &mut self,
        shape_id: &ShapeID,
        stop_ids: &[StopID],
        stop_locations: &BTreeMap<StopID, LatLon>,
        polyline: &[Edge],
        edge_ids: &[EdgeID],
    ) -> Result<PatternKey> {
        let key = PatternKey::new(shape_id, stop_ids);
        if self.patterns.contains_key(&key) {
            self.hits += 1;
            return Ok(key);
        }

        let mut stops = Vec::with_capacity(stop_ids.len());
        for stop_id in stop_ids {
            match stop_locations.get(stop_id) {
                Some(pos) => stops.push(*pos),
                None => bail!("Unknown stop {stop_id}"),
            }
        }
        let result = snap_stops(&stops, polyline, edge_ids, self.slack);
        debug!(
            "Pattern {} on shape {shape_id}: {} stops, {} segments",
            key.0,
            stops.len(),
            result.segments.len()
        );
        self.misses += 1;
        self.patterns.insert(key, result);
        Ok(key)
    }

    pub fn get(&self, key: PatternKey) -> Option<&PatternResult> {
        self.patterns.get(&key)
    }

    pub fn patterns(&self) -> &BTreeMap<PatternKey, PatternResult> {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// How many lookups reused an existing pattern
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
