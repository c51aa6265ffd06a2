//! Turns the shapes of a GTFS feed into a graph of shared edges, then cuts every trip's shape
//! into segments between its stops.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub mod export;
mod geometry;
mod graph;
mod network;
mod patterns;
mod snap;

pub use self::geometry::{
    distance_point_to_segment, great_circle_distance, project_point_on_segment, LatLon,
};
pub use self::graph::{Edge, EdgeGraph, EdgeGraphBuilder, EdgeID, Provenance};
pub use self::network::{Network, SnapConfig, TripPattern};
pub use self::patterns::{PatternCache, PatternKey};
pub use self::snap::{snap_stops, PatternResult, TripSegment, STOP_OFFSET_SLACK};
