use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

use gtfs::{ShapeID, ShapePoint};
use serde::{Serialize, Serializer};

use crate::geometry::{great_circle_distance, LatLon};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeID(pub usize);

/// A directed piece of a shape between two consecutive points. Two edges are the same only if all
/// four coordinates are exactly equal; there's no tolerance.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub start: LatLon,
    pub end: LatLon,
}

impl Edge {
    pub fn new(start: LatLon, end: LatLon) -> Self {
        Self { start, end }
    }

    pub fn length_meters(&self) -> f64 {
        great_circle_distance(self.start.lat, self.start.lon, self.end.lat, self.end.lon)
    }

    fn coordinates(&self) -> [f64; 4] {
        [self.start.lat, self.start.lon, self.end.lat, self.end.lon]
    }
}

// Float equality, so 0.0 and -0.0 match. The hash has to agree with that.
impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.coordinates() == other.coordinates()
    }
}

// Loading a feed rejects NaN coordinates
impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for x in self.coordinates() {
            // Adding 0.0 turns -0.0 into 0.0
            (x + 0.0).to_bits().hash(state);
        }
    }
}

// Written as `[start_lat, start_lon, end_lat, end_lon]`
impl Serialize for Edge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.coordinates().serialize(serializer)
    }
}

/// Where an edge occurs: the shape and the 1-based position of the edge within that shape
pub type Provenance = (ShapeID, usize);

/// The deduplicated edges of every shape
#[derive(Default)]
pub struct EdgeGraph {
    /// Indexed by EdgeID
    pub edges: Vec<Edge>,
    /// Indexed by EdgeID. Every (shape, sequence) pair that produced the edge.
    pub provenance: Vec<Vec<Provenance>>,
    /// The shape as a sequence of edges. The same edge may occur in many shapes.
    pub shapes: BTreeMap<ShapeID, Vec<EdgeID>>,
}

impl EdgeGraph {
    pub fn build(points: &[ShapePoint]) -> Self {
        let mut builder = EdgeGraphBuilder::new();
        for pt in points {
            builder.add_point(pt);
        }
        builder.finish()
    }

    pub fn edge(&self, id: EdgeID) -> &Edge {
        &self.edges[id.0]
    }

    /// The edges of a shape, in order, with their IDs
    pub fn polyline(&self, shape_id: &ShapeID) -> Option<(Vec<Edge>, &[EdgeID])> {
        let ids = self.shapes.get(shape_id)?;
        Some((ids.iter().map(|id| self.edges[id.0]).collect(), ids))
    }
}

/// Turns shape points, fed in file order, into an EdgeGraph. IDs are assigned in the order edges
/// are first seen, so the same input always produces the same IDs.
pub struct EdgeGraphBuilder {
    graph: EdgeGraph,
    ids: HashMap<Edge, EdgeID>,
    // The previous point, if it belongs to the shape currently being read
    last: Option<(ShapeID, LatLon)>,
    sequence: usize,
}

impl EdgeGraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: EdgeGraph::default(),
            ids: HashMap::new(),
            last: None,
            sequence: 1,
        }
    }

    pub fn add_point(&mut self, pt: &ShapePoint) {
        let pos = LatLon::new(pt.lat, pt.lon);
        let prev = match self.last.take() {
            Some((shape_id, prev)) if shape_id == pt.shape_id => Some(prev),
            _ => None,
        };
        self.last = Some((pt.shape_id.clone(), pos));

        let prev = if let Some(prev) = prev {
            prev
        } else {
            // A new run of points starts
            self.sequence = 1;
            return;
        };

        let edge = Edge::new(prev, pos);
        let provenance = (pt.shape_id.clone(), self.sequence);
        self.sequence += 1;

        let id = match self.ids.get(&edge) {
            Some(id) => {
                self.graph.provenance[id.0].push(provenance);
                *id
            }
            None => {
                let id = EdgeID(self.graph.edges.len());
                self.ids.insert(edge, id);
                self.graph.edges.push(edge);
                self.graph.provenance.push(vec![provenance]);
                id
            }
        };
        self.graph
            .shapes
            .entry(pt.shape_id.clone())
            .or_insert_with(Vec::new)
            .push(id);
    }

    pub fn finish(self) -> EdgeGraph {
        self.graph
    }
}

impl Default for EdgeGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(shape: &str, lat: f64, lon: f64) -> ShapePoint {
        ShapePoint::new(shape, lat, lon)
    }

    fn ids(graph: &EdgeGraph, shape: &str) -> Vec<usize> {
        graph.shapes[&ShapeID::from(shape)]
            .iter()
            .map(|id| id.0)
            .collect()
    }

    #[test]
    fn shared_edges_are_deduplicated() {
        let graph = EdgeGraph::build(&[
            pt("a", 0.0, 0.0),
            pt("a", 0.0, 1.0),
            pt("a", 0.0, 2.0),
            pt("b", 5.0, 5.0),
            pt("b", 0.0, 1.0),
            pt("b", 0.0, 2.0),
            pt("b", 0.0, 3.0),
        ]);
        assert_eq!(graph.edges.len(), 4);
        assert_eq!(ids(&graph, "a"), vec![0, 1]);
        assert_eq!(ids(&graph, "b"), vec![2, 1, 3]);
        assert_eq!(
            graph.provenance[1],
            vec![(ShapeID::from("a"), 2), (ShapeID::from("b"), 2)]
        );
        assert_eq!(graph.provenance[3], vec![(ShapeID::from("b"), 3)]);
    }

    #[test]
    fn direction_matters() {
        let graph = EdgeGraph::build(&[
            pt("a", 0.0, 0.0),
            pt("a", 0.0, 1.0),
            pt("b", 0.0, 1.0),
            pt("b", 0.0, 0.0),
        ]);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn no_edges_across_shapes_or_for_single_points() {
        let graph = EdgeGraph::build(&[
            pt("lonely", 1.0, 1.0),
            pt("a", 0.0, 0.0),
            pt("a", 0.0, 1.0),
            pt("b", 0.0, 2.0),
        ]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edge(EdgeID(0)).start, LatLon::new(0.0, 0.0));
        assert_eq!(graph.edge(EdgeID(0)).end, LatLon::new(0.0, 1.0));
        assert!(!graph.shapes.contains_key(&ShapeID::from("lonely")));
        assert!(!graph.shapes.contains_key(&ShapeID::from("b")));
        assert!(graph.polyline(&ShapeID::from("b")).is_none());
    }

    #[test]
    fn shape_reappearing_starts_a_new_run() {
        let graph = EdgeGraph::build(&[
            pt("a", 0.0, 0.0),
            pt("a", 0.0, 1.0),
            pt("b", 9.0, 9.0),
            pt("b", 9.0, 8.0),
            pt("a", 1.0, 0.0),
            pt("a", 1.0, 1.0),
        ]);
        assert_eq!(ids(&graph, "a"), vec![0, 2]);
        assert_eq!(graph.provenance[2], vec![(ShapeID::from("a"), 1)]);
    }

    #[test]
    fn negative_zero_is_the_same_coordinate() {
        let graph = EdgeGraph::build(&[
            pt("a", 0.0, 0.0),
            pt("a", 1.0, 1.0),
            pt("b", -0.0, 0.0),
            pt("b", 1.0, 1.0),
        ]);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn ids_are_stable() {
        let points = vec![
            pt("x", 3.0, 3.0),
            pt("x", 2.0, 2.0),
            pt("y", 2.0, 2.0),
            pt("y", 3.0, 3.0),
            pt("z", 3.0, 3.0),
            pt("z", 2.0, 2.0),
            pt("z", 1.0, 1.0),
        ];
        let first = EdgeGraph::build(&points);
        let second = EdgeGraph::build(&points);
        assert_eq!(first.edges, second.edges);
        assert_eq!(first.shapes, second.shapes);
        assert_eq!(ids(&first, "z"), vec![0, 2]);
    }

    #[test]
    fn edge_length() {
        let edge = Edge::new(LatLon::new(0.0, 0.0), LatLon::new(1.0, 0.0));
        assert!((edge.length_meters() - 111_194.93).abs() < 0.1);
    }
}
