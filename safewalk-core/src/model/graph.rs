//! Canonical graph collections and the concurrent store wrapper

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use log::{debug, info};
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};

use crate::geometry::coords_close;
use crate::{Error, MAX_DANGER_SCORE, NodeId, StreetId};

use super::{Intersection, Street};

/// The city street graph: intersections and streets with id lookup maps.
///
/// Streets are undirected; each contributes traversal in both directions
/// with identical cost. Instances are immutable snapshots except for
/// [`set_danger_score`](Self::set_danger_score), which is only reachable
/// through [`GraphStore`].
#[derive(Debug, Clone)]
pub struct CityGraph {
    pub(crate) graph: UnGraph<Intersection, Street>,
    node_ids: HashMap<NodeId, NodeIndex>,
    street_ids: HashMap<StreetId, EdgeIndex>,
}

impl CityGraph {
    /// Assembles and validates a graph from its node and edge records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] on duplicate ids, out-of-range
    /// coordinates or scores, dangling street endpoints, or street geometry
    /// that does not connect its endpoints.
    pub fn build(intersections: Vec<Intersection>, streets: Vec<Street>) -> Result<Self, Error> {
        let mut graph = UnGraph::with_capacity(intersections.len(), streets.len());
        let mut node_ids = HashMap::with_capacity(intersections.len());
        let mut street_ids = HashMap::with_capacity(streets.len());

        for node in intersections {
            validate_intersection(&node)?;
            let id = node.id.clone();
            let idx = graph.add_node(node);
            if node_ids.insert(id.clone(), idx).is_some() {
                return Err(Error::InvalidData(format!("Duplicate intersection id: {id}")));
            }
        }

        for street in streets {
            let start = *node_ids.get(&street.start).ok_or_else(|| {
                Error::InvalidData(format!(
                    "Street {} references unknown intersection: {}",
                    street.id, street.start
                ))
            })?;
            let end = *node_ids.get(&street.end).ok_or_else(|| {
                Error::InvalidData(format!(
                    "Street {} references unknown intersection: {}",
                    street.id, street.end
                ))
            })?;

            validate_street(&street, &graph[start], &graph[end])?;

            let id = street.id.clone();
            let idx = graph.add_edge(start, end, street);
            if street_ids.insert(id.clone(), idx).is_some() {
                return Err(Error::InvalidData(format!("Duplicate street id: {id}")));
            }
        }

        info!(
            "Built city graph with {} intersections and {} streets",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            node_ids,
            street_ids,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn street_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Point lookup of an intersection by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] for an unknown id.
    pub fn node(&self, id: &str) -> Result<&Intersection, Error> {
        self.node_ids
            .get(id)
            .map(|&idx| &self.graph[idx])
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    /// Point lookup of a street by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreetNotFound`] for an unknown id.
    pub fn street(&self, id: &str) -> Result<&Street, Error> {
        self.street_ids
            .get(id)
            .map(|&idx| &self.graph[idx])
            .ok_or_else(|| Error::StreetNotFound(id.to_string()))
    }

    /// All intersections, for map rendering and index construction.
    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.graph.node_weights()
    }

    /// All streets with their current danger scores, for the dashboard read.
    pub fn streets(&self) -> impl Iterator<Item = &Street> {
        self.graph.edge_weights()
    }

    /// Streets whose display name contains `name` (case-insensitive).
    ///
    /// Used to resolve incident reports that carry a parsed street name
    /// instead of an id; may match several segments of the same street.
    pub fn streets_matching(&self, name: &str) -> Vec<&Street> {
        let needle = name.to_lowercase();
        self.streets()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Sets a street's danger score, clamped to [0, 100].
    ///
    /// Only reachable through [`GraphStore::set_danger_score`]; returns the
    /// clamped value actually stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreetNotFound`] for an unknown id and
    /// [`Error::InvalidData`] for a non-finite score.
    pub(crate) fn set_danger_score(&mut self, id: &str, score: f64) -> Result<f64, Error> {
        if !score.is_finite() {
            return Err(Error::InvalidData(format!(
                "Non-finite danger score for street {id}"
            )));
        }
        let idx = *self
            .street_ids
            .get(id)
            .ok_or_else(|| Error::StreetNotFound(id.to_string()))?;
        let street = &mut self.graph[idx];
        let clamped = score.clamp(0.0, MAX_DANGER_SCORE);
        debug!(
            "Street {} danger_score: {:.1} -> {:.1}",
            street.name, street.danger_score, clamped
        );
        street.danger_score = clamped;
        Ok(clamped)
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_ids.get(id).copied()
    }

    pub(crate) fn node_at(&self, idx: NodeIndex) -> &Intersection {
        &self.graph[idx]
    }

    pub(crate) fn street_at(&self, idx: EdgeIndex) -> &Street {
        &self.graph[idx]
    }
}

fn validate_intersection(node: &Intersection) -> Result<(), Error> {
    let (lng, lat) = (node.geometry.x(), node.geometry.y());
    if !lng.is_finite() || !lat.is_finite() || lng.abs() > 180.0 || lat.abs() > 90.0 {
        return Err(Error::InvalidData(format!(
            "Intersection {} has invalid coordinates ({lng}, {lat})",
            node.id
        )));
    }
    Ok(())
}

fn validate_street(street: &Street, start: &Intersection, end: &Intersection) -> Result<(), Error> {
    if !street.distance_m.is_finite() || street.distance_m < 0.0 {
        return Err(Error::InvalidData(format!(
            "Street {} has invalid distance_m: {}",
            street.id, street.distance_m
        )));
    }
    if !street.danger_score.is_finite()
        || street.danger_score < 0.0
        || street.danger_score > MAX_DANGER_SCORE
    {
        return Err(Error::InvalidData(format!(
            "Street {} has danger_score outside [0, {MAX_DANGER_SCORE}]: {}",
            street.id, street.danger_score
        )));
    }
    let coords = &street.geometry.0;
    if coords.len() < 2 {
        return Err(Error::InvalidData(format!(
            "Street {} geometry needs at least 2 coordinates",
            street.id
        )));
    }
    // The geometry must connect the endpoint intersections, in either
    // stored orientation; the planner re-orients it per traversal.
    let first = coords[0];
    let last = coords[coords.len() - 1];
    let forward =
        coords_close(first, start.geometry.into()) && coords_close(last, end.geometry.into());
    let reversed =
        coords_close(first, end.geometry.into()) && coords_close(last, start.geometry.into());
    if !forward && !reversed {
        return Err(Error::InvalidData(format!(
            "Street {} geometry does not connect {} and {}",
            street.id, street.start, street.end
        )));
    }
    Ok(())
}

/// Concurrent owner of the canonical [`CityGraph`].
///
/// Readers take cheap point-in-time snapshots; the single mutation entry
/// point swaps a new graph in atomically, so a snapshot never observes a
/// half-applied update. A route computed concurrently with an incident
/// application may use the pre- or post-update score for that edge, never a
/// torn value.
#[derive(Debug)]
pub struct GraphStore {
    graph: RwLock<Arc<CityGraph>>,
}

impl GraphStore {
    pub fn new(graph: CityGraph) -> Self {
        Self {
            graph: RwLock::new(Arc::new(graph)),
        }
    }

    /// An immutable point-in-time view sufficient to run a full search.
    pub fn snapshot(&self) -> Arc<CityGraph> {
        Arc::clone(&self.graph.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Atomically sets a street's danger score to `clamp(score, 0, 100)`.
    ///
    /// The write clones the graph only when snapshots are outstanding, so
    /// in-flight route computations keep their own consistent view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreetNotFound`] if `street_id` does not exist.
    pub fn set_danger_score(&self, street_id: &str, score: f64) -> Result<f64, Error> {
        let mut guard = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut guard).set_danger_score(street_id, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::seed::demo_graph;

    #[test]
    fn point_lookups_fail_on_unknown_ids() {
        let graph = demo_graph();
        assert!(matches!(graph.node("nope"), Err(Error::NodeNotFound(_))));
        assert!(matches!(graph.street("nope"), Err(Error::StreetNotFound(_))));
        assert!(graph.node("pine-and-rolla").is_ok());
    }

    #[test]
    fn build_rejects_dangling_endpoint() {
        let mut streets: Vec<Street> = demo_graph().streets().cloned().collect();
        let nodes: Vec<Intersection> = demo_graph().intersections().cloned().collect();
        streets[0].start = "missing".into();
        let err = CityGraph::build(nodes, streets).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn build_rejects_out_of_range_danger() {
        let nodes: Vec<Intersection> = demo_graph().intersections().cloned().collect();
        let mut streets: Vec<Street> = demo_graph().streets().cloned().collect();
        streets[0].danger_score = 150.0;
        assert!(CityGraph::build(nodes, streets).is_err());
    }

    #[test]
    fn store_clamps_scores_and_keeps_snapshots_consistent() {
        let store = GraphStore::new(demo_graph());
        let before = store.snapshot();
        let old = before.street("state-10th-12th").unwrap().danger_score;

        assert_eq!(store.set_danger_score("state-10th-12th", 250.0).unwrap(), 100.0);
        assert_eq!(store.set_danger_score("state-10th-12th", -5.0).unwrap(), 0.0);

        // The pre-mutation snapshot still sees the original value.
        assert_eq!(before.street("state-10th-12th").unwrap().danger_score, old);
        assert_eq!(store.snapshot().street("state-10th-12th").unwrap().danger_score, 0.0);
    }

    #[test]
    fn store_rejects_unknown_street() {
        let store = GraphStore::new(demo_graph());
        assert!(matches!(
            store.set_danger_score("nope", 50.0),
            Err(Error::StreetNotFound(_))
        ));
    }

    #[test]
    fn name_matching_is_case_insensitive_substring() {
        let graph = demo_graph();
        let matches = graph.streets_matching("state st");
        assert!(!matches.is_empty());
        assert!(matches.iter().all(|s| s.name.to_lowercase().contains("state st")));
    }
}
