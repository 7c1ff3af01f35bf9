//! Nearest-intersection lookup over an R-tree
//!
//! The index is a read-only projection of the graph's node set (id and
//! position only) and is correct as of its last rebuild. Node churn is rare,
//! so build-on-construction is the normal path; [`SpatialIndex::rebuild`]
//! replaces the tree wholesale for a future node-mutation path, letting an
//! owner build the new index and publish it atomically.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::model::CityGraph;
use crate::{Error, NodeId};

/// Entry stored in the R-tree: a `[lng, lat]` point with its node id.
#[derive(Debug, Clone)]
struct IndexedPoint {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    /// Squared planar distance in lng/lat space. Sufficient for
    /// nearest-node queries within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Maps an arbitrary (lng, lat) query point to the nearest intersection.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
}

impl SpatialIndex {
    /// Bulk-loads the index from the graph's current node set.
    pub fn build(graph: &CityGraph) -> Self {
        let points = graph
            .intersections()
            .map(|node| IndexedPoint {
                point: [node.geometry.x(), node.geometry.y()],
                id: node.id.clone(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Id of the intersection nearest to `(lng, lat)`.
    ///
    /// Equidistant candidates (within floating-point tolerance) resolve to
    /// the lexicographically smallest id, so results are deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyGraph`] if the node set is empty.
    pub fn nearest(&self, lng: f64, lat: f64) -> Result<NodeId, Error> {
        let query = [lng, lat];
        let mut candidates = self.tree.nearest_neighbor_iter(&query);
        let first = candidates.next().ok_or(Error::EmptyGraph)?;
        let best_d2 = first.distance_2(&query);
        let tolerance = best_d2 * 1e-9 + 1e-18;

        let mut best_id = &first.id;
        // The iterator is ordered by ascending distance, so ties are a
        // prefix of it.
        for candidate in candidates {
            if candidate.distance_2(&query) > best_d2 + tolerance {
                break;
            }
            if candidate.id < *best_id {
                best_id = &candidate.id;
            }
        }
        Ok(best_id.clone())
    }

    /// Discards the tree and rebuilds it from the graph's node set.
    pub fn rebuild(&mut self, graph: &CityGraph) {
        *self = Self::build(graph);
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::model::Intersection;

    fn corner_graph() -> CityGraph {
        let nodes = vec![
            Intersection {
                id: "a".into(),
                name: "A".into(),
                geometry: Point::new(0.0, 0.0),
                tags: vec![],
            },
            Intersection {
                id: "b".into(),
                name: "B".into(),
                geometry: Point::new(1.0, 1.0),
                tags: vec![],
            },
        ];
        CityGraph::build(nodes, vec![]).unwrap()
    }

    #[test]
    fn nearest_picks_the_closer_node() {
        let index = SpatialIndex::build(&corner_graph());
        assert_eq!(index.nearest(0.1, 0.1).unwrap(), "a");
        assert_eq!(index.nearest(0.9, 0.9).unwrap(), "b");
    }

    #[test]
    fn equidistant_query_resolves_to_smaller_id() {
        let index = SpatialIndex::build(&corner_graph());
        assert_eq!(index.nearest(0.5, 0.5).unwrap(), "a");
    }

    #[test]
    fn empty_graph_is_an_error() {
        let graph = CityGraph::build(vec![], vec![]).unwrap();
        let index = SpatialIndex::build(&graph);
        assert!(matches!(index.nearest(0.0, 0.0), Err(Error::EmptyGraph)));
    }

    #[test]
    fn rebuild_tracks_a_new_node_set() {
        let graph = corner_graph();
        let mut index = SpatialIndex::build(&CityGraph::build(vec![], vec![]).unwrap());
        assert!(index.is_empty());
        index.rebuild(&graph);
        assert_eq!(index.len(), 2);
        assert_eq!(index.nearest(0.0, 0.1).unwrap(), "a");
    }
}
