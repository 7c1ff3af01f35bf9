//! Route planning entry point and path/geometry assembly

use geo::{Coord, LineString};
use geojson::{Feature, Geometry};
use log::debug;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde_json::{Map, json};

use crate::geometry::coords_close;
use crate::model::CityGraph;
use crate::{Error, NodeId};

use super::RouteMode;
use super::dijkstra::shortest_path_tree;

/// Computed route between two intersections; derived per request, not
/// persisted.
#[derive(Debug, Clone)]
pub struct RouteResult {
    /// Ordered intersection ids from start to end
    pub path: Vec<NodeId>,
    /// Concatenated street geometry oriented with the direction of travel
    pub geometry: LineString<f64>,
    /// Cumulative cost under the selected mode
    pub total_cost: f64,
    /// The cost mode the route was computed under
    pub mode: RouteMode,
    /// Whether non-accessible streets were excluded
    pub ada_required: bool,
    /// Streets excluded from the search by the ADA constraint
    pub hazards_bypassed: usize,
}

impl RouteResult {
    /// Path geometry as `[lng, lat]` pairs for wire encoding.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.geometry.coords().map(|c| [c.x, c.y]).collect()
    }

    /// Convert the route to a `GeoJSON` Feature for map consumers.
    pub fn to_geojson(&self) -> Feature {
        let mut properties = Map::new();
        properties.insert("path".to_string(), json!(self.path));
        properties.insert("total_cost".to_string(), json!(self.total_cost));
        properties.insert("mode".to_string(), json!(self.mode));
        properties.insert("ada_required".to_string(), json!(self.ada_required));
        properties.insert(
            "hazards_bypassed".to_string(),
            json!(self.hazards_bypassed),
        );

        Feature {
            bbox: None,
            geometry: Some(Geometry::new((&self.geometry).into())),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Computes the lowest-cost path between two intersections.
///
/// # Errors
///
/// - [`Error::EmptyGraph`] if the snapshot has no intersections.
/// - [`Error::NodeNotFound`] if `start` or `end` is absent.
/// - [`Error::Unreachable`] if no path exists in the (possibly
///   ADA-restricted) induced subgraph. Never conflated with an empty route.
pub fn plan_route(
    graph: &CityGraph,
    start: &str,
    end: &str,
    mode: RouteMode,
    ada_required: bool,
) -> Result<RouteResult, Error> {
    if graph.is_empty() {
        return Err(Error::EmptyGraph);
    }
    let start_idx = graph
        .node_index(start)
        .ok_or_else(|| Error::NodeNotFound(start.to_string()))?;
    let end_idx = graph
        .node_index(end)
        .ok_or_else(|| Error::NodeNotFound(end.to_string()))?;

    let hazards_bypassed = if ada_required {
        graph.streets().filter(|s| !s.is_accessible).count()
    } else {
        0
    };

    let tree = shortest_path_tree(graph, start_idx, Some(end_idx), mode, ada_required);

    let Some(&total_cost) = tree.distances.get(&end_idx) else {
        return Err(Error::Unreachable {
            start: start.to_string(),
            end: end.to_string(),
        });
    };

    // Follow predecessors backward from end to start.
    let mut node_path = vec![end_idx];
    let mut edge_path: Vec<EdgeIndex> = Vec::new();
    let mut current = end_idx;
    while current != start_idx {
        if let Some(&(prev, edge)) = tree.predecessors.get(&current) {
            edge_path.push(edge);
            node_path.push(prev);
            current = prev;
        } else {
            break;
        }
    }
    node_path.reverse();
    edge_path.reverse();

    let path: Vec<NodeId> = node_path
        .iter()
        .map(|&idx| graph.node_at(idx).id.clone())
        .collect();
    let geometry = assemble_geometry(graph, &node_path, &edge_path);

    debug!(
        "Route {start} -> {end} [{mode}, ada={ada_required}]: cost={total_cost:.2}, hops={}, hazards_bypassed={hazards_bypassed}",
        edge_path.len()
    );

    Ok(RouteResult {
        path,
        geometry,
        total_cost,
        mode,
        ada_required,
        hazards_bypassed,
    })
}

/// Concatenates the traversed streets' geometries, oriented with the
/// direction of travel.
///
/// A street stores its shape from its `start` to its `end` intersection; when
/// the path traverses it the other way the coordinate sequence is reversed
/// before concatenation. Shared segment endpoints collapse into one point.
fn assemble_geometry(
    graph: &CityGraph,
    node_path: &[NodeIndex],
    edge_path: &[EdgeIndex],
) -> LineString<f64> {
    if edge_path.is_empty() {
        // Trivial route: a single intersection.
        let pos = graph.node_at(node_path[0]).geometry;
        return LineString::new(vec![Coord {
            x: pos.x(),
            y: pos.y(),
        }]);
    }

    let mut coords: Vec<Coord<f64>> = Vec::new();
    for (i, &edge) in edge_path.iter().enumerate() {
        let street = graph.street_at(edge);
        let from_id = &graph.node_at(node_path[i]).id;

        let mut segment: Vec<Coord<f64>> = street.geometry.coords().copied().collect();
        if street.start != *from_id {
            segment.reverse();
        }
        coords.extend(segment);
    }
    coords.dedup_by(|a, b| coords_close(*a, *b));

    LineString::new(coords)
}
