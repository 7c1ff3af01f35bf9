//! Graph loading and seeding
//!
//! The collaborator that owns durable storage supplies the full node and
//! edge lists; this module accepts them as a JSON document and validates
//! them into a [`CityGraph`]. The wire DTOs are kept separate from the model
//! types so the file format can evolve without touching the engine.

pub mod seed;

use std::fs;
use std::path::Path;

use geo::{LineString, Point};
use log::info;
use serde::Deserialize;

use crate::Error;
use crate::geometry::haversine_distance_m;
use crate::model::{CityGraph, Intersection, Street};

#[derive(Debug, Deserialize)]
pub struct RawGraph {
    pub intersections: Vec<RawIntersection>,
    pub streets: Vec<RawStreet>,
}

#[derive(Debug, Deserialize)]
pub struct RawIntersection {
    pub id: String,
    pub name: String,
    /// `[longitude, latitude]`
    pub location: [f64; 2],
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawStreet {
    pub id: String,
    pub name: String,
    pub start_intersection_id: String,
    pub end_intersection_id: String,
    /// Array of `[longitude, latitude]` pairs
    pub geometry: Vec<[f64; 2]>,
    /// Physical length in metres; derived from the geometry when absent
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub danger_score: f64,
    #[serde(default = "default_accessible")]
    pub is_accessible: bool,
}

fn default_accessible() -> bool {
    true
}

/// Builds a validated graph from deserialized raw records.
///
/// # Errors
///
/// Returns [`Error::InvalidData`] for the violations listed on
/// [`CityGraph::build`].
pub fn graph_from_raw(raw: RawGraph) -> Result<CityGraph, Error> {
    let intersections = raw
        .intersections
        .into_iter()
        .map(|n| Intersection {
            id: n.id,
            name: n.name,
            geometry: Point::new(n.location[0], n.location[1]),
            tags: n.tags,
        })
        .collect();

    let streets = raw
        .streets
        .into_iter()
        .map(|s| {
            let geometry = LineString::from(
                s.geometry
                    .iter()
                    .map(|c| (c[0], c[1]))
                    .collect::<Vec<_>>(),
            );
            let distance_m = s
                .distance_m
                .unwrap_or_else(|| geometry_length_m(&geometry));
            Street {
                id: s.id,
                name: s.name,
                start: s.start_intersection_id,
                end: s.end_intersection_id,
                geometry,
                distance_m,
                danger_score: s.danger_score,
                is_accessible: s.is_accessible,
            }
        })
        .collect();

    CityGraph::build(intersections, streets)
}

/// Haversine length of a street geometry, summed over its segments.
fn geometry_length_m(geometry: &LineString<f64>) -> f64 {
    geometry
        .coords()
        .zip(geometry.coords().skip(1))
        .map(|(a, b)| haversine_distance_m(Point::from(*a), Point::from(*b)))
        .sum()
}

/// Loads and validates a graph from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the graph
/// data is invalid.
pub fn load_graph(path: &Path) -> Result<CityGraph, Error> {
    info!("Loading city graph from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let raw: RawGraph = serde_json::from_str(&contents)?;
    graph_from_raw(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_fixture() -> RawGraph {
        serde_json::from_str(
            r#"{
                "intersections": [
                    {"id": "a", "name": "A & B", "location": [0.0, 0.0], "tags": ["lit"]},
                    {"id": "b", "name": "B & C", "location": [0.001, 0.0]}
                ],
                "streets": [
                    {
                        "id": "ab",
                        "name": "AB Street",
                        "start_intersection_id": "a",
                        "end_intersection_id": "b",
                        "geometry": [[0.0, 0.0], [0.001, 0.0]],
                        "distance_m": 111.0,
                        "danger_score": 12.0
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn raw_graph_round_trips_into_a_city_graph() {
        let graph = graph_from_raw(raw_fixture()).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.street_count(), 1);
        let street = graph.street("ab").unwrap();
        assert_eq!(street.danger_score, 12.0);
        assert!(street.is_accessible, "accessibility defaults to true");
    }

    #[test]
    fn negative_distance_is_rejected() {
        let mut raw = raw_fixture();
        raw.streets[0].distance_m = Some(-1.0);
        assert!(matches!(graph_from_raw(raw), Err(Error::InvalidData(_))));
    }

    #[test]
    fn missing_distance_is_derived_from_geometry() {
        let mut raw = raw_fixture();
        raw.streets[0].distance_m = None;
        let graph = graph_from_raw(raw).unwrap();
        let derived = graph.street("ab").unwrap().distance_m;
        // 0.001° of longitude at the equator ≈ 111 m.
        assert!((derived - 111.0).abs() < 1.0, "got {derived}");
    }

    #[test]
    fn disconnected_geometry_is_rejected() {
        let mut raw = raw_fixture();
        raw.streets[0].geometry = vec![[5.0, 5.0], [6.0, 6.0]];
        assert!(matches!(graph_from_raw(raw), Err(Error::InvalidData(_))));
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let err = load_graph(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
