//! Built-in demo graph
//!
//! A small campus-area street grid (Rolla, MO) so the service can route
//! immediately after startup with no data file. Also serves as the fixture
//! graph for tests.

use geo::{LineString, Point};

use crate::model::{CityGraph, Intersection, Street};

const INTERSECTIONS: [(&str, &str, f64, f64, &[&str]); 6] = [
    ("pine-and-rolla", "Pine St & Rolla St", -91.7713, 37.9554, &["campus", "well_lit"]),
    ("pine-and-state", "Pine St & State St", -91.7743, 37.9554, &["campus"]),
    ("tenth-and-rolla", "10th St & Rolla St", -91.7713, 37.9530, &["well_lit"]),
    ("tenth-and-state", "10th St & State St", -91.7743, 37.9530, &[]),
    ("twelfth-and-rolla", "12th St & Rolla St", -91.7713, 37.9505, &["residential"]),
    ("twelfth-and-state", "12th St & State St", -91.7743, 37.9505, &["residential", "dimly_lit"]),
];

// (id, name, start, end, distance_m, danger_score, is_accessible)
const STREETS: [(&str, &str, usize, usize, f64, f64, bool); 7] = [
    ("pine-rolla-state", "Pine St (Rolla→State)", 0, 1, 280.0, 5.0, true),
    ("rolla-pine-10th", "Rolla St (Pine→10th)", 0, 2, 270.0, 10.0, true),
    ("state-pine-10th", "State St (Pine→10th)", 1, 3, 270.0, 15.0, true),
    ("tenth-rolla-state", "10th St (Rolla→State)", 2, 3, 280.0, 8.0, true),
    // No curb cuts along this stretch.
    ("rolla-10th-12th", "Rolla St (10th→12th)", 2, 4, 280.0, 20.0, false),
    ("state-10th-12th", "State St (10th→12th)", 3, 5, 280.0, 65.0, true),
    ("twelfth-rolla-state", "12th St (Rolla→State)", 4, 5, 280.0, 40.0, true),
];

/// Builds the demo graph. The seed data is static and valid by
/// construction.
pub fn demo_graph() -> CityGraph {
    let intersections: Vec<Intersection> = INTERSECTIONS
        .iter()
        .map(|&(id, name, lng, lat, tags)| Intersection {
            id: id.to_string(),
            name: name.to_string(),
            geometry: Point::new(lng, lat),
            tags: tags.iter().map(ToString::to_string).collect(),
        })
        .collect();

    let streets = STREETS
        .iter()
        .map(|&(id, name, start, end, distance_m, danger_score, is_accessible)| {
            let a = &INTERSECTIONS[start];
            let b = &INTERSECTIONS[end];
            Street {
                id: id.to_string(),
                name: name.to_string(),
                start: a.0.to_string(),
                end: b.0.to_string(),
                geometry: LineString::from(vec![(a.2, a.3), (b.2, b.3)]),
                distance_m,
                danger_score,
                is_accessible,
            }
        })
        .collect();

    CityGraph::build(intersections, streets).expect("seed graph data is statically valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_graph_matches_seed_dimensions() {
        let graph = demo_graph();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.street_count(), 7);
        assert_eq!(graph.street("state-10th-12th").unwrap().danger_score, 65.0);
        assert!(!graph.street("rolla-10th-12th").unwrap().is_accessible);
    }
}
