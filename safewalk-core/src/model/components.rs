//! Street graph components - intersections and street segments

use geo::{LineString, Point};

use crate::{NodeId, StreetId};

/// Graph node: a street intersection
#[derive(Debug, Clone)]
pub struct Intersection {
    /// Stable identifier, immutable once created
    pub id: NodeId,
    /// Display name, e.g. "Pine St & Rolla St"
    pub name: String,
    /// Node coordinates (lng, lat)
    pub geometry: Point<f64>,
    /// Free-form labels describing safety-relevant features
    pub tags: Vec<String>,
}

/// Graph edge: a street segment between two intersections
///
/// Traversable in both directions. `danger_score` is the only field mutated
/// after construction, exclusively through [`super::GraphStore`].
#[derive(Debug, Clone)]
pub struct Street {
    /// Stable identifier, immutable once created
    pub id: StreetId,
    /// Display name, e.g. "Pine St (Rolla→State)"
    pub name: String,
    /// Origin intersection id
    pub start: NodeId,
    /// Destination intersection id
    pub end: NodeId,
    /// Physical path shape for visualization, not for cost
    pub geometry: LineString<f64>,
    /// Physical length in metres
    pub distance_m: f64,
    /// Dynamic danger score in [0, 100]
    pub danger_score: f64,
    /// Traversable under a wheelchair/ADA constraint
    pub is_accessible: bool,
}
