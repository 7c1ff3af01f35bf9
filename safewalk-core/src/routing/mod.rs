//! Dual-mode shortest-path search over a graph snapshot

pub mod dijkstra;
pub mod itinerary;

pub use itinerary::{RouteResult, plan_route};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Street;

/// Cost function selector for route planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Edge cost is the street's danger score
    Safest,
    /// Edge cost is the street's physical length in metres
    Shortest,
}

impl RouteMode {
    pub(crate) fn edge_cost(self, street: &Street) -> f64 {
        match self {
            Self::Safest => street.danger_score,
            Self::Shortest => street.distance_m,
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safest => write!(f, "safest"),
            Self::Shortest => write!(f, "shortest"),
        }
    }
}
