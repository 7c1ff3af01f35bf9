// Re-export key components
pub use crate::loading::{graph_from_raw, load_graph, seed::demo_graph};
pub use crate::model::{CityGraph, GraphStore, Intersection, Street};
pub use crate::risk::{DangerPolicy, Incident, IncidentReport, RiskUpdater};
pub use crate::routing::{RouteMode, RouteResult, plan_route};
pub use crate::spatial::SpatialIndex;

// Core types and constants
pub use crate::Error;
pub use crate::MAX_DANGER_SCORE;
pub use crate::NodeId;
pub use crate::StreetId;
