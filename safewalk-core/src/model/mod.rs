//! Data model for the city street graph
//!
//! Contains the node/edge records and the canonical graph store.

pub mod components;
pub mod graph;

pub use components::{Intersection, Street};
pub use graph::{CityGraph, GraphStore};
