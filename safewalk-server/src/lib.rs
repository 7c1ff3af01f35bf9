//! HTTP surface for the SafeWalk routing engine
//!
//! Thin axum glue over `safewalk_core`: route queries, nearest-intersection
//! lookup, graph reads for map/dashboard rendering, and incident
//! application. All routing/consistency logic lives in the core.

pub mod api;
pub mod config;
