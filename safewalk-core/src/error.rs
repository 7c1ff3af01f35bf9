use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Intersection not found: {0}")]
    NodeNotFound(String),
    #[error("Street not found: {0}")]
    StreetNotFound(String),
    #[error("No path between {start} and {end} under current constraints")]
    Unreachable { start: String, end: String },
    #[error("Graph has no intersections")]
    EmptyGraph,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
