use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapSearchError {
    #[error("Search query is empty")]
    EmptyQuery,
    #[error("Radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error("Coordinate out of range: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("No place candidate at index {0}")]
    UnknownCandidate(usize),
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error("Invalid contact request: {0}")]
    InvalidContact(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapSearchError>;
