use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("no vertex with id {0} in the graph")]
    VertexNotFound(usize),
    #[error("vertex id {0} is already in the graph")]
    DuplicateVertex(usize),
    #[error("invalid graph configuration: {0}")]
    InvalidConfig(String),
}
