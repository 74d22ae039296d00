use crate::graphlib::GraphError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("cannot intersect rectangle at ({x}, {y}) with its own centre")]
    DegenerateIntersection { x: f64, y: f64 },

    #[error("layout graph is missing node {id}")]
    MissingNode { id: String },

    #[error("invalid layout configuration: {0}")]
    Config(#[from] serde_json::Error),
}
