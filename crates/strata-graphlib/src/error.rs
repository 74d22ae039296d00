pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("cannot set parent in a non-compound graph")]
    NotCompound,

    #[error("setting {parent} as parent of {child} would create a cycle")]
    ParentCycle { child: String, parent: String },

    #[error("node not found: {id}")]
    MissingNode { id: String },
}
