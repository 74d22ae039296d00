//! Graph configuration options.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    pub directed: bool,
    pub multigraph: bool,
    pub compound: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            directed: true,
            multigraph: false,
            compound: false,
        }
    }
}

impl GraphOptions {
    pub fn multigraph() -> Self {
        Self {
            multigraph: true,
            ..Default::default()
        }
    }

    pub fn compound() -> Self {
        Self {
            multigraph: true,
            compound: true,
            ..Default::default()
        }
    }

    pub fn undirected() -> Self {
        Self {
            directed: false,
            ..Default::default()
        }
    }
}
