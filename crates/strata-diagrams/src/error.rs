use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Diagram parse error ({diagram_type}): {message}")]
    DiagramParse {
        diagram_type: String,
        message: String,
        hash: ParseHash,
    },

    #[error("No diagram type detected matching given configuration for text: {text}")]
    UnknownDiagram { text: String },

    #[error(transparent)]
    Layout(#[from] strata::Error),

    #[error(transparent)]
    Graph(#[from] strata::graphlib::GraphError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(diagram_type: &str, message: impl Into<String>, hash: ParseHash) -> Self {
        Self::DiagramParse {
            diagram_type: diagram_type.to_string(),
            message: message.into(),
            hash,
        }
    }

    /// The user-facing message of a parse error, without the diagram prefix.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::DiagramParse { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Fills in the source line of an error raised away from the parser (e.g. by a database
    /// operation), unless it already has one.
    pub fn at_line(mut self, line: usize) -> Self {
        if let Self::DiagramParse { hash, .. } = &mut self {
            if hash.line == 0 {
                hash.line = line;
            }
        }
        self
    }

    pub fn hash(&self) -> Option<&ParseHash> {
        match self {
            Self::DiagramParse { hash, .. } => Some(hash),
            _ => None,
        }
    }
}

/// Where a parse or database error happened and what would have been accepted instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseHash {
    pub text: String,
    pub token: String,
    /// 1-based source line.
    pub line: usize,
    pub expected: Vec<String>,
}

impl ParseHash {
    pub fn at(line: usize, text: &str) -> Self {
        Self {
            text: text.to_string(),
            token: text.split_whitespace().next().unwrap_or_default().to_string(),
            line,
            expected: Vec::new(),
        }
    }

    pub fn expecting<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }
}
