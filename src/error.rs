use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidMatrix(#[from] InvalidMatrix),

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Malformed path data. Fatal to the one string being parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid path data at offset {offset}: {kind}")]
pub struct ParseError {
    /// Byte offset into the input where parsing stopped.
    pub offset: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("expected number")]
    ExpectedNumber,

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("expected arc flag (0 or 1)")]
    ExpectedFlag,

    #[error("unknown command: {0}")]
    UnknownCommand(char),

    #[error("expected command letter")]
    ExpectedCommand,

    #[error("path data must begin with a moveto")]
    MissingMoveTo,

    #[error("odd number of coordinates in point list")]
    OddCoordinateCount,

    #[error("expected {expected} numbers, found {found}")]
    WrongValueCount { expected: usize, found: usize },
}

/// An arc that has no center parameterization. Callers recover locally,
/// so this never surfaces as a `FlattenError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DegenerateArc {
    #[error("rx and ry must be non-zero")]
    ZeroRadius,

    #[error("start point is the same as end point")]
    CoincidentEndpoints,
}

/// A matrix cell that is NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Invalid matrix: cell {index} is not finite ({value})")]
pub struct InvalidMatrix {
    pub index: usize,
    pub value: f64,
}
