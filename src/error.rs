use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A literal of 0 (the dimacs terminator) or one whose negation overflows.
    #[error("invalid literal {lit}")]
    InvalidLiteral { lit: i32 },

    #[error("invalid literal {lit} in clause {clause}")]
    InvalidClause { clause: usize, lit: i32 },

    /// Variables are 1-based and must fit a positive `i32`.
    #[error("invalid variable {var}")]
    InvalidVariable { var: u32 },

    /// The search was stopped by `max_recursions` or an abort hook.
    #[error("search aborted after {recursions} recursions")]
    Aborted { recursions: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
