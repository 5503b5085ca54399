use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A guarded statement in a batch affected no rows; the transaction was
    /// rolled back. The message is the guard message supplied by the caller.
    #[error("{0}")]
    Aborted(String),
}
