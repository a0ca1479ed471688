use crate::encoding::EncodingError;

/// Errors that reject or abort a process request.
///
/// Compiler-reported and network failures are not errors here: they come back
/// as [`crate::session::ProcessOutcome::Failed`] so the same staged set can be
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl StageError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        StageError::Precondition(msg.into())
    }
}
