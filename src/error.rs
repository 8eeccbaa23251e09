use thiserror::Error;

/// Codec errors
///
/// Whatever was written into the output buffer before an error is returned
/// is unspecified and must not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The output buffer was too small, or the input to compression exceeded
    /// [MAX_INPUT_LEN](crate::MAX_INPUT_LEN).
    #[error("content too large")]
    ContentTooLarge,
    /// A back-reference pointed before the start of the output.
    #[error("invalid back-reference offset")]
    InvalidOffset,
    /// The bitstream ended in the middle of a code.
    #[error("input was truncated")]
    TruncatedInput,
    /// The call produced no output at all.
    #[error("result length is zero")]
    EmptyResult,
}

pub type Result<T> = core::result::Result<T, Error>;
