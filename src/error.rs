//! Error types for the MPC toolkit.

use thiserror::Error;

/// The Result type used throughout the toolkit.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the toolkit.
///
/// Four families: arithmetic errors (parameter or integrity problems, never
/// silently recovered), protocol errors (caller misuse of the sharing or
/// encryption API), transport errors (the channel is left in `Failed` state
/// and must be re-connected), and deserialization errors (fatal to the
/// current receive). None of these are recoverable by retrying the same
/// operation with the same inputs.
#[derive(Debug, Error)]
pub enum Error {
    /// No modular inverse exists: the operand shares a factor with the modulus.
    #[error("no modular inverse: operand and modulus are not coprime")]
    NoInverse,

    /// A scheme parameter failed validation (non-prime modulus, zero
    /// threshold, out-of-range secret, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Key generation did not find a usable prime pair within the retry budget.
    #[error("key generation failed after {0} attempts")]
    KeyGeneration(usize),

    /// A ciphertext failed the decryption integrity check.
    #[error("invalid ciphertext: not a well-formed encryption under this key")]
    InvalidCiphertext,

    /// Operands were produced under different public keys.
    #[error("key mismatch: operands belong to different moduli")]
    KeyMismatch,

    /// Fewer distinct shares were supplied than the scheme threshold.
    #[error("insufficient shares: got {provided}, need {required}")]
    InsufficientShares {
        /// Number of distinct-index shares supplied.
        provided: usize,
        /// The scheme threshold.
        required: usize,
    },

    /// Two supplied shares carry the same x-coordinate.
    #[error("duplicate share index {0}")]
    DuplicateShareIndex(u32),

    /// Two share sets do not cover the same x-coordinates.
    #[error("share set mismatch: {0}")]
    ShareSetMismatch(String),

    /// Establishing a channel failed (refusal, timeout, bad handshake).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The peer disconnected, or the channel is no longer usable.
    #[error("channel closed")]
    ChannelClosed,

    /// A bounded receive expired before a full message arrived.
    #[error("timed out waiting for a message")]
    ChannelTimeout,

    /// Received bytes do not match the expected wire schema or type tag.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// An underlying transport I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a deserialization error for an unexpected payload kind.
    pub(crate) fn unexpected_payload(expected: &str, got: &str) -> Self {
        Error::Deserialization(format!("expected {expected} payload, got {got}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            Error::InsufficientShares {
                provided: 1,
                required: 2
            }
            .to_string(),
            "insufficient shares: got 1, need 2"
        );
        assert_eq!(
            Error::DuplicateShareIndex(3).to_string(),
            "duplicate share index 3"
        );
        assert_eq!(
            Error::unexpected_payload("CIPHERTEXT", "SHARE").to_string(),
            "deserialization failed: expected CIPHERTEXT payload, got SHARE"
        );
    }
}
