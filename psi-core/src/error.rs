//! The crate's single error type.

/// Errors occurring during the construction or execution of the PSI protocol.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The caller supplied malformed or out-of-range input (empty set, bin
    /// index out of range, duplicate interpolation points, ...).
    InvalidInput,
    /// A message received from the other party violated the protocol
    /// (bad polynomial degree, mismatched element count, or a Merkle root
    /// that does not match the disclosed leaves/evaluations).
    ProtocolAbort,
    /// A cryptographic primitive failed in a way that cannot be the result
    /// of honest protocol execution (Elligator2 resampling exhausted its
    /// budget, a field inversion of zero was attempted).
    PrimitiveFailure,
    /// The underlying channel could not deliver or accept a message.
    ChannelFailure,
    /// A length-prefixed wire message declared more bytes, coefficients, or
    /// polynomials than the channel actually carried.
    TruncatedMessage,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInput => f.write_str("invalid input for this operation"),
            Error::ProtocolAbort => {
                f.write_str("the other party's message violates the protocol")
            }
            Error::PrimitiveFailure => f.write_str("a cryptographic primitive failed"),
            Error::ChannelFailure => f.write_str("the channel could not deliver the message"),
            Error::TruncatedMessage => {
                f.write_str("a length-prefixed message was shorter than declared")
            }
        }
    }
}
