//! Error types for the `zeropow` crate

/// Errors applicable to configuring and running the solver
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested Equihash parameters are malformed.
    ///
    /// See [`crate::Params::new`] for the full rule set. The shipping
    /// configuration [`crate::Params::EQUIHASH_192_7`] always validates.
    #[error("invalid Equihash parameters")]
    Params,

    /// The arena allocation failed.
    ///
    /// Raised by `start()` when the system refuses the aligned region
    /// allocations. A solver without an arena refuses to solve.
    #[error("failed to allocate the solver arena")]
    Memory,

    /// `solve()` was called before `start()` allocated the arena.
    #[error("solver has not been started")]
    NotStarted,

    /// The header and nonce together exceed the hasher input limit.
    #[error("header and nonce exceed the hash input limit")]
    InputLength,
}

/// Structural failures of a reported or externally supplied solution
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SolutionError {
    /// The index list does not contain exactly `2^k` entries.
    #[error("wrong number of indices for these parameters")]
    Length,

    /// The index list is not strictly ascending.
    ///
    /// This also covers duplicate indices, which a strictly ascending
    /// list cannot contain.
    #[error("indices are not sorted in strictly ascending order")]
    Order,

    /// An index lies outside the seed space.
    #[error("index outside the seed space")]
    IndexRange,

    /// The digests selected by the indices do not XOR to zero.
    #[error("selected digests do not cancel")]
    NonZeroXor,
}
