/// Error type for this crate.
///
/// Failures of the wrapped callable itself are never represented here; they
/// pass through [`Buffered::call`](crate::Buffered::call) untouched. This enum
/// only covers configuration misuse, key resolution, and backend failures.
#[derive(Debug, thiserror::Error)]
pub enum FermataError {
    /// A delay range was configured with `min > max`.
    #[error("invalid delay range: {0}")]
    InvalidDelayRange(String),

    /// A shared-store key prefix failed validation.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[error("invalid shared prefix: {0}")]
    InvalidSharedPrefix(String),

    /// Argument keying is enabled but the supplied arguments cannot be turned
    /// into a stable signature.
    #[error("cannot derive a buffer key: {0}")]
    KeyResolution(String),

    /// The schedule backend is unusable (e.g. a poisoned slot lock).
    ///
    /// Backend failures are fatal to the call; they are never downgraded to
    /// unbuffered execution.
    #[error("schedule backend failure: {0}")]
    Backend(String),

    /// Redis error from the shared backend.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
