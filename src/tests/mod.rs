#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;

mod test_key_resolver;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod test_shared_prefix_validation;
