#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod buffer;
pub use buffer::*;

mod key;
pub use key::*;

mod local;
pub use local::*;

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
mod shared;
#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
pub use shared::*;

mod error;
pub use error::*;

mod policy;

#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;

mod common;
pub use common::{ArgSignature, BufferKey, BufferOptions, CallableId, DelayRange, ScheduleState};

#[cfg(test)]
mod tests;
