//! Cross-process schedule store, coordinated through Redis.
//!
//! Buffering state for a key lives in the coordinator, so cooperating
//! processes sharing one [`SharedScheduleStore`] buffer against each other.
//! The whole read-decide-write step of the delay policy runs as a single
//! atomic Lua script; when two freshly started processes race to initialize a
//! key, the first script to execute wins and the second is scheduled against
//! the anchor it committed.
//!
//! Timing uses the Redis server's clock (`TIME`), so cooperating processes
//! agree on "now" without synchronized host clocks.
//!
//! Coordinator failures are fatal to the call ([`FermataError::Redis`]);
//! execution is never silently downgraded to unbuffered, since the caller
//! asked for shared buffering explicitly.
//!
//! # Requirements
//!
//! - Redis >= 6.2.0
//! - Tokio or Smol (via the `redis-tokio` / `redis-smol` features)

mod shared_buffered;
pub use shared_buffered::*;

mod shared_schedule_store;
pub use shared_schedule_store::*;
