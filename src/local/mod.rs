//! In-process schedule store.
//!
//! Timing state lives in process memory, one store per wrapped callable
//! ([`DashMap`](dashmap::DashMap) plus a mutex per key slot). Visible to all
//! threads in the process, invisible to other processes: a forked child
//! inherits a frozen copy of the entries, not a live view, which reproduces
//! "no buffering across independent processes" as the default.
//!
//! Entries are created lazily on first call for a key and never evicted; the
//! key space of a wrapped callable is bounded by its distinct argument
//! signatures, and the store's lifetime is the wrapped callable's.

mod local_schedule_store;
pub use local_schedule_store::*;
