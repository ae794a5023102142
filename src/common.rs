use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use crate::FermataError;

/// Nanoseconds measured from a store's epoch.
pub(crate) type Nanos = u64;

/// Identity of one wrapped callable, stable for the lifetime of the process.
///
/// Allocated once at wrap time. Clones of a wrapped callable share the id;
/// two independent wraps of structurally identical closables get distinct
/// ids, so they never buffer against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallableId(u64);

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

impl CallableId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value, used by the shared backend to name coordinator keys.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A 64-bit digest over a canonical encoding of call arguments.
///
/// Present in a [`BufferKey`] only when `key_on_arguments` is enabled. See
/// [`ArgKey`](crate::ArgKey) for the encoding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgSignature(pub(crate) u64);

impl ArgSignature {
    /// Raw digest value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Identity of a buffering lineage: the callable, optionally plus an
/// argument signature.
///
/// Two calls share a `BufferKey` iff they target the same wrapped callable
/// and, when argument keying is on, have signature-equal arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKey {
    pub(crate) callable: CallableId,
    pub(crate) args: Option<ArgSignature>,
}

impl BufferKey {
    /// The callable component of the key.
    pub fn callable(&self) -> CallableId {
        self.callable
    }

    /// The argument-signature component, if argument keying is enabled.
    pub fn args(&self) -> Option<ArgSignature> {
        self.args
    }
}

/// Per-key timing state: the instant the next delay is measured from.
///
/// The anchor, once set, is monotonically non-decreasing across calls sharing
/// a key, in lock-acquisition order. Only the schedule store's critical
/// section ever reads or writes it.
#[derive(Debug, Default)]
pub struct ScheduleState {
    pub(crate) anchor: Option<Nanos>,
}

impl ScheduleState {
    /// Current anchor, as nanoseconds from the owning store's epoch.
    ///
    /// `None` until the first call for the key.
    pub fn anchor_nanos(&self) -> Option<u64> {
        self.anchor
    }
}

/// A validated `[min, max]` delay range with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Lower bound of the range.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound of the range.
    pub fn max(&self) -> Duration {
        self.max
    }
}

impl TryFrom<(Duration, Duration)> for DelayRange {
    type Error = FermataError;

    fn try_from((min, max): (Duration, Duration)) -> Result<Self, Self::Error> {
        if min > max {
            Err(FermataError::InvalidDelayRange(format!(
                "min ({min:?}) must not exceed max ({max:?})"
            )))
        } else {
            Ok(Self { min, max })
        }
    }
}

/// Buffering policy for one wrapped callable. Immutable after wrapping.
#[derive(Debug, Clone, Copy)]
pub struct BufferOptions {
    /// Delay applied between calls sharing a key.
    ///
    /// Ignored when `random_range` is set. `Duration::ZERO` with no range and
    /// `always_buffer == false` degenerates to "never buffer".
    pub base_delay: Duration,
    /// When set, the effective delay is drawn uniformly from the range on
    /// every call instead of using `base_delay`.
    pub random_range: Option<DelayRange>,
    /// Delay every call unconditionally, even the first and even after real
    /// time longer than the delay has passed.
    pub always_buffer: bool,
    /// Give each distinct argument signature its own buffer.
    pub key_on_arguments: bool,
}

impl BufferOptions {
    /// Options with a fixed delay and all flags off.
    pub fn fixed(base_delay: Duration) -> Self {
        Self {
            base_delay,
            random_range: None,
            always_buffer: false,
            key_on_arguments: false,
        }
    }
}
