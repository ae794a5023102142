//! The delay policy: given stored state and the current instant, how long the
//! call must wait and where the anchor moves.
//!
//! `decide` is a pure function over nanosecond offsets so both backends (and
//! the tests) share one implementation; callers run it inside the store's
//! critical section. The effective delay is sampled first via `sample_delay`,
//! independently of state.

use std::time::Duration;

use rand::Rng;

use crate::common::{BufferOptions, Nanos};

/// Outcome of one policy decision.
pub(crate) struct Decision {
    /// How long the caller must suspend, after releasing the lock.
    pub wait: Duration,
    /// The committed new anchor, written before the lock is released.
    pub anchor: Nanos,
}

pub(crate) fn duration_nanos(d: Duration) -> Nanos {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Sample the effective delay for one call.
///
/// Uniform over `[min, max]` when a range is configured, else `base_delay`.
/// A degenerate `(x, x)` range is deterministic and skips the RNG.
pub(crate) fn sample_delay(options: &BufferOptions) -> Duration {
    let Some(range) = options.random_range else {
        return options.base_delay;
    };

    if range.min() == range.max() {
        return range.min();
    }

    let min = duration_nanos(range.min());
    let max = duration_nanos(range.max());

    Duration::from_nanos(rand::rng().random_range(min..=max))
}

/// Decide the wait and the new anchor for one call.
///
/// With `always_buffer` off:
/// - no anchor yet: run immediately, anchor = now;
/// - enough real time elapsed (`>= delay`): run immediately, anchor = now;
/// - inside the window: push out to exactly `anchor + delay`, so a rapid
///   burst accumulates delays additively instead of collapsing onto
///   "now + remainder".
///
/// With `always_buffer` on every call is pushed at least `delay` past the
/// later of now and the previous anchor; buffering is never skipped.
///
/// The anchor can sit ahead of `now` (a burst already queued behind it), in
/// which case elapsed time counts as zero.
pub(crate) fn decide(
    anchor: Option<Nanos>,
    now: Nanos,
    delay: Duration,
    always_buffer: bool,
) -> Decision {
    let d = duration_nanos(delay);

    match anchor {
        None if !always_buffer => Decision {
            wait: Duration::ZERO,
            anchor: now,
        },
        None => Decision {
            wait: delay,
            anchor: now.saturating_add(d),
        },
        Some(anchor) if always_buffer => {
            let target = now.max(anchor).saturating_add(d);

            Decision {
                wait: Duration::from_nanos(target.saturating_sub(now)),
                anchor: target,
            }
        }
        Some(anchor) => {
            let elapsed = now.saturating_sub(anchor);

            if elapsed >= d {
                Decision {
                    wait: Duration::ZERO,
                    anchor: now,
                }
            } else {
                let target = anchor.saturating_add(d);

                Decision {
                    wait: Duration::from_nanos(target.saturating_sub(now)),
                    anchor: target,
                }
            }
        }
    }
} // end fn decide
