use std::{sync::Arc, time::Duration};

use redis::aio::ConnectionManager;

use crate::{FermataError, common::ArgSignature};

/// A validated prefix for coordinator keys.
///
/// Constraints:
/// - Must not be empty
/// - Must not be longer than 255 bytes
/// - Must not contain colons (the key separator)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SharedKeyPrefix(Arc<str>);

impl SharedKeyPrefix {
    /// The default prefix, `"fermata"`.
    pub fn default_prefix() -> Self {
        Self(Arc::from("fermata"))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SharedKeyPrefix {
    type Error = FermataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(FermataError::InvalidSharedPrefix(
                "prefix must not be empty".to_string(),
            ))
        } else if value.len() > 255 {
            Err(FermataError::InvalidSharedPrefix(
                "prefix must not be longer than 255 characters".to_string(),
            ))
        } else if value.contains(':') {
            Err(FermataError::InvalidSharedPrefix(
                "prefix must not contain colons".to_string(),
            ))
        } else {
            Ok(Self(Arc::from(value)))
        }
    }
}

// Implements the delay policy against an anchor stored in microseconds of
// Redis server time. Mirrors `policy::decide`; both must change together.
const SCHEDULE_SCRIPT: &str = r#"
    local time_array = redis.call("TIME")
    local now = tonumber(time_array[1]) * 1000000 + tonumber(time_array[2])

    local anchor_key = KEYS[1]

    local delay = tonumber(ARGV[1])
    local always_buffer = tonumber(ARGV[2]) == 1

    local anchor = tonumber(redis.call("GET", anchor_key))

    local wait
    local new_anchor

    if not anchor then
        if always_buffer then
            wait = delay
            new_anchor = now + delay
        else
            wait = 0
            new_anchor = now
        end
    elseif always_buffer then
        local target = math.max(now, anchor) + delay
        wait = target - now
        new_anchor = target
    else
        local elapsed = now - anchor
        if elapsed >= delay then
            wait = 0
            new_anchor = now
        else
            wait = anchor + delay - now
            new_anchor = anchor + delay
        end
    end

    -- %.0f: Lua's default number formatting would round a microsecond epoch.
    redis.call("SET", anchor_key, string.format("%.0f", new_anchor))

    return wait
"#;

/// Schedule store visible across process boundaries.
///
/// Cheap to clone; clones share the underlying connection manager. Create it
/// (and any [`SharedBuffered`](crate::SharedBuffered) using it) before
/// spawning the processes that must coordinate.
///
/// Anchors are never evicted by this store; teardown of coordinator state is
/// the deployment's concern.
#[derive(Clone)]
pub struct SharedScheduleStore {
    connection_manager: ConnectionManager,
    prefix: SharedKeyPrefix,
}

// Manual impl: `redis::aio::ConnectionManager` does not implement `Debug`.
impl std::fmt::Debug for SharedScheduleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedScheduleStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl SharedScheduleStore {
    /// Create a store over an established connection.
    ///
    /// `prefix` defaults to [`SharedKeyPrefix::default_prefix`]. Callables
    /// that must buffer against each other across processes need the same
    /// prefix (and, being the same binary, the same argument signatures).
    pub fn new(connection_manager: ConnectionManager, prefix: Option<SharedKeyPrefix>) -> Self {
        Self {
            connection_manager,
            prefix: prefix.unwrap_or_else(SharedKeyPrefix::default_prefix),
        }
    }

    /// The prefix under which this store names coordinator keys.
    pub fn prefix(&self) -> &SharedKeyPrefix {
        &self.prefix
    }

    // Coordinator keys are named by the callable's metadata name, not by the
    // process-local CallableId: counters from independent processes would
    // never meet on one key.
    fn anchor_key(&self, scope: &str, args: Option<ArgSignature>) -> String {
        match args {
            Some(sig) => format!(
                "{}:{}:{:016x}:anchor",
                self.prefix.as_str(),
                scope,
                sig.as_u64()
            ),
            None => format!("{}:{}:anchor", self.prefix.as_str(), scope),
        }
    }

    /// Run the delay policy for one buffering lineage atomically in the
    /// coordinator and return the committed wait.
    pub(crate) async fn schedule(
        &self,
        scope: &str,
        args: Option<ArgSignature>,
        delay: Duration,
        always_buffer: bool,
    ) -> Result<Duration, FermataError> {
        let script = redis::Script::new(SCHEDULE_SCRIPT);

        let delay_us = u64::try_from(delay.as_micros()).unwrap_or(u64::MAX);
        let mut connection_manager = self.connection_manager.clone();

        let wait_us: u64 = script
            .key(self.anchor_key(scope, args))
            .arg(delay_us)
            .arg(always_buffer as u8)
            .invoke_async(&mut connection_manager)
            .await?;

        Ok(Duration::from_micros(wait_us))
    } // end method schedule
}
