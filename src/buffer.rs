//! The buffer engine: wrapping callables and orchestrating one call.

use std::{any::type_name, sync::Arc, thread, time::Duration};

use crate::{
    FermataError,
    common::{BufferOptions, CallableId},
    key::{ArgKey, resolve},
    local::LocalScheduleStore,
    policy::{decide, sample_delay},
};

#[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
use crate::shared::{SharedBuffered, SharedScheduleStore};

/// Descriptive metadata carried by a wrapped callable.
///
/// Wrapping forwards this record explicitly instead of relying on any
/// implicit attribute copying, so it survives stacking with other wrappers.
/// Defaults to the callable's type name when not supplied.
#[derive(Debug, Clone)]
pub struct CallableMeta {
    name: String,
    module: String,
    doc: Option<String>,
}

impl CallableMeta {
    /// Metadata with an explicit name and defining module.
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            doc: None,
        }
    }

    /// Attach a documentation string.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub(crate) fn of<F>() -> Self {
        let full = type_name::<F>();
        let module = full.rsplit_once("::").map(|(m, _)| m).unwrap_or("");

        Self {
            name: full.to_string(),
            module: module.to_string(),
            doc: None,
        }
    }

    /// The callable's externally observable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The callable's defining module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The callable's documentation string, if any.
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// A buffering policy, ready to wrap callables.
///
/// One `Buffer` can wrap any number of callables; each wrap allocates a fresh
/// [`CallableId`] and its own schedule store, so independently wrapped
/// callables never buffer against each other.
#[derive(Debug, Clone)]
pub struct Buffer {
    options: BufferOptions,
}

impl Buffer {
    /// Create a buffer with the given policy.
    ///
    /// Range validation happens at [`DelayRange`](crate::DelayRange)
    /// construction, so `options` is taken as already well-formed.
    pub fn new(options: BufferOptions) -> Self {
        Self { options }
    }

    /// The policy this buffer applies.
    pub fn options(&self) -> &BufferOptions {
        &self.options
    }

    /// Wrap `f` with buffering backed by a fresh process-local store.
    pub fn wrap<F>(&self, f: F) -> Buffered<F> {
        self.wrap_named(f, CallableMeta::of::<F>())
    }

    /// Wrap `f` with explicit metadata.
    pub fn wrap_named<F>(&self, f: F, meta: CallableMeta) -> Buffered<F> {
        Buffered {
            inner: Arc::new(BufferedInner {
                f,
                options: self.options,
                id: CallableId::next(),
                store: LocalScheduleStore::new(),
                meta,
            }),
        }
    }

    /// Wrap `f` with buffering coordinated through the given shared store.
    ///
    /// Create the store (and the wrapped callable) before spawning the
    /// processes or workers that must buffer against each other; handles
    /// created afterwards are invisible to already-running siblings.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
    pub fn wrap_shared<F>(&self, f: F, store: SharedScheduleStore) -> SharedBuffered<F> {
        self.wrap_shared_named(f, store, CallableMeta::of::<F>())
    }

    /// Wrap `f` with a shared store and explicit metadata.
    #[cfg(any(feature = "redis-tokio", feature = "redis-smol"))]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "redis-tokio", feature = "redis-smol"))))]
    pub fn wrap_shared_named<F>(
        &self,
        f: F,
        store: SharedScheduleStore,
        meta: CallableMeta,
    ) -> SharedBuffered<F> {
        SharedBuffered::new(f, self.options, CallableId::next(), store, meta)
    }
}

#[derive(Debug)]
struct BufferedInner<F> {
    f: F,
    options: BufferOptions,
    id: CallableId,
    store: LocalScheduleStore,
    meta: CallableMeta,
}

/// A callable wrapped with buffering, backed by a process-local store.
///
/// A drop-in replacement for the original callable: same arguments, same
/// return value, failures propagated unchanged. Cloning is cheap and clones
/// share one identity and one store, so every call site holding a clone
/// buffers against the others.
#[derive(Debug)]
pub struct Buffered<F> {
    inner: Arc<BufferedInner<F>>,
}

impl<F> Clone for Buffered<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> Buffered<F> {
    /// Metadata of the wrapped callable.
    pub fn meta(&self) -> &CallableMeta {
        &self.inner.meta
    }

    /// The policy applied to this callable.
    pub fn options(&self) -> &BufferOptions {
        &self.inner.options
    }

    /// This callable's buffering identity.
    pub fn id(&self) -> CallableId {
        self.inner.id
    }

    /// The schedule store owned by this wrapped callable.
    pub fn store(&self) -> &LocalScheduleStore {
        &self.inner.store
    }

    /// Resolve the key, run the policy under the key's lock, and return the
    /// committed wait. The state mutation is done once this returns; the
    /// caller sleeps outside the critical section so other callers of the
    /// same key are never blocked by this one's wait.
    fn wait_for<A: ArgKey>(&self, args: &A) -> Result<Duration, FermataError> {
        let inner = &*self.inner;
        let key = resolve(inner.id, args, &inner.options)?;
        let delay = sample_delay(&inner.options);

        inner.store.with_lock(&key, |state| {
            let decision = decide(
                state.anchor,
                inner.store.now(),
                delay,
                inner.options.always_buffer,
            );
            state.anchor = Some(decision.anchor);
            decision.wait
        })
    } // end method wait_for

    /// Invoke the wrapped callable, delayed per the buffering policy.
    ///
    /// Key resolution errors return without invoking the callable. The
    /// callable's own output, including any error value it returns, passes
    /// through unchanged; buffering adds latency, not fault tolerance.
    pub fn call<A, R>(&self, args: A) -> Result<R, FermataError>
    where
        F: Fn(A) -> R,
        A: ArgKey,
    {
        let wait = self.wait_for(&args)?;

        if !wait.is_zero() {
            thread::sleep(wait);
        }

        Ok((self.inner.f)(args))
    }

    /// Invoke a wrapped async callable, suspending cooperatively for the
    /// computed wait so unrelated tasks progress during it.
    #[cfg(any(feature = "async-tokio", feature = "async-smol"))]
    #[cfg_attr(docsrs, doc(cfg(any(feature = "async-tokio", feature = "async-smol"))))]
    pub async fn call_async<A, Fut>(&self, args: A) -> Result<Fut::Output, FermataError>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
        A: ArgKey,
    {
        let wait = self.wait_for(&args)?;

        if !wait.is_zero() {
            crate::runtime::async_sleep(wait).await;
        }

        Ok((self.inner.f)(args).await)
    }
}
