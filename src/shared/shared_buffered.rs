use std::sync::Arc;

use crate::{
    CallableMeta, FermataError, SharedScheduleStore,
    common::{BufferOptions, CallableId},
    key::{ArgKey, resolve},
    policy::sample_delay,
};

#[derive(Debug)]
struct SharedBufferedInner<F> {
    f: F,
    options: BufferOptions,
    id: CallableId,
    store: SharedScheduleStore,
    meta: CallableMeta,
}

/// A callable wrapped with buffering coordinated through a shared store.
///
/// The async counterpart of [`Buffered`](crate::Buffered): key resolution and
/// policy semantics are identical, but the decision executes in the
/// coordinator and the wait suspends cooperatively. Clones share one identity
/// and one store.
///
/// The coordinator groups callables by their metadata name: wrapped entities
/// in cooperating processes buffer against each other when they share a store
/// prefix and a name. Use [`Buffer::wrap_shared_named`](crate::Buffer) with a
/// stable name; the default (the callable's type name) is only stable across
/// processes running the same binary.
#[derive(Debug)]
pub struct SharedBuffered<F> {
    inner: Arc<SharedBufferedInner<F>>,
}

impl<F> Clone for SharedBuffered<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> SharedBuffered<F> {
    pub(crate) fn new(
        f: F,
        options: BufferOptions,
        id: CallableId,
        store: SharedScheduleStore,
        meta: CallableMeta,
    ) -> Self {
        Self {
            inner: Arc::new(SharedBufferedInner {
                f,
                options,
                id,
                store,
                meta,
            }),
        }
    }

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

    /// The shared store this callable schedules through.
    pub fn store(&self) -> &SharedScheduleStore {
        &self.inner.store
    }

    async fn wait_for<A: ArgKey>(&self, args: &A) -> Result<std::time::Duration, FermataError> {
        let inner = &*self.inner;
        let key = resolve(inner.id, args, &inner.options)?;
        let delay = sample_delay(&inner.options);

        inner
            .store
            .schedule(
                inner.meta.name(),
                key.args(),
                delay,
                inner.options.always_buffer,
            )
            .await
    }

    /// Invoke a wrapped synchronous callable, delayed per the shared
    /// schedule.
    ///
    /// Scheduling goes through the coordinator, so even a synchronous
    /// callable is invoked from an async context here. Coordinator failures
    /// surface as [`FermataError::Redis`]; the callable is not invoked.
    pub async fn call<A, R>(&self, args: A) -> Result<R, FermataError>
    where
        F: Fn(A) -> R,
        A: ArgKey,
    {
        let wait = self.wait_for(&args).await?;

        if !wait.is_zero() {
            crate::runtime::async_sleep(wait).await;
        }

        Ok((self.inner.f)(args))
    }

    /// Invoke a wrapped async callable, delayed per the shared schedule.
    pub async fn call_async<A, Fut>(&self, args: A) -> Result<Fut::Output, FermataError>
    where
        F: Fn(A) -> Fut,
        Fut: Future,
        A: ArgKey,
    {
        let wait = self.wait_for(&args).await?;

        if !wait.is_zero() {
            crate::runtime::async_sleep(wait).await;
        }

        Ok((self.inner.f)(args).await)
    }
}
