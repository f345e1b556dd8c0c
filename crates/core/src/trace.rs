//! Span-per-operation decorator for any [`Storage`].
//!
//! [`TracedStorage`] forwards every call to the storage it owns. When a
//! [`Tracer`] is configured, `put`, `get`, `exists`, `delete` and `list` each
//! run inside a span opened by the tracer and closed when the call returns.
//! Results and errors pass through untouched; `get_multiple` and `purge` are
//! never traced.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;
use tracing::field::Empty;

use crate::backend::Storage;
use crate::error::Result;
use crate::object::Object;

/// Storage operations that get a span of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
    Exists,
    Delete,
    List,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Put => "put",
            Operation::Get => "get",
            Operation::Exists => "exists",
            Operation::Delete => "delete",
            Operation::List => "list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens the span wrapping one storage call. `attribute` is either
/// `("key", key)` or `("prefix", prefix)`.
pub trait Tracer: Send + Sync {
    fn start_span(&self, op: Operation, attribute: (&'static str, &str)) -> tracing::Span;
}

/// [`Tracer`] that emits `tracing` spans at INFO level, named
/// `storage.<operation>`, to whatever subscriber is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriberTracer;

impl Tracer for SubscriberTracer {
    fn start_span(&self, op: Operation, (name, value): (&'static str, &str)) -> tracing::Span {
        // Span names must be literals, hence one arm per operation.
        let span = match op {
            Operation::Put => tracing::info_span!("storage.put", key = Empty, prefix = Empty),
            Operation::Get => tracing::info_span!("storage.get", key = Empty, prefix = Empty),
            Operation::Exists => tracing::info_span!("storage.exists", key = Empty, prefix = Empty),
            Operation::Delete => tracing::info_span!("storage.delete", key = Empty, prefix = Empty),
            Operation::List => tracing::info_span!("storage.list", key = Empty, prefix = Empty),
        };
        span.record(name, value);
        span
    }
}

/// Storage decorator emitting one span per traced operation.
pub struct TracedStorage {
    inner: Box<dyn Storage>,
    tracer: Option<Arc<dyn Tracer>>,
}

impl TracedStorage {
    pub fn new(inner: Box<dyn Storage>, tracer: Option<Arc<dyn Tracer>>) -> Self {
        Self { inner, tracer }
    }

    pub fn inner(&self) -> &dyn Storage {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn Storage> {
        self.inner
    }

    fn span(&self, op: Operation, attribute: (&'static str, &str)) -> Option<tracing::Span> {
        self.tracer
            .as_ref()
            .map(|tracer| tracer.start_span(op, attribute))
    }
}

/// Await `fut` inside `span` when there is one.
async fn traced<F: Future>(span: Option<tracing::Span>, fut: F) -> F::Output {
    match span {
        Some(span) => fut.instrument(span).await,
        None => fut.await,
    }
}

#[async_trait]
impl Storage for TracedStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let span = self.span(Operation::Put, ("key", key));
        traced(span, self.inner.put(key, data)).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let span = self.span(Operation::Get, ("key", key));
        traced(span, self.inner.get(key)).await
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Object>> {
        self.inner.get_multiple(keys).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let span = self.span(Operation::Exists, ("key", key));
        traced(span, self.inner.exists(key)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let span = self.span(Operation::Delete, ("key", key));
        traced(span, self.inner.delete(key)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<Object>> {
        let span = self.span(Operation::List, ("prefix", prefix));
        traced(span, self.inner.list(prefix)).await
    }

    async fn purge(&self) -> Result<()> {
        self.inner.purge().await
    }
}

/// Wrap any backend in a [`TracedStorage`].
pub trait StorageExt: Storage + Sized + 'static {
    fn traced(self, tracer: Arc<dyn Tracer>) -> TracedStorage {
        TracedStorage::new(Box::new(self), Some(tracer))
    }
}

impl<S: Storage + 'static> StorageExt for S {}
