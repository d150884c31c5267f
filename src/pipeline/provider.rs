//! Context providers: enrichment stages that run before parsing.
//!
//! # Design Decisions
//! - A provider sees only the context it is handed; providers never reach
//!   each other directly
//! - Providers cannot fail; a provider that must abort panics and the
//!   pipeline's panic boundary turns that into an error response

use std::fmt;
use std::sync::Arc;

use crate::context::{Context, Key};

/// A pre-parsing enrichment stage.
pub trait Provider: Send + Sync {
    /// Return `ctx` unchanged or with additional bindings.
    fn provide(&self, ctx: Context) -> Context;
}

impl<F> Provider for F
where
    F: Fn(Context) -> Context + Send + Sync,
{
    fn provide(&self, ctx: Context) -> Context {
        self(ctx)
    }
}

/// Binds one shared instance under `key` on every invocation.
pub struct Singleton<T> {
    key: Key<Arc<T>>,
    value: Arc<T>,
}

impl<T> Provider for Singleton<T>
where
    T: Send + Sync + 'static,
{
    fn provide(&self, ctx: Context) -> Context {
        ctx.with(&self.key, Arc::clone(&self.value))
    }
}

impl<T> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton").field("key", &self.key).finish()
    }
}

/// Share `value` across invocations under `key`.
pub fn singleton<T>(key: Key<Arc<T>>, value: T) -> Singleton<T>
where
    T: Send + Sync + 'static,
{
    Singleton {
        key,
        value: Arc::new(value),
    }
}

/// Binds a freshly generated value under `key` on every invocation.
pub struct Generated<T, F> {
    key: Key<T>,
    generate: F,
}

impl<T, F> Provider for Generated<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync,
{
    fn provide(&self, ctx: Context) -> Context {
        ctx.with(&self.key, (self.generate)())
    }
}

/// Generate a new value per invocation, e.g. a clock reading or a nonce.
pub fn generated<T, F>(key: Key<T>, generate: F) -> Generated<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync,
{
    Generated { key, generate }
}

/// Several providers run in order as one.
pub struct Providers(Vec<Box<dyn Provider>>);

impl Provider for Providers {
    fn provide(&self, ctx: Context) -> Context {
        self.0.iter().fold(ctx, |ctx, provider| provider.provide(ctx))
    }
}

pub fn providers(list: Vec<Box<dyn Provider>>) -> Providers {
    Providers(list)
}
