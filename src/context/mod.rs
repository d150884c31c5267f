//! Per-invocation context threaded through every pipeline stage.
//!
//! # Data Flow
//! ```text
//! Request
//!     → Context::for_request (debug, path, lookup tables, platform metadata)
//!     → providers: ctx.with(&KEY, value) → new Context
//!     → parser: parsed body bound once
//!     → checkers: may return a replacement Context
//!     → handler: reads only
//! ```
//!
//! # Design Decisions
//! - Immutable and append-only: `with` returns a new value and leaves the
//!   receiver untouched, so earlier stages never observe later bindings
//! - Cloning is two `Arc` bumps; bindings form a persistent linked list
//! - Built once per invocation and passed explicitly; no thread-locals

pub mod lookup;

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::http::{Request, RequestContext};

pub use lookup::{MultiGet, SingleGet};

/// Request headers.
pub type Headers = MultiGet;
/// Query string parameters.
pub type QueryString = MultiGet;
/// Path parameters.
pub type PathParameters = SingleGet;
/// Stage variables.
pub type StageVariables = SingleGet;

/// Metadata about the original request path and method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub resource: String,
    pub path: String,
    pub method: String,
}

/// A typed key for caller-defined context values.
///
/// Two keys address the same slot only if both the name and the value type
/// match.
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.name)
    }
}

const PARSED_BODY: &str = "parsed-body";

struct Base {
    debug: bool,
    path: Path,
    headers: Headers,
    query_string: QueryString,
    path_parameters: PathParameters,
    stage_variables: StageVariables,
    request_context: RequestContext,
}

struct Binding {
    name: &'static str,
    type_id: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Binding>>,
}

/// Immutable per-invocation value carrier.
#[derive(Clone)]
pub struct Context {
    base: Arc<Base>,
    bindings: Option<Arc<Binding>>,
}

impl Context {
    /// Build a fresh context from the inbound request.
    pub fn for_request(debug: bool, request: &Request) -> Self {
        let base = Base {
            debug,
            path: Path {
                resource: request.resource.clone(),
                path: request.path.clone(),
                method: request.http_method.clone(),
            },
            headers: MultiGet::new(request.headers.clone(), request.multi_value_headers.clone()),
            query_string: MultiGet::new(
                request.query_string_parameters.clone(),
                request.multi_value_query_string_parameters.clone(),
            ),
            path_parameters: SingleGet::new(request.path_parameters.clone()),
            stage_variables: SingleGet::new(request.stage_variables.clone()),
            request_context: request.request_context.clone(),
        };

        Self {
            base: Arc::new(base),
            bindings: None,
        }
    }

    /// Whether internal error detail may be exposed.
    pub fn debug(&self) -> bool {
        self.base.debug
    }

    pub fn path(&self) -> &Path {
        &self.base.path
    }

    pub fn headers(&self) -> &Headers {
        &self.base.headers
    }

    pub fn query_string(&self) -> &QueryString {
        &self.base.query_string
    }

    pub fn path_parameters(&self) -> &PathParameters {
        &self.base.path_parameters
    }

    pub fn stage_variables(&self) -> &StageVariables {
        &self.base.stage_variables
    }

    pub fn request_context(&self) -> &RequestContext {
        &self.base.request_context
    }

    /// Platform correlation id; empty if the platform omitted it.
    pub fn request_id(&self) -> &str {
        &self.base.request_context.request_id
    }

    /// Return a new context with `value` bound under `key`.
    pub fn with<T>(&self, key: &Key<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.bind(key.name, Arc::new(value))
    }

    /// Look up the innermost binding for `key`.
    pub fn get<T>(&self, key: &Key<T>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.lookup(key.name)
    }

    /// Like [`Context::get`], but a missing value is a programming error.
    ///
    /// # Panics
    /// If nothing is bound under `key`.
    pub fn require<T>(&self, key: &Key<T>) -> &T
    where
        T: Send + Sync + 'static,
    {
        match self.get(key) {
            Some(value) => value,
            None => panic!("missing context value '{}'", key.name),
        }
    }

    /// The parsed request body, if the parser stage bound one of type `T`.
    pub fn try_parsed_body<T>(&self) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.lookup(PARSED_BODY)
    }

    /// The parsed request body.
    ///
    /// # Panics
    /// If called before the parser stage bound a body of type `T`.
    pub fn parsed_body<T>(&self) -> &T
    where
        T: Send + Sync + 'static,
    {
        match self.try_parsed_body() {
            Some(body) => body,
            None => panic!("parsed body accessed before it was set"),
        }
    }

    pub(crate) fn with_parsed_body<T>(&self, body: Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.bind(PARSED_BODY, body)
    }

    fn bind<T>(&self, name: &'static str, value: Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let binding = Binding {
            name,
            type_id: TypeId::of::<T>(),
            value,
            parent: self.bindings.clone(),
        };

        Self {
            base: Arc::clone(&self.base),
            bindings: Some(Arc::new(binding)),
        }
    }

    fn lookup<T>(&self, name: &str) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        let wanted = TypeId::of::<T>();
        let mut current = self.bindings.as_deref();
        while let Some(binding) = current {
            if binding.name == name && binding.type_id == wanted {
                return binding.value.downcast_ref::<T>();
            }
            current = binding.parent.as_deref();
        }
        None
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut current = self.bindings.as_deref();
        while let Some(binding) = current {
            names.push(binding.name);
            current = binding.parent.as_deref();
        }

        f.debug_struct("Context")
            .field("debug", &self.base.debug)
            .field("path", &self.base.path)
            .field("request_id", &self.request_id())
            .field("bindings", &names)
            .finish()
    }
}
