//! The pipeline orchestrator.
//!
//! # Data Flow
//! ```text
//! invoke(Request)
//!     → catch_unwind boundary
//!         → Context::for_request
//!         → providers (in order)
//!         → parse_body → parsed body bound into the context
//!         → content-type checker, then configured checkers (first error wins)
//!         → handler → Reply → Response
//!     → success response, or adapt_error on any error or panic
//! ```
//!
//! # Design Decisions
//! - Configuration is fixed once built; `invoke` takes `&self` and keeps
//!   every per-invocation value on the stack
//! - The panic boundary wraps all stages, so a provider, checker or
//!   handler panic renders the same envelope as a returned error
//! - Call stacks are captured only while a debug function is invoking

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::FunctionConfig;
use crate::context::Context;
use crate::error::{adapt_error, ErrorKind, ErrorScope, FunctionError, StackCapture};
use crate::http::{
    Request, Response, ResponseBuilder, SerializedResponse, CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use crate::observability::metrics;
use crate::pipeline::checker::{Checker, ContentTypeChecker};
use crate::pipeline::parser::{parse_body, BodyStrategy, RequestShape};
use crate::pipeline::provider::Provider;

/// What a handler produced on success.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    /// 200 with an empty body.
    Empty,
    /// 200 with `T` rendered as JSON.
    Json(T),
    /// 200 with a body the handler rendered itself.
    Serialized(SerializedResponse),
    /// Returned exactly as built.
    Response(Response),
}

impl<T> From<T> for Reply<T> {
    fn from(value: T) -> Self {
        Reply::Json(value)
    }
}

impl<T: Serialize> Reply<T> {
    /// Render the reply; pipeline-rendered bodies carry the no-cache headers.
    pub fn into_response(self) -> Result<Response, FunctionError> {
        let builder = ResponseBuilder::new().no_cache();
        match self {
            Reply::Empty => Ok(builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).empty()),
            Reply::Json(value) => builder.json(&value),
            Reply::Serialized(body) => Ok(builder.serialized(body)),
            Reply::Response(response) => Ok(response),
        }
    }
}

type Handler<Req, Resp> =
    Box<dyn Fn(&Context, Option<&Req>) -> Result<Reply<Resp>, FunctionError> + Send + Sync>;

/// A configured function: request shape, stages and business handler.
pub struct Function<Req, Resp> {
    shape: RequestShape<Req>,
    debug: bool,
    body_strategy: BodyStrategy,
    check_content_type: bool,
    providers: Vec<Box<dyn Provider>>,
    checkers: Vec<Box<dyn Checker<Req>>>,
    handler: Handler<Req, Resp>,
}

impl<Req, Resp> Function<Req, Resp>
where
    Req: DeserializeOwned + Send + Sync + 'static,
    Resp: Serialize + 'static,
{
    pub fn new<H>(shape: RequestShape<Req>, handler: H) -> Self
    where
        H: Fn(&Context, Option<&Req>) -> Result<Reply<Resp>, FunctionError> + Send + Sync + 'static,
    {
        Self {
            shape,
            debug: false,
            body_strategy: BodyStrategy::default(),
            check_content_type: true,
            providers: Vec::new(),
            checkers: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// Expose internal messages and stacks in error responses.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn body_strategy(mut self, strategy: BodyStrategy) -> Self {
        self.body_strategy = strategy;
        self
    }

    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Closure form of [`Function::provider`].
    pub fn provide<F>(self, provider: F) -> Self
    where
        F: Fn(Context) -> Context + Send + Sync + 'static,
    {
        self.provider(provider)
    }

    pub fn checker(mut self, checker: impl Checker<Req> + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    /// Closure form of [`Function::checker`].
    pub fn check<F>(self, checker: F) -> Self
    where
        F: Fn(&Context, &Request, Option<&Req>) -> Result<Option<Context>, FunctionError>
            + Send
            + Sync
            + 'static,
    {
        self.checker(checker)
    }

    /// Drop the built-in `Content-Type` checker.
    pub fn without_default_checkers(mut self) -> Self {
        self.check_content_type = false;
        self
    }

    /// Apply the file-level settings.
    pub fn configure(mut self, config: &FunctionConfig) -> Self {
        self.debug = config.debug;
        self.body_strategy = config.body_strategy;
        self.check_content_type = config.check_content_type;
        self
    }

    /// Run one invocation. Always yields exactly one complete response.
    pub fn invoke(&self, request: Request) -> Response {
        let started = Instant::now();
        let scope = ErrorScope::new(self.debug, request.request_context.request_id.clone());

        let span = tracing::info_span!(
            "invocation",
            request_id = %scope.request_id,
            method = %request.http_method,
            path = %request.path,
        );
        let _enter = span.enter();
        let _capture = StackCapture::set(self.debug);

        let (response, outcome) = match panic::catch_unwind(AssertUnwindSafe(|| self.run(&request))) {
            Ok(Ok(response)) => (response, "success"),
            Ok(Err(err)) => {
                log_failure(&err, false);
                (adapt_error(&scope, &err), "error")
            }
            Err(payload) => {
                let err = FunctionError::from_panic(payload);
                log_failure(&err, true);
                (adapt_error(&scope, &err), "panic")
            }
        };

        metrics::record_invocation(response.status_code, outcome, started);
        tracing::debug!(status = response.status_code, outcome, "invocation complete");
        response
    }

    fn run(&self, request: &Request) -> Result<Response, FunctionError> {
        let mut ctx = Context::for_request(self.debug, request);
        tracing::debug!("context built");

        for provider in &self.providers {
            ctx = provider.provide(ctx);
        }
        tracing::debug!(providers = self.providers.len(), "providers run");

        let body = parse_body(self.body_strategy, &self.shape, request)?.map(Arc::new);
        if let Some(body) = &body {
            ctx = ctx.with_parsed_body(Arc::clone(body));
        }
        let body = body.as_deref();
        tracing::debug!(has_body = body.is_some(), "body parsed");

        let content_type = self
            .check_content_type
            .then(|| ContentTypeChecker::for_strategy(self.body_strategy));
        let checkers = content_type
            .iter()
            .map(|checker| checker as &dyn Checker<Req>)
            .chain(self.checkers.iter().map(|checker| checker.as_ref()));

        for checker in checkers {
            let replaced = checker
                .check(&ctx, request, body)
                .map_err(|e| e.classify(ErrorKind::CheckerRejected))?;
            if let Some(next) = replaced {
                ctx = next;
            }
        }
        tracing::debug!("checkers run");

        let reply = (self.handler)(&ctx, body)?;
        reply.into_response()
    }
}

fn log_failure(err: &FunctionError, panicked: bool) {
    let status = err.status_or_default();
    if panicked || status >= 500 {
        tracing::error!(kind = err.kind().as_str(), status, error = %err, panicked, "invocation failed");
    } else {
        tracing::warn!(kind = err.kind().as_str(), status, error = %err, "invocation rejected");
    }
}

impl<Req, Resp> fmt::Debug for Function<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("shape", &self.shape)
            .field("debug", &self.debug)
            .field("body_strategy", &self.body_strategy)
            .field("check_content_type", &self.check_content_type)
            .field("providers", &self.providers.len())
            .field("checkers", &self.checkers.len())
            .finish_non_exhaustive()
    }
}
