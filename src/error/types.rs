//! Error taxonomy shared by every pipeline stage.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::Cell;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed, absent or wrongly encoded body.
    InvalidBody,
    /// `Content-Type` header mismatch.
    InvalidContentType,
    /// Body present when none was expected.
    UnexpectedBody,
    /// A checker rejected the request.
    CheckerRejected,
    /// Business logic failure; also the kind of unclassified errors.
    HandlerError,
    /// Non-error panic payload or programming error.
    UnhandledPanic,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidBody => "invalid_body",
            ErrorKind::InvalidContentType => "invalid_content_type",
            ErrorKind::UnexpectedBody => "unexpected_body",
            ErrorKind::CheckerRejected => "checker_rejected",
            ErrorKind::HandlerError => "handler_error",
            ErrorKind::UnhandledPanic => "unhandled_panic",
        }
    }
}

thread_local! {
    static CAPTURE_STACKS: Cell<bool> = const { Cell::new(true) };
}

/// Turns stack capture on or off for errors built on the current thread
/// until the guard is dropped, then restores the previous setting.
///
/// Capture is on by default. `Function::invoke` switches it off for
/// invocations that never render stacks.
#[must_use]
#[derive(Debug)]
pub struct StackCapture {
    previous: bool,
}

impl StackCapture {
    pub fn set(enabled: bool) -> Self {
        let previous = CAPTURE_STACKS.with(|capture| capture.replace(enabled));
        Self { previous }
    }
}

impl Drop for StackCapture {
    fn drop(&mut self) {
        CAPTURE_STACKS.with(|capture| capture.set(self.previous));
    }
}

fn capture_stack() -> Backtrace {
    if CAPTURE_STACKS.with(Cell::get) {
        Backtrace::force_capture()
    } else {
        Backtrace::disabled()
    }
}

/// A failure flowing through the pipeline.
///
/// Carries an optional HTTP status and public message (the adapter fills in
/// defaults), the internal message, the call stack captured at construction,
/// and any further causes when several failures are reported together.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FunctionError {
    kind: ErrorKind,
    status: Option<u16>,
    public_message: Option<String>,
    message: String,
    stack: Arc<Backtrace>,
    related: Vec<FunctionError>,
    #[source]
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl FunctionError {
    /// An unclassified error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::HandlerError, message)
    }

    fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            public_message: None,
            message: message.into(),
            stack: Arc::new(capture_stack()),
            related: Vec::new(),
            cause: None,
        }
    }

    /// Wrap any error, keeping it as the source.
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let mut wrapped = Self::new(err.to_string());
        wrapped.cause = Some(Arc::new(err));
        wrapped
    }

    /// 400 `invalid-body`.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidBody, message)
            .with_status(400)
            .with_public_message("invalid-body")
    }

    /// 400 `invalid-content-type`.
    pub fn invalid_content_type(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidContentType, message)
            .with_status(400)
            .with_public_message("invalid-content-type")
    }

    /// 400 `unexpected-body`.
    pub fn unexpected_body(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::UnexpectedBody, message)
            .with_status(400)
            .with_public_message("unexpected-body")
    }

    /// A checker rejection with an explicit status.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::CheckerRejected, message).with_status(status)
    }

    /// Convert a payload recovered from a panic.
    ///
    /// A panic carrying a `FunctionError` keeps its status and message; any
    /// other payload becomes an [`ErrorKind::UnhandledPanic`] whose stack is
    /// captured at the recovery point.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<FunctionError>() {
            Ok(err) => return *err,
            Err(payload) => payload,
        };
        let payload = match payload.downcast::<Box<dyn StdError + Send + Sync>>() {
            Ok(err) => {
                let mut converted = Self::with_kind(ErrorKind::UnhandledPanic, err.to_string());
                converted.cause = Some(Arc::from(*err));
                return converted;
            }
            Err(payload) => payload,
        };

        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::with_kind(ErrorKind::UnhandledPanic, message)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_public_message(mut self, public_message: impl Into<String>) -> Self {
        self.public_message = Some(public_message.into());
        self
    }

    /// Prepend `prefix: ` to the internal message.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix}: {}", self.message);
        self
    }

    /// Report `other` alongside this error. Status and public message still
    /// come from `self`.
    pub fn and(mut self, mut other: FunctionError) -> Self {
        let nested = std::mem::take(&mut other.related);
        self.related.push(other);
        self.related.extend(nested);
        self
    }

    /// Re-tag an unclassified error; classified errors keep their kind.
    pub fn classify(mut self, kind: ErrorKind) -> Self {
        if self.kind == ErrorKind::HandlerError {
            self.kind = kind;
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Explicit status, if one was attached.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Explicit status, or 500.
    pub fn status_or_default(&self) -> u16 {
        self.status.unwrap_or(500)
    }

    /// Explicit public message, if one was attached.
    pub fn public_message(&self) -> Option<&str> {
        self.public_message.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// This error followed by every related cause, in order.
    pub fn causes(&self) -> impl Iterator<Item = &FunctionError> {
        std::iter::once(self).chain(self.related.iter())
    }

    /// Whether a call stack was captured at construction.
    pub fn has_stack(&self) -> bool {
        self.stack.status() == BacktraceStatus::Captured
    }

    /// Call stack captured at construction, one human-readable frame per entry.
    pub fn stack_frames(&self) -> Vec<String> {
        format_frames(&self.stack)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for FunctionError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        let mut converted = Self::new(err.to_string());
        converted.cause = Some(Arc::from(err));
        converted
    }
}

/// Result alias used by checkers and handlers.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Render a backtrace as `symbol (at file:line:col)` entries.
fn format_frames(stack: &Backtrace) -> Vec<String> {
    if stack.status() != BacktraceStatus::Captured {
        return vec![stack.to_string()];
    }

    let rendered = stack.to_string();
    let mut frames: Vec<String> = Vec::new();
    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(last) = frames.last_mut() {
                last.push_str(" (at ");
                last.push_str(location);
                last.push(')');
            }
            continue;
        }
        match line.split_once(": ") {
            Some((index, symbol)) if index.chars().all(|c| c.is_ascii_digit()) => {
                frames.push(symbol.to_string());
            }
            _ if !line.is_empty() => frames.push(line.to_string()),
            _ => {}
        }
    }

    if frames.is_empty() {
        frames.push(rendered);
    }
    frames
}
