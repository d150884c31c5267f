//! Checkers: validation stages that run after parsing.
//!
//! # Responsibilities
//! - Define the checker contract and blanket-implement it for closures
//! - Built-in `Content-Type` check
//! - Regex header validation
//!
//! # Design Decisions
//! - A checker returns `Ok(None)` to keep the context, `Ok(Some(ctx))` to
//!   replace it for every later stage, and `Err` to short-circuit
//! - Header lookups go through the context's case-insensitive tables

use mime::Mime;
use regex::Regex;

use crate::context::Context;
use crate::error::FunctionError;
use crate::http::{Request, CONTENT_TYPE};
use crate::pipeline::parser::BodyStrategy;

/// A post-parsing stage that may reject the request or enrich the context.
pub trait Checker<Req>: Send + Sync {
    fn check(
        &self,
        ctx: &Context,
        request: &Request,
        body: Option<&Req>,
    ) -> Result<Option<Context>, FunctionError>;
}

impl<Req, F> Checker<Req> for F
where
    F: Fn(&Context, &Request, Option<&Req>) -> Result<Option<Context>, FunctionError> + Send + Sync,
{
    fn check(
        &self,
        ctx: &Context,
        request: &Request,
        body: Option<&Req>,
    ) -> Result<Option<Context>, FunctionError> {
        self(ctx, request, body)
    }
}

/// Rejects requests whose `Content-Type` is malformed, names another media
/// type, or declares a charset other than `utf-8`. A missing header passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeChecker {
    expected: &'static str,
}

impl ContentTypeChecker {
    pub fn json() -> Self {
        Self::for_strategy(BodyStrategy::Json)
    }

    pub fn form() -> Self {
        Self::for_strategy(BodyStrategy::Form)
    }

    pub fn for_strategy(strategy: BodyStrategy) -> Self {
        Self {
            expected: strategy.media_type(),
        }
    }

    pub fn expected(&self) -> &'static str {
        self.expected
    }

    fn verify(&self, content_type: &str) -> Result<(), FunctionError> {
        if content_type.is_empty() {
            return Ok(());
        }

        let mime: Mime = content_type.parse().map_err(|e| {
            FunctionError::invalid_content_type(format!(
                "bad Content-Type: cannot parse '{content_type}': {e}"
            ))
        })?;

        if !mime.essence_str().eq_ignore_ascii_case(self.expected) {
            return Err(FunctionError::invalid_content_type(format!(
                "bad Content-Type: expected mime type '{}', got '{}'",
                self.expected, content_type
            )));
        }

        if let Some(charset) = charset(&mime) {
            if !charset.eq_ignore_ascii_case("utf-8") {
                return Err(FunctionError::invalid_content_type(format!(
                    "bad Content-Type: expected charset 'utf-8', got '{charset}'"
                )));
            }
        }
        Ok(())
    }
}

/// The `charset` parameter, unquoted. Parameter names are case-insensitive.
fn charset(mime: &Mime) -> Option<&str> {
    mime.params()
        .find(|(name, _)| name.as_str().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.as_str().trim_matches('"'))
}

impl<Req> Checker<Req> for ContentTypeChecker {
    fn check(
        &self,
        ctx: &Context,
        _request: &Request,
        _body: Option<&Req>,
    ) -> Result<Option<Context>, FunctionError> {
        self.verify(ctx.headers().get(CONTENT_TYPE))?;
        Ok(None)
    }
}

/// Rejects with 400 `bad-header` unless header `name` matches `pattern`.
/// A missing header is matched as the empty string.
pub fn header_matches<Req>(name: &str, pattern: Regex) -> impl Checker<Req> {
    let name = name.to_string();
    move |ctx: &Context, _: &Request, _: Option<&Req>| -> Result<Option<Context>, FunctionError> {
        let value = ctx.headers().get(&name);
        if pattern.is_match(value) {
            Ok(None)
        } else {
            Err(FunctionError::rejected(
                400,
                format!("invalid header '{name}': expected '{pattern}', got '{value}'"),
            )
            .with_public_message("bad-header"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ctx_with(request: &Request) -> Context {
        Context::for_request(false, request)
    }

    fn check_content_type(checker: &ContentTypeChecker, value: Option<&str>) -> Result<(), FunctionError> {
        let mut request = Request::new("POST", "/");
        if let Some(value) = value {
            request = request.with_header("Content-Type", value);
        }
        let ctx = ctx_with(&request);
        Checker::<()>::check(checker, &ctx, &request, None).map(|_| ())
    }

    #[test]
    fn test_content_type_accepts() {
        let checker = ContentTypeChecker::json();
        for value in [
            None,
            Some(""),
            Some("application/json"),
            Some("application/json; charset=utf-8"),
            Some("APPLICATION/JSON; charset=UTF-8"),
            Some("application/json; boundary=x"),
            Some("application/json; charset=\"utf-8\""),
        ] {
            assert!(check_content_type(&checker, value).is_ok(), "{value:?}");
        }
    }

    #[test]
    fn test_content_type_rejects() {
        let checker = ContentTypeChecker::json();
        let err = check_content_type(&checker, Some("text/plain")).unwrap_err();
        assert_eq!(
            err.message(),
            "bad Content-Type: expected mime type 'application/json', got 'text/plain'"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidContentType);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.public_message(), Some("invalid-content-type"));

        let err = check_content_type(&checker, Some("application/json; charset=latin1")).unwrap_err();
        assert_eq!(err.message(), "bad Content-Type: expected charset 'utf-8', got 'latin1'");

        for malformed in ["application json", "json"] {
            let err = check_content_type(&checker, Some(malformed)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidContentType, "{malformed}");
            assert_eq!(err.public_message(), Some("invalid-content-type"), "{malformed}");
            assert!(err.message().starts_with("bad Content-Type: cannot parse"), "{}", err.message());
        }
    }

    #[test]
    fn test_content_type_follows_strategy() {
        let checker = ContentTypeChecker::form();
        assert!(check_content_type(&checker, Some("application/x-www-form-urlencoded")).is_ok());
        assert!(check_content_type(&checker, Some("application/json")).is_err());
    }

    #[test]
    fn test_content_type_header_is_case_insensitive() {
        let request = Request::new("POST", "/").with_header("content-type", "text/html");
        let ctx = ctx_with(&request);
        let result = Checker::<()>::check(&ContentTypeChecker::json(), &ctx, &request, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_matches() {
        let checker = header_matches::<()>("X-Api-Key", Regex::new("^[a-z]{4}$").unwrap());

        let request = Request::new("GET", "/").with_header("x-api-key", "abcd");
        assert!(checker.check(&ctx_with(&request), &request, None).unwrap().is_none());

        let request = Request::new("GET", "/");
        let err = checker.check(&ctx_with(&request), &request, None).unwrap_err();
        assert_eq!(err.message(), "invalid header 'X-Api-Key': expected '^[a-z]{4}$', got ''");
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.public_message(), Some("bad-header"));
        assert_eq!(err.kind(), ErrorKind::CheckerRejected);
    }

    #[test]
    fn test_closure_checker_can_replace_context() {
        use crate::context::Key;
        const USER: Key<String> = Key::new("user");

        let checker = |ctx: &Context, _: &Request, body: Option<&String>| -> Result<Option<Context>, FunctionError> {
            Ok(body.map(|user| ctx.with(&USER, user.clone())))
        };
        let request = Request::new("GET", "/");
        let ctx = ctx_with(&request);
        let body = "alice".to_string();
        let replaced = checker.check(&ctx, &request, Some(&body)).unwrap().unwrap();
        assert_eq!(replaced.get(&USER).map(String::as_str), Some("alice"));
    }
}
