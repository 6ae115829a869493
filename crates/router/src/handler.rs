use crate::controller::ControllerRegistry;
use crate::error::{BoxError, RouteError};
use crate::responder::{Outcome, Redirect, Responder};
use crate::PathParams;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An inline request handler, invoked with the parameters bound by the matched route.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, params: PathParams) -> Result<Outcome, BoxError>;

    /// A short human readable description used by route listings.
    fn describe(&self) -> String {
        "closure".to_string()
    }
}

/// Adapts an async function or closure taking [`PathParams`] into a [`RequestHandler`].
pub struct FnHandler<F> {
    f: F,
}

/// Wraps `f` as a request handler.
///
/// # Example
/// ```
/// use light_router::{PathParams, handler_fn};
/// use serde_json::json;
///
/// let handler = handler_fn(|params: PathParams| async move {
///     json!({ "id": params.get("id") })
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(PathParams) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(PathParams) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: Responder,
{
    async fn invoke(&self, params: PathParams) -> Result<Outcome, BoxError> {
        (self.f)(params).await.into_outcome()
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

/// Answers every request with the same redirect.
#[derive(Debug, Clone)]
pub struct RedirectHandler {
    redirect: Redirect,
}

impl RedirectHandler {
    pub fn new(redirect: Redirect) -> Self {
        Self { redirect }
    }
}

#[async_trait]
impl RequestHandler for RedirectHandler {
    async fn invoke(&self, _params: PathParams) -> Result<Outcome, BoxError> {
        Ok(Outcome::Redirect(self.redirect.clone()))
    }

    fn describe(&self) -> String {
        format!("redirect {} -> {}", self.redirect.status().as_u16(), self.redirect.location())
    }
}

/// The handler bound to a route entry.
#[derive(Clone)]
pub enum Handler {
    /// A handler invoked directly.
    Inline(Arc<dyn RequestHandler>),
    /// A controller action resolved through the [`ControllerRegistry`] at call time.
    Controller { controller: Arc<str>, action: Arc<str> },
}

impl Handler {
    pub fn inline<H: RequestHandler + 'static>(handler: H) -> Self {
        Self::Inline(Arc::new(handler))
    }

    pub fn controller(controller: impl Into<Arc<str>>, action: impl Into<Arc<str>>) -> Self {
        Self::Controller { controller: controller.into(), action: action.into() }
    }

    /// Parses the `Controller@action` notation.
    ///
    /// # Errors
    /// Returns [`RouteError::InvalidControllerHandler`] when either side of the `@` is empty or
    /// the separator is missing.
    pub fn parse_controller(notation: &str) -> Result<Self, RouteError> {
        match notation.split_once('@') {
            Some((controller, action)) if !controller.is_empty() && !action.is_empty() => {
                Ok(Self::controller(controller, action))
            }
            _ => Err(RouteError::InvalidControllerHandler(notation.to_string())),
        }
    }

    /// Invokes the handler, controller actions are looked up in `controllers`.
    ///
    /// # Errors
    /// Returns whatever the handler returned, or a [`crate::ControllerError`] when the controller
    /// action is not registered.
    pub async fn invoke(&self, params: PathParams, controllers: &ControllerRegistry) -> Result<Outcome, BoxError> {
        match self {
            Handler::Inline(handler) => handler.invoke(params).await,
            Handler::Controller { controller, action } => controllers.invoke(controller, action, params).await,
        }
    }

    /// A short human readable description used by route listings.
    pub fn describe(&self) -> String {
        match self {
            Handler::Inline(handler) => handler.describe(),
            Handler::Controller { controller, action } => format!("{controller}@{action}"),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Inline(handler) => f.debug_tuple("Inline").field(&handler.describe()).finish(),
            Handler::Controller { controller, action } => {
                f.debug_struct("Controller").field("controller", controller).field("action", action).finish()
            }
        }
    }
}

impl<H: RequestHandler + 'static> From<H> for Handler {
    fn from(handler: H) -> Self {
        Handler::inline(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::{Handler, RedirectHandler, RequestHandler, handler_fn};
    use crate::controller::ControllerRegistry;
    use crate::error::RouteError;
    use crate::responder::{Outcome, Redirect};
    use crate::PathParams;
    use serde_json::json;

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    #[test]
    fn assert_fn_is_request_handler() {
        async fn get(_params: PathParams) -> &'static str {
            "hello world"
        }

        let handler = handler_fn(get);
        assert_is_handler(&handler);

        let closure = handler_fn(|params: PathParams| async move { json!({ "id": params.get("id") }) });
        assert_is_handler(&closure);
    }

    #[tokio::test]
    async fn test_inline_invoke() {
        let handler = Handler::from(handler_fn(|_params: PathParams| async { vec!["here"] }));
        let outcome = handler.invoke(PathParams::empty(), &ControllerRegistry::new()).await.unwrap();
        assert_eq!(outcome, Outcome::Data(json!(["here"])));
        assert_eq!(handler.describe(), "closure");
    }

    #[tokio::test]
    async fn test_redirect_handler() {
        let handler = RedirectHandler::new(Redirect::to("/admin/manage/users"));
        assert_eq!(handler.describe(), "redirect 302 -> /admin/manage/users");

        let outcome = handler.invoke(PathParams::empty()).await.unwrap();
        assert_eq!(outcome, Outcome::Redirect(Redirect::to("/admin/manage/users")));
    }

    #[test]
    fn test_parse_controller() {
        let handler = Handler::parse_controller("Test@index").unwrap();
        assert_eq!(handler.describe(), "Test@index");

        assert!(matches!(Handler::parse_controller("Test"), Err(RouteError::InvalidControllerHandler(_))));
        assert!(matches!(Handler::parse_controller("@index"), Err(RouteError::InvalidControllerHandler(_))));
        assert!(matches!(Handler::parse_controller("Test@"), Err(RouteError::InvalidControllerHandler(_))));
    }
}
