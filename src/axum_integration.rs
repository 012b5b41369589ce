//! Axum web framework integration.
//!
//! Every request gets its own [`Scope`]: the [`scope_per_request`]
//! middleware creates it before the handler runs and closes it after the
//! response is produced. Handlers receive resolved instances through the
//! [`Inject`] and [`InjectTrait`] extractors.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use scopewire::axum_integration::{DiRouterExt, Inject};
//! use scopewire::{Bindings, Container};
//!
//! struct Greeting(&'static str);
//!
//! async fn hello(Inject(greeting): Inject<Greeting>) -> &'static str {
//!     greeting.0
//! }
//!
//! let container = Container::new();
//! container
//!     .register_scoped(Bindings::new().bind(|_| Ok(Greeting("hello"))))
//!     .unwrap();
//!
//! let app: Router = Router::new()
//!     .route("/", get(hello))
//!     .with_request_scopes(container);
//! ```

use std::ops::Deref;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::error::DiError;
use crate::provider::{Container, Scope};
use crate::traits::Resolver;

/// The scope of the current request, stored in request extensions.
#[derive(Clone)]
pub struct RequestScope(pub Arc<Scope>);

impl Deref for RequestScope {
    type Target = Scope;

    fn deref(&self) -> &Scope {
        &self.0
    }
}

/// Middleware creating a scope per request and closing it afterwards.
///
/// Install it with [`DiRouterExt::with_request_scopes`] or
/// `axum::middleware::from_fn_with_state(container, scope_per_request)`.
pub async fn scope_per_request(
    State(container): State<Container>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = Arc::new(container.create_scope());
    request.extensions_mut().insert(RequestScope(scope.clone()));

    let response = next.run(request).await;

    scope.close_async().await;
    response
}

/// Router extension installing the per-request scope middleware.
pub trait DiRouterExt {
    fn with_request_scopes(self, container: Container) -> Self;
}

impl<S> DiRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_request_scopes(self, container: Container) -> Self {
        self.layer(middleware::from_fn_with_state(container, scope_per_request))
    }
}

/// Extractor resolving a concrete type from the request scope.
pub struct Inject<T>(pub Arc<T>);

/// Extractor resolving a trait object such as `dyn Clock` from the
/// request scope.
pub struct InjectTrait<T: ?Sized>(pub Arc<T>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = DiRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        request_scope(parts)
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for Inject<T>
where
    T: Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = DiRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scope = request_scope(parts)?;
        scope.get::<T>().map(Inject).map_err(DiRejection::Resolution)
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for InjectTrait<T>
where
    T: ?Sized + Send + Sync + 'static,
    S: Send + Sync,
{
    type Rejection = DiRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scope = request_scope(parts)?;
        scope.get_trait::<T>().map(InjectTrait).map_err(DiRejection::Resolution)
    }
}

fn request_scope(parts: &Parts) -> Result<RequestScope, DiRejection> {
    parts
        .extensions
        .get::<RequestScope>()
        .cloned()
        .ok_or(DiRejection::MissingScope)
}

/// Rejection for DI extraction failures; always a `500`.
#[derive(Debug)]
pub enum DiRejection {
    /// The router was not wrapped with the per-request scope middleware
    MissingScope,
    /// The requested instance could not be resolved
    Resolution(DiError),
}

impl IntoResponse for DiRejection {
    fn into_response(self) -> Response {
        let message = match self {
            DiRejection::MissingScope => {
                "request scope not found; install the scope_per_request middleware".to_string()
            }
            DiRejection::Resolution(err) => err.to_string(),
        };
        tracing::error!(%message, "dependency injection failed for request");
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
