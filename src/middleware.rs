/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    net::SocketAddr,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::context::RequestContext;
use crate::extractor::{HeaderValue, Headers};
use crate::resolver::GeoResolver;

/// Layer that resolves each request's location before it reaches the handler.
///
/// The resulting [`RequestContext`] is stored as a request extension, and can
/// be pulled into handlers with the `RequestContext` extractor. The socket
/// address comes from `ConnectInfo<SocketAddr>`, so serve the app with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use ip2loc::{GeoLocationLayer, RequestContext};
///
/// async fn handler(context: RequestContext) -> String {
///     format!("{:?}", context.location)
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(GeoLocationLayer::default());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GeoLocationLayer {
    resolver: GeoResolver,
}

impl GeoLocationLayer {
    /// Create a layer using the given resolver.
    pub fn new(resolver: GeoResolver) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for GeoLocationLayer {
    type Service = GeoLocationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GeoLocationService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Service that resolves request locations.
#[derive(Debug, Clone)]
pub struct GeoLocationService<S> {
    inner: S,
    resolver: GeoResolver,
}

impl<S> Service<Request> for GeoLocationService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let headers = headers_to_list(req.headers());
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0.ip().to_string());

        // The ready service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let resolver = self.resolver.clone();

        Box::pin(async move {
            let mut context = RequestContext::new();
            resolver
                .resolve(remote_addr.as_deref(), &headers, &mut context)
                .await;
            req.extensions_mut().insert(context);
            inner.call(req).await
        })
    }
}

/// Convert Axum headers to our ordered header list.
///
/// Names that appear more than once become a `Multiple` value, decided on the
/// raw count. Values that are not valid UTF-8 are dropped.
fn headers_to_list(headers: &HeaderMap) -> Headers {
    headers
        .keys()
        .filter_map(|name| {
            let raw = headers.get_all(name);
            let repeated = raw.iter().count() > 1;
            let mut values: Vec<String> = raw
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_string)
                .collect();
            let value = if repeated {
                HeaderValue::Multiple(values)
            } else {
                HeaderValue::Single(values.pop()?)
            };
            Some((name.as_str().to_string(), value))
        })
        .collect()
}

/// Axum extractor for the request's location context.
///
/// Yields an empty context when the request did not pass through
/// [`GeoLocationLayer`].
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}
