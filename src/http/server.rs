//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Hold routes, global middlewares and admission controllers
//! - Dispatch each request through a pooled context
//! - Wire up tower middleware (tracing, timeout, request ID)
//! - Serve on a listener until shutdown

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Method, Request},
    response::Response,
    Router,
};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admission::{Rejection, Slowdown, Throttle};
use crate::chain::{handler_fn, Handler};
use crate::config::AppConfig;
use crate::context::{Context, ContextPool, Params, PooledContext};
use crate::error::Result;
use crate::http::{response, X_REQUEST_ID};
use crate::observability::metrics;
use crate::routing::group::verb_routes;
use crate::routing::{decode_path, RouteGroup, RouteMatch, RouteTable, Router as RouteLookup};

/// Application server: routes, middlewares and admission control around a
/// pool of request contexts.
pub struct AppServer {
    config: AppConfig,
    id_header: HeaderName,
    pool: Arc<ContextPool>,
    middlewares: Vec<Handler>,
    routes: RouteTable,
    mounted: Vec<Box<dyn RouteLookup>>,
    throttle: Option<Throttle>,
    slowdown: Option<Slowdown>,
}

impl AppServer {
    /// Create a server from `config`; admission controllers enabled there
    /// are built immediately.
    pub fn new(config: AppConfig) -> Self {
        let id_header = HeaderName::from_bytes(config.request.request_id_header.as_bytes())
            .unwrap_or_else(|_| {
                tracing::warn!(
                    header = %config.request.request_id_header,
                    "Invalid request ID header, using default"
                );
                HeaderName::from_static(X_REQUEST_ID)
            });

        let throttle = config
            .throttle
            .enabled
            .then(|| NonZeroUsize::new(config.throttle.rate))
            .flatten()
            .map(|rate| Throttle::new(rate, Duration::from_millis(config.throttle.window_ms)));

        let slowdown = config.slowdown.enabled.then(|| {
            Slowdown::new(
                config.slowdown.max_concurrency,
                Duration::from_millis(config.slowdown.wait_ms),
            )
        });

        Self {
            pool: Arc::new(ContextPool::new(config.context.pool_capacity)),
            id_header,
            middlewares: Vec::new(),
            routes: RouteTable::new(),
            mounted: Vec::new(),
            throttle,
            slowdown,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<ContextPool> {
        &self.pool
    }

    pub fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }

    pub fn slowdown(&self) -> Option<&Slowdown> {
        self.slowdown.as_ref()
    }

    /// Install or replace the throughput limiter.
    pub fn set_throttle(&mut self, throttle: Throttle) -> &mut Self {
        self.throttle = Some(throttle);
        self
    }

    /// Install or replace the concurrency limiter.
    pub fn set_slowdown(&mut self, slowdown: Slowdown) -> &mut Self {
        self.slowdown = Some(slowdown);
        self
    }

    /// Add a middleware that runs before every route's own chain.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.use_handler(handler_fn(middleware))
    }

    pub fn use_handler(&mut self, middleware: Handler) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Register `handlers` for `method` and `path`; `None` matches any method.
    pub fn handle(&mut self, method: Option<Method>, path: &str, handlers: Vec<Handler>) -> &mut Self {
        self.routes.add(method, path, handlers);
        self
    }

    verb_routes! {
        get => Some(Method::GET),
        post => Some(Method::POST),
        put => Some(Method::PUT),
        patch => Some(Method::PATCH),
        delete => Some(Method::DELETE),
        head => Some(Method::HEAD),
        options => Some(Method::OPTIONS),
        any => None,
    }

    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(&mut self.routes, prefix.to_string(), Vec::new())
    }

    /// Consult `router` for requests the built-in table does not match.
    pub fn mount(&mut self, router: impl RouteLookup) -> &mut Self {
        self.mounted.push(Box::new(router));
        self
    }

    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.resolve(method, path).or_else(|| {
            self.mounted
                .iter()
                .find_map(|router| router.resolve(method, path))
        })
    }

    /// Serve one request.
    ///
    /// Never fails: every outcome, including admission rejections and chain
    /// faults, is a response.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let (parts, body) = request.into_parts();
        let limit = self.config.request.max_body_size;
        let body = match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(method = %method, path = %path, error = %e, "Request body rejected");
                metrics::record_request(method.as_str(), 413, start);
                return response::payload_too_large(limit);
            }
        };
        let request = Request::from_parts(parts, body);

        let Some(route) = self.resolve(&method, &path) else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, start);
            return response::not_found(&method, &decode_path(&path));
        };

        let params = Params::from_parts(route.params, request.uri().query());
        let mut ctx = self.pool.acquire(request, params, &self.id_header);

        if let Some(Err(rejection)) = self.throttle.as_ref().map(Throttle::try_admit) {
            return self.rejected(ctx, rejection, start);
        }

        let _permit = match &self.slowdown {
            Some(slowdown) => match slowdown.admit().await {
                Ok(permit) => Some(permit),
                Err(rejection) => return self.rejected(ctx, rejection, start),
            },
            None => None,
        };

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %method,
            route = %route.pattern,
            "Dispatching request"
        );

        ctx.run(self.middlewares.iter().cloned().chain(route.chain.iter().cloned()))
            .await;

        let response = ctx.response_mut().take();
        let status = response.status();

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        metrics::record_request(method.as_str(), status.as_u16(), start);

        response
    }

    fn rejected(&self, mut ctx: PooledContext, rejection: Rejection, start: Instant) -> Response {
        response::reject(&mut ctx, rejection);

        tracing::warn!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            kind = rejection.kind(),
            "Request rejected"
        );
        metrics::record_rejection(rejection.kind());
        metrics::record_request(ctx.method().as_str(), rejection.status().as_u16(), start);

        ctx.response_mut().take()
    }

    /// Build the axum router: every request falls through to [`dispatch`](Self::dispatch).
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let timeout = Duration::from_secs(self.config.request.timeout_secs);
        let id_header = self.id_header.clone();

        Router::new()
            .fallback(serve_request)
            .with_state(Arc::new(self))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(id_header.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(id_header))
                    .layer(TimeoutLayer::new(timeout)),
            )
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let app = self.into_router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_request(State(server): State<Arc<AppServer>>, request: Request<Body>) -> Response {
    server.dispatch(request).await
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_runs_global_then_route_chain() {
        let mut server = AppServer::new(AppConfig::default());
        server.use_middleware(|ctx| {
            Box::pin(async move {
                ctx.set("seen", "global");
                ctx.next().await
            })
        });
        server.get("/users/{id}", |ctx| {
            Box::pin(async move {
                let body = format!(
                    "{} {} {}",
                    ctx.get_str("seen").unwrap_or("none"),
                    ctx.params().get("id").unwrap_or(""),
                    ctx.params().get("tab").unwrap_or("")
                );
                ctx.send(body)?;
                Ok(())
            })
        });

        let response = server
            .dispatch(request(Method::GET, "/users/42?tab=posts"))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "global 42 posts");
    }

    #[tokio::test]
    async fn test_dispatch_miss() {
        let server = AppServer::new(AppConfig::default());
        let response = server.dispatch(request(Method::POST, "/nowhere")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Route(POST /nowhere) not found");
    }

    #[tokio::test]
    async fn test_dispatch_decodes_path() {
        let mut server = AppServer::new(AppConfig::default());
        server.get("/hello/{name}", |ctx| {
            Box::pin(async move {
                let name = ctx.params().get("name").unwrap_or_default().to_string();
                ctx.send(format!("Hello, {name}!"))?;
                Ok(())
            })
        });

        let hit = server
            .dispatch(request(Method::GET, "/hello/John%20Doe"))
            .await;
        assert_eq!(hit.status(), StatusCode::OK);
        assert_eq!(body_text(hit).await, "Hello, John Doe!");

        let miss = server
            .dispatch(request(Method::GET, "/good%20bye/John"))
            .await;
        assert_eq!(miss.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(miss).await, "Route(GET /good bye/John) not found");
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let mut config = AppConfig::default();
        config.request.max_body_size = 4;
        let mut server = AppServer::new(config);
        server.post("/upload", |_ctx| Box::pin(async move { Ok(()) }));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Body::from("too large"))
            .unwrap();
        let response = server.dispatch(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_throttle_from_config() {
        let mut config = AppConfig::default();
        config.throttle.enabled = true;
        config.throttle.rate = 1;
        config.throttle.window_ms = 60_000;
        let mut server = AppServer::new(config);
        server.get("/", |ctx| Box::pin(async move { Ok(ctx.send("ok")?) }));

        let first = server.dispatch(request(Method::GET, "/")).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = server.dispatch(request(Method::GET, "/")).await;
        assert_eq!(second.status(), StatusCode::IM_A_TEAPOT);
        assert!(second.headers().contains_key("retry-after"));
        assert!(second.headers().contains_key("x-request-id"));
        assert_eq!(body_text(second).await, "I'm a teapot");
    }

    #[tokio::test]
    async fn test_contexts_return_to_pool() {
        let mut server = AppServer::new(AppConfig::default());
        server.get("/", |ctx| Box::pin(async move { Ok(ctx.send("ok")?) }));

        for _ in 0..3 {
            server.dispatch(request(Method::GET, "/")).await;
        }

        assert_eq!(server.pool().created(), 1);
        assert_eq!(server.pool().idle(), 1);
    }

    #[tokio::test]
    async fn test_mounted_router_is_consulted_after_table() {
        let mut external = RouteTable::new();
        external.add(
            Some(Method::GET),
            "/external",
            vec![handler_fn(|ctx| Box::pin(async move { Ok(ctx.send("mounted")?) }))],
        );

        let mut server = AppServer::new(AppConfig::default());
        server.mount(external);

        let response = server.dispatch(request(Method::GET, "/external")).await;
        assert_eq!(body_text(response).await, "mounted");
    }
}
