//! The frozen application and per-request dispatch.

use std::fmt;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use gantry_core::{Context, HandlerChain, Params, Renderer, Request, Response};
use gantry_router::Router;
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};

use crate::middleware::panic_message;
use crate::templates::Templates;

/// Body of the default not-found response.
pub const NOT_FOUND_BODY: &str = "404 page not found";

/// Body of the default method-not-allowed response.
pub const METHOD_NOT_ALLOWED_BODY: &str = "405 method not allowed";

/// Remote address of the connection a request arrived on.
///
/// Stored as a context extension when requests come from a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

/// A configured application, ready to serve.
///
/// Cheap to clone; all clones share one route table.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    router: Router<HandlerChain>,
    not_found: HandlerChain,
    method_not_allowed: HandlerChain,
    renderer: Option<Arc<dyn Renderer>>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.inner.router.len())
            .field("not_found", &self.inner.not_found.len())
            .field("templates", &self.inner.renderer.is_some())
            .finish()
    }
}

/// What the router decided for a request.
enum Resolution {
    Matched,
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl App {
    pub(crate) fn new(
        router: Router<HandlerChain>,
        not_found: HandlerChain,
        method_not_allowed: HandlerChain,
        templates: Option<Arc<Templates>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppInner {
                router,
                not_found,
                method_not_allowed,
                renderer: templates.map(|t| t as Arc<dyn Renderer>),
            }),
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.router.len()
    }

    /// Runs the request through the matching chain and returns the
    /// response.
    ///
    /// - A matching route runs its flattened chain.
    /// - A path that exists under other methods runs the root middleware,
    ///   then answers `405` with an `Allow` header unless something was
    ///   written.
    /// - Anything else runs the not-found chain, then answers
    ///   `404 page not found` unless something was written.
    pub fn dispatch(&self, request: Request) -> Response {
        self.dispatch_from(request, None)
    }

    pub(crate) fn dispatch_from(&self, request: Request, client: Option<SocketAddr>) -> Response {
        let (mut ctx, resolution) = self.prepare(request);
        if let Some(addr) = client {
            ctx.insert_extension(ClientAddr(addr));
        }

        run_chain(&mut ctx);

        match resolution {
            Resolution::Matched => {}
            Resolution::NotFound => {
                if !ctx.writer().written() {
                    ctx.string(StatusCode::NOT_FOUND, NOT_FOUND_BODY);
                }
            }
            Resolution::MethodNotAllowed(allowed) => {
                if !ctx.writer().written() {
                    if let Ok(value) = HeaderValue::from_str(&allow_header(allowed)) {
                        ctx.header(header::ALLOW, value);
                    }
                    ctx.string(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_BODY);
                }
            }
        }

        ctx.into_response()
    }

    fn prepare(&self, request: Request) -> (Context, Resolution) {
        let inner = &self.inner;
        let path = request.uri().path().to_string();

        let (chain, params, resolution) = match inner.router.match_route(request.method(), &path) {
            Some(matched) => (matched.value.clone(), matched.params, Resolution::Matched),
            None => match inner.router.match_path(&path) {
                Some((methods, _)) if methods.has_any_method() => (
                    inner.method_not_allowed.clone(),
                    Params::new(),
                    Resolution::MethodNotAllowed(methods.allowed_methods()),
                ),
                _ => (inner.not_found.clone(), Params::new(), Resolution::NotFound),
            },
        };

        let ctx = Context::new(request, params, chain);
        let ctx = match &inner.renderer {
            Some(renderer) => ctx.with_renderer(Arc::clone(renderer)),
            None => ctx,
        };
        (ctx, resolution)
    }
}

/// `Allow` value for a path. HEAD is listed whenever GET is, since the
/// router answers HEAD through the GET binding.
fn allow_header(mut methods: Vec<Method>) -> String {
    if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
        methods.push(Method::HEAD);
    }
    methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ")
}

/// Runs the chain; a panic that no middleware recovered becomes a `500`.
fn run_chain(ctx: &mut Context) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| ctx.advance())) {
        let message = panic_message(payload.as_ref());
        tracing::error!(
            method = %ctx.method(),
            path = ctx.path(),
            panic = %message,
            "unrecovered panic in handler chain"
        );
        ctx.record_error(&message, serde_json::Value::from("panic"));
        ctx.abort(StatusCode::INTERNAL_SERVER_ERROR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;
    use bytes::Bytes;
    use gantry_core::handler;
    use http_body_util::BodyExt;

    fn request(method: Method, path: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    fn body_of(response: Response) -> String {
        let bytes = tokio_test::block_on(response.into_body().collect())
            .unwrap()
            .to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_matched_route_runs_chain() {
        let mut engine = Engine::new();
        engine.get(
            "/users/:id",
            [handler(|c| {
                let id = c.param("id").unwrap_or_default().to_string();
                c.string(StatusCode::OK, &id);
            })],
        );
        let app = engine.into_app();

        let response = app.dispatch(request(Method::GET, "/users/42"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response), "42");
    }

    #[test]
    fn test_unwritten_match_is_200() {
        let mut engine = Engine::new();
        engine.post("/noop", [handler(|_| {})]);
        let response = engine.into_app().dispatch(request(Method::POST, "/noop"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response), "");
    }

    #[test]
    fn test_default_not_found() {
        let app = Engine::new().into_app();
        let response = app.dispatch(request(Method::GET, "/missing"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response), NOT_FOUND_BODY);
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut engine = Engine::new();
        engine.get("/items", [handler(|_| {})]);
        engine.post("/items", [handler(|_| {})]);
        let response = engine.into_app().dispatch(request(Method::DELETE, "/items"));

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers()[header::ALLOW].to_str().unwrap().to_string();
        assert_eq!(allow, "GET, POST, HEAD");
        assert_eq!(body_of(response), METHOD_NOT_ALLOWED_BODY);
    }

    #[test]
    fn test_allow_header_adds_head_only_for_get() {
        assert_eq!(allow_header(vec![Method::GET]), "GET, HEAD");
        assert_eq!(allow_header(vec![Method::HEAD, Method::GET]), "HEAD, GET");
        assert_eq!(allow_header(vec![Method::POST, Method::PUT]), "POST, PUT");
    }

    #[test]
    fn test_unrecovered_panic_is_500() {
        let mut engine = Engine::new();
        engine.get("/boom", [handler(|_| panic!("no recovery installed"))]);
        let response = engine.into_app().dispatch(request(Method::GET, "/boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut engine = Engine::new();
        engine.get("/page", [handler(|c| c.string(StatusCode::OK, "page"))]);
        let response = engine.into_app().dispatch(request(Method::HEAD, "/page"));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
