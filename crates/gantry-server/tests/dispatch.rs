//! End-to-end dispatch through engines built with groups and middleware.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use gantry_server::{
    handler, recovery, App, Context, Engine, Handler, Response, Templates, Validate,
    ValidationError, NOT_FOUND_BODY,
};
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use serde::Deserialize;

type Trace = Arc<Mutex<Vec<String>>>;

fn tracing_handler(trace: &Trace, name: &'static str) -> Handler {
    let trace = trace.clone();
    handler(move |_| trace.lock().unwrap().push(name.to_string()))
}

fn request(method: Method, path: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

fn json_request(path: &str, body: &str) -> http::Request<Bytes> {
    http::Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

fn body_of(response: Response) -> String {
    let bytes = tokio_test::block_on(response.into_body().collect())
        .unwrap()
        .to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(app: &App, path: &str) -> Response {
    app.dispatch(request(Method::GET, path))
}

#[test]
fn group_middleware_runs_before_route_handlers() {
    let trace = Trace::default();
    let mut engine = Engine::new();
    engine.use_middleware([tracing_handler(&trace, "Logger")]);
    {
        let mut api = engine.group("/api", [tracing_handler(&trace, "Auth")]);
        api.get("/items", [tracing_handler(&trace, "ListItems")]);
    }
    engine.get("/health", [tracing_handler(&trace, "Health")]);
    let app = engine.into_app();

    get(&app, "/api/items");
    assert_eq!(*trace.lock().unwrap(), ["Logger", "Auth", "ListItems"]);

    trace.lock().unwrap().clear();
    get(&app, "/health");
    assert_eq!(*trace.lock().unwrap(), ["Logger", "Health"]);
}

#[test]
fn nested_groups_concatenate_prefixes_and_middleware() {
    let trace = Trace::default();
    let mut engine = Engine::new();
    {
        let mut api = engine.group("/api", [tracing_handler(&trace, "api")]);
        let mut v1 = api.group("v1", [tracing_handler(&trace, "v1")]);
        assert_eq!(v1.prefix(), "/api/v1");
        let mut admin = v1.group("/admin/", [tracing_handler(&trace, "admin")]);
        admin.delete("/users/:id", [tracing_handler(&trace, "DeleteUser")]);
    }
    let app = engine.into_app();

    let response = app.dispatch(request(Method::DELETE, "/api/v1/admin/users/9"));
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*trace.lock().unwrap(), ["api", "v1", "admin", "DeleteUser"]);
}

#[test]
fn middleware_added_later_only_affects_later_routes() {
    let trace = Trace::default();
    let mut engine = Engine::new();
    engine.get("/before", [tracing_handler(&trace, "before")]);
    engine.use_middleware([tracing_handler(&trace, "late")]);
    engine.get("/after", [tracing_handler(&trace, "after")]);
    let app = engine.into_app();

    get(&app, "/before");
    get(&app, "/after");
    assert_eq!(*trace.lock().unwrap(), ["before", "late", "after"]);
}

#[test]
fn reopened_group_keeps_prefix() {
    let mut engine = Engine::new();
    let id = engine.group("/shop", []).id();
    engine
        .router_group(id)
        .unwrap()
        .get("/cart", [handler(|c| c.string(StatusCode::OK, "cart"))]);

    let response = get(&engine.into_app(), "/shop/cart");
    assert_eq!(body_of(response), "cart");
}

#[test]
fn aborting_middleware_stops_chain() {
    let trace = Trace::default();
    let auth = {
        let trace = trace.clone();
        handler(move |c: &mut Context| {
            trace.lock().unwrap().push("Auth".to_string());
            if c.request_headers().get(header::AUTHORIZATION).is_none() {
                c.abort(StatusCode::UNAUTHORIZED);
            }
        })
    };

    let mut engine = Engine::new();
    engine
        .group("/api", [auth])
        .get("/items", [tracing_handler(&trace, "ListItems")]);
    let app = engine.into_app();

    let response = get(&app, "/api/items");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(*trace.lock().unwrap(), ["Auth"]);

    trace.lock().unwrap().clear();
    let authorized = http::Request::builder()
        .uri("/api/items")
        .header(header::AUTHORIZATION, "Bearer token")
        .body(Bytes::new())
        .unwrap();
    let response = app.dispatch(authorized);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*trace.lock().unwrap(), ["Auth", "ListItems"]);
}

#[test]
fn wrapping_middleware_sees_downstream_status() {
    let seen = Arc::new(Mutex::new(0u16));
    let observer = {
        let seen = seen.clone();
        handler(move |c: &mut Context| {
            c.advance();
            *seen.lock().unwrap() = c.writer().status();
        })
    };

    let mut engine = Engine::new();
    engine.use_middleware([observer]);
    engine.get("/teapot", [handler(|c| c.string(StatusCode::IM_A_TEAPOT, "short and stout"))]);
    get(&engine.into_app(), "/teapot");

    assert_eq!(*seen.lock().unwrap(), 418);
}

#[test]
fn not_found_chain_runs_after_root_middleware() {
    let trace = Trace::default();
    let mut engine = Engine::new();
    engine.use_middleware([tracing_handler(&trace, "Logger")]);
    engine.not_found([tracing_handler(&trace, "NotFound")]);
    let response = get(&engine.into_app(), "/nowhere");

    assert_eq!(*trace.lock().unwrap(), ["Logger", "NotFound"]);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_of(response), NOT_FOUND_BODY);
}

#[test]
fn not_found_handler_can_write_its_own_response() {
    let mut engine = Engine::new();
    engine.not_found([handler(|c| {
        c.json(StatusCode::NOT_FOUND, &serde_json::json!({ "error": "no such page" }));
    })]);
    let response = get(&engine.into_app(), "/missing");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(body_of(response), r#"{"error":"no such page"}"#);
}

#[test]
fn wrong_method_is_405_with_allow_header() {
    let mut engine = Engine::new();
    engine.get("/items", [handler(|_| {})]);
    let response = engine.into_app().dispatch(request(Method::PUT, "/items"));

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers()[header::ALLOW].to_str().unwrap();
    assert_eq!(allow, "GET, HEAD");
}

#[test]
fn recovery_middleware_turns_panic_into_500() {
    let mut engine = Engine::new();
    engine.use_middleware([recovery()]);
    engine.get("/panic", [handler(|_| panic!("handler bug"))]);
    let app = engine.into_app();

    let response = get(&app, "/panic");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The app keeps serving after a panic.
    assert_eq!(get(&app, "/panic").status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
    quantity: u32,
}

impl Validate for NewItem {
    fn validate(&self, _ctx: &Context) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::field("name", "must not be empty"));
        }
        Ok(())
    }
}

fn create_item_app(errors: &Arc<Mutex<Vec<String>>>) -> App {
    let errors = errors.clone();
    let collector = handler(move |c: &mut Context| {
        c.advance();
        let mut errors = errors.lock().unwrap();
        errors.extend(c.errors().iter().map(|e| e.msg.clone()));
    });

    let mut engine = Engine::new();
    engine.use_middleware([collector]);
    engine.post(
        "/items",
        [handler(|c| {
            if let Some(item) = c.ensure_body::<NewItem>() {
                c.json(
                    StatusCode::CREATED,
                    &serde_json::json!({ "name": item.name, "quantity": item.quantity }),
                );
            }
        })],
    );
    engine.into_app()
}

#[test]
fn valid_body_is_parsed() {
    let errors = Arc::default();
    let app = create_item_app(&errors);
    let response = app.dispatch(json_request("/items", r#"{"name":"bolt","quantity":3}"#));

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_of(response), r#"{"name":"bolt","quantity":3}"#);
    assert!(errors.lock().unwrap().is_empty());
}

#[test]
fn malformed_body_is_400_with_recorded_error() {
    let errors = Arc::default();
    let app = create_item_app(&errors);
    let response = app.dispatch(json_request("/items", "{not json"));

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    let decoder_message = serde_json::from_str::<serde_json::Value>("{not json")
        .unwrap_err()
        .to_string();
    assert_eq!(errors[0], decoder_message);
}

#[test]
fn invalid_body_is_400_with_validation_error() {
    let errors = Arc::default();
    let app = create_item_app(&errors);
    let response = app.dispatch(json_request("/items", r#"{"name":"  ","quantity":1}"#));

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(*errors.lock().unwrap(), ["name: must not be empty"]);
}

#[test]
fn key_store_carries_values_between_handlers() {
    let mut engine = Engine::new();
    engine.use_middleware([handler(|c| c.set("user", "ada".to_string()))]);
    engine.get(
        "/me",
        [handler(|c| {
            let user = c.must_get::<String>("user").clone();
            c.string(StatusCode::OK, &user);
        })],
    );
    assert_eq!(body_of(get(&engine.into_app(), "/me")), "ada");
}

#[test]
fn static_files_are_served_behind_root_middleware() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();

    let trace = Trace::default();
    let mut engine = Engine::new();
    engine.use_middleware([tracing_handler(&trace, "Logger")]);
    engine.serve_static("/assets", dir.path());
    let app = engine.into_app();

    let response = get(&app, "/assets/app.css");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    assert!(response.headers().contains_key(header::ETAG));
    assert_eq!(body_of(response), "body { margin: 0 }");
    assert_eq!(*trace.lock().unwrap(), ["Logger"]);

    let response = get(&app, "/assets");
    assert_eq!(body_of(response), "<h1>home</h1>");

    assert_eq!(get(&app, "/assets/.env").status(), StatusCode::FORBIDDEN);
    assert_eq!(get(&app, "/assets/missing.js").status(), StatusCode::NOT_FOUND);
}

#[test]
fn static_files_answer_conditional_requests() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("logo.svg"), "<svg/>").unwrap();

    let mut engine = Engine::new();
    engine.serve_static("/static", dir.path());
    let app = engine.into_app();

    let first = get(&app, "/static/logo.svg");
    let etag = first.headers()[header::ETAG].clone();

    let conditional = http::Request::builder()
        .uri("/static/logo.svg")
        .header(header::IF_NONE_MATCH, etag)
        .body(Bytes::new())
        .unwrap();
    let response = app.dispatch(conditional);
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(body_of(response), "");
}

#[test]
fn html_renders_loaded_templates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("hello.html"),
        "<p>Hello {{ name }}!</p>",
    )
    .unwrap();
    let pattern = format!("{}/*.html", dir.path().display());

    let mut engine = Engine::new();
    engine.load_templates(&pattern).unwrap();
    engine.get(
        "/hello/:name",
        [handler(|c| {
            let name = c.param("name").unwrap_or_default().to_string();
            c.html(StatusCode::OK, "hello.html", &serde_json::json!({ "name": name }));
        })],
    );
    let response = get(&engine.into_app(), "/hello/gantry");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(body_of(response), "<p>Hello gantry!</p>");
}

#[test]
fn html_without_templates_is_500() {
    let mut engine = Engine::new();
    engine.get(
        "/page",
        [handler(|c| c.html(StatusCode::OK, "page.html", &serde_json::json!({})))],
    );
    let response = get(&engine.into_app(), "/page");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn set_templates_accepts_prebuilt_set() {
    let mut templates = Templates::new();
    templates.add("greet.html", "hi {{ who }}").unwrap();

    let mut engine = Engine::new();
    engine.set_templates(templates);
    engine.get(
        "/",
        [handler(|c| c.html(StatusCode::OK, "greet.html", &serde_json::json!({ "who": "there" })))],
    );
    assert_eq!(body_of(get(&engine.into_app(), "/")), "hi there");
}

#[test]
fn custom_headers_reach_the_response() {
    let mut engine = Engine::new();
    engine.get(
        "/h",
        [handler(|c| {
            c.header("x-request-id", HeaderValue::from_static("abc"));
            c.string(StatusCode::OK, "ok");
        })],
    );
    let response = get(&engine.into_app(), "/h");
    assert_eq!(response.headers()["x-request-id"], "abc");
}

#[test]
#[should_panic(expected = "already registered")]
fn duplicate_route_panics() {
    let mut engine = Engine::new();
    engine.get("/dup", [handler(|_| {})]);
    engine.get("/dup", [handler(|_| {})]);
}

#[test]
fn try_handle_reports_duplicate_route() {
    let mut engine = Engine::new();
    let mut root = engine.root();
    root.try_handle(Method::GET, "/dup", [handler(|_| {})]).unwrap();
    assert!(root.try_handle(Method::GET, "/dup", [handler(|_| {})]).is_err());
}
