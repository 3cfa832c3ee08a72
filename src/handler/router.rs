//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method
//! validation, route matching, and dispatching.

use crate::api::params::QueryParams;
use crate::api::{handlers, response};
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling.
///
/// Generic over the request body type: the server instantiates it with
/// `hyper::body::Incoming`, tests with `Full<Bytes>`. No route reads the
/// body, so no bound is required.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let is_head = method == Method::HEAD;

    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path.clone());
    entry.query = query.clone();
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_value(&req, "referer");
    entry.user_agent = header_value(&req, "user-agent");

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let mut response = build_response(&req, &state, &path, query.as_deref());

    if is_head {
        response = http::strip_body_for_head(response);
    }

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(hyper::header::SERVER, value);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = if is_head { 0 } else { declared_body_bytes(&response) };
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the transport-level gates, then dispatch to the matched route
fn build_response<B>(
    req: &Request<B>,
    state: &Arc<AppState>,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method(), state.config.http.enable_cors) {
        return resp;
    }

    if let Some(resp) = check_body_size(req, state.config.http.max_body_size) {
        return resp;
    }

    let params = match QueryParams::parse(query) {
        Ok(params) => params,
        Err(message) => return response::bad_request(&message),
    };

    match dispatch(path, &params) {
        Ok(resp) => resp,
        Err(message) => response::bad_request(&message),
    }
}

/// Check HTTP method and return an early response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if the declared size exceeds the limit
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

/// Route table: exact paths first, then the path-variable routes.
/// `Err` carries a binding-failure message for the 400 branch.
fn dispatch(path: &str, params: &QueryParams) -> Result<Response<Full<Bytes>>, String> {
    let response = match path {
        "/" => handlers::home(),
        "/hello" => handlers::hello(),
        "/greet" => handlers::greet(params),
        "/welcome" => handlers::welcome(params),
        "/info" => handlers::app_info(),
        "/health" => handlers::health(),
        "/users" => handlers::users(),
        "/status" => handlers::status(),
        "/calculate" => handlers::calculate(params)?,
        _ => dispatch_path_variable(path)?,
    };
    Ok(response)
}

/// Match the `/hello/{name}` and `/users/{id}` routes
fn dispatch_path_variable(path: &str) -> Result<Response<Full<Bytes>>, String> {
    if let Some(raw) = single_segment(path, "/hello/") {
        let name = decode_segment(raw)?;
        return Ok(handlers::hello_name(&name));
    }

    if let Some(raw) = single_segment(path, "/users/") {
        let id = decode_segment(raw)?
            .parse::<i64>()
            .map_err(|_| "Invalid user id: expected an integer".to_string())?;
        return Ok(handlers::user_by_id(id));
    }

    Ok(response::not_found())
}

/// A path variable is exactly one non-empty segment
fn single_segment<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest)
}

/// Percent-decode one path segment
fn decode_segment(raw: &str) -> Result<String, String> {
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| format!("Invalid encoding in path segment '{raw}'"))
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

fn header_value<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Body size as declared by the Content-Length header set at build time
fn declared_body_bytes(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    };
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(&Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                show_headers: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
            http: HttpConfig {
                server_name: "demo-api/0.1".to_string(),
                enable_cors: false,
                max_body_size: 1024,
            },
        }))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:54321".parse().unwrap()
    }

    fn request(method: Method, uri: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn run_on_runtime<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    async fn send(method: Method, uri: &str) -> Response<Full<Bytes>> {
        handle_request(request(method, uri), test_state(), peer())
            .await
            .unwrap()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_home_route() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/").await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(resp.headers()["Content-Type"], "text/plain; charset=utf-8");
            assert_eq!(body_string(resp).await, "Welcome to the Demo API Server!");
        });
    }

    #[test]
    fn test_hello_routes() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/hello").await;
            assert_eq!(body_string(resp).await, "Hello, World!");

            let resp = send(Method::GET, "/hello/Alice").await;
            assert_eq!(
                body_string(resp).await,
                "Hello, Alice! Welcome to our demo API."
            );

            // Percent-decoded path variable
            let resp = send(Method::GET, "/hello/John%20Doe").await;
            assert_eq!(
                body_string(resp).await,
                "Hello, John Doe! Welcome to our demo API."
            );
        });
    }

    #[test]
    fn test_path_variable_never_spans_segments() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/hello/a/b").await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);

            let resp = send(Method::GET, "/hello/").await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        });
    }

    #[test]
    fn test_unknown_path_is_404_with_endpoint_list() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/nope").await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body = body_json(resp).await;
            assert_eq!(body["available_endpoints"].as_array().unwrap().len(), 11);
        });
    }

    #[test]
    fn test_non_get_method_is_405() {
        run_on_runtime(async {
            let resp = send(Method::POST, "/hello").await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

            let resp = send(Method::DELETE, "/users/1").await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        });
    }

    #[test]
    fn test_options_returns_204() {
        run_on_runtime(async {
            let resp = send(Method::OPTIONS, "/").await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT);
            assert_eq!(resp.headers()["Allow"], "GET, HEAD, OPTIONS");
        });
    }

    #[test]
    fn test_head_returns_headers_without_body() {
        run_on_runtime(async {
            let resp = send(Method::HEAD, "/info").await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().contains_key("Content-Length"));
            assert!(body_string(resp).await.is_empty());
        });
    }

    #[test]
    fn test_user_lookup_routes() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/users/2").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["name"], "Jane Smith");

            // Unknown id is a soft error: still 200
            let resp = send(Method::GET, "/users/999").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["error"], "User not found");
            assert_eq!(body["id"], 999);
        });
    }

    #[test]
    fn test_users_listing() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/users").await;
            let body = body_json(resp).await;
            let list = body.as_array().unwrap();
            assert_eq!(list.len(), 3);
            assert_eq!(list[0]["id"], 1);
        });
    }

    #[test]
    fn test_non_integer_user_id_is_400() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/users/abc").await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body = body_json(resp).await;
            assert!(body.get("error").is_some());
        });
    }

    #[test]
    fn test_calculate_route() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/calculate?num1=15&num2=3&operation=divide").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["num1"], 15);
            assert_eq!(body["num2"], 3);
            assert_eq!(body["operation"], "divide");
            assert_eq!(body["result"], 5.0);
        });
    }

    #[test]
    fn test_calculate_defaults_route() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/calculate").await;
            let body = body_json(resp).await;
            assert_eq!(body["num1"], 10);
            assert_eq!(body["num2"], 5);
            assert_eq!(body["operation"], "add");
            assert_eq!(body["result"], 15);
        });
    }

    #[test]
    fn test_calculate_soft_errors_are_200() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/calculate?num2=0&operation=divide").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(body["error"], "Cannot divide by zero");
            assert!(body.get("result").is_none());

            let resp = send(Method::GET, "/calculate?operation=power").await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_json(resp).await;
            assert_eq!(
                body["error"],
                "Invalid operation. Use: add, subtract, multiply, divide"
            );
        });
    }

    #[test]
    fn test_calculate_preserves_operation_casing() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/calculate?operation=ADD").await;
            let body = body_json(resp).await;
            assert_eq!(body["operation"], "ADD");
            assert_eq!(body["result"], 15);
        });
    }

    #[test]
    fn test_calculate_binding_error_is_400() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/calculate?num1=abc").await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        });
    }

    #[test]
    fn test_greet_and_welcome_defaults() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/greet").await;
            let body = body_string(resp).await;
            assert!(body.starts_with("Greetings, Guest! Today is "));

            let resp = send(Method::GET, "/welcome?name=Alice&city=Paris").await;
            assert_eq!(
                body_string(resp).await,
                "Welcome Alice from Paris! Hope you're having a great day!"
            );

            let resp = send(Method::GET, "/welcome").await;
            assert_eq!(
                body_string(resp).await,
                "Welcome Guest from Unknown! Hope you're having a great day!"
            );
        });
    }

    #[test]
    fn test_oversized_declared_body_is_413() {
        run_on_runtime(async {
            let req = Request::builder()
                .method(Method::GET)
                .uri("/hello")
                .header("Content-Length", "4096")
                .body(Full::new(Bytes::new()))
                .unwrap();
            let resp = handle_request(req, test_state(), peer()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        });
    }

    #[test]
    fn test_server_header_is_set() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/health").await;
            assert_eq!(resp.headers()["Server"], "demo-api/0.1");
        });
    }

    #[test]
    fn test_status_route_lists_endpoints() {
        run_on_runtime(async {
            let resp = send(Method::GET, "/status").await;
            let body = body_json(resp).await;
            let endpoints = body["endpoints"].as_array().unwrap();
            assert_eq!(endpoints.len(), 11);
            assert!(endpoints.contains(&serde_json::json!("/hello/{name}")));
            assert!(endpoints.contains(&serde_json::json!("/users/{id}")));
        });
    }
}
