//! Security headers and request IDs on every kind of response.

use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use axum::response::Response;

mod common;
use common::{get, header, request, send, Site};

fn assert_security_headers(response: &Response) {
    let csp = header(response, "content-security-policy").expect("CSP header");
    let directives: Vec<&str> = csp.split(';').collect();

    assert!(directives.contains(&"default-src 'self'"), "{csp}");
    assert!(
        directives.contains(&"script-src 'self' cdnjs.cloudflare.com cdn.tailwindcss.com"),
        "{csp}"
    );
    assert!(
        directives.contains(&"style-src 'self' 'unsafe-inline' cdnjs.cloudflare.com"),
        "{csp}"
    );
    assert!(directives.contains(&"img-src 'self' data: https:"), "{csp}");
    assert!(directives.contains(&"font-src 'self' cdnjs.cloudflare.com"), "{csp}");

    assert_eq!(header(response, "x-content-type-options"), Some("nosniff"));
    assert_eq!(header(response, "x-frame-options"), Some("SAMEORIGIN"));
    assert_eq!(header(response, "referrer-policy"), Some("no-referrer"));
    assert_eq!(header(response, "cross-origin-opener-policy"), Some("same-origin"));
    assert_eq!(header(response, "cross-origin-embedder-policy"), None);
    assert_eq!(header(response, "cross-origin-resource-policy"), None);
}

#[tokio::test]
async fn present_on_successful_responses() {
    let site = Site::new();
    let router = site.router();
    for uri in ["/", "/logo.png", "/css/app.css", "/about/"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_security_headers(&response);
    }
}

#[tokio::test]
async fn present_on_redirects_not_modified_and_not_found() {
    let site = Site::new();
    let router = site.router();

    let redirect = get(&router, "/about").await;
    assert_eq!(redirect.status(), StatusCode::MOVED_PERMANENTLY);
    assert_security_headers(&redirect);

    let missing = get(&router, "/nope.js").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_security_headers(&missing);

    let etag = header(&get(&router, "/logo.png").await, "etag")
        .unwrap()
        .to_string();
    let not_modified = send(
        &router,
        request(Method::GET, "/logo.png")
            .header(header::IF_NONE_MATCH, etag)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(not_modified.status(), StatusCode::NOT_MODIFIED);
    assert_security_headers(&not_modified);
}

#[tokio::test]
async fn present_on_compressed_responses() {
    let site = Site::new();
    let response = send(
        &site.router(),
        request(Method::GET, "/css/app.css")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(header(&response, "content-encoding"), Some("gzip"));
    assert_security_headers(&response);
}

#[tokio::test]
async fn configured_sources_replace_the_defaults() {
    let site = Site::new();
    let mut config = site.config();
    config.security.script_src = vec!["'self'".into(), "https://cdn.example.com".into()];
    config.security.cross_origin_resource_policy = true;
    let router = static_site_server::HttpServer::new(config).unwrap().router();

    let response = get(&router, "/").await;
    let csp = header(&response, "content-security-policy").unwrap();
    assert!(csp.contains("script-src 'self' https://cdn.example.com;"));
    assert!(!csp.contains("cdn.tailwindcss.com"));
    assert_eq!(header(&response, "cross-origin-resource-policy"), Some("same-origin"));
    assert_eq!(header(&response, "cross-origin-embedder-policy"), None);
}

#[tokio::test]
async fn headers_can_be_switched_off() {
    let site = Site::new();
    let mut config = site.config();
    config.security.enable_headers = false;
    let router = static_site_server::HttpServer::new(config).unwrap().router();

    let response = get(&router, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-security-policy"), None);
}

#[tokio::test]
async fn request_id_is_generated_or_echoed() {
    let site = Site::new();
    let router = site.router();

    let generated = get(&router, "/").await;
    let id = header(&generated, "x-request-id").expect("request id");
    assert_eq!(id.len(), 36);

    let echoed = send(
        &router,
        request(Method::GET, "/nope")
            .header("x-request-id", "client-chosen-id")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(header(&echoed, "x-request-id"), Some("client-chosen-id"));
}
