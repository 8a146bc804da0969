use ddl_engine::{
    FailureKind, HttpClient, HttpRequest, HttpSettings, Method, ReqwestHttpClient,
};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(settings: HttpSettings) -> ReqwestHttpClient {
    ReqwestHttpClient::new(settings).expect("client builds")
}

#[tokio::test]
async fn redirect_is_visible_through_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/go/1"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/files/a.zip"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("zip"))
        .mount(&server)
        .await;

    let url = format!("{}/go/1", server.uri());
    let response = client(HttpSettings::default())
        .send(HttpRequest::get(&url))
        .await
        .expect("send ok");

    assert_eq!(response.status, 200);
    assert_eq!(response.requested_url, url);
    assert_eq!(response.final_url, format!("{}/files/a.zip", server.uri()));
    assert!(response.was_redirected());
    assert_eq!(response.body, "zip");
}

#[tokio::test]
async fn non_success_status_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let response = client(HttpSettings::default())
        .send(HttpRequest::get(&url))
        .await
        .expect("404 is still a response");

    assert_eq!(response.status, 404);
    assert_eq!(response.body, "not here");
    assert!(!response.was_redirected());
}

#[tokio::test]
async fn post_sends_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ajax/download"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header("Referer", "https://mag.example/issue/7"))
        .and(body_string("id=42"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"a":"https://files.example/1"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let request = HttpRequest {
        method: Method::Post,
        url: format!("{}/ajax/download", server.uri()),
        headers: vec![
            ("Referer".to_string(), "https://mag.example/issue/7".to_string()),
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
        ],
        body: Some("id=42".to_string()),
    };
    let response = client(HttpSettings::default())
        .send(request)
        .await
        .expect("send ok");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"a":"https://files.example/1"}"#);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(256)))
        .mount(&server)
        .await;

    let settings = HttpSettings {
        max_bytes: 64,
        ..HttpSettings::default()
    };
    let err = client(settings)
        .send(HttpRequest::get(format!("{}/big", server.uri())))
        .await
        .expect_err("too large");

    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 64, .. }));
}

#[tokio::test]
async fn redirect_limit_is_enforced() {
    let server = MockServer::start().await;
    for (from, to) in [("/a", "/b"), ("/b", "/c"), ("/c", "/d")] {
        Mock::given(method("GET"))
            .and(path(from))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", to))
            .mount(&server)
            .await;
    }

    let settings = HttpSettings {
        redirect_limit: 1,
        ..HttpSettings::default()
    };
    let err = client(settings)
        .send(HttpRequest::get(format!("{}/a", server.uri())))
        .await
        .expect_err("redirect limit");

    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
}

#[tokio::test]
async fn invalid_url_is_reported() {
    let err = client(HttpSettings::default())
        .send(HttpRequest::get("not a url"))
        .await
        .expect_err("invalid");

    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
