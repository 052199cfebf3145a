use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookshelf_api::routes::{create_router, AppState};
use bookshelf_api::services::providers::{build_http_client, GeminiProvider, OpenLibraryProvider};

const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";
const COVERS_URL: &str = "https://covers.test";

/// Test server whose catalog and language model both point at `upstream`
fn create_test_server(upstream: &MockServer) -> TestServer {
    let http_client = build_http_client(5).unwrap();
    let catalog = Arc::new(OpenLibraryProvider::new(
        http_client.clone(),
        upstream.uri(),
    ));
    let language_model = Arc::new(GeminiProvider::new(
        http_client,
        "test-key".to_string(),
        upstream.uri(),
        "gemini-test".to_string(),
    ));
    let state = AppState::new(catalog, language_model, COVERS_URL.to_string());
    TestServer::new(create_router(state)).unwrap()
}

fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

async fn mount_gemini(upstream: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(text)))
        .mount(upstream)
        .await;
}

fn six_recommendations() -> String {
    let titles = [
        ("Foundation", "Isaac Asimov"),
        ("Hyperion", "Dan Simmons"),
        ("The Left Hand of Darkness", "Ursula K. Le Guin"),
        ("Children of Time", "Adrian Tchaikovsky"),
        ("A Canticle for Leibowitz", "Walter M. Miller Jr."),
        ("The Stars My Destination", "Alfred Bester"),
    ];
    let items: Vec<Value> = titles
        .iter()
        .map(|(title, author)| json!({"title": title, "author": author, "why": "Epic scope"}))
        .collect();
    serde_json::to_string_pretty(&items).unwrap()
}

fn dune_request() -> Value {
    json!({"books": [{"title": "Dune", "author": "Frank Herbert"}]})
}

#[tokio::test]
async fn test_health_check() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);
    let id = "0b7c6a2e-8a7e-4f6b-9a7e-1f2d3c4b5a69";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.headers().get("x-request-id").unwrap(), id);
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.get("/health").await;
    let header = response.headers().get("x-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_recommend_empty_books() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&json!({"books": []})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("No books provided"));
}

#[tokio::test]
async fn test_recommend_missing_books() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_success_with_fenced_json() {
    let upstream = MockServer::start().await;
    mount_gemini(&upstream, &format!("```json\n{}\n```", six_recommendations())).await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status_ok();
    let candidates: Vec<Value> = response.json();
    assert_eq!(candidates.len(), 6);
    assert_eq!(candidates[0]["title"], "Foundation");
    assert_eq!(candidates[0]["author"], "Isaac Asimov");
    assert_eq!(candidates[0]["why"], "Epic scope");
}

#[tokio::test]
async fn test_recommend_bad_json_returns_raw_response() {
    let upstream = MockServer::start().await;
    mount_gemini(&upstream, "```json\n[bad json\n```").await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["rawResponse"], "[bad json");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse AI response"));
}

#[tokio::test]
async fn test_recommend_non_array_returns_raw_response() {
    let upstream = MockServer::start().await;
    mount_gemini(&upstream, r#"{"title": "Dune"}"#).await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["rawResponse"], r#"{"title": "Dune"}"#);
    assert_eq!(
        body["error"],
        "Failed to parse AI response: Unexpected response format. Expected an array."
    );
}

#[tokio::test]
async fn test_recommend_keeps_null_and_numeric_fields() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Dune Messiah", "author": null, "why": "Sequel"},
            {"title": "Solaris", "author": "Stanislaw Lem", "why": null},
            {"title": 1984, "author": "George Orwell", "why": "Surveillance"}]"#,
    )
    .await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status_ok();
    let candidates: Vec<Value> = response.json();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0]["title"], "Dune Messiah");
    assert_eq!(candidates[0]["author"], "");
    assert_eq!(candidates[1]["why"], "");
    assert_eq!(candidates[2]["title"], "1984");
}

#[tokio::test]
async fn test_recommend_enriched_null_author_falls_back() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Dune Messiah", "author": null, "why": "Sequel"}]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "Dune Messiah"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server
        .post("/api/recommend/enriched")
        .json(&dune_request())
        .await;

    response.assert_status_ok();
    let books: Vec<Value> = response.json();
    assert_eq!(books[0]["title"], "Dune Messiah");
    assert_eq!(books[0]["author"], "Unknown");
    assert_eq!(books[0]["why"], "Sequel");
}

#[tokio::test]
async fn test_recommend_whitespace_completion_is_malformed() {
    let upstream = MockServer::start().await;
    mount_gemini(&upstream, "  \n").await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["rawResponse"], "");
}

#[tokio::test]
async fn test_recommend_without_body_returns_json_error() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_recommend_non_json_body_returns_json_error() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").text("Dune by Frank Herbert").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    let response = server
        .post("/api/recommend/enriched")
        .json(&json!({"books": [{"title": "Dune"}]}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_recommend_empty_model_response() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Empty response from AI.");
    assert!(body.get("rawResponse").is_none());
}

#[tokio::test]
async fn test_recommend_upstream_failure() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/recommend").json(&dune_request()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body.get("error").is_some());
    assert!(body.get("rawResponse").is_none());
}

#[tokio::test]
async fn test_search_missing_query() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.get("/api/search").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing query");

    let response = server.get("/api/search?q=").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_returns_raw_payload() {
    let upstream = MockServer::start().await;
    let payload = json!({
        "numFound": 1,
        "start": 0,
        "docs": [{"key": "/works/OL893415W", "title": "Dune", "cover_i": 11481354}]
    });
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "dune"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server.get("/api/search?q=dune").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), payload);
}

#[tokio::test]
async fn test_search_upstream_failure() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server.get("/api/search?q=dune").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "Failed to fetch books");
}

#[tokio::test]
async fn test_recommend_enriched_full_pipeline() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Foundation", "author": "Isaac Asimov", "why": "Galactic politics"}]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "Foundation Isaac Asimov"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{
                "key": "/works/OL123",
                "title": "Foundation",
                "author_name": ["Isaac Asimov"],
                "cover_i": 42,
                "first_publish_year": 1951
            }]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/works/OL123.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "description": {"type": "/type/text", "value": "The Empire is dying."},
            "subjects": ["Science fiction", "Galactic empires", "Psychohistory",
                         "Robots", "Space", "Hari Seldon"]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/works/OL123/editions.json"))
        .and(query_param("languages", "eng"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{"isbn_10": ["0553293354"]}]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/works/OL123/ratings.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": {"average": 4.2, "count": 120}
        })))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server
        .post("/api/recommend/enriched")
        .json(&dune_request())
        .await;

    response.assert_status_ok();
    let books: Vec<Value> = response.json();
    assert_eq!(books.len(), 1);

    let book = &books[0];
    assert_eq!(book["title"], "Foundation");
    assert_eq!(book["author"], "Isaac Asimov");
    assert_eq!(book["cover"], "https://covers.test/b/id/42-M.jpg");
    assert_eq!(book["why"], "Galactic politics");
    assert_eq!(book["isbn"], "0553293354");
    assert_eq!(book["rating"], 4.2);
    assert_eq!(book["first_publish_year"], 1951);
    assert_eq!(book["synopsis"], "The Empire is dying.");
    assert_eq!(book["subjects"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_recommend_enriched_without_catalog_key() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Obscure Novel", "author": "Nobody", "why": "Hidden gem"}]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/works/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server
        .post("/api/recommend/enriched")
        .json(&dune_request())
        .await;

    response.assert_status_ok();
    let books: Vec<Value> = response.json();
    assert_eq!(
        books[0],
        json!({
            "title": "Obscure Novel",
            "author": "Nobody",
            "cover": "/placeholder.jpg",
            "why": "Hidden gem",
            "isbn": null,
            "first_publish_year": "Unknown",
            "subjects": ["N/A"],
            "synopsis": "No synopsis available.",
            "rating": "No rating"
        })
    );
}

#[tokio::test]
async fn test_recommend_enriched_search_failure_is_isolated() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Found", "author": "A", "why": "1"},
            {"title": "Lost", "author": "B", "why": "2"}]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "Lost B"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "Found A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{"title": "Found", "first_publish_year": 2001}]
        })))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    let response = server
        .post("/api/recommend/enriched")
        .json(&dune_request())
        .await;

    response.assert_status_ok();
    let books: Vec<Value> = response.json();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["first_publish_year"], 2001);
    assert_eq!(books[1]["title"], "Lost");
    assert_eq!(books[1]["first_publish_year"], "Unknown");
    assert_eq!(books[1]["why"], "2");
}

#[tokio::test]
async fn test_bookshelf_flow() {
    let upstream = MockServer::start().await;
    mount_gemini(
        &upstream,
        r#"[{"title": "Hyperion", "author": "Dan Simmons", "why": "Pilgrimage"}]"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    // Starts empty
    let shelf: Value = server.get("/api/bookshelf").await.json();
    assert_eq!(shelf["books"], json!([]));
    assert_eq!(shelf["recommendations"], json!([]));

    // Refreshing an empty shelf is rejected
    let response = server.post("/api/bookshelf/recommendations").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Please add books first.");

    // Add two books, remove one
    let response = server
        .post("/api/bookshelf/books")
        .json(&json!({"title": "Dune", "author": "Frank Herbert"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let dune: Value = response.json();

    let response = server
        .post("/api/bookshelf/books")
        .json(&json!({"title": "Solaris", "author": "Stanislaw Lem"}))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .delete(&format!("/api/bookshelf/books/{}", dune["id"].as_str().unwrap()))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let shelf: Value = server.get("/api/bookshelf").await.json();
    assert_eq!(shelf["books"].as_array().unwrap().len(), 1);
    assert_eq!(shelf["books"][0]["title"], "Solaris");

    // Refresh stores the batch on the shelf
    let response = server.post("/api/bookshelf/recommendations").await;
    response.assert_status_ok();
    let books: Vec<Value> = response.json();
    assert_eq!(books[0]["title"], "Hyperion");

    let shelf: Value = server.get("/api/bookshelf").await.json();
    assert_eq!(shelf["recommendations"][0]["title"], "Hyperion");
    assert!(shelf["recommended_at"].is_string());

    // Clear resets everything
    server
        .delete("/api/bookshelf")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let shelf: Value = server.get("/api/bookshelf").await.json();
    assert_eq!(shelf["books"], json!([]));
    assert_eq!(shelf["recommendations"], json!([]));
}

#[tokio::test]
async fn test_bookshelf_refresh_after_clear_is_not_stored() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_reply(
                    r#"[{"title": "Hyperion", "author": "Dan Simmons", "why": "Pilgrimage"}]"#,
                ))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .mount(&upstream)
        .await;
    let server = create_test_server(&upstream);

    server
        .post("/api/bookshelf/books")
        .json(&json!({"title": "Dune", "author": "Frank Herbert"}))
        .await
        .assert_status(StatusCode::CREATED);

    let (refresh, clear) = tokio::join!(
        async { server.post("/api/bookshelf/recommendations").await },
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            server.delete("/api/bookshelf").await
        }
    );

    refresh.assert_status_ok();
    clear.assert_status(StatusCode::NO_CONTENT);

    let shelf: Value = server.get("/api/bookshelf").await.json();
    assert_eq!(shelf["books"], json!([]));
    assert_eq!(shelf["recommendations"], json!([]));
    assert!(shelf["recommended_at"].is_null());
}

#[tokio::test]
async fn test_bookshelf_add_without_body_returns_json_error() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server.post("/api/bookshelf/books").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_bookshelf_remove_unknown_book() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server
        .delete(&format!("/api/bookshelf/books/{}", uuid::Uuid::new_v4()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bookshelf_rejects_blank_title() {
    let upstream = MockServer::start().await;
    let server = create_test_server(&upstream);

    let response = server
        .post("/api/bookshelf/books")
        .json(&json!({"title": "  ", "author": "Someone"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
