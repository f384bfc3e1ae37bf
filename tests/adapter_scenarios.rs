//! End-to-end tool calls against mocked upstream services.
//!
//! Each test builds a real registry with the reqwest client and points the
//! configured service URLs at a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use mcp_operator::core::Config;
use mcp_operator::domains::tools::ToolRegistry;
use serde_json::{Value, json};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.credentials.google_api_key = Some("test-key".into());
    config.credentials.google_cse_id = Some("test-engine".into());
    config.credentials.noun_project_client_key = Some("ck".into());
    config.credentials.noun_project_client_secret = Some("cs".into());
    config.tools.google_cse_api_url = format!("{}/customsearch/v1", server.uri());
    config.tools.noun_project_base_url = server.uri();
    config.tools.astrology_api_url = Some(server.uri());
    config.tools.nasa_images_api_url = server.uri();
    config
}

fn registry(config: Config) -> ToolRegistry {
    ToolRegistry::new(Arc::new(config)).unwrap()
}

fn image_hits(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "title": format!("Andromeda {i}"),
                "link": format!("https://img.test/andromeda-{i}.jpg"),
                "image": {"contextLink": "https://nasa.test/m31", "width": 1024, "height": 768}
            })
        })
        .collect();
    json!({ "items": items })
}

/// Exactly one of `result` / `error` is present.
fn assert_well_formed(envelope: &Value) {
    let has_result = envelope.get("result").is_some();
    let has_error = envelope.get("error").is_some();
    assert!(has_result != has_error, "malformed envelope: {envelope}");
    assert_eq!(envelope["is_successful"], has_result);
}

// =============================================================================
// Image Search
// =============================================================================

#[tokio::test]
async fn test_search_images_returns_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("q", "Andromeda galaxy"))
        .and(query_param("num", "5"))
        .and(query_param("key", "test-key"))
        .and(query_param("cx", "test-engine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_hits(5)))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope(
            "search_images",
            json!({"query": "Andromeda galaxy", "num_results": 5}),
        )
        .await;

    assert_well_formed(&envelope);
    assert_eq!(envelope["is_successful"], true);
    let images = envelope["result"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 5);
    assert_eq!(images[0]["source_url"], "https://nasa.test/m31");
}

#[tokio::test]
async fn test_search_images_clamps_result_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_hits(10)))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope("search_images", json!({"query": "nebula", "num_results": 37}))
        .await;

    assert_eq!(envelope["result"]["images"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_zero_results_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})))
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope("search_images", json!({"query": "qwzxv"}))
        .await;

    assert_eq!(envelope, json!({"is_successful": true, "result": {"images": []}}));
}

#[tokio::test]
async fn test_missing_credentials_never_reach_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_hits(1)))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.credentials.google_api_key = None;

    let envelope = registry(config)
        .call_envelope("search_images", json!({"query": "Andromeda galaxy"}))
        .await;

    assert_well_formed(&envelope);
    assert!(envelope["error"].as_str().unwrap().contains("GOOGLE_API_KEY"));
}

#[tokio::test]
async fn test_upstream_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Quota exceeded"))
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope("search_images", json!({"query": "m31"}))
        .await;

    assert_eq!(envelope["error"], "Search failed: HTTP 429: Quota exceeded");
}

#[tokio::test]
async fn test_upstream_timeout_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_hits(1))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.tools.upstream_timeout_secs = 1;

    let envelope = registry(config)
        .call_envelope("search_images", json!({"query": "m31"}))
        .await;

    let error = envelope["error"].as_str().unwrap();
    assert!(error.starts_with("Search failed: request timed out"), "{error}");
}

#[tokio::test]
async fn test_identical_calls_produce_identical_envelopes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_hits(3)))
        .expect(2)
        .mount(&server)
        .await;

    let registry = registry(config_for(&server));
    let arguments = json!({"query": "Andromeda galaxy", "num_results": 3});
    let first = registry.call_envelope("search_images", arguments.clone()).await;
    let second = registry.call_envelope("search_images", arguments).await;

    assert_eq!(first.to_string(), second.to_string());
}

// =============================================================================
// Icons
// =============================================================================

#[tokio::test]
async fn test_download_icon_encodes_binary_body() {
    let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13];

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/icon/12345/download"))
        .and(query_param("filetype", "png"))
        .and(query_param("size", "200"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope(
            "download_icon",
            json!({"icon_id": 12345, "filetype": "png", "size": 200}),
        )
        .await;

    assert_well_formed(&envelope);
    let result = &envelope["result"];
    assert_eq!(result["content_type"], "image/png");
    let decoded = BASE64.decode(result["data"].as_str().unwrap()).unwrap();
    assert_eq!(decoded, png);
}

// =============================================================================
// NASA
// =============================================================================

#[tokio::test]
async fn test_nasa_album_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/album/Apollo-at-50"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": {
                "items": [{
                    "data": [{"nasa_id": "as11-40-5874", "title": "Buzz Aldrin on the Moon"}],
                    "links": [{"href": "https://images.test/as11~thumb.jpg"}]
                }],
                "metadata": {"total_hits": 101}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope("get_nasa_album", json!({"album_name": "Apollo-at-50", "page": 2}))
        .await;

    assert_well_formed(&envelope);
    let result = &envelope["result"];
    assert_eq!(result["total_hits"], 101);
    assert_eq!(result["items"][0]["preview_url"], "https://images.test/as11~thumb.jpg");
}

#[tokio::test]
async fn test_nasa_metadata_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/metadata/missing-id"))
        .respond_with(ResponseTemplate::new(404).set_body_string("No assets found"))
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope("get_nasa_metadata", json!({"nasa_id": "missing-id"}))
        .await;

    assert_eq!(
        envelope["error"],
        "NASA metadata lookup failed: HTTP 404: No assets found"
    );
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_missing_required_parameter_is_named() {
    let server = MockServer::start().await;
    let registry = registry(config_for(&server));

    for (tool, missing) in [
        ("search_images", "query"),
        ("download_icon", "icon_id"),
        ("generate_birth_chart_data", "time_utc"),
    ] {
        let envelope = registry.call_envelope(tool, json!({"filetype": "png"})).await;
        assert_well_formed(&envelope);
        let error = envelope["error"].as_str().unwrap();
        assert!(error.contains(missing), "{tool}: {error}");
    }
}

#[tokio::test]
async fn test_unknown_tool() {
    let server = MockServer::start().await;
    let envelope = registry(config_for(&server))
        .call_envelope("launch_rocket", json!({}))
        .await;

    assert_eq!(
        envelope,
        json!({"is_successful": false, "error": "Unknown tool: launch_rocket"})
    );
}

// =============================================================================
// Astrology
// =============================================================================

#[tokio::test]
async fn test_visual_chart_without_base_url_fails_before_rendering() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<svg/>", "image/svg+xml"))
        .expect(0)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope(
            "generate_visual_chart",
            json!({"time_utc": "1990-07-14T08:30:00Z", "latitude": 51.5, "longitude": -0.12}),
        )
        .await;

    assert_well_formed(&envelope);
    let error = envelope["error"].as_str().unwrap();
    assert!(error.contains("Cannot provide chart URL"), "{error}");
}

#[tokio::test]
async fn test_visual_chart_writes_file_and_returns_url() {
    let tmp = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/natal/svg"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<svg>chart</svg>", "image/svg+xml"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.tools.outputs_dir = tmp.path().to_path_buf();
    config.tools.outputs_web_base_url = Some("https://files.test/".into());

    let envelope = registry(config)
        .call_envelope(
            "generate_visual_chart",
            json!({"time_utc": "1990-07-14T08:30:00Z", "latitude": 51.5, "longitude": -0.12,
                   "name": "Ada"}),
        )
        .await;

    let url = envelope["result"]["chart_url"].as_str().unwrap();
    assert!(url.starts_with("https://files.test/tools/astrology/charts/natal_chart_ada_"), "{url}");

    let filename = url.rsplit('/').next().unwrap();
    let written = std::fs::read_to_string(tmp.path().join("tools/astrology/charts").join(filename)).unwrap();
    assert_eq!(written, "<svg>chart</svg>");
}

#[tokio::test]
async fn test_relationship_score_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/relationship"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"score": 9.999})))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = registry(config_for(&server))
        .call_envelope(
            "get_relationship_score",
            json!({
                "person1_time_utc": "1990-07-14T08:30:00Z", "person1_latitude": 1.0,
                "person1_longitude": 2.0, "person1_name": "Ada",
                "person2_time_utc": "1991-01-01T00:00:00Z", "person2_latitude": 3.0,
                "person2_longitude": 4.0, "person2_name": "Charles"
            }),
        )
        .await;

    assert_eq!(
        envelope["result"],
        json!({"person1_name": "Ada", "person2_name": "Charles",
               "relationship_score": 10.0, "description": null})
    );
}
