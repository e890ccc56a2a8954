//! Wiremock integration tests for GeminiClient.
//!
//! These tests verify the request shape and how each kind of service
//! response maps onto a result or an error.

use eggteto::codec::{SourceFile, encode};
use eggteto::config::ServiceConfig;
use eggteto::{Acquisition, Classification, EggtetoError, EncodedImage, FaceClassifier, GeminiClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn face() -> EncodedImage {
    encode(SourceFile::new("face.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], Acquisition::Gallery))
        .expect("jpeg source encodes")
}

/// Wrap the model's text output in a generateContent envelope.
fn envelope(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn eggen_73() -> String {
    json!({
        "type": "Eggen",
        "percentage": 73,
        "title": "부드러운 달걀형",
        "description": "둥근 이마와 부드러운 턱선이 특징입니다.",
        "stylingTips": ["레이어드 컷", "라운드 안경"],
        "celebrityLookalikes": ["아이유", "수지"]
    })
    .to_string()
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_classify_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&eggen_73())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let result = client.classify(face()).await.expect("classify should succeed");

    assert_eq!(result.classification(), Classification::Eggen);
    assert_eq!(result.confidence(), 73);
    assert_eq!(result.title(), "부드러운 달걀형");
    assert_eq!(result.styling_tips(), ["레이어드 컷", "라운드 안경"]);
    assert_eq!(result.lookalikes(), ["아이유", "수지"]);
}

#[tokio::test]
async fn test_request_carries_schema_and_raw_base64() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": { "required": ["type", "percentage", "title", "description", "stylingTips", "celebrityLookalikes"] }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&eggen_73())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let image = face();
    let expected_data = image.to_base64();
    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    client.classify(image).await.expect("classify should succeed");

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    let inline = &body["contents"][0]["parts"][0]["inlineData"];
    assert_eq!(inline["mimeType"], "image/jpeg");
    assert_eq!(inline["data"], expected_data.as_str());
    assert!(!inline["data"].as_str().unwrap().starts_with("data:"));

    let prompt = body["contents"][0]["parts"][1]["text"].as_str().unwrap();
    assert!(prompt.contains("Eggen"));
    assert!(prompt.contains("Teto"));

    let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn test_empty_text_is_empty_response() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, ResponseTemplate::new(200).set_body_json(envelope(""))).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert_eq!(err, EggtetoError::EmptyResponse);
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let mock_server = MockServer::start().await;
    let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
    mount(&mock_server, ResponseTemplate::new(200).set_body_json(blocked)).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert_eq!(err, EggtetoError::EmptyResponse);
}

#[tokio::test]
async fn test_non_json_text_is_malformed() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(envelope("I think this is an Eggen face.")),
    )
    .await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let mock_server = MockServer::start().await;
    let partial = json!({ "type": "Teto", "percentage": 60, "title": "각진 테토형" }).to_string();
    mount(&mock_server, ResponseTemplate::new(200).set_body_json(envelope(&partial))).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_out_of_range_percentage_is_malformed() {
    let mock_server = MockServer::start().await;
    let text = eggen_73().replace("73", "140");
    mount(&mock_server, ResponseTemplate::new(200).set_body_json(envelope(&text))).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unknown_type_is_malformed() {
    let mock_server = MockServer::start().await;
    let text = eggen_73().replace("Eggen", "Potato");
    mount(&mock_server, ResponseTemplate::new(200).set_body_json(envelope(&text))).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, ResponseTemplate::new(500).set_body_string("internal")).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    match err {
        EggtetoError::ServiceUnavailable(msg) => assert!(msg.contains("500"), "got {msg}"),
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_key_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        ResponseTemplate::new(403).set_body_json(json!({ "error": { "status": "PERMISSION_DENIED" } })),
    )
    .await;

    let client = GeminiClient::with_base_url("bad_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    match err {
        EggtetoError::ServiceUnavailable(msg) => assert!(msg.contains("credential"), "got {msg}"),
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        ResponseTemplate::new(429).insert_header("retry-after", "12"),
    )
    .await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    match err {
        EggtetoError::ServiceUnavailable(msg) => assert!(msg.contains("12"), "got {msg}"),
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_envelope_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, ResponseTemplate::new(200).set_body_string("<html>proxy</html>")).await;

    let client = GeminiClient::with_base_url("test_key", mock_server.uri()).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::ServiceUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_missing_key_never_calls_service() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&eggen_73())))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig {
        base_url: mock_server.uri(),
        ..ServiceConfig::default()
    };
    let client = GeminiClient::new(&config, None).unwrap();
    let err = client.classify(face()).await.unwrap_err();
    assert!(matches!(err, EggtetoError::ServiceUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_configured_model_selects_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&eggen_73())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ServiceConfig {
        base_url: format!("{}/", mock_server.uri()),
        model: "gemini-2.5-pro".to_string(),
        ..ServiceConfig::default()
    };
    let client = GeminiClient::new(&config, Some("test_key".to_string())).unwrap();
    assert_eq!(client.model(), "gemini-2.5-pro");
    client.classify(face()).await.expect("classify should succeed");
}
