//! A bad secrets file must not stop the client from starting.
//!
//! Lives in its own test binary because it points `HOME` at a tempdir.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use eggteto::codec::{SourceFile, encode};
use eggteto::config::{Secrets, ServiceConfig};
use eggteto::{Acquisition, EggtetoError, FaceClassifier, GeminiClient};

fn home_with_secrets(content: &str, mode: u32) -> TempDir {
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".eggteto");
    fs::create_dir(&dir).unwrap();
    let path = dir.join("secrets.toml");
    fs::write(&path, content).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    home
}

#[tokio::test]
async fn insecure_secrets_surface_on_first_classify() {
    let home = home_with_secrets("[gemini]\napi_key = \"AIza-world-readable\"\n", 0o644);
    // Only this test in this binary touches the environment.
    unsafe { std::env::set_var("HOME", home.path()) };

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let secrets = Secrets::load();
    assert!(secrets.gemini.is_none());

    let config = ServiceConfig {
        base_url: mock_server.uri(),
        ..ServiceConfig::default()
    };
    // Keep a developer's own key out of the picture.
    let client = GeminiClient::new(&config, secrets.api_key_with(|_| None)).unwrap();

    let image = encode(SourceFile::new("face.jpg", vec![0xFF, 0xD8, 0xFF], Acquisition::Gallery)).unwrap();
    let err = client.classify(image).await.unwrap_err();
    assert!(matches!(err, EggtetoError::ServiceUnavailable(_)), "got {err:?}");
}

#[test]
fn unparsable_secrets_fall_back_to_env() {
    let home = home_with_secrets("[gemini\napi_key = ", 0o600);

    let secrets = Secrets::load_from_home(Some(home.path()));
    let key = secrets.api_key_with(|name| (name == "API_KEY").then(|| "from-env".to_string()));
    assert_eq!(key.as_deref(), Some("from-env"));
}

#[test]
fn secure_secrets_are_used() {
    let home = home_with_secrets("[gemini]\napi_key = \"AIza-ok\"\n", 0o600);

    let secrets = Secrets::load_from_home(Some(home.path()));
    assert_eq!(secrets.api_key_with(|_| None).as_deref(), Some("AIza-ok"));
}
