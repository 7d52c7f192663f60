/// Integration tests for jawab's session flow using the offline mock backend.
use std::io::Write;

use jawab_client::{DocumentUpload, MockBackend};
use jawab_config::{Config, Mode};
use jawab_core::{DocumentStatus, SessionController, SessionError, FALLBACK_ANSWER};

fn mock_controller() -> SessionController {
    let cfg = Config {
        backend: jawab_config::BackendConfig {
            provider: "mock".into(),
            ..jawab_config::BackendConfig::default()
        },
        ..Config::default()
    };
    let backend = jawab_client::from_config(&cfg.backend).unwrap();
    SessionController::new(backend, cfg.session)
}

#[tokio::test]
async fn upload_then_ask_round_trips_document_id() {
    let ctrl = mock_controller();
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4 lecture notes").unwrap();

    let upload = DocumentUpload::from_path(file.path()).await.unwrap();
    let receipt = ctrl.upload_document(upload).await.unwrap();
    assert_eq!(receipt.document_id, "mock-doc-1");

    let outcome = ctrl.ask("What is chapter 2 about?").await.unwrap();
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.turn().text, "MOCK: What is chapter 2 about?");
    assert_eq!(outcome.turn().sources, vec!["mock-doc-1 (study)"]);

    let snap = ctrl.snapshot();
    assert_eq!(snap.conversation().len(), 2);
    assert_eq!(snap.document().status(), DocumentStatus::Ready);
    assert!(!snap.is_pending());
}

#[tokio::test]
async fn mode_switch_requires_new_upload() {
    let ctrl = mock_controller();
    ctrl.upload_document(DocumentUpload::new("notes.pdf", b"x".to_vec()))
        .await
        .unwrap();
    ctrl.ask("q").await.unwrap();

    assert!(ctrl.set_mode(Mode::Invoice).unwrap());
    assert!(matches!(
        ctrl.ask("Total?").await,
        Err(SessionError::DocumentNotReady { .. })
    ));

    ctrl.upload_document(DocumentUpload::new("bill.pdf", b"y".to_vec()))
        .await
        .unwrap();
    let outcome = ctrl.ask("Total?").await.unwrap();
    assert_eq!(outcome.turn().sources, vec!["mock-doc-2 (invoice)"]);
    assert_eq!(ctrl.snapshot().conversation().len(), 2);
}

#[tokio::test]
async fn unreachable_backend_yields_fallback_turn() {
    // Bind then drop to obtain a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let cfg = jawab_config::BackendConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_secs: 5,
        ..jawab_config::BackendConfig::default()
    };
    let http = jawab_client::from_config(&cfg).unwrap();
    let mock = std::sync::Arc::new(MockBackend::default());
    // Real HTTP chat, offline documents so a document can become ready.
    let ctrl = SessionController::with_clients(mock, http.chat, Default::default());
    ctrl.upload_document(DocumentUpload::new("notes.pdf", b"x".to_vec()))
        .await
        .unwrap();

    let outcome = ctrl.ask("anyone there?").await.unwrap();
    assert!(outcome.is_fallback());
    assert_eq!(outcome.turn().text, FALLBACK_ANSWER);
    assert!(!ctrl.is_pending());
}

#[test]
fn config_file_selects_mock_backend_and_window() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "backend:\n  provider: mock\nsession:\n  default_mode: invoice\n  history_window: 6"
    )
    .unwrap();

    let cfg = jawab_config::load(Some(file.path())).unwrap();
    assert_eq!(cfg.backend.provider, "mock");
    assert_eq!(cfg.session.default_mode, Mode::Invoice);
    assert_eq!(cfg.session.history_window, 6);

    let backend = jawab_client::from_config(&cfg.backend).unwrap();
    let ctrl = SessionController::new(backend, cfg.session);
    assert_eq!(ctrl.mode(), Mode::Invoice);
}
