use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{serve, Json, Router};
use codeshare::config::Endpoints;
use codeshare::transfer::backends::{FileIo, GoFile};
use codeshare::transfer::{Archiver, BackendKind, HttpDownloader, ZipArchiver};
use codeshare::{
    App, CommandRunner, Config, Credential, DependencyManifest, DirectDownloadUrl, HostUi,
    InstallerCommand, LinkResolver, MessageLevel, TransferError,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

// ============================================================================
// Test host
// ============================================================================

#[derive(Default)]
struct TestHost {
    messages: Mutex<Vec<(MessageLevel, String)>>,
    opened: Mutex<Vec<PathBuf>>,
    prompt_answer: Option<String>,
    fail_open: bool,
}

impl TestHost {
    fn messages(&self) -> Vec<(MessageLevel, String)> {
        self.messages.lock().unwrap().clone()
    }

    fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostUi for TestHost {
    async fn prompt(&self, _message: &str, _masked: bool) -> Option<String> {
        self.prompt_answer.clone()
    }

    fn show(&self, level: MessageLevel, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }

    async fn open_workspace(&self, path: &Path, _new_window: bool) -> Result<(), TransferError> {
        if self.fail_open {
            return Err(TransferError::Workspace("editor crashed".to_string()));
        }
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<InstallerCommand>>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &InstallerCommand, _cwd: &Path) -> std::io::Result<bool> {
        self.calls.lock().unwrap().push(command.clone());
        Ok(true)
    }
}

// ============================================================================
// Test file host
// ============================================================================

struct ServerState {
    base: String,
    archive: Vec<u8>,
    hits: AtomicUsize,
    uploads: AtomicUsize,
    /// File name and content of the last gist created
    gist: Mutex<Option<(String, String)>>,
}

struct TestFileHost {
    base: Url,
    state: Arc<ServerState>,
}

impl TestFileHost {
    async fn spawn(archive: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");
        let state = Arc::new(ServerState {
            base: base.clone(),
            archive,
            hits: AtomicUsize::new(0),
            uploads: AtomicUsize::new(0),
            gist: Mutex::new(None),
        });

        let router = Router::new()
            .route("/uploadfile", post(gofile_upload))
            .route("/broken/uploadfile", post(broken_upload))
            .route("/contents/{id}", get(gofile_contents))
            .route("/", post(fileio_upload))
            .route("/dl/{name}", get(download))
            .route("/gists", post(gist_create))
            .route("/gists/{id}", get(gist_metadata))
            .route("/raw/{id}", get(gist_raw))
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = serve(listener, router).await;
        });

        Self {
            base: Url::parse(&format!("{base}/")).unwrap(),
            state,
        }
    }

    fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    fn endpoints(&self) -> Endpoints {
        Endpoints {
            gofile_upload: self.base.clone(),
            gofile_api: self.base.clone(),
            fileio: self.base.clone(),
            gist_api: self.base.clone(),
        }
    }
}

fn is_multipart_file(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    text.contains("name=\"file\"") && text.contains("filename=")
}

async fn gofile_upload(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if !is_multipart_file(&body) {
        return (StatusCode::BAD_REQUEST, "missing file field").into_response();
    }
    state.uploads.fetch_add(1, Ordering::SeqCst);
    Json(json!({"status": "ok", "data": {"downloadPage": "https://gofile.io/d/XYZ"}})).into_response()
}

async fn broken_upload(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "storage offline").into_response()
}

async fn fileio_upload(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if !is_multipart_file(&body) {
        return (StatusCode::BAD_REQUEST, "missing file field").into_response();
    }
    state.uploads.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "key": "abc", "link": format!("{}/dl/abc.zip", state.base)}))
        .into_response()
}

async fn gofile_contents(
    State(state): State<Arc<ServerState>>,
    UrlPath(id): UrlPath<String>,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let contents = match id.as_str() {
        "XYZ" => json!({"f1": {"link": format!("{}/dl/abc.zip", state.base)}}),
        "SHARED" => json!({"f1": {"link": "https://store/dl/abc.zip"}}),
        "NOLINK" => json!({"f1": {"name": "abc.zip"}}),
        _ => json!({}),
    };
    Json(json!({"status": "ok", "data": {"contents": contents}}))
}

async fn download(
    State(state): State<Arc<ServerState>>,
    UrlPath(name): UrlPath<String>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if name == "abc.zip" {
        state.archive.clone().into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

const GIST_TOKEN: &str = "ghp_test_token";

async fn gist_create(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {GIST_TOKEN}").as_str());
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["public"] != json!(false) {
        return (StatusCode::BAD_REQUEST, "gist must be secret").into_response();
    }
    let Some((name, file)) = body["files"].as_object().and_then(|f| f.iter().next()) else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "no files").into_response();
    };
    let Some(content) = file["content"].as_str() else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "no content").into_response();
    };

    state.uploads.fetch_add(1, Ordering::SeqCst);
    *state.gist.lock().unwrap() = Some((name.clone(), content.to_string()));
    (
        StatusCode::CREATED,
        Json(json!({"id": "abc123", "html_url": "https://gist.github.com/abc123"})),
    )
        .into_response()
}

async fn gist_metadata(
    State(state): State<Arc<ServerState>>,
    UrlPath(id): UrlPath<String>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let stored = state.gist.lock().unwrap().clone();
    match stored {
        Some((name, _)) if id == "abc123" => Json(json!({
            "id": id,
            "files": {
                name.clone(): {"raw_url": format!("{}/raw/{id}", state.base), "truncated": false}
            }
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn gist_raw(State(state): State<Arc<ServerState>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let stored = state.gist.lock().unwrap().clone();
    match stored {
        // Served line-wrapped, the way long text files usually come back.
        Some((_, content)) => content
            .as_bytes()
            .chunks(76)
            .map(|line| format!("{}\n", String::from_utf8_lossy(line)))
            .collect::<String>()
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves one response that promises more body than it sends, then hangs up.
async fn truncated_body_server() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        let _ = socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\nContent-Length: 4096\r\n\r\nPK\x03\x04partial",
            )
            .await;
        let _ = socket.shutdown().await;
    });
    Url::parse(&format!("http://{addr}/dl/abc.zip")).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let source = project(files);
    let scratch = tempfile::tempdir().unwrap();
    let archive = ZipArchiver::new(scratch.path())
        .create_archive(source.path())
        .unwrap();
    std::fs::read(archive.path()).unwrap()
}

fn config_for(server: &TestFileHost, scratch: &TempDir, backend: BackendKind) -> Config {
    Config {
        backend,
        scratch_dir: Some(scratch.path().to_path_buf()),
        bootstrap_delay_ms: 0,
        endpoints: server.endpoints(),
        ..Config::default()
    }
}

fn scratch_entries(scratch: &TempDir) -> Vec<String> {
    std::fs::read_dir(scratch.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

// ============================================================================
// Send
// ============================================================================

#[tokio::test]
async fn send_returns_download_page_and_cleans_scratch() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();
    let source = project(&[("a.txt", "a"), ("b/c.txt", "c")]);

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    )
    .with_workspace_folder(Some(source.path().to_path_buf()));

    let link = app.send_code().await.unwrap();

    assert_eq!(link.as_str(), "https://gofile.io/d/XYZ");
    assert_eq!(server.state.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(
        app.host().messages(),
        vec![(
            MessageLevel::Info,
            "Share link: https://gofile.io/d/XYZ".to_string()
        )]
    );
    assert!(scratch_entries(&scratch).is_empty());
}

#[tokio::test]
async fn send_without_open_folder_does_nothing() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    );

    let err = app.send_code().await.unwrap_err();

    assert_eq!(err.to_string(), "No folder is open.");
    assert_eq!(
        app.host().messages(),
        vec![(MessageLevel::Error, "No folder is open.".to_string())]
    );
    assert_eq!(server.hits(), 0);
    assert!(scratch_entries(&scratch).is_empty());
}

#[tokio::test]
async fn send_reports_backend_failure() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();
    let source = project(&[("a.txt", "a")]);
    let mut config = config_for(&server, &scratch, BackendKind::Gofile);
    config.endpoints.gofile_upload = server.base.join("broken/").unwrap();

    let app = App::new(TestHost::default(), config)
        .with_workspace_folder(Some(source.path().to_path_buf()));

    let err = app.send_code().await.unwrap_err();

    match &err {
        TransferError::Upload {
            backend,
            http_status,
            ..
        } => {
            assert_eq!(backend, "GoFile");
            assert_eq!(*http_status, Some(500));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let messages = app.host().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, MessageLevel::Error);
    assert!(messages[0].1.starts_with("Upload failed:"));
    assert!(scratch_entries(&scratch).is_empty());
}

#[tokio::test]
async fn gist_send_without_token_is_refused() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();
    let source = project(&[("a.txt", "a")]);

    // The prompt is dismissed, so no token is available.
    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gist),
    )
    .with_workspace_folder(Some(source.path().to_path_buf()));

    let err = app.send_code().await.unwrap_err();

    assert!(matches!(err, TransferError::MissingCredential { .. }));
    assert_eq!(server.hits(), 0);
}

// ============================================================================
// Resolve
// ============================================================================

#[tokio::test]
async fn resolve_picks_first_content_link() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let resolver = GoFile::new(reqwest::Client::new(), &server.endpoints(), None);

    let direct = resolver.resolve("https://gofile.io/d/SHARED").await.unwrap();

    assert_eq!(direct.url.as_str(), "https://store/dl/abc.zip");
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn resolve_empty_contents_is_no_content() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let resolver = GoFile::new(reqwest::Client::new(), &server.endpoints(), None);

    let err = resolver
        .resolve("https://gofile.io/d/EMPTY")
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NoContent { ref id } if id == "EMPTY"));
}

#[tokio::test]
async fn resolve_entry_without_link_is_missing_link() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let resolver = GoFile::new(reqwest::Client::new(), &server.endpoints(), None);

    let err = resolver
        .resolve("https://gofile.io/d/NOLINK")
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::MissingLink { ref entry } if entry == "f1"));
}

#[tokio::test]
async fn malformed_links_never_reach_the_network() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let resolver = GoFile::new(reqwest::Client::new(), &server.endpoints(), None);

    for link in ["not-a-link", "https://gofile.io/x/XYZ", "https://gofile.io/d/", ""] {
        let err = resolver.resolve(link).await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidLink { .. }), "{link}");
    }
    assert_eq!(server.hits(), 0);
}

// ============================================================================
// Download
// ============================================================================

#[tokio::test]
async fn download_streams_body_to_scratch() {
    let body = zip_of(&[("a.txt", "a")]);
    let server = TestFileHost::spawn(body.clone()).await;
    let scratch = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::new(reqwest::Client::new(), scratch.path());

    let local = downloader
        .download(&DirectDownloadUrl::raw(server.base.join("dl/abc.zip").unwrap()))
        .await
        .unwrap();

    assert_eq!(std::fs::read(local.path()).unwrap(), body);
    assert_eq!(local.size_bytes, body.len() as u64);
    assert!(local.path().starts_with(scratch.path()));
}

#[tokio::test]
async fn download_of_missing_file_fails() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::new(reqwest::Client::new(), scratch.path());

    let err = downloader
        .download(&DirectDownloadUrl::raw(server.base.join("dl/gone.zip").unwrap()))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Download(_)));
    assert!(scratch_entries(&scratch).is_empty());
}

#[tokio::test]
async fn download_cut_short_fails_and_leaves_nothing() {
    let url = truncated_body_server().await;
    let scratch = tempfile::tempdir().unwrap();
    let downloader = HttpDownloader::new(reqwest::Client::new(), scratch.path());

    let err = downloader
        .download(&DirectDownloadUrl::raw(url))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Download(_)), "{err:?}");
    assert!(scratch_entries(&scratch).is_empty());
}

// ============================================================================
// Receive
// ============================================================================

#[tokio::test]
async fn receive_opens_workspace_and_installs_once() {
    let files = [
        ("package.json", "{\"name\": \"demo\"}"),
        ("src/index.js", "console.log('hi')"),
    ];
    let server = TestFileHost::spawn(zip_of(&files)).await;
    let scratch = tempfile::tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    )
    .with_command_runner(runner.clone());

    let received = app
        .receive_code(Some("https://gofile.io/d/XYZ"))
        .await
        .unwrap()
        .expect("a link was given");

    assert_eq!(app.host().opened(), vec![received.workspace.clone()]);
    assert_eq!(
        std::fs::read_to_string(received.workspace.join("src/index.js")).unwrap(),
        "console.log('hi')"
    );
    assert_eq!(received.stats.files_extracted, 2);

    let outcome = received.bootstrap.await.unwrap().unwrap();
    assert_eq!(outcome.manifest, DependencyManifest::PackageJson);
    assert_eq!(
        *runner.calls.lock().unwrap(),
        vec![DependencyManifest::PackageJson.installer()]
    );

    // Only the opened workspace is left in scratch storage.
    let leftovers = scratch_entries(&scratch);
    assert_eq!(leftovers.len(), 1, "{leftovers:?}");
    assert!(received.workspace.starts_with(scratch.path()));
}

#[tokio::test]
async fn receive_invalid_link_fails_without_network() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    );

    let err = app.receive_code(Some("not-a-link")).await.unwrap_err();

    assert!(matches!(err, TransferError::InvalidLink { .. }));
    assert_eq!(server.hits(), 0);
    assert!(app.host().opened().is_empty());
    let messages = app.host().messages();
    assert!(messages[0].1.starts_with("Invalid GoFile link"));
}

#[tokio::test]
async fn receive_failed_open_leaves_no_workspace() {
    let server = TestFileHost::spawn(zip_of(&[("requirements.txt", "flask\n")])).await;
    let scratch = tempfile::tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let host = TestHost {
        fail_open: true,
        ..TestHost::default()
    };

    let app = App::new(host, config_for(&server, &scratch, BackendKind::Gofile))
        .with_command_runner(runner.clone());

    let err = app
        .receive_code(Some("https://gofile.io/d/XYZ"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Workspace(_)));
    assert!(scratch_entries(&scratch).is_empty());
    assert!(runner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn receive_garbage_archive_is_extraction_error() {
    let server = TestFileHost::spawn(b"definitely not a zip".to_vec()).await;
    let scratch = tempfile::tempdir().unwrap();

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    );

    let err = app
        .receive_code(Some("https://gofile.io/d/XYZ"))
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Extraction(_)));
    assert!(app.host().opened().is_empty());
    assert!(scratch_entries(&scratch).is_empty());
}

#[tokio::test]
async fn receive_prompts_and_accepts_dismissal() {
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();

    let app = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gofile),
    );

    let received = app.receive_code(None).await.unwrap();

    assert!(received.is_none());
    assert!(app.host().messages().is_empty());
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn fileio_send_then_receive() {
    let files = [("main.py", "print('hello')\n"), ("requirements.txt", "requests\n")];
    let server = TestFileHost::spawn(zip_of(&files)).await;
    let scratch = tempfile::tempdir().unwrap();
    let source = project(&files);
    let runner = Arc::new(RecordingRunner::default());

    let sender = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Fileio),
    )
    .with_workspace_folder(Some(source.path().to_path_buf()));
    let link = sender.send_code().await.unwrap();
    assert_eq!(link.as_str(), format!("{}/dl/abc.zip", server.state.base));

    // A file.io link is fetched as-is.
    let direct = FileIo::new(reqwest::Client::new(), &server.endpoints())
        .resolve(link.as_str())
        .await
        .unwrap();
    assert_eq!(direct.url.as_str(), link.as_str());

    let receiver = App::new(
        TestHost {
            prompt_answer: Some(link.to_string()),
            ..TestHost::default()
        },
        config_for(&server, &scratch, BackendKind::Fileio),
    )
    .with_command_runner(runner.clone());
    let received = receiver.receive_code(None).await.unwrap().unwrap();

    assert_eq!(
        std::fs::read_to_string(received.workspace.join("main.py")).unwrap(),
        "print('hello')\n"
    );
    let outcome = received.bootstrap.await.unwrap().unwrap();
    assert_eq!(outcome.manifest, DependencyManifest::Requirements);
    assert_eq!(runner.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn gist_send_then_receive() {
    let files = [("a.txt", "A"), ("b/c.txt", "C")];
    let server = TestFileHost::spawn(Vec::new()).await;
    let scratch = tempfile::tempdir().unwrap();
    let source = project(&files);
    let runner = Arc::new(RecordingRunner::default());

    let sender = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gist),
    )
    .with_workspace_folder(Some(source.path().to_path_buf()))
    .with_credential(Credential::new(GIST_TOKEN));
    let link = sender.send_code().await.unwrap();

    assert_eq!(link.as_str(), "https://gist.github.com/abc123");
    let (name, _) = server.state.gist.lock().unwrap().clone().unwrap();
    assert!(name.ends_with(".zip.b64"), "{name}");
    assert!(scratch_entries(&scratch).is_empty());

    let receiver = App::new(
        TestHost::default(),
        config_for(&server, &scratch, BackendKind::Gist),
    )
    .with_command_runner(runner.clone());
    let received = receiver
        .receive_code(Some(link.as_str()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(receiver.host().opened(), vec![received.workspace.clone()]);
    assert_eq!(
        std::fs::read_to_string(received.workspace.join("a.txt")).unwrap(),
        "A"
    );
    assert_eq!(
        std::fs::read_to_string(received.workspace.join("b/c.txt")).unwrap(),
        "C"
    );
    assert_eq!(received.bootstrap.await.unwrap(), None);
    assert!(runner.calls.lock().unwrap().is_empty());

    // Both the encoded and the decoded download are gone.
    assert_eq!(scratch_entries(&scratch).len(), 1);
}
