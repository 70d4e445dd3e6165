//! Routing across the mounted roots, driven without a socket.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

mod common;

use common::{body_string, TestApp};

async fn get(app: &TestApp, uri: &str) -> axum::response::Response {
    app.server
        .router()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn root_serves_embedded_index() {
    let app = TestApp::new();
    let res = get(&app, "/").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let body = body_string(res.into_body()).await;
    assert!(body.contains("/uploadFile"));
    assert!(body.contains("originalFile"));
}

#[tokio::test]
async fn data_files_are_served() {
    let app = TestApp::new();
    app.write_data("notes.txt", "plain notes");

    let res = get(&app, "/data/notes.txt").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res.into_body()).await, "plain notes");
}

#[tokio::test]
async fn bare_prefix_redirects_to_directory() {
    let app = TestApp::new();
    let res = get(&app, "/data").await;

    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[header::LOCATION], "/data/");
}

#[tokio::test]
async fn request_id_is_assigned_and_echoed() {
    let app = TestApp::new();
    let res = get(&app, "/").await;
    let id = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let res = app
        .server
        .router()
        .oneshot(
            Request::get("/")
                .header("x-request-id", "client-chosen")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "client-chosen");
}

#[tokio::test]
async fn directories_without_index_are_listed() {
    let app = TestApp::new();
    app.write_data("a.txt", "a");
    std::fs::create_dir(app.layout.data_dir.join("nested")).unwrap();
    std::fs::write(app.layout.uploads_dir.join("sent.bin"), "s").unwrap();

    let res = get(&app, "/data/").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_string(res.into_body()).await;
    assert!(body.contains("<a href=\"./a.txt\">a.txt</a>"));
    assert!(body.contains("<a href=\"./nested/\">nested/</a>"));
    assert!(body.contains("<a href=\"./uploads/\">uploads/</a>"));

    let res = get(&app, "/uploads/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_string(res.into_body()).await.contains("./sent.bin"));

    let res = get(&app, "/data/nested/").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_html_wins_over_listing() {
    let app = TestApp::new();
    app.write_data("index.html", "<p>home</p>");
    app.write_data("other.txt", "o");

    let res = get(&app, "/data/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res.into_body()).await, "<p>home</p>");
}

#[tokio::test]
async fn unmounted_paths_are_not_found() {
    let app = TestApp::new();
    let res = get(&app, "/elsewhere/file.txt").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_data_file_is_not_found() {
    let app = TestApp::new();
    let res = get(&app, "/data/absent.txt").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_out_of_a_root_is_not_found() {
    let app = TestApp::new();
    std::fs::write(app.dir.path().join("secret.txt"), "secret").unwrap();

    for uri in [
        "/data/../secret.txt",
        "/data/%2e%2e/secret.txt",
        "/uploads/../../secret.txt",
    ] {
        let res = get(&app, uri).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn roots_do_not_overlap() {
    let app = TestApp::new();
    std::fs::write(app.layout.uploads_dir.join("only-upload.txt"), "u").unwrap();

    assert_eq!(get(&app, "/uploads/only-upload.txt").await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/data/only-upload.txt").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fallback_document_replaces_not_found() {
    let app = TestApp::with(|config| {
        config.assets.fallback = Some("/index.html".to_string());
    });

    let res = get(&app, "/client/side/route").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/index.html");

    // Other mounts keep their own not-found behaviour.
    let res = get(&app, "/data/absent.txt").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
