use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

use source_mirror_core::client::{
    content_url, decode_payload, listing_url, ApiClient, ContentResponse,
};
use source_mirror_core::config::MirrorConfig;
use source_mirror_core::contract::{ContentFetcher, EntryKind, TreeEntry, TreeFetcher};
use source_mirror_core::error::{ContentError, ListingError};
use source_mirror_core::mirror::run;
use source_mirror_core::path::RemotePath;

fn test_config() -> MirrorConfig {
    MirrorConfig::new("token", "my-app-abc123.vercel.app", "team_42", "./out")
}

fn remote(relative: &str) -> RemotePath {
    let root = Path::new("mirror");
    let local = relative.split('/').fold(root.to_path_buf(), |dir, part| dir.join(part));
    RemotePath::from_local(root, &local).expect("path below root")
}

fn query(url: &reqwest::Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn test_listing_url_for_root_and_nested_paths() {
    let config = test_config();
    let cases = vec![
        ("root", RemotePath::root(), "src/", "base=src%2F&teamId=team_42"),
        ("top level", remote("components"), "src/components", "base=src%2Fcomponents&teamId=team_42"),
        ("nested", remote("parent/x"), "src/parent/x", "base=src%2Fparent%2Fx&teamId=team_42"),
    ];

    for (name, path, expected_base, expected_raw_query) in cases {
        let url = listing_url(&config, &path).unwrap();
        assert_eq!(url.scheme(), "https", "{name}");
        assert_eq!(url.host_str(), Some("vercel.com"), "{name}");
        assert_eq!(url.path(), "/api/file-tree/my-app-abc123.vercel.app", "{name}");
        assert_eq!(
            query(&url),
            vec![
                ("base".to_string(), expected_base.to_string()),
                ("teamId".to_string(), "team_42".to_string()),
            ],
            "{name}"
        );
        assert_eq!(url.query(), Some(expected_raw_query), "{name}");
    }
}

#[test]
fn test_listing_url_respects_custom_base_and_source_root() {
    let mut config = test_config();
    config.api_base = "http://localhost:8080/".to_string();
    config.source_root = "/app/".to_string();

    let url = listing_url(&config, &remote("lib")).unwrap();
    assert_eq!(url.as_str().split('?').next(), Some("http://localhost:8080/api/file-tree/my-app-abc123.vercel.app"));
    assert_eq!(query(&url)[0], ("base".to_string(), "app/lib".to_string()));
}

#[test]
fn test_content_url_merges_team_id_into_existing_query() {
    let config = test_config();
    let url = content_url(
        &config,
        "https://vercel.com/api/v7/deployments/dpl_1/files/file_9?path=src%2Findex.ts&raw=1",
    )
    .unwrap();

    assert_eq!(url.path(), "/api/v7/deployments/dpl_1/files/file_9");
    assert_eq!(
        query(&url),
        vec![
            ("path".to_string(), "src/index.ts".to_string()),
            ("raw".to_string(), "1".to_string()),
            ("teamId".to_string(), "team_42".to_string()),
        ]
    );
}

#[test]
fn test_content_url_replaces_existing_team_id() {
    let config = test_config();
    let url = content_url(&config, "https://vercel.com/api/file?teamId=other&id=7").unwrap();

    assert_eq!(
        query(&url),
        vec![
            ("id".to_string(), "7".to_string()),
            ("teamId".to_string(), "team_42".to_string()),
        ]
    );
}

#[test]
fn test_content_url_resolves_relative_links_against_api_base() {
    let config = test_config();
    let url = content_url(&config, "/api/file/abc").unwrap();

    assert_eq!(url.as_str(), "https://vercel.com/api/file/abc?teamId=team_42");
}

#[test]
fn test_decode_payload_returns_exact_bytes() {
    let raw: Vec<u8> = (0u8..=255).collect();
    let encoded = STANDARD.encode(&raw);

    let decoded = decode_payload(ContentResponse {
        data: Some(encoded),
    })
    .unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn test_decode_payload_ignores_line_wrapping() {
    let decoded = decode_payload(ContentResponse {
        data: Some("aGVsbG8g\nd29ybGQ=\n".to_string()),
    })
    .unwrap();
    assert_eq!(decoded, b"hello world".to_vec());
}

#[test]
fn test_decode_payload_empty_string_is_an_empty_file() {
    let decoded = decode_payload(ContentResponse {
        data: Some(String::new()),
    })
    .expect("an empty payload is present, not missing");
    assert!(decoded.is_empty());
}

#[test]
fn test_decode_payload_errors() {
    let missing = decode_payload(ContentResponse { data: None });
    assert!(matches!(missing, Err(ContentError::MissingPayload)));

    let invalid = decode_payload(ContentResponse {
        data: Some("not base64!".to_string()),
    });
    assert!(matches!(invalid, Err(ContentError::Base64(_))));
}

#[test]
fn test_content_response_without_data_field_deserializes() {
    let body: ContentResponse = serde_json::from_str(r#"{"error":"gone"}"#).unwrap();
    assert!(body.data.is_none());

    let body: ContentResponse = serde_json::from_str(r#"{"data":null}"#).unwrap();
    assert!(body.data.is_none());
}

#[test]
fn test_tree_entries_deserialize_from_listing_json() {
    let json = r#"[
        {"name": "index.ts", "type": "file", "link": "https://vercel.com/api/file/1"},
        {"name": "components", "type": "directory"},
        {"name": "handler", "type": "lambda"}
    ]"#;
    let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();

    assert_eq!(
        entries,
        vec![
            TreeEntry::file("index.ts", "https://vercel.com/api/file/1"),
            TreeEntry::directory("components"),
            TreeEntry {
                name: "handler".to_string(),
                kind: EntryKind::Other,
                link: None,
            },
        ]
    );
}

/// Serves one canned `(status line, JSON body)` per connection, in order, and
/// forwards each captured request head (request line + headers).
fn serve(
    responses: Vec<(&'static str, &'static str)>,
) -> (String, mpsc::Receiver<String>, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .expect("read timeout");

            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut captured = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).expect("read request") == 0 {
                    break;
                }
                captured.push_str(&line);
                if line == "\r\n" || line == "\n" {
                    break;
                }
            }
            tx.send(captured).expect("send captured request");

            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
            stream.flush().expect("flush response");
        }
    });

    (format!("http://{addr}"), rx, handle)
}

fn local_config(api_base: &str, output_dir: &Path) -> MirrorConfig {
    let mut config = MirrorConfig::new("tok", "dep", "team", output_dir);
    config.api_base = api_base.to_string();
    config.timeout = Some(Duration::from_secs(10));
    config
}

fn request_line(head: &str) -> &str {
    head.lines().next().unwrap_or_default()
}

fn has_bearer(head: &str) -> bool {
    head.lines()
        .any(|line| line.to_ascii_lowercase() == "authorization: bearer tok")
}

#[tokio::test]
async fn test_api_client_lists_entries_over_http() {
    let (base, requests, server) = serve(vec![(
        "200 OK",
        r#"[{"name":"a.txt","type":"file","link":"/f?x=1"},{"name":"sub","type":"directory"}]"#,
    )]);
    let config = local_config(&base, Path::new("./out"));
    let client = ApiClient::new(&config).unwrap();

    let entries = client.list_entries(&remote("parent/x")).await.unwrap();

    assert_eq!(
        entries,
        vec![TreeEntry::file("a.txt", "/f?x=1"), TreeEntry::directory("sub")]
    );
    let head = requests.recv().unwrap();
    assert_eq!(
        request_line(&head),
        "GET /api/file-tree/dep?base=src%2Fparent%2Fx&teamId=team HTTP/1.1"
    );
    assert!(has_bearer(&head), "missing bearer header in:\n{head}");
    server.join().unwrap();
}

#[tokio::test]
async fn test_api_client_reports_listing_status() {
    let (base, _requests, server) = serve(vec![("404 Not Found", r#"{"error":"not found"}"#)]);
    let config = local_config(&base, Path::new("./out"));
    let client = ApiClient::new(&config).unwrap();

    let result = client.list_entries(&RemotePath::root()).await;

    assert!(
        matches!(result, Err(ListingError::Status { status: 404, .. })),
        "got {result:?}"
    );
    server.join().unwrap();
}

#[tokio::test]
async fn test_api_client_fetches_content_and_reports_server_errors() {
    let (base, requests, server) = serve(vec![
        ("500 Internal Server Error", r#"{"data":"c2VjcmV0"}"#),
        ("200 OK", r#"{"data":"aGk="}"#),
        ("200 OK", r#"{"size":0}"#),
    ]);
    let config = local_config(&base, Path::new("./out"));
    let client = ApiClient::new(&config).unwrap();

    let failed = client.fetch_content("/f?x=1").await;
    assert!(
        matches!(failed, Err(ContentError::Status { status: 500, .. })),
        "a 500 must never yield bytes, got {failed:?}"
    );
    let head = requests.recv().unwrap();
    assert_eq!(request_line(&head), "GET /f?x=1&teamId=team HTTP/1.1");
    assert!(has_bearer(&head), "missing bearer header in:\n{head}");

    let bytes = client.fetch_content("/f?x=1").await.unwrap();
    assert_eq!(bytes, b"hi".to_vec());
    assert!(has_bearer(&requests.recv().unwrap()));

    let missing = client.fetch_content("/g").await;
    assert!(matches!(missing, Err(ContentError::MissingPayload)), "got {missing:?}");

    server.join().unwrap();
}

#[tokio::test]
async fn test_run_over_http_skips_file_on_server_error() {
    let temp = tempdir().unwrap();
    let output_dir = temp.path().join("mirror");
    let (base, requests, server) = serve(vec![
        (
            "200 OK",
            r#"[{"name":"a.txt","type":"file","link":"/f/a"},{"name":"sub","type":"directory"}]"#,
        ),
        ("500 Internal Server Error", r#"{"error":"boom"}"#),
        ("200 OK", "[]"),
    ]);
    let config = local_config(&base, &output_dir);
    let client = ApiClient::new(&config).unwrap();

    let report = run(&config, &client, &client).await.unwrap();

    assert!(!output_dir.join("a.txt").exists(), "a.txt must not be written");
    assert!(output_dir.join("sub").is_dir());
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.directories_created, 1);

    server.join().unwrap();
    let lines: Vec<String> = requests
        .try_iter()
        .map(|head| request_line(&head).to_string())
        .collect();
    assert_eq!(
        lines,
        vec![
            "GET /api/file-tree/dep?base=src%2F&teamId=team HTTP/1.1".to_string(),
            "GET /f/a?teamId=team HTTP/1.1".to_string(),
            "GET /api/file-tree/dep?base=src%2Fsub&teamId=team HTTP/1.1".to_string(),
        ]
    );
}
