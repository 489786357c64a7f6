use file_relay_core::storage::{RemoteEntry, Retrieved, StorageBackend, StorageError, YandexDisk};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "y0_test-token";

async fn disk() -> (MockServer, YandexDisk) {
    let server = MockServer::start().await;
    let client = YandexDisk::with_endpoint(&format!("{}/v1/disk/", server.uri()), TOKEN);
    (server, client)
}

fn folder_page(items: &[(&str, &str)], total: usize) -> serde_json::Value {
    let items: Vec<_> = items
        .iter()
        .map(|(name, kind)| json!({"name": name, "path": format!("disk:/{name}"), "type": kind}))
        .collect();
    json!({
        "path": "disk:/",
        "type": "dir",
        "_embedded": {"items": items, "limit": 1000, "offset": 0, "total": total}
    })
}

#[tokio::test]
async fn test_check_token_accepts_valid_token() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk"))
        .and(header("Authorization", "OAuth y0_test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_space": 1})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.check_token().await.expect("request succeeds"));
}

#[tokio::test]
async fn test_check_token_rejects_unauthorized() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "UnauthorizedError"})),
        )
        .mount(&server)
        .await;

    assert!(!client.check_token().await.expect("request succeeds"));
}

#[tokio::test]
async fn test_ensure_existing_folder_does_not_create() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/Invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": "disk:/Invoices"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    client
        .ensure_folder("Invoices")
        .await
        .expect("folder exists");
}

#[tokio::test]
async fn test_ensure_missing_folder_creates_it() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/Invoices"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "DiskNotFoundError",
            "description": "Resource not found."
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/Invoices"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .ensure_folder("Invoices")
        .await
        .expect("folder created");
}

#[tokio::test]
async fn test_root_folder_needs_no_requests() {
    let (server, client) = disk().await;

    client.ensure_folder("").await.expect("root is a no-op");
    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_upload_puts_bytes_to_returned_href() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/upload"))
        .and(query_param("path", "/Invoices/q3.csv"))
        .and(query_param("overwrite", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "href": format!("{}/upload-target/q3", server.uri()),
            "method": "PUT",
            "templated": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload-target/q3"))
        .and(body_string("a,b\n1,2\n"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upload("Invoices/q3.csv", b"a,b\n1,2\n".to_vec())
        .await
        .expect("upload succeeds");
}

#[tokio::test]
async fn test_upload_conflict_is_a_transfer_error() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/upload"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": "DiskResourceAlreadyExistsError",
            "description": "Resource \"disk:/report.pdf\" already exists."
        })))
        .mount(&server)
        .await;

    let result = client.upload("report.pdf", vec![1, 2, 3]).await;
    match result {
        Err(StorageError::Transfer(msg)) => assert!(msg.contains("already exists"), "{msg}"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_top_level_folders_follow_pagination() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_page(
            &[("Invoices", "dir"), ("report.pdf", "file")],
            3,
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .and(query_param("path", "/"))
        .and(query_param("offset", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(folder_page(&[("Photos", "dir")], 3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let folders = client
        .list_top_level_folders()
        .await
        .expect("listing succeeds");
    assert_eq!(
        folders,
        vec![
            RemoteEntry::directory("Invoices", "disk:/Invoices"),
            RemoteEntry::directory("Photos", "disk:/Photos"),
        ]
    );
}

#[tokio::test]
async fn test_search_failure_is_reported_as_search_error() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let result = client.recursive_search("", "a").await;
    assert!(matches!(result, Err(StorageError::Search(_))), "{result:?}");
}

#[tokio::test]
async fn test_retrieve_returns_download_link() {
    let (server, client) = disk().await;
    Mock::given(method("GET"))
        .and(path("/v1/disk/resources/download"))
        .and(query_param("path", "disk:/b/c/A.TXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "href": "https://downloader.disk.yandex.ru/disk/abc?filename=A.TXT",
            "method": "GET",
            "templated": false
        })))
        .mount(&server)
        .await;

    let retrieved = client
        .retrieve(&RemoteEntry::file("A.TXT", "disk:/b/c/A.TXT"))
        .await
        .expect("link resolved");
    assert_eq!(
        retrieved,
        Retrieved::Link("https://downloader.disk.yandex.ru/disk/abc?filename=A.TXT".to_string())
    );
}
