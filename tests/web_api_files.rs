//! Web API File/Directory Tests
//!
//! Integration tests for whole-file storage and directory endpoints.

mod common;

use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use serde_json::{json, Value};
use std::fs;

use common::{bearer, create_storage_server, dir_entries, file_form};

#[tokio::test]
async fn test_list_files_empty() {
    let (server, _dirs) = create_storage_server();

    let response = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({}));
}

#[tokio::test]
async fn test_upload_download_and_delete() {
    let (server, dirs) = create_storage_server();

    let response = server
        .post("/api/files/hello.txt")
        .add_header(AUTHORIZATION, bearer())
        .multipart(file_form("hello.txt", b"hello world"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "success"}));
    assert_eq!(
        fs::read(dirs.storage().join("hello.txt")).unwrap(),
        b"hello world"
    );

    // Listing
    let response = server
        .get("/api/files")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hello.txt"]["name"], "hello.txt");
    assert_eq!(body["hello.txt"]["size"], 11);
    assert_eq!(body["hello.txt"]["md5"], "5eb63bbbe01eeed093cb22bb8f5acdc3");

    // Download
    let response = server
        .get("/api/files/hello.txt")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"hello world");
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"hello.txt\""
    );
    assert!(response
        .header(CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    // Delete
    let response = server
        .delete("/api/files/hello.txt")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "success"}));
    assert!(!dirs.storage().join("hello.txt").exists());

    let response = server
        .delete("/api/files/hello.txt")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_overwrites() {
    let (server, dirs) = create_storage_server();

    for content in [&b"first version"[..], &b"second"[..]] {
        server
            .post("/api/files/data.bin")
            .add_header(AUTHORIZATION, bearer())
            .multipart(file_form("data.bin", content))
            .await
            .assert_status_ok();
    }

    assert_eq!(fs::read(dirs.storage().join("data.bin")).unwrap(), b"second");
    assert_eq!(dir_entries(&dirs.storage()), vec!["data.bin".to_string()]);
}

#[tokio::test]
async fn test_upload_name_is_sanitized() {
    let (server, dirs) = create_storage_server();

    let response = server
        .post("/api/files/..%2F..%2Fescape.txt")
        .add_header(AUTHORIZATION, bearer())
        .multipart(file_form("escape.txt", b"contained"))
        .await;

    response.assert_status_ok();
    assert!(dirs.storage().join("escape.txt").is_file());
    assert!(!dirs.temp_dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let (server, dirs) = create_storage_server();

    let response = server
        .post("/api/files/nothing.txt")
        .add_header(AUTHORIZATION, bearer())
        .multipart(MultipartForm::new().add_text("note", "no file here"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(dir_entries(&dirs.storage()).is_empty());
}

#[tokio::test]
async fn test_upload_with_empty_selected_filename() {
    let (server, dirs) = create_storage_server();

    let response = server
        .post("/api/files/empty.txt")
        .add_header(AUTHORIZATION, bearer())
        .multipart(file_form("", b"data"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(dir_entries(&dirs.storage()).is_empty());
}

#[tokio::test]
async fn test_download_missing_file() {
    let (server, _dirs) = create_storage_server();

    let response = server
        .get("/api/files/missing.txt")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_download_directory_name_is_not_found() {
    let (server, dirs) = create_storage_server();
    fs::create_dir(dirs.storage().join("docs")).unwrap();

    let response = server
        .get("/api/files/docs")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_info() {
    let (server, dirs) = create_storage_server();
    fs::write(dirs.storage().join("empty.dat"), b"").unwrap();

    let response = server
        .get("/api/files/empty.dat/info")
        .add_header(AUTHORIZATION, bearer())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "empty.dat");
    assert_eq!(body["size"], 0);
    assert_eq!(body["md5"], "d41d8cd98f00b204e9800998ecf8427e");
    assert!(body["modified"].as_str().unwrap().contains('T'));

    let response = server
        .get("/api/files/missing.dat/info")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_and_list_directory() {
    let (server, dirs) = create_storage_server();

    let response = server
        .post("/api/dirs")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({"name": "docs"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "success"}));

    let docs = dirs.storage().join("docs");
    assert!(docs.is_dir());
    fs::write(docs.join("readme.md"), b"# docs").unwrap();
    fs::create_dir(docs.join("images")).unwrap();

    let response = server
        .get("/api/dirs/docs")
        .add_header(AUTHORIZATION, bearer())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["directories"], json!(["images"]));
    assert_eq!(body["files"][0]["name"], "readme.md");
    assert_eq!(body["files"][0]["size"], 6);
}

#[tokio::test]
async fn test_create_directory_twice() {
    let (server, _dirs) = create_storage_server();

    server
        .post("/api/dirs")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({"name": "docs"}))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/dirs")
        .add_header(AUTHORIZATION, bearer())
        .json(&json!({"name": "docs"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Directory already exists");
}

#[tokio::test]
async fn test_create_directory_without_name() {
    let (server, _dirs) = create_storage_server();

    for body in [json!({}), json!({"name": ""}), json!({"name": null})] {
        let response = server
            .post("/api/dirs")
            .add_header(AUTHORIZATION, bearer())
            .json(&body)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_list_directory_not_found() {
    let (server, dirs) = create_storage_server();
    fs::write(dirs.storage().join("plain.txt"), b"x").unwrap();

    for name in ["missing", "plain.txt"] {
        let response = server
            .get(&format!("/api/dirs/{}", name))
            .add_header(AUTHORIZATION, bearer())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Directory not found");
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let (server, _dirs) = create_storage_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
