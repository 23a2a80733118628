//! Shared test utilities for integration tests.
//!
//! `TestClient` points the application at a CSV file inside a temporary
//! directory and makes HTTP requests against the router.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mercadata::config::Config;
use mercadata::server::build_app;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub const HEADER: &str = "timestamp,ticket_id,item,category,price\n";

/// Three rows, two tickets, January 2024.
pub const SCENARIO_CSV: &str = "timestamp,ticket_id,item,category,price\n\
    01/01/2024 10:00,1,A,Food,10\n\
    01/01/2024 10:05,1,B,Food,5\n\
    02/01/2024 09:00,2,C,Drinks,3\n";

/// Spans three months with an empty February.
pub const MULTI_MONTH_CSV: &str = "fecha,identificativo de ticket,ubicación,item,categoría,precio\n\
    08/01/2024 19:15,100,VALENCIA,LECHE ENTERA,lácteos,0.89\n\
    08/01/2024 19:15,100,VALENCIA,BARRA DE PAN,panadería,0.60\n\
    15/01/2024 11:02,101,VALENCIA,AGUACATE,fruta,2.15\n\
    04/03/2024 18:40,102,VALENCIA,LECHE ENTERA,lácteos,0.89\n\
    04/03/2024 18:40,102,VALENCIA,ANACARDO NATURAL,frutos secos,3.40\n\
    30/03/2024 10:30,103,VALENCIA,AGUACATE,fruta,2.15\n";

/// A test client backed by a CSV file in a temporary directory.
pub struct TestClient {
    router: Router,
    dir: TempDir,
}

impl TestClient {
    /// Client whose CSV file contains `content`.
    pub fn with_csv(content: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("mercadata.csv");
        std::fs::write(&path, content).expect("Failed to write CSV");
        Self::with_path(dir, path)
    }

    /// Client whose CSV path does not exist.
    pub fn without_csv() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("missing.csv");
        Self::with_path(dir, path)
    }

    fn with_path(dir: TempDir, csv_path: PathBuf) -> Self {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            csv_path,
            currency: "EUR".into(),
            locale: "en-US".into(),
        };
        let (_state, router) = build_app(config);
        Self { router, dir }
    }

    /// Replace the CSV contents; the next request sees the new data.
    pub fn write_csv(&self, content: &str) {
        std::fs::write(self.dir.path().join("mercadata.csv"), content)
            .expect("Failed to write CSV");
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Make a POST request with a plain text body.
    pub async fn post_text(&self, uri: &str, text: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "text/plain; charset=utf-8")
                    .body(Body::from(text.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Option<serde_json::Value>) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).ok();
        (status, parsed)
    }
}
