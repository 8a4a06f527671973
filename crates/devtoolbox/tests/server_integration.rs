//! HTTP API tests: the router is served on an ephemeral port backed by an
//! in-memory or SQLite [`AppContext`] and exercised with reqwest.

use async_trait::async_trait;
use devtoolbox::app::AppContext;
use devtoolbox::config::Config;
use devtoolbox::server;
use devtoolbox::traits::{Tool, ToolContext, ToolRegistry};
use devtoolbox_core::store::{DocumentStore, StoredDocument};
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tempfile::TempDir;

async fn spawn(app: AppContext) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(app)).await.unwrap();
    });
    let base = format!("http://{}", addr);
    wait_for_server(&base).await;
    base
}

async fn wait_for_server(base: &str) {
    let client = reqwest::Client::new();
    let url = format!("{}/health", base);
    for _ in 0..50 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Server did not become ready within 5 seconds");
}

fn memory_app() -> AppContext {
    let mut config = Config::minimal();
    config.auth.uid = "u1".to_string();
    AppContext::in_memory(config)
}

async fn call_tool(base: &str, name: &str, params: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/tools/{}", base, name))
        .json(&params)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ─── Tools ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_and_tool_list() {
    let base = spawn(memory_app()).await;

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let list: Value = reqwest::get(format!("{}/tools/list", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tools = list["tools"].as_array().unwrap();
    let regex = tools.iter().find(|t| t["name"] == "regex_test").unwrap();
    assert_eq!(regex["builtin"], true);
    assert_eq!(regex["parameters"]["required"], json!(["pattern", "text"]));
}

#[tokio::test]
async fn test_tool_call_success() {
    let base = spawn(memory_app()).await;
    let (status, body) = call_tool(
        &base,
        "html_escape",
        json!({ "text": "<a href=\"x\">Tom & Jerry</a>" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["result"]["output"],
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&lt;/a&gt;"
    );
}

#[tokio::test]
async fn test_tool_error_codes() {
    let base = spawn(memory_app()).await;

    let (status, body) = call_tool(&base, "nope", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = call_tool(&base, "json_format", json!({})).await;
    assert_eq!(status, 400);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing required parameter: text"));

    let (status, body) = call_tool(&base, "json_format", json!({ "text": "{bad" })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = call_tool(&base, "regex_test", json!({ "pattern": "[", "text": "x" })).await;
    assert_eq!(status, 400);

    let (status, _) = call_tool(&base, "lorem_ipsum", json!({ "count": 0 })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_regex_offsets_are_utf16() {
    let base = spawn(memory_app()).await;
    let (status, body) = call_tool(
        &base,
        "regex_test",
        json!({ "pattern": "b", "text": "😀b" }),
    )
    .await;
    assert_eq!(status, 200);
    let m = &body["result"]["matches"][0];
    assert_eq!(m["start"], 2);
    assert_eq!(m["end"], 3);
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn description(&self) -> &str {
        "Fails every call"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, _ctx: &ToolContext) -> anyhow::Result<Value> {
        anyhow::bail!("disk on fire")
    }
}

#[tokio::test]
async fn test_custom_tool_registration() {
    let mut tools = ToolRegistry::with_builtins();
    tools.register(Box::new(FailingTool));
    let base = spawn(memory_app().with_tools(tools)).await;

    let list: Value = reqwest::get(format!("{}/tools/list", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let custom = list["tools"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "always_fails")
        .unwrap()
        .clone();
    assert_eq!(custom["builtin"], false);

    let (status, body) = call_tool(&base, "always_fails", json!({})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "tool_error");
}

// ─── Bookmarks & forms ──────────────────────────────────────────────

#[tokio::test]
async fn test_bookmarks_over_sqlite() {
    let tmp = TempDir::new().unwrap();
    let mut config = Config::minimal();
    config.db.path = tmp.path().join("data/devtoolbox.sqlite");
    config.auth.uid = "u1".to_string();
    let base = spawn(AppContext::open(config).await.unwrap()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/users/u1/bookmarks", base))
        .json(&json!({ "title": "Base64", "href": "/tools/base64" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["id"], "L3Rvb2xzL2Jhc2U2NA");
    assert!(created["createdAt"].is_string());

    let list: Value = client
        .get(format!("{}/users/u1/bookmarks", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["bookmarks"].as_array().unwrap().len(), 1);

    let resp = client
        .delete(format!("{}/users/u1/bookmarks/L3Rvb2xzL2Jhc2U2NA", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let list: Value = client
        .get(format!("{}/users/u1/bookmarks", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list["bookmarks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bookmarks_of_other_user_forbidden() {
    let base = spawn(memory_app()).await;
    let resp = reqwest::get(format!("{}/users/someone-else/bookmarks", base))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn test_bookmark_missing_title_is_bad_request() {
    let base = spawn(memory_app()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/users/u1/bookmarks", base))
        .json(&json!({ "title": " ", "href": "/tools/json" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "title is required");
}

#[tokio::test]
async fn test_feedback_and_tool_requests() {
    let base = spawn(memory_app()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/feedback", base))
        .json(&json!({ "message": "Great site", "page": "/tools/regex" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = client
        .post(format!("{}/tool-requests", base))
        .json(&json!({ "toolName": "Cron parser", "description": "Explain cron lines" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["toolName"], "Cron parser");
}

struct OfflineStore;

#[async_trait]
impl DocumentStore for OfflineStore {
    async fn put(&self, _: &str, _: &str, _: &Value) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
    async fn delete(&self, _: &str, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
    async fn list(&self, _: &str) -> anyhow::Result<Vec<StoredDocument>> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn test_store_outage_is_unavailable() {
    let mut app = memory_app();
    app.store = Arc::new(OfflineStore);
    let base = spawn(app).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/feedback", base))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "unavailable");

    let resp = client
        .get(format!("{}/users/u1/bookmarks", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 503);
}

// ─── Favicon ────────────────────────────────────────────────────────

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(40, 40, image::Rgba([10, 200, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn test_favicon_returns_zip() {
    let base = spawn(memory_app()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/favicon?app_name=Demo", base))
        .body(png_bytes())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "application/zip");

    let bytes = resp.bytes().await.unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut manifest = String::new();
    archive
        .by_name("site.webmanifest")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    assert!(manifest.contains("\"name\": \"Demo\""));
    assert!(archive.by_name("favicon-512x512.png").is_ok());
}

#[tokio::test]
async fn test_favicon_rejects_garbage() {
    let base = spawn(memory_app()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/favicon", base))
        .body("definitely not an image")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_favicon_rejects_non_hex_color() {
    let base = spawn(memory_app()).await;
    let resp = reqwest::Client::new()
        .post(format!(
            "{}/favicon?theme_color=%22%3E%3Cscript%3Ealert(1)%3C%2Fscript%3E",
            base
        ))
        .body(png_bytes())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("favicon.theme_color"));
}
