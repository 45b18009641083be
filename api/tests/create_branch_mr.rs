//! End-to-end tests: real axum server on an ephemeral port, GitLab and
//! OpenAI replaced by mockito servers.

use std::{collections::HashMap, sync::Arc};

use api::core::app_state::{AppConfig, AppState};
use mockito::{Matcher, ServerGuard};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_app(gitlab: &ServerGuard, openai: &ServerGuard) -> String {
    let env: HashMap<&'static str, String> = HashMap::from([
        ("GITLAB_TOKEN", "glpat-test".to_string()),
        ("GITLAB_API_BASE", gitlab.url()),
        ("OPENAI_API_KEY", "sk-test".to_string()),
        ("OPENAI_BASE_URL", openai.url()),
    ]);
    let cfg = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
    let state = Arc::new(AppState::from_config(&cfg).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(api::serve(listener, state, std::future::pending()));
    format!("http://{addr}")
}

/// Branch lookup misses and creation succeeds.
async fn branch_ready(gitlab: &mut ServerGuard) {
    gitlab
        .mock("GET", Matcher::Regex(r"^/projects/42/repository/branches/".into()))
        .with_status(404)
        .create_async()
        .await;
    gitlab
        .mock("POST", "/projects/42/repository/branches")
        .with_status(201)
        .with_body(r#"{"name":"feature/x","commit":{"id":"abc123"}}"#)
        .create_async()
        .await;
}

async fn mr_opened(gitlab: &mut ServerGuard) {
    gitlab
        .mock("POST", "/projects/42/merge_requests")
        .with_status(201)
        .with_body(r#"{"id":1007,"iid":7}"#)
        .create_async()
        .await;
}

async fn post_workflow(base: &str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/create-branch-mr/"))
        .json(&body())
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn body() -> Value {
    json!({
        "project_id": 42,
        "source_branch": "main",
        "target_branch": "main",
        "new_branch_name": "feature/x",
        "mr_title": "Add X",
        "mr_description": ""
    })
}

#[tokio::test]
async fn ping_answers_ok() {
    let gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;
    let base = spawn_app(&gitlab, &openai).await;

    let resp = reqwest::get(format!("{base}/ping")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn creates_reviews_and_echoes_merge_request() {
    let mut gitlab = mockito::Server::new_async().await;
    let mut openai = mockito::Server::new_async().await;

    gitlab
        .mock(
            "GET",
            Matcher::Regex(r"^/projects/42/repository/branches/feature(%2F|/)x$".into()),
        )
        .with_status(404)
        .with_body(r#"{"message":"404 Branch Not Found"}"#)
        .create_async()
        .await;
    gitlab
        .mock("POST", "/projects/42/repository/branches")
        .match_header("private-token", "glpat-test")
        .with_status(201)
        .with_body(r#"{"name":"feature/x","commit":{"id":"abc123"}}"#)
        .create_async()
        .await;
    let mr_json = json!({
        "id": 1007,
        "iid": 7,
        "web_url": "https://example/mr/7",
        "labels": ["ai"],
        "author": {"username": "bot"}
    });
    gitlab
        .mock("POST", "/projects/42/merge_requests")
        .with_status(201)
        .with_body(mr_json.to_string())
        .create_async()
        .await;
    gitlab
        .mock("GET", "/projects/42/merge_requests/7/changes")
        .with_status(200)
        .with_body(
            json!({"changes": [{"old_path": "a.txt", "new_path": "a.txt", "diff": "+hello"}]})
                .to_string(),
        )
        .create_async()
        .await;
    let note = gitlab
        .mock("POST", "/projects/42/merge_requests/7/notes")
        .match_body(Matcher::Regex("Looks fine".into()))
        .with_status(201)
        .with_body(r#"{"id":555}"#)
        .expect(1)
        .create_async()
        .await;
    openai
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_body(json!({"choices":[{"message":{"content":"Looks fine."}}]}).to_string())
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/create-branch-mr/"))
        .json(&body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let out: Value = resp.json().await.unwrap();
    assert_eq!(out["message"], "Merge Request created and reviewed");
    assert_eq!(out["merge_request"], mr_json);
    assert_eq!(
        out["ai_code_review"],
        "### AI Code Review\n\n### Review for `a.txt`\nLooks fine."
    );
    assert_eq!(out["branch"], "created");
    assert_eq!(out["comment_id"], 555);
    note.assert_async().await;
}

#[tokio::test]
async fn branch_failure_is_400_and_nothing_is_posted() {
    let mut gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;

    gitlab
        .mock("GET", Matcher::Regex(r"^/projects/42/repository/branches/".into()))
        .with_status(404)
        .create_async()
        .await;
    gitlab
        .mock("POST", "/projects/42/repository/branches")
        .with_status(400)
        .with_body(r#"{"message":"Invalid reference name: main"}"#)
        .create_async()
        .await;
    let note = gitlab
        .mock("POST", Matcher::Regex("/notes$".into()))
        .expect(0)
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/create-branch-mr"))
        .json(&body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let out: Value = resp.json().await.unwrap();
    assert_eq!(out["error"], "BRANCH_ERROR");
    assert!(out["message"].as_str().unwrap().contains("Invalid reference name"));
    note.assert_async().await;
}

#[tokio::test]
async fn malformed_and_invalid_bodies_are_rejected() {
    let mut gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;
    let untouched = gitlab
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/create-branch-mr/"))
        .header("content-type", "application/json")
        .body("{\"project_id\": 42,")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json::<Value>().await.unwrap()["error"], "BAD_REQUEST");

    let resp = client
        .post(format!("{base}/create-branch-mr/"))
        .json(&json!({"project_id": 42, "source_branch": "main"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json::<Value>().await.unwrap()["error"], "BAD_REQUEST");

    let mut blank = body();
    blank["new_branch_name"] = json!("  ");
    let resp = client
        .post(format!("{base}/create-branch-mr/"))
        .json(&blank)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let out: Value = resp.json().await.unwrap();
    assert_eq!(out["error"], "VALIDATION_ERROR");
    assert!(out["message"].as_str().unwrap().contains("new_branch_name"));

    untouched.assert_async().await;
}

#[tokio::test]
async fn ping_allows_any_origin() {
    let gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;
    let base = spawn_app(&gitlab, &openai).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/ping"))
        .header("origin", "https://dashboard.example")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn merge_request_conflict_is_400() {
    let mut gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;

    branch_ready(&mut gitlab).await;
    gitlab
        .mock("POST", "/projects/42/merge_requests")
        .with_status(409)
        .with_body(r#"{"message":["Another open merge request already exists"]}"#)
        .create_async()
        .await;
    let note = gitlab
        .mock("POST", Matcher::Regex("/notes$".into()))
        .expect(0)
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let (status, out) = post_workflow(&base).await;

    assert_eq!(status, 400);
    assert_eq!(out["error"], "MERGE_REQUEST_ERROR");
    let msg = out["message"].as_str().unwrap();
    assert!(msg.starts_with("Merge request creation failed: 409"), "{msg}");
    assert!(msg.contains("Another open merge request already exists"));
    note.assert_async().await;
}

#[tokio::test]
async fn diff_fetch_failure_is_400() {
    let mut gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;

    branch_ready(&mut gitlab).await;
    mr_opened(&mut gitlab).await;
    gitlab
        .mock("GET", "/projects/42/merge_requests/7/changes")
        .with_status(500)
        .with_body(r#"{"message":"500 Internal Server Error"}"#)
        .create_async()
        .await;
    let note = gitlab
        .mock("POST", Matcher::Regex("/notes$".into()))
        .expect(0)
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let (status, out) = post_workflow(&base).await;

    assert_eq!(status, 400);
    assert_eq!(out["error"], "FETCH_CHANGES_ERROR");
    assert!(
        out["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to fetch MR diff: 500")
    );
    note.assert_async().await;
}

#[tokio::test]
async fn comment_rejection_is_400() {
    let mut gitlab = mockito::Server::new_async().await;
    let openai = mockito::Server::new_async().await;

    branch_ready(&mut gitlab).await;
    mr_opened(&mut gitlab).await;
    gitlab
        .mock("GET", "/projects/42/merge_requests/7/changes")
        .with_status(200)
        .with_body(r#"{"changes":[]}"#)
        .create_async()
        .await;
    gitlab
        .mock("POST", "/projects/42/merge_requests/7/notes")
        .with_status(403)
        .with_body(r#"{"message":"403 Forbidden"}"#)
        .create_async()
        .await;

    let base = spawn_app(&gitlab, &openai).await;
    let (status, out) = post_workflow(&base).await;

    assert_eq!(status, 400);
    assert_eq!(out["error"], "COMMENT_ERROR");
    let msg = out["message"].as_str().unwrap();
    assert!(msg.starts_with("Failed to post MR comment: 403"), "{msg}");
    assert!(msg.contains("403 Forbidden"));
}
