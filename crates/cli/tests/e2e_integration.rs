//! End-to-end integration tests for the TreatOrHell service.
//!
//! These tests drive the full router: questionnaire submission into a real
//! file store, then chat requests whose prompts must carry those answers.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use treatorhell_agent::{ANGEL_PERSONA, AngelPersona, ONE_SHOT_ASSISTANT, ONE_SHOT_USER};
use treatorhell_config::{ApiInfoConfig, AppConfig};
use treatorhell_core::error::ProviderError;
use treatorhell_core::message::Role;
use treatorhell_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use treatorhell_gateway::{AppState, build_router};
use treatorhell_providers::{CompletionClient, RetryPolicy};
use treatorhell_storage::{ContextStore, FileBackend};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted outcomes in sequence and keeps
/// every request it saw.
struct ScriptedProvider {
    outcomes: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            panic!("ScriptedProvider exhausted");
        }
        outcomes.remove(0)
    }
}

fn text_response(text: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        content: Some(text.into()),
        usage: Some(Usage {
            prompt_tokens: 210,
            completion_tokens: 64,
            total_tokens: 274,
        }),
        model: "gpt-4o-mini-2024-07-18".into(),
    })
}

fn build_app(provider: Arc<ScriptedProvider>, store: ContextStore) -> Router {
    let client = CompletionClient::new(provider, "gpt-4o-mini", 1000, 0.7)
        .with_retry(RetryPolicy::no_delay());
    let state = Arc::new(AppState {
        persona: Arc::new(AngelPersona::new(Arc::new(client), store.clone())),
        store,
        info: ApiInfoConfig::default(),
    });
    build_router(state, &AppConfig::default().gateway.cors_origins)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn chat(message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat/angel")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap()
}

fn submit(form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/questions/submit")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_submit_then_chat_personalizes_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContextStore::new(Arc::new(FileBackend::new(
        dir.path().join("data").join("student_responses.txt"),
    )));
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("✨ A wildlife researcher of knowledge! ✨"),
    ]));
    let app = build_app(provider.clone(), store);

    let (status, html) = send(
        &app,
        submit(
            "q1=Submitted+late+%28but+with+hope+in+your+heart%29\
             &q2=Googled+aggressively\
             &q3=I+observe%E2%80%A6+quietly%E2%80%A6+like+a+wildlife+researcher\
             &q4=Not+at+all+%28classic%29",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Your responses have been saved!"));

    let (status, body) = send(&app, chat("Did I do well this week?")).await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["response"], "✨ A wildlife researcher of knowledge! ✨");
    assert_eq!(body["usage"]["prompt_tokens"], 210);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0].messages;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.starts_with(ANGEL_PERSONA));
    assert!(messages[0].content.contains(
        "\n\nThe student has shared the following information:\n\
         Q1: Submitted late (but with hope in your heart)\n\
         Q2: Googled aggressively\n\
         Q3: I observe… quietly… like a wildlife researcher\n\
         Q4: Not at all (classic)\n"
    ));
    assert_eq!(messages[1].content, ONE_SHOT_USER);
    assert_eq!(messages[2].content, ONE_SHOT_ASSISTANT);
    assert_eq!(messages[3].content, "Did I do well this week?");
    assert_eq!(requests[0].model, "gpt-4o-mini");
}

#[tokio::test]
async fn e2e_chat_without_answers_uses_bare_persona() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContextStore::new(Arc::new(FileBackend::new(dir.path().join("none.txt"))));
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("glitter!")]));
    let app = build_app(provider.clone(), store);

    let (status, _) = send(&app, chat("hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.requests()[0].messages[0].content, ANGEL_PERSONA);
}

#[tokio::test]
async fn e2e_latest_submission_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("student_responses.txt");
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("ok")]));
    let app = build_app(
        provider.clone(),
        ContextStore::new(Arc::new(FileBackend::new(&path))),
    );

    send(&app, submit("q1=first&q2=first&q3=first&q4=first")).await;
    send(&app, submit("q1=second&q2=second&q3=second&q4=second")).await;

    // A fresh app over the same file sees only the second record.
    let restarted = build_app(
        provider.clone(),
        ContextStore::new(Arc::new(FileBackend::new(&path))),
    );
    let (status, _) = send(&restarted, chat("hi")).await;
    assert_eq!(status, StatusCode::OK);

    let system = &provider.requests()[0].messages[0].content;
    assert!(system.contains("Q1: second"));
    assert!(!system.contains("first"));
}

#[tokio::test]
async fn e2e_rejected_submission_keeps_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("student_responses.txt");
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("ok")]));
    let app = build_app(
        provider.clone(),
        ContextStore::new(Arc::new(FileBackend::new(&path))),
    );

    let (status, _) = send(&app, submit("q1=kept&q2=kept&q3=kept&q4=kept")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, submit("q1=new&q2=&q3=new&q4=new")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, chat("hi")).await;
    let system = &provider.requests()[0].messages[0].content;
    assert!(system.contains("Q2: kept"));
}

#[tokio::test]
async fn e2e_transient_failures_are_retried_transparently() {
    let dir = tempfile::tempdir().unwrap();
    let store = ContextStore::new(Arc::new(FileBackend::new(dir.path().join("r.txt"))));
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited {
            retry_after_secs: None,
        }),
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "server had an error".into(),
        }),
        text_response("third time's the charm ✨"),
    ]));
    let app = build_app(provider.clone(), store);

    let (status, body) = send(&app, chat("hi")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("third time's the charm"));
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test]
async fn e2e_corrupt_store_does_not_block_chat() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("student_responses.txt");
    std::fs::write(&path, "definitely not json").unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![text_response("still shining")]));
    let app = build_app(
        provider.clone(),
        ContextStore::new(Arc::new(FileBackend::new(&path))),
    );

    let (status, _) = send(&app, chat("hi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(provider.requests()[0].messages[0].content, ANGEL_PERSONA);
}
