//! Shared fixtures for regwatch-api integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use regwatch_api::agents::PromptLibrary;
use regwatch_api::llm::{LlmClient, LlmError, StructuredRequest};
use regwatch_api::services::{FetchError, PageFetcher};
use regwatch_api::{build_router, AppState};
use regwatch_common::db::init_memory_pool;
use regwatch_common::events::EventBus;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const TAGGING_OUTPUT: &str = "record_regulation_tags";
pub const ASSESSMENT_OUTPUT: &str = "record_compliance_assessment";

/// Scripted LLM: returns the configured tags for tagging calls and the
/// assessment registered for the feature's name for analysis calls
#[derive(Default)]
pub struct FakeLlmClient {
    tags: Mutex<Vec<String>>,
    assessments: Mutex<HashMap<String, Value>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing_tagging: Mutex<bool>,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl FakeLlmClient {
    pub fn set_tags(&self, tags: &[&str]) {
        *self.tags.lock().unwrap() = tags.iter().map(|t| t.to_string()).collect();
    }

    pub fn fail_tagging(&self, fail: bool) {
        *self.failing_tagging.lock().unwrap() = fail;
    }

    pub fn set_assessment(&self, feature_name: &str, assessment: Value) {
        self.assessments
            .lock()
            .unwrap()
            .insert(feature_name.to_string(), assessment);
    }

    /// Delay the analysis answer for `feature_name`
    pub fn set_delay(&self, feature_name: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(feature_name.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Feature names of the analysis calls received so far
    pub fn analyzed_features(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.output_name == ASSESSMENT_OUTPUT)
            .filter_map(|r| feature_name(r))
            .collect()
    }
}

fn feature_name(request: &StructuredRequest) -> Option<String> {
    request
        .messages
        .first()?
        .lines()
        .find_map(|line| line.strip_prefix("Name: "))
        .map(str::to_string)
}

pub fn assessment(
    needs_action: bool,
    original_status: &str,
    status_change_to: &str,
    reason: &str,
) -> Value {
    json!({
        "needs_action": needs_action,
        "original_status": original_status,
        "status_change_to": status_change_to,
        "reason": reason,
        "confidence": 0.8,
    })
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn structured(&self, request: StructuredRequest) -> Result<Value, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        match request.output_name.as_str() {
            TAGGING_OUTPUT => {
                if *self.failing_tagging.lock().unwrap() {
                    return Err(LlmError::RateLimited);
                }
                let tags = self.tags.lock().unwrap().clone();
                Ok(json!({ "tags": tags }))
            }
            ASSESSMENT_OUTPUT => {
                let name = feature_name(&request).unwrap_or_default();
                let delay = self.delays.lock().unwrap().get(&name).copied();
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let answer = self.assessments.lock().unwrap().get(&name).cloned();
                Ok(answer.unwrap_or_else(|| assessment(false, "pending", "pending", "No change")))
            }
            other => Err(LlmError::MissingStructuredOutput(other.to_string())),
        }
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// In-memory web: URL → HTML, or URL → HTTP error status
#[derive(Default)]
pub struct FakePageFetcher {
    pages: Mutex<HashMap<String, Result<String, u16>>>,
}

impl FakePageFetcher {
    pub fn set_page(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(html.to_string()));
    }

    pub fn set_status(&self, url: &str, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
    }
}

#[async_trait]
impl PageFetcher for FakePageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.pages.lock().unwrap().get(url).cloned() {
            Some(Ok(html)) => Ok(html),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            None => Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

pub fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><nav>Menu</nav><article><p>{}</p></article></body></html>",
        title, body
    )
}

pub struct TestApp {
    pub state: AppState,
    pub llm: Option<Arc<FakeLlmClient>>,
    pub fetcher: Arc<FakePageFetcher>,
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// The fake LLM; panics for apps built without one
    pub fn llm(&self) -> &FakeLlmClient {
        self.llm.as_deref().expect("app was built without an LLM")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::POST, uri, None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }
}

async fn build(llm: Option<Arc<FakeLlmClient>>) -> TestApp {
    let pool = init_memory_pool().await.unwrap();
    let fetcher = Arc::new(FakePageFetcher::default());
    let client = llm.clone().map(|llm| llm as Arc<dyn LlmClient>);

    let state = AppState::new(
        pool,
        EventBus::new(64),
        client,
        fetcher.clone(),
        PromptLibrary::bundled(),
    );

    TestApp {
        state,
        llm,
        fetcher,
    }
}

/// App with the scripted LLM configured
pub async fn test_app() -> TestApp {
    build(Some(Arc::new(FakeLlmClient::default()))).await
}

/// App started without an API key
pub async fn test_app_without_llm() -> TestApp {
    build(None).await
}
