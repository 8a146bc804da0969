#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use ddl_engine::{
    FailureKind, FetchError, HttpClient, HttpRequest, HttpResponse, KeyValueStore,
    MemoryKeyValueStore, StoreError,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

/// Answers requests from a fixed URL table and records what was sent.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<HashMap<String, Result<HttpResponse, FetchError>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.redirect(url, url, status, body)
    }

    pub fn redirect(self, url: &str, final_url: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Ok(HttpResponse {
                status,
                body: body.to_string(),
                requested_url: url.to_string(),
                final_url: final_url.to_string(),
            }),
        );
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Err(FetchError::new(FailureKind::Network, "connection refused")),
        );
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::new(FailureKind::Network, "unscripted url")))
    }
}

/// Memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryKeyValueStore,
    writes: Mutex<usize>,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        *self.writes.lock().unwrap() += 1;
        self.inner.set(key, value).await
    }
}
