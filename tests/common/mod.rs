#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::Params;
use reqwest::StatusCode;
use serde_json::{json, Value};

use ticket_desk_api::auth::{PasswordHasher, TokenService};
use ticket_desk_api::config::{AppConfig, StoreBackend};
use ticket_desk_api::database::seed::{seed_demo_data, DEMO_PASSWORD};
use ticket_desk_api::database::{CredentialStore, MemoryStore};
use ticket_desk_api::{router, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_ISSUER: &str = "ticket-desk";

pub const OWNER: &str = "admin@example.com";
pub const CS: &str = "cs@example.com";
pub const NOC: &str = "noc@example.com";
pub const TECH: &str = "tech@example.com";
pub const CUSTOMER_ONE: &str = "customer1@example.com";
pub const CUSTOMER_TWO: &str = "customer2@example.com";

/// A live server on its own port with a fresh, seeded in-memory store.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
}

pub fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(Params::new(Params::MIN_M_COST, 1, 1, None).expect("argon2 params"))
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.database.seed_demo_data = true;
    config.api.enable_request_logging = false;
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.security.jwt_issuer = TEST_ISSUER.to_string();
    config
}

pub async fn spawn_app() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::new());
    let passwords = cheap_hasher();
    seed_demo_data(store.as_ref(), &passwords).await?;

    let config = test_config();
    let tokens = TokenService::from_config(&config.security)?;
    let app = router(AppState::new(config, store.clone(), tokens, passwords));

    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    Ok(TestApp {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign in a seeded staff member and return the bearer token.
    pub async fn staff_token(&self, email: &str) -> Result<String> {
        let body = json!({ "email": email, "password": DEMO_PASSWORD });
        let (status, body) = self.post("/api/auth/employee/login", None, Some(body)).await?;
        anyhow::ensure!(status == StatusCode::OK, "staff login for {} failed: {}", email, body);
        token_of(&body)
    }

    pub async fn customer_token(&self, identifier: &str) -> Result<String> {
        let body = json!({ "email": identifier, "password": DEMO_PASSWORD });
        let (status, body) = self.post("/api/auth/customer/login", None, Some(body)).await?;
        anyhow::ensure!(status == StatusCode::OK, "customer login for {} failed: {}", identifier, body);
        token_of(&body)
    }

    pub async fn customer_id(&self, email: &str) -> Result<i64> {
        let customer = self
            .store
            .find_customer_by_email_or_phone(email)
            .await?
            .with_context(|| format!("no seeded customer {}", email))?;
        Ok(customer.id)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(self.url(path)), token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        self.send(self.client.post(self.url(path)), token, body).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.put(self.url(path)), token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(self.client.delete(self.url(path)), token, None).await
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// Open a ticket as customer service and return its id.
    pub async fn open_ticket(&self, cs_token: &str, customer_id: i64, title: &str) -> Result<i64> {
        let body = json!({ "customer_id": customer_id, "title": title, "description": "line is down" });
        let (status, body) = self.post("/api/tickets", Some(cs_token), Some(body)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "ticket create failed: {}", body);
        body["data"]["id"].as_i64().context("ticket id missing")
    }
}

fn token_of(body: &Value) -> Result<String> {
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from login response")
}

/// Assert the structured error body and return its message.
pub fn assert_error(body: &Value, code: &str) -> String {
    assert_eq!(body["success"], false, "expected an error body: {}", body);
    assert_eq!(body["code"], code, "unexpected error code: {}", body);
    body["error"].as_str().unwrap_or_default().to_string()
}
