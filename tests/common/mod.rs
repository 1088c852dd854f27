#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::{header::HeaderMap, StatusCode};
use serde_json::{json, Value};

use laminate_catalog_api::config::AppConfig;
use laminate_catalog_api::database::DatabaseManager;
use laminate_catalog_api::{app, AppState};

pub const JWT_SECRET: &str = "integration-access-secret";
pub const JWT_REFRESH_SECRET: &str = "integration-refresh-secret";

/// One router bound to an ephemeral port over a fresh in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub config: AppConfig,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "memory://".to_string()),
        ("JWT_SECRET".to_string(), JWT_SECRET.to_string()),
        ("JWT_REFRESH_ENABLED".to_string(), "true".to_string()),
        ("JWT_REFRESH_SECRET".to_string(), JWT_REFRESH_SECRET.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(AppConfig::from_lookup(|key| vars.get(key).cloned())?)
}

pub async fn spawn() -> Result<TestServer> {
    spawn_with(&[]).await
}

pub async fn spawn_with(overrides: &[(&str, &str)]) -> Result<TestServer> {
    let config = test_config(overrides)?;
    let store = DatabaseManager::connect_and_migrate(&config).await?;
    let router = app(AppState::new(config.clone(), store));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind ephemeral port")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        config,
    })
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn reply(res: reqwest::Response) -> Result<Reply> {
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.json::<Value>().await.context("response is not JSON")?;
        Ok(Reply { status, headers, body })
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Reply> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::reply(req.send().await?).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<Reply> {
        let mut req = self.client.post(self.url(path)).json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::reply(req.send().await?).await
    }

    /// Register `email` and return its access token.
    pub async fn login_as(&self, email: &str) -> Result<String> {
        let password = "password123";
        let reg = self
            .post(
                "/auth/register",
                None,
                json!({ "name": "Tester", "email": email, "password": password }),
            )
            .await?;
        anyhow::ensure!(reg.status == StatusCode::OK, "register failed: {}", reg.body);

        let login = self
            .post("/auth/login", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(login.status == StatusCode::OK, "login failed: {}", login.body);
        login.body["record"]["accessToken"]
            .as_str()
            .map(str::to_string)
            .context("missing accessToken")
    }

    pub async fn token(&self) -> Result<String> {
        self.login_as("admin@example.com").await
    }

    /// Create a category with the given ordered fields and return its id.
    pub async fn category(&self, token: &str, name: &str, fields: &[&str]) -> Result<String> {
        let reply = self
            .post(
                "/category/create",
                Some(token),
                json!({ "name": name, "taxRate": 18, "taxCode": "HSN44", "fields": fields }),
            )
            .await?;
        anyhow::ensure!(reply.status == StatusCode::OK, "category create failed: {}", reply.body);
        reply.body["record"]["id"]
            .as_str()
            .map(str::to_string)
            .context("missing category id")
    }
}
