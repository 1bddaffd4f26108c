#![allow(dead_code)]

use authgate::auth::CredentialHasher;
use authgate::configuration::JwtSettings;
use authgate::persistence::{InMemoryUserStore, UserStore};
use authgate::startup::{run, AppState};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

pub const PASSWORD: &str = "SecurePass123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryUserStore>,
    pub jwt: JwtSettings,
    pub client: reqwest::Client,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-secret-key-at-least-32-characters".to_string(),
        access_token_expiry: 900,
        refresh_token_expiry: 3600,
        issuer: "authgate-test".to_string(),
    }
}

/// Spawn the server on a random port backed by a fresh in-memory store
pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(InMemoryUserStore::new()).await
}

pub async fn spawn_app_with_store(store: InMemoryUserStore) -> TestApp {
    let store = Arc::new(store);
    let address = spawn_server(store.clone(), Duration::from_secs(10));

    TestApp {
        address,
        store,
        jwt: jwt_settings(),
        client: reqwest::Client::new(),
    }
}

/// Spawn the server over an arbitrary store with the given storage budget
pub fn spawn_server(store: Arc<dyn UserStore>, storage_timeout: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let state = AppState::new(store, &jwt_settings(), storage_timeout)
        .with_hasher(CredentialHasher::with_cost(4));
    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

pub fn signup_body(email: &str, phone: &str) -> Value {
    json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": email,
        "phone": phone,
        "password": PASSWORD,
    })
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_token(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(&format!("{}{}", self.address, path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Sign up and return the created user's id
    pub async fn signup(&self, body: &Value) -> String {
        let response = self.post_json("/users/signup", body).await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        body["user"]["user_id"].as_str().unwrap().to_string()
    }

    /// Log in and return the response body holding the token pair
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post_json("/users/login", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.unwrap()
    }

    /// Sign up a user with the given role and log in, returning (user_id, access token)
    pub async fn user_with_session(&self, email: &str, phone: &str, role: &str) -> (String, String) {
        let mut body = signup_body(email, phone);
        body["user_type"] = json!(role);
        let user_id = self.signup(&body).await;
        let session = self.login(email, PASSWORD).await;
        (user_id, session["token"].as_str().unwrap().to_string())
    }
}
