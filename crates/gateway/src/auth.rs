//! Toy authentication for the chat UI.
//!
//! Opaque password comparison over an in-process registry, seeded with a
//! demo account. This is a login gate for a demo product, not a security
//! mechanism: the salt is fixed and the registry lives for the process.

use crate::api_v1::{ApiError, ErrorBody, missing_fields_error};
use crate::{SharedState, validation};
use axum::{Router, extract::State, http::StatusCode, response::Json, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

const PASSWORD_SALT: &str = "aanya_salt_2025";

/// A successfully authenticated identity, as handed back to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub email: String,
    pub name: String,
    pub is_guest: bool,
}

struct StoredCredentials {
    name: String,
    password_hash: String,
}

/// In-process credential registry.
pub struct SimpleAuth {
    users: HashMap<String, StoredCredentials>,
}

impl SimpleAuth {
    /// Create a registry seeded with the demo account.
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert(
            "demo@chatbot.com".to_string(),
            StoredCredentials {
                name: "Demo User".to_string(),
                password_hash: hash_password("demo123"),
            },
        );
        Self { users }
    }

    /// Check credentials; `None` on any mismatch (no detail leaked).
    pub fn authenticate(&self, email: &str, password: &str) -> Option<AuthenticatedUser> {
        let stored = self.users.get(email)?;
        if stored.password_hash == hash_password(password) {
            Some(AuthenticatedUser {
                email: email.to_string(),
                name: stored.name.clone(),
                is_guest: false,
            })
        } else {
            None
        }
    }

    /// Register a new account. Returns `false` if the email is taken.
    pub fn register(&mut self, email: &str, name: &str, password: &str) -> bool {
        if self.users.contains_key(email) {
            return false;
        }
        self.users.insert(
            email.to_string(),
            StoredCredentials {
                name: name.to_string(),
                password_hash: hash_password(password),
            },
        );
        true
    }

    /// Mint a throwaway guest identity.
    pub fn guest_login() -> AuthenticatedUser {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let guest_id = &token[..16];
        AuthenticatedUser {
            email: format!("guest_{guest_id}@chatbot.local"),
            name: format!("Guest_{guest_id}"),
            is_guest: true,
        }
    }
}

impl Default for SimpleAuth {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ── Routes ────────────────────────────────────────────────────────────────

/// Auth routes, nested under `/v1` alongside the main API.
pub fn auth_router(state: SharedState) -> Router {
    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/guest", post(guest_handler))
        .with_state(state)
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<AuthenticatedUser>, ApiError> {
    let missing = validation::missing_fields(&body, &["email", "password"]);
    if !missing.is_empty() {
        return Err(missing_fields_error(missing));
    }
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let auth = state.auth.read().await;
    match auth.authenticate(email, password) {
        Some(user) => {
            info!(email = %user.email, "Login");
            Ok(Json(user))
        }
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Invalid email or password")),
        )),
    }
}

async fn register_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<AuthenticatedUser>), ApiError> {
    let missing = validation::missing_fields(&body, &["email", "name", "password"]);
    if !missing.is_empty() {
        return Err(missing_fields_error(missing));
    }
    let email = body["email"].as_str().unwrap_or_default();
    let name = body["name"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut auth = state.auth.write().await;
    if auth.register(email, name, password) {
        info!(email, "Registered");
        Ok((
            StatusCode::CREATED,
            Json(AuthenticatedUser {
                email: email.to_string(),
                name: name.to_string(),
                is_guest: false,
            }),
        ))
    } else {
        Err((
            StatusCode::CONFLICT,
            Json(ErrorBody::new("An account with this email already exists")),
        ))
    }
}

async fn guest_handler() -> Json<AuthenticatedUser> {
    Json(SimpleAuth::guest_login())
}
