//! HTTP API v1 — the REST surface consumed by the chat UI.
//!
//! Endpoints:
//!
//! - `POST /v1/chat`                        — Run one chat turn
//! - `POST /v1/session/create`              — Create a chat session
//! - `POST /v1/session/history`             — Fetch a session transcript
//! - `POST /v1/session/delete`              — Delete an owned session
//! - `POST /v1/user/sessions`               — List a user's sessions
//! - `POST /v1/user/personalization`        — Set personalization (explicit)
//! - `POST /v1/user/personalization/get`    — Read personalization
//! - `POST /v1/user/personalization/update` — Incremental (union) update
//! - `POST /v1/user/stats`                  — User statistics
//!
//! Identity rides in the request body as `user_email`, and every endpoint
//! auto-creates the user on first contact, so the UI never needs a separate
//! signup round-trip.

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::post};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{error, info, warn};

use aanya_core::error::{ProviderError, StorageError};
use aanya_core::message::{ChatMessage, Role, SessionSummary, UserStats};
use aanya_core::profile::{PersonalizationProfile, ProfileUpdate};
use aanya_core::provider::ChatTurnRequest;
use aanya_persona::{AssemblyInput, analyze_message, merge_proposals, union_topics};
use aanya_store::MESSAGE_RETENTION_CAP;

use crate::{SharedState, validation};

/// Fields a chat turn must carry. Reported back by name when absent.
const CHAT_REQUIRED_FIELDS: &[&str] = &[
    "user_email",
    "user_name",
    "model_name",
    "model_provider",
    "messages",
    "allow_search",
];

/// How much transcript a successful chat turn echoes back.
const CHAT_RESPONSE_HISTORY_LIMIT: usize = 50;

/// Default transcript size for the history endpoint.
const HISTORY_DEFAULT_LIMIT: usize = 100;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/session/create", post(create_session_handler))
        .route("/session/history", post(session_history_handler))
        .route("/session/delete", post(delete_session_handler))
        .route("/user/sessions", post(list_sessions_handler))
        .route("/user/personalization", post(set_personalization_handler))
        .route("/user/personalization/get", post(get_personalization_handler))
        .route("/user/personalization/update", post(update_personalization_handler))
        .route("/user/stats", post(user_stats_handler))
        .with_state(state)
}

// ── Error plumbing ────────────────────────────────────────────────────────

/// The error payload every handler speaks.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    /// Field names a request failed to supply, when that is the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn missing_fields_error(missing: Vec<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: format!("Missing fields in request: {missing:?}"),
            missing: Some(missing),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message)))
}

fn storage_error(e: StorageError) -> ApiError {
    error!("Storage failure: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(format!("Storage unavailable: {e}"))),
    )
}

fn provider_error(e: ProviderError) -> ApiError {
    warn!("Provider failure: {e}");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody::new(format!("Model call failed: {e}"))),
    )
}

/// Check required fields on the raw body, then deserialize it.
///
/// The two-step parse is what lets a malformed request name its missing
/// fields instead of surfacing a generic deserialization failure.
fn parse_request<T: DeserializeOwned>(body: Value, required: &[&str]) -> Result<T, ApiError> {
    let missing = validation::missing_fields(&body, required);
    if !missing.is_empty() {
        return Err(missing_fields_error(missing));
    }
    serde_json::from_value(body).map_err(|e| bad_request(format!("Malformed request: {e}")))
}

fn display_name(user_name: &Option<String>) -> &str {
    user_name.as_deref().unwrap_or("User")
}

// ── Chat ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChatRequest {
    user_email: String,
    user_name: String,
    #[serde(default)]
    session_id: Option<i64>,
    model_name: String,
    model_provider: String,
    messages: Vec<String>,
    allow_search: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
    history: Vec<ChatMessage>,
    session_id: i64,
    user_id: i64,
}

/// One full chat turn: validate → personalize → persist → assemble →
/// invoke → persist reply.
///
/// Every rejection happens before the first store write. The user's
/// message(s) are durable before the model is consulted, so a provider
/// failure loses only the reply.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<ChatResponse>, ApiError> {
    let req: ChatRequest = parse_request(body, CHAT_REQUIRED_FIELDS)?;
    info!(model = %req.model_name, provider = %req.model_provider, "v1/chat request");

    if !state.config.is_model_allowed(&req.model_name) {
        return Err(bad_request(format!(
            "Invalid model name: {}. Kindly select a valid AI model",
            req.model_name
        )));
    }
    if req.messages.is_empty() {
        return Err(bad_request("messages must contain at least one entry"));
    }
    if let Some(bad) = req.messages.iter().find(|m| validation::is_meaningless(m)) {
        return Err(bad_request(format!("Message is empty or meaningless: {bad:?}")));
    }

    let user_id = state
        .store
        .get_or_create_user(&req.user_email, &req.user_name)
        .await
        .map_err(storage_error)?;

    let session_id = match req.session_id {
        Some(id) => id,
        None => state
            .store
            .create_session(user_id, None)
            .await
            .map_err(storage_error)?,
    };

    // The transcript as it stood before this turn: the inference signal and
    // the assembler's history window both come from here.
    let history = state
        .store
        .get_history(session_id, MESSAGE_RETENTION_CAP as usize)
        .await
        .map_err(storage_error)?;

    let proposals = merge_proposals(req.messages.iter().map(|m| analyze_message(m, history.len())));
    if !proposals.is_empty() {
        state
            .store
            .apply_profile_updates(user_id, &proposals)
            .await
            .map_err(storage_error)?;
    }
    let profile = state.store.get_profile(user_id).await.map_err(storage_error)?;

    for message in &req.messages {
        state
            .store
            .append_message(session_id, Role::User, message)
            .await
            .map_err(storage_error)?;
    }

    let assembled = state.assembler.assemble(&AssemblyInput {
        profile: &profile,
        display_name: &req.user_name,
        history: &history,
        incoming: &req.messages,
    });

    let provider = state
        .providers
        .resolve(&req.model_provider)
        .ok_or_else(|| provider_error(ProviderError::NotConfigured(req.model_provider.clone())))?;

    let reply = provider
        .complete(ChatTurnRequest {
            model: req.model_name.clone(),
            system_prompt: assembled.system_prompt,
            messages: assembled.messages,
            allow_search: req.allow_search,
        })
        .await
        .map_err(provider_error)?;

    state
        .store
        .append_message(session_id, Role::Assistant, &reply)
        .await
        .map_err(storage_error)?;

    let updated_history = state
        .store
        .get_history(session_id, CHAT_RESPONSE_HISTORY_LIMIT)
        .await
        .map_err(storage_error)?;

    Ok(Json(ChatResponse {
        response: reply,
        history: updated_history,
        session_id,
        user_id,
    }))
}

// ── Sessions ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateSessionRequest {
    user_email: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    session_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct CreateSessionResponse {
    session_id: i64,
}

async fn create_session_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let req: CreateSessionRequest = parse_request(body, &["user_email"])?;
    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    let session_id = state
        .store
        .create_session(user_id, req.session_name.as_deref())
        .await
        .map_err(storage_error)?;
    Ok(Json(CreateSessionResponse { session_id }))
}

#[derive(Deserialize)]
struct SessionHistoryRequest {
    session_id: i64,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
struct HistoryResponse {
    history: Vec<ChatMessage>,
}

async fn session_history_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let req: SessionHistoryRequest = parse_request(body, &["session_id"])?;
    let history = state
        .store
        .get_history(req.session_id, req.limit.unwrap_or(HISTORY_DEFAULT_LIMIT))
        .await
        .map_err(storage_error)?;
    Ok(Json(HistoryResponse { history }))
}

#[derive(Deserialize)]
struct DeleteSessionRequest {
    session_id: i64,
    user_email: String,
    #[serde(default)]
    user_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ActionResponse {
    success: bool,
}

async fn delete_session_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse>, ApiError> {
    let req: DeleteSessionRequest = parse_request(body, &["session_id", "user_email"])?;
    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    // Ownership mismatches are silent no-ops inside the store.
    state
        .store
        .delete_session(req.session_id, user_id)
        .await
        .map_err(storage_error)?;
    Ok(Json(ActionResponse { success: true }))
}

#[derive(Deserialize)]
struct UserRequest {
    user_email: String,
    #[serde(default)]
    user_name: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
}

async fn list_sessions_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let req: UserRequest = parse_request(body, &["user_email"])?;
    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    let sessions = state.store.list_sessions(user_id).await.map_err(storage_error)?;
    Ok(Json(SessionListResponse { sessions }))
}

// ── Personalization ───────────────────────────────────────────────────────

async fn get_personalization_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<PersonalizationProfile>, ApiError> {
    let req: UserRequest = parse_request(body, &["user_email"])?;
    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    let profile = state.store.get_profile(user_id).await.map_err(storage_error)?;
    Ok(Json(profile))
}

/// Explicit settings write: recognized fields land as-is (topics replace),
/// everything else in the body is silently ignored.
async fn set_personalization_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<ActionResponse>, ApiError> {
    let req: UserRequest = parse_request(body.clone(), &["user_email"])?;
    let updates: ProfileUpdate =
        serde_json::from_value(body).map_err(|e| bad_request(format!("Malformed request: {e}")))?;

    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    state
        .store
        .apply_profile_updates(user_id, &updates)
        .await
        .map_err(storage_error)?;
    Ok(Json(ActionResponse { success: true }))
}

#[derive(Serialize, Deserialize)]
struct IncrementalUpdateResponse {
    success: bool,
    updated: ProfileUpdate,
}

/// Incremental write: supplied topics *union* into the stored set (existing
/// members first, capped at ten); other fields land as-is.
async fn update_personalization_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<IncrementalUpdateResponse>, ApiError> {
    let req: UserRequest = parse_request(body.clone(), &["user_email"])?;
    let mut updates: ProfileUpdate =
        serde_json::from_value(body).map_err(|e| bad_request(format!("Malformed request: {e}")))?;

    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;

    if let Some(new_topics) = updates.favorite_topics.take() {
        let current = state.store.get_profile(user_id).await.map_err(storage_error)?;
        updates.favorite_topics = Some(union_topics(&current.favorite_topics, &new_topics));
    }

    state
        .store
        .apply_profile_updates(user_id, &updates)
        .await
        .map_err(storage_error)?;
    Ok(Json(IncrementalUpdateResponse {
        success: true,
        updated: updates,
    }))
}

// ── Stats ─────────────────────────────────────────────────────────────────

async fn user_stats_handler(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<UserStats>, ApiError> {
    let req: UserRequest = parse_request(body, &["user_email"])?;
    let user_id = state
        .store
        .get_or_create_user(&req.user_email, display_name(&req.user_name))
        .await
        .map_err(storage_error)?;
    let stats = state.store.get_stats(user_id).await.map_err(storage_error)?;
    Ok(Json(stats))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SimpleAuth;
    use crate::{GatewayState, build_router};
    use aanya_core::provider::ChatProvider;
    use aanya_persona::PromptAssembler;
    use aanya_providers::ProviderRouter;
    use aanya_store::ProfileStore;
    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    /// A scripted stand-in for the external model.
    struct MockProvider {
        outcome: Result<String, ProviderError>,
    }

    impl MockProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(reply.to_string()),
            })
        }

        fn failing(error: ProviderError) -> Arc<Self> {
            Arc::new(Self { outcome: Err(error) })
        }
    }

    #[async_trait]
    impl ChatProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, _request: ChatTurnRequest) -> Result<String, ProviderError> {
            self.outcome.clone()
        }
    }

    async fn test_app(provider: Arc<dyn ChatProvider>) -> (Router, SharedState) {
        let mut providers = ProviderRouter::new("groq");
        providers.register("groq", provider);

        let state = Arc::new(GatewayState {
            config: aanya_config::AppConfig::default(),
            store: ProfileStore::new("sqlite::memory:").await.unwrap(),
            providers,
            assembler: PromptAssembler::new("Aanya"),
            auth: RwLock::new(SimpleAuth::new()),
            start_time: chrono::Utc::now(),
        });
        (build_router(state.clone()), state)
    }

    async fn post(router: &Router, path: &str, body: Value) -> (u16, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn chat_body(messages: &[&str], session_id: Option<i64>) -> Value {
        let mut body = json!({
            "user_email": "a@x.com",
            "user_name": "Alice",
            "model_name": "llama3-70b-8192",
            "model_provider": "groq",
            "messages": messages,
            "allow_search": false,
        });
        if let Some(id) = session_id {
            body["session_id"] = json!(id);
        }
        body
    }

    #[tokio::test]
    async fn chat_reports_missing_fields_by_name() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;
        let (status, body) = post(&router, "/v1/chat", json!({"user_name": "Alice"})).await;
        assert_eq!(status, 400);
        let missing: Vec<String> = body["missing"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        for field in ["user_email", "model_name", "model_provider", "messages", "allow_search"] {
            assert!(missing.contains(&field.to_string()), "missing should list {field}");
        }
        assert!(!missing.contains(&"user_name".to_string()));
    }

    #[tokio::test]
    async fn chat_rejects_unknown_model_with_zero_writes() {
        let (router, state) = test_app(MockProvider::replying("hey")).await;

        // Seed a user and session directly, then cite a disallowed model.
        let user_id = state.store.get_or_create_user("a@x.com", "Alice").await.unwrap();
        let session_id = state.store.create_session(user_id, None).await.unwrap();

        let mut body = chat_body(&["hello there"], Some(session_id));
        body["model_name"] = json!("gpt-5-ultra");
        let (status, response) = post(&router, "/v1/chat", body).await;

        assert_eq!(status, 400);
        assert!(response["error"].as_str().unwrap().contains("Invalid model name"));
        // No message was persisted and no session was added.
        assert!(state.store.get_history(session_id, 200).await.unwrap().is_empty());
        assert_eq!(state.store.get_stats(user_id).await.unwrap().session_count, 1);
    }

    #[tokio::test]
    async fn chat_rejects_meaningless_messages_without_writes() {
        let (router, state) = test_app(MockProvider::replying("hey")).await;
        let user_id = state.store.get_or_create_user("a@x.com", "Alice").await.unwrap();
        let session_id = state.store.create_session(user_id, None).await.unwrap();

        for bad in ["", "   ", "...", "?!", " . , ! "] {
            let (status, _) = post(&router, "/v1/chat", chat_body(&[bad], Some(session_id))).await;
            assert_eq!(status, 400, "{bad:?} should be rejected");
        }
        assert!(state.store.get_history(session_id, 200).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_turn_persists_learns_and_replies() {
        let (router, state) = test_app(MockProvider::replying("Haha, a sporty musician!")).await;

        let (status, body) =
            post(&router, "/v1/chat", chat_body(&["I love football and music lol"], None)).await;
        assert_eq!(status, 200);
        assert_eq!(body["response"], "Haha, a sporty musician!");

        let session_id = body["session_id"].as_i64().unwrap();
        let user_id = body["user_id"].as_i64().unwrap();

        // Transcript holds exactly the user message and the reply.
        let history = body["history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "I love football and music lol");
        assert_eq!(history[1]["role"], "assistant");

        // The inferencer learned topics and style from the message.
        let profile = state.store.get_profile(user_id).await.unwrap();
        assert_eq!(
            profile.favorite_topics,
            vec!["sports".to_string(), "music".to_string()]
        );
        assert_eq!(
            profile.conversation_style,
            aanya_core::profile::ConversationStyle::Humorous
        );

        // A later incremental update unions, preserving existing order.
        let (status, _) = post(
            &router,
            "/v1/user/personalization/update",
            json!({"user_email": "a@x.com", "favorite_topics": ["travel"]}),
        )
        .await;
        assert_eq!(status, 200);
        let profile = state.store.get_profile(user_id).await.unwrap();
        assert_eq!(
            profile.favorite_topics,
            vec!["sports".to_string(), "music".to_string(), "travel".to_string()]
        );

        // Same session continues when cited explicitly.
        let (status, body) =
            post(&router, "/v1/chat", chat_body(&["tell me more"], Some(session_id))).await;
        assert_eq!(status, 200);
        assert_eq!(body["history"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn provider_failure_keeps_user_message() {
        let (router, state) =
            test_app(MockProvider::failing(ProviderError::Timeout("deadline".into()))).await;

        let (status, body) = post(&router, "/v1/chat", chat_body(&["are you there?"], None)).await;
        assert_eq!(status, 502);
        assert!(body["error"].as_str().unwrap().contains("Model call failed"));

        // The user's message survived; only the reply was lost.
        let user_id = state.store.get_or_create_user("a@x.com", "Alice").await.unwrap();
        let sessions = state.store.list_sessions(user_id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        let history = state.store.get_history(sessions[0].id, 200).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "are you there?");
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn session_lifecycle_create_list_delete() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;

        let (status, created) = post(
            &router,
            "/v1/session/create",
            json!({"user_email": "a@x.com", "user_name": "Alice", "session_name": "My First Chat"}),
        )
        .await;
        assert_eq!(status, 200);
        let session_id = created["session_id"].as_i64().unwrap();

        let (_, listed) = post(&router, "/v1/user/sessions", json!({"user_email": "a@x.com"})).await;
        let sessions = listed["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["name"], "My First Chat");

        // A stranger's delete is a silent no-op.
        let (status, _) = post(
            &router,
            "/v1/session/delete",
            json!({"user_email": "b@x.com", "session_id": session_id}),
        )
        .await;
        assert_eq!(status, 200);
        let (_, listed) = post(&router, "/v1/user/sessions", json!({"user_email": "a@x.com"})).await;
        assert_eq!(listed["sessions"].as_array().unwrap().len(), 1);

        // The owner's delete works.
        let (status, _) = post(
            &router,
            "/v1/session/delete",
            json!({"user_email": "a@x.com", "session_id": session_id}),
        )
        .await;
        assert_eq!(status, 200);
        let (_, listed) = post(&router, "/v1/user/sessions", json!({"user_email": "a@x.com"})).await;
        assert!(listed["sessions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_settings_replace_topics_and_ignore_unknown_keys() {
        let (router, state) = test_app(MockProvider::replying("hey")).await;

        let (status, _) = post(
            &router,
            "/v1/user/personalization",
            json!({
                "user_email": "a@x.com",
                "conversation_style": "romantic",
                "favorite_topics": ["books", "travel"],
                "custom_prompt": "You are a poet.",
                "shoe_size": 44
            }),
        )
        .await;
        assert_eq!(status, 200);

        let user_id = state.store.get_or_create_user("a@x.com", "Alice").await.unwrap();
        let profile = state.store.get_profile(user_id).await.unwrap();
        assert_eq!(
            profile.conversation_style,
            aanya_core::profile::ConversationStyle::Romantic
        );
        assert_eq!(profile.custom_prompt.as_deref(), Some("You are a poet."));

        // The explicit path replaces, not unions.
        let (status, _) = post(
            &router,
            "/v1/user/personalization",
            json!({"user_email": "a@x.com", "favorite_topics": ["food"]}),
        )
        .await;
        assert_eq!(status, 200);
        let profile = state.store.get_profile(user_id).await.unwrap();
        assert_eq!(profile.favorite_topics, vec!["food".to_string()]);
    }

    #[tokio::test]
    async fn personalization_get_returns_profile() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;
        let (status, body) = post(
            &router,
            "/v1/user/personalization/get",
            json!({"user_email": "a@x.com"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["personality_type"], "girlfriend");
        assert_eq!(body["conversation_style"], "casual");
        assert_eq!(body["emoji_preference"], "rare");
    }

    #[tokio::test]
    async fn incremental_update_caps_topics_at_ten() {
        let (router, state) = test_app(MockProvider::replying("hey")).await;
        let user_id = state.store.get_or_create_user("a@x.com", "Alice").await.unwrap();

        for i in 0..15 {
            let (status, _) = post(
                &router,
                "/v1/user/personalization/update",
                json!({"user_email": "a@x.com", "favorite_topics": [format!("topic{i}")]}),
            )
            .await;
            assert_eq!(status, 200);
        }

        let profile = state.store.get_profile(user_id).await.unwrap();
        assert_eq!(profile.favorite_topics.len(), 10);
        assert_eq!(profile.favorite_topics[0], "topic0");
    }

    #[tokio::test]
    async fn stats_reflect_activity() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;
        let (_, chat) = post(&router, "/v1/chat", chat_body(&["hello you"], None)).await;
        assert_eq!(chat["history"].as_array().unwrap().len(), 2);

        let (status, stats) = post(&router, "/v1/user/stats", json!({"user_email": "a@x.com"})).await;
        assert_eq!(status, 200);
        assert_eq!(stats["session_count"], 1);
        assert_eq!(stats["message_count"], 2);
        assert!(stats["member_since"].is_string());
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["name"], "aanya");
    }

    #[tokio::test]
    async fn auth_endpoints_cover_login_register_guest() {
        let (router, _) = test_app(MockProvider::replying("hey")).await;

        let (status, user) = post(
            &router,
            "/v1/auth/login",
            json!({"email": "demo@chatbot.com", "password": "demo123"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(user["name"], "Demo User");

        let (status, _) = post(
            &router,
            "/v1/auth/login",
            json!({"email": "demo@chatbot.com", "password": "wrong"}),
        )
        .await;
        assert_eq!(status, 401);

        let (status, _) = post(
            &router,
            "/v1/auth/register",
            json!({"email": "new@x.com", "name": "New", "password": "pw"}),
        )
        .await;
        assert_eq!(status, 201);
        let (status, _) = post(
            &router,
            "/v1/auth/register",
            json!({"email": "new@x.com", "name": "New", "password": "pw"}),
        )
        .await;
        assert_eq!(status, 409);

        let (status, guest) = post(&router, "/v1/auth/guest", json!({})).await;
        assert_eq!(status, 200);
        assert_eq!(guest["is_guest"], true);
        assert!(guest["email"].as_str().unwrap().starts_with("guest_"));
    }
}
