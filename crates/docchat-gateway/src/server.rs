use crate::middleware::{auth_middleware, AuthConfig};
use crate::upload::{classify, sanitize_filename, UploadKind};
use axum::{
    extract::{multipart::Multipart, rejection::FormRejection, rejection::JsonRejection, State},
    extract::{DefaultBodyLimit, Form},
    http::{HeaderValue, StatusCode},
    middleware as axum_mw,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use docchat_agent::SessionContextManager;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

const UPLOAD_OK: &str = "Document uploaded and processed successfully!";
const NO_RESPONSE: &str = "No response generated from the agent";
const QUERY_MISSING: &str = "Query not provided";

/// Settings for the HTTP front end.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Session used when a request names none.
    pub default_session: String,
    /// Where uploaded files are stored before loading.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS. Empty disables the CORS layer.
    pub cors_origins: Vec<String>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            default_session: "acc_setup".to_string(),
            upload_dir: PathBuf::from("./data"),
            max_upload_bytes: 25 * 1024 * 1024,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Shared application state.
pub struct AppState {
    pub manager: Arc<SessionContextManager>,
    pub options: GatewayOptions,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway with default options and no auth.
    pub fn build(manager: Arc<SessionContextManager>) -> Router {
        Self::build_with_options(manager, GatewayOptions::default(), AuthConfig::default())
    }

    /// Build the gateway with explicit options and optional auth middleware.
    pub fn build_with_options(
        manager: Arc<SessionContextManager>,
        options: GatewayOptions,
        auth_config: AuthConfig,
    ) -> Router {
        let max_upload_bytes = options.max_upload_bytes;
        let cors = cors_layer(&options.cors_origins);
        let state = Arc::new(AppState { manager, options });

        let mut app = Router::new()
            .route("/upload", post(upload_handler))
            .route("/api/upload", post(upload_handler))
            .route("/query", post(query_handler))
            .route("/api/chat", post(api_chat_handler))
            .route("/document", get(document_handler).delete(clear_document_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(max_upload_bytes));

        if auth_config.is_enabled() {
            app = app.layer(axum_mw::from_fn_with_state(
                Arc::new(auth_config),
                auth_middleware,
            ));
        }

        // CORS goes outermost so preflight requests never need a key.
        match cors {
            Some(cors) => app.layer(cors),
            None => app,
        }
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "docchat" }))
}

// --- Upload ---

async fn upload_handler(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                upload = Some((file_name, field.bytes().await));
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return error_response(e.status(), e.body_text()),
        }
    }

    let Some((file_name, data)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file part");
    };
    let file_name = match file_name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return error_response(StatusCode::BAD_REQUEST, "No selected file"),
    };
    let data = match data {
        Ok(data) => data,
        Err(e) => return error_response(e.status(), e.body_text()),
    };

    let safe_name = sanitize_filename(&file_name);
    let Some(kind) = classify(&safe_name) else {
        warn!(file = %file_name, "Rejected upload with unsupported extension");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Unsupported file type. Please upload a supported document.",
        );
    };

    // Concurrent uploads of one name must not share a file.
    let upload_dir = &state.options.upload_dir;
    let path = upload_dir.join(format!("{}-{safe_name}", Uuid::new_v4().simple()));
    if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
        error!(dir = %upload_dir.display(), error = %e, "Cannot create upload directory");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing document: {e}"),
        );
    }
    if let Err(e) = tokio::fs::write(&path, &data).await {
        error!(path = %path.display(), error = %e, "Cannot store upload");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing document: {e}"),
        );
    }
    info!(path = %path.display(), bytes = data.len(), "Stored upload");

    match kind {
        UploadKind::Unparsed { extension } => {
            warn!(
                path = %path.display(),
                extension = %extension,
                "Upload accepted but not parsed, document context unchanged"
            );
            Json(json!({
                "message": UPLOAD_OK,
                "warning": format!(
                    "'.{extension}' files are stored but not parsed; the active document was not changed"
                ),
            }))
            .into_response()
        }
        UploadKind::Document => match state.manager.load_document(&path).await {
            Ok(_) => Json(json!({ "message": UPLOAD_OK })).into_response(),
            Err(e) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing document: {e}"),
            ),
        },
    }
}

// --- Chat ---

#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = body else {
        return error_response(StatusCode::BAD_REQUEST, QUERY_MISSING);
    };
    run_chat(&state, req.session_id, req.query).await
}

async fn api_chat_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return error_response(StatusCode::BAD_REQUEST, QUERY_MISSING);
    };
    run_chat(&state, form.session_id, form.message).await
}

async fn run_chat(state: &AppState, session: Option<String>, input: Option<String>) -> Response {
    let Some(input) = input.filter(|q| !q.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, QUERY_MISSING);
    };
    let session = session
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| state.options.default_session.clone());

    match state.manager.chat(&session, &input).await {
        Ok(answer) if answer.trim().is_empty() => {
            warn!(session = %session, "Model returned an empty answer");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, NO_RESPONSE)
        }
        Ok(answer) => Json(json!({ "response": answer })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": NO_RESPONSE, "detail": e.to_string() })),
        )
            .into_response(),
    }
}

// --- Document ---

async fn document_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.manager.document().await {
        Some(doc) => Json(json!({
            "loaded": true,
            "source_path": doc.source_path.display().to_string(),
            "format": doc.format,
            "characters": doc.char_count(),
            "loaded_at": doc.loaded_at,
        })),
        None => Json(json!({ "loaded": false })),
    }
}

async fn clear_document_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.manager.clear_document().await;
    Json(json!({ "cleared": cleared }))
}
