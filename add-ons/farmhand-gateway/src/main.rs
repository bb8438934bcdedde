//! Axum-based API gateway: HTTP entry point for the Farmhand crop advisor.
//! Config-driven via CoreConfig.

use axum::extract::{Json, State};
use axum::routing::{get, post};
use axum::Router;
use farmhand_core::{ChatResponse, CoreConfig, CropAdvisor, KnowledgeBase};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pre-flight check: verify the knowledge resource parses and the port is available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge resource {}... ", config.knowledge_path);
    let knowledge = KnowledgeBase::load_or_empty(&config.knowledge_path)
        .map_err(|e| format!("Knowledge check failed: {}", e))?;
    if knowledge.is_empty() {
        println!("OK (no crops loaded)");
    } else {
        println!("OK ({} crops)", knowledge.len());
    }

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\n✅ SUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!(
            "[farmhand-gateway] .env not loaded: {} (using system environment)",
            e
        );
    }

    // Handle --verify flag for pre-flight check
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("❌ PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(CoreConfig::load().expect("load CoreConfig"));

    // A missing resource is tolerated (empty knowledge base, warning emitted
    // by the loader); a malformed one is fatal here.
    let knowledge = Arc::new(
        KnowledgeBase::load_or_empty(&config.knowledge_path).expect("parse knowledge resource"),
    );
    if knowledge.is_empty() {
        tracing::warn!("Knowledge base is empty; replies will carry no crop data");
    } else {
        tracing::info!(crops = knowledge.len(), "Knowledge base loaded");
    }

    let advisor = Arc::new(CropAdvisor::new(knowledge));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        advisor,
    });

    let port = config.port;
    let app_name = config.app_name.clone();
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("{} listening on {}", app_name, addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

fn static_root_dir() -> std::path::PathBuf {
    // Prefer a working-directory relative path for local development (run from
    // workspace root). Fall back to the workspace-root-relative path from
    // add-ons/farmhand-gateway: manifest -> .. -> .. -> static.
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let from_cwd = cwd.join("static");
    if from_cwd.exists() {
        return from_cwd;
    }

    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("static")
}

fn build_app(state: AppState) -> Router {
    let frontend_enabled = state.config.frontend_enabled;

    // CORS: wide open for local development; the chat UI may be served from
    // any origin or opened straight from disk.
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let mut app = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/crops", get(crops))
        .route("/health", get(health))
        .with_state(state);

    if frontend_enabled {
        let static_dir = static_root_dir();
        let index_file = static_dir.join("index.html");

        // Map `/` -> `static/index.html`
        app = app.route_service("/", ServeFile::new(index_file));

        // Map `/static/*` -> `static/*` (styles, scripts, images)
        app = app.nest_service("/static", ServeDir::new(static_dir));
    }

    app.layer(cors).layer(CatchPanicLayer::custom(handle_panic))
}

#[derive(Clone)]
struct AppState {
    config: Arc<CoreConfig>,
    advisor: Arc<CropAdvisor>,
}

/// Request boundary for unexpected processing failures: surfaces them as one
/// generic server-error response carrying the failure description.
fn handle_panic(
    err: Box<dyn std::any::Any + Send + 'static>,
) -> axum::http::Response<axum::body::Body> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown error".to_string()
    };
    tracing::error!(target: "farmhand::chat", detail = %detail, "Request processing failed");
    let body = serde_json::json!({
        "detail": format!("Error processing message: {}", detail),
    });
    axum::http::Response::builder()
        .status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Chat request from the frontend.
#[derive(serde::Deserialize)]
struct ChatRequest {
    message: String,
    /// Optional explicit crop, overriding automatic detection.
    #[serde(default)]
    crop_type: Option<String>,
}

/// GET /health – liveness check for UI and scripts. Independent of the
/// knowledge base.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /api/crops – crop names in knowledge-base order.
async fn crops(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "crops": state.advisor.available_crops() }))
}

/// POST /api/chat – runs one message through the advisor decision chain.
async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> axum::Json<ChatResponse> {
    let correlation_id = uuid::Uuid::new_v4();
    tracing::info!(
        target: "farmhand::chat",
        correlation_id = %correlation_id,
        chars = req.message.len(),
        crop_hint = req.crop_type.as_deref().unwrap_or("-"),
        "Chat request received"
    );

    let response = state
        .advisor
        .process_message(&req.message, req.crop_type.as_deref());

    if let Some(crop) = &response.crop_type {
        tracing::debug!(
            target: "farmhand::chat",
            correlation_id = %correlation_id,
            crop = %crop,
            "Crop-specific reply"
        );
    }
    axum::Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const TEST_KNOWLEDGE: &str = r#"{
        "Wheat": {
            "season": "Sow in October-November",
            "watering": ["Water every 3 days", "Avoid waterlogging"]
        },
        "Rice": { "season": "Transplant in June-July" }
    }"#;

    fn test_config(frontend_enabled: bool) -> CoreConfig {
        CoreConfig {
            app_name: "Test Gateway".to_string(),
            port: 8000,
            knowledge_path: "data/crop_data.json".to_string(),
            frontend_enabled,
        }
    }

    fn test_app(frontend_enabled: bool) -> Router {
        let knowledge: KnowledgeBase = serde_json::from_str(TEST_KNOWLEDGE).unwrap();
        build_app(AppState {
            config: Arc::new(test_config(frontend_enabled)),
            advisor: Arc::new(CropAdvisor::new(Arc::new(knowledge))),
        })
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_chat(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_static() {
        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let res = test_app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, serde_json::json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_crops_listed_in_knowledge_order() {
        let req = Request::builder()
            .method("GET")
            .uri("/api/crops")
            .body(Body::empty())
            .unwrap();
        let res = test_app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_json(res).await,
            serde_json::json!({ "crops": ["Wheat", "Rice"] })
        );
    }

    #[tokio::test]
    async fn test_chat_greeting_returns_canned_suggestions() {
        let res = test_app(false)
            .oneshot(post_chat(serde_json::json!({ "message": "hello there" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(
            json["response"],
            "Hello! I'm your farming assistant. I can help you with crop info, irrigation, fertilizers, pests, and more."
        );
        assert_eq!(json["suggestions"].as_array().map(Vec::len), Some(2));
        assert!(json.get("crop_type").is_none());
    }

    #[tokio::test]
    async fn test_chat_crop_topic_reply() {
        let res = test_app(false)
            .oneshot(post_chat(serde_json::json!({
                "message": "How often should I water wheat?"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(
            json["response"],
            "\u{2022} Water every 3 days\n\u{2022} Avoid waterlogging"
        );
        assert_eq!(json["crop_type"], "Wheat");
        assert!(json.get("suggestions").is_none());
    }

    #[tokio::test]
    async fn test_chat_explicit_crop_hint() {
        let res = test_app(false)
            .oneshot(post_chat(serde_json::json!({
                "message": "watering schedule?",
                "crop_type": "Rice"
            })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let json = body_json(res).await;
        assert_eq!(json["response"], "No information available for watering of Rice.");
        assert_eq!(json["crop_type"], "Rice");
    }

    #[tokio::test]
    async fn test_frontend_index_served_when_enabled() {
        let req = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let res = test_app(true).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.contains("Farmhand"), "chat UI title should be present");
    }

    #[tokio::test]
    async fn test_frontend_disabled_hides_root() {
        let req = Request::builder()
            .method("GET")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let res = test_app(false).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
