//! Infinicraft reference server
//!
//! Serves the combination game over JSON/HTTP, backed by the in-memory game
//! from `infinicraft-core`.
//!
//! ## Routes
//!
//! ```text
//! GET  /api/elements/base
//! GET  /api/elements/all
//! GET  /api/elements/discovered?user_id=<id>
//! POST /api/elements/combine?user_id=<id>   {"element1_id", "element2_id", "user_id"}
//! GET  /api/user/progress?user_id=<id>
//! POST /api/user/reset?user_id=<id>
//! ```
//!
//! A missing `user_id` means `"default"`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use infinicraft_core::service::{MemoryCraftService, Recipe};
use infinicraft_core::{CombineRequest, CombineResponse, CraftService, Element, ElementId, Progress, ServiceError, UserId};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "infinicraft-server", version, about = "Infinicraft combination service")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "INFINICRAFT_PORT", default_value_t = 8001)]
    port: u16,
    /// JSON recipe file: [{"element1": "💧 Water", "element2": "🔥 Fire", "result": "♨️ Steam"}]
    #[arg(long)]
    recipes: Option<PathBuf>,
}

type SharedGame = Arc<MemoryCraftService>;

#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    user_id: Option<String>,
}

impl UserQuery {
    fn user(&self) -> UserId {
        UserId::resolve(self.user_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct CombineBody {
    element1_id: ElementId,
    element2_id: ElementId,
    #[serde(default)]
    user_id: Option<String>,
}

/// Error response with a `detail` message.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                detail: "One or both elements not found".to_string(),
            },
            other => {
                warn!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: other.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn app(game: SharedGame) -> Router {
    Router::new()
        .route("/api", get(index))
        .route("/health", get(health))
        .route("/api/elements/base", get(base_elements))
        .route("/api/elements/all", get(all_elements))
        .route("/api/elements/discovered", get(discovered_elements))
        .route("/api/elements/combine", post(combine))
        .route("/api/user/progress", get(progress))
        .route("/api/user/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(game)
}

fn load_game(recipes: Option<&Path>) -> Result<MemoryCraftService, Box<dyn std::error::Error>> {
    let Some(path) = recipes else {
        info!("Using the built-in recipes");
        return Ok(MemoryCraftService::new());
    };
    let json = std::fs::read_to_string(path)?;
    let recipes = Recipe::parse_list(&json)?;
    info!("Loaded {} recipes from {}", recipes.len(), path.display());
    Ok(MemoryCraftService::from_recipes(&recipes)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "infinicraft_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let game = Arc::new(load_game(args.recipes.as_deref())?);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Infinicraft server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(game)).await?;
    Ok(())
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Infinicraft API" }))
}

async fn health() -> &'static str {
    "ok"
}

async fn base_elements(State(game): State<SharedGame>) -> ApiResult<Vec<Element>> {
    Ok(Json(game.base_elements().await?))
}

async fn all_elements(State(game): State<SharedGame>) -> ApiResult<Vec<Element>> {
    Ok(Json(game.all_elements()?))
}

async fn discovered_elements(State(game): State<SharedGame>, Query(query): Query<UserQuery>) -> ApiResult<Vec<Element>> {
    Ok(Json(game.discovered_elements(&query.user()).await?))
}

async fn progress(State(game): State<SharedGame>, Query(query): Query<UserQuery>) -> ApiResult<Progress> {
    Ok(Json(game.progress(&query.user()).await?))
}

async fn reset(State(game): State<SharedGame>, Query(query): Query<UserQuery>) -> ApiResult<Value> {
    let user = query.user();
    game.reset(&user).await?;
    info!("Reset progress for {}", user);
    Ok(Json(json!({ "message": "User progress reset to base elements" })))
}

async fn combine(
    State(game): State<SharedGame>,
    Query(query): Query<UserQuery>,
    Json(body): Json<CombineBody>,
) -> ApiResult<CombineResponse> {
    // The body's user id wins; the query parameter is the fallback.
    let user = match body.user_id.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => UserId::from(name),
        _ => query.user(),
    };
    let request = CombineRequest {
        element1_id: body.element1_id,
        element2_id: body.element2_id,
        user_id: user,
    };
    let response = game.combine(&request).await?;
    debug!(
        "{} + {} for {}: {}",
        request.element1_id, request.element2_id, request.user_id, response.message
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_app() -> (SharedGame, Router) {
        let game = Arc::new(MemoryCraftService::new());
        (Arc::clone(&game), app(game))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_req(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn id_of(game: &MemoryCraftService, name: &str) -> String {
        game.element_named(name).unwrap().id.as_str().to_string()
    }

    #[tokio::test]
    async fn test_base_and_discovered() {
        let (_, app) = test_app();

        let (status, base) = send(&app, get_req("/api/elements/base")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = base.as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Water", "Fire", "Wind", "Earth"]);

        let (status, discovered) = send(&app, get_req("/api/elements/discovered?user_id=alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(discovered, base);
    }

    #[tokio::test]
    async fn test_combine_records_discovery() {
        let (game, app) = test_app();
        let body = json!({
            "element1_id": id_of(&game, "Water"),
            "element2_id": id_of(&game, "Fire"),
            "user_id": "alice",
        });

        let (status, first) = send(&app, post_req("/api/elements/combine?user_id=alice", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["result"]["name"], "Steam");
        assert_eq!(first["message"], "New element discovered!");

        let (_, again) = send(&app, post_req("/api/elements/combine?user_id=alice", body)).await;
        assert_eq!(again["message"], "Element already discovered");

        let (_, progress) = send(&app, get_req("/api/user/progress?user_id=alice")).await;
        assert_eq!(progress["user_id"], "alice");
        assert_eq!(progress["discovery_count"], 5);
    }

    #[tokio::test]
    async fn test_body_user_wins_over_query() {
        let (game, app) = test_app();
        let body = json!({
            "element1_id": id_of(&game, "Water"),
            "element2_id": id_of(&game, "Fire"),
            "user_id": "carol",
        });
        send(&app, post_req("/api/elements/combine?user_id=dave", body)).await;

        let (_, carol) = send(&app, get_req("/api/user/progress?user_id=carol")).await;
        let (_, dave) = send(&app, get_req("/api/user/progress?user_id=dave")).await;
        assert_eq!(carol["discovery_count"], 5);
        assert_eq!(dave["discovery_count"], 4);
    }

    #[tokio::test]
    async fn test_missing_user_is_default() {
        let (game, app) = test_app();
        let body = json!({
            "element1_id": id_of(&game, "Water"),
            "element2_id": id_of(&game, "Fire"),
        });
        send(&app, post_req("/api/elements/combine", body)).await;

        let (_, progress) = send(&app, get_req("/api/user/progress")).await;
        assert_eq!(progress["user_id"], "default");
        assert_eq!(progress["discovery_count"], 5);
    }

    #[tokio::test]
    async fn test_no_recipe_is_rejected() {
        let (game, app) = test_app();
        let water = id_of(&game, "Water");
        let body = json!({ "element1_id": water, "element2_id": water, "user_id": "alice" });

        let (status, response) = send(&app, post_req("/api/elements/combine", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["success"], false);
        assert_eq!(response["message"], "These elements cannot be combined");
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn test_unknown_element_is_404() {
        let (game, app) = test_app();
        let body = json!({ "element1_id": id_of(&game, "Water"), "element2_id": "missing" });

        let (status, response) = send(&app, post_req("/api/elements/combine", body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response["detail"], "One or both elements not found");
    }

    #[tokio::test]
    async fn test_reset_restores_base() {
        let (game, app) = test_app();
        let body = json!({
            "element1_id": id_of(&game, "Water"),
            "element2_id": id_of(&game, "Fire"),
            "user_id": "bob",
        });
        send(&app, post_req("/api/elements/combine", body)).await;

        let (status, response) = send(&app, post_req("/api/user/reset?user_id=bob", Value::Null)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["message"], "User progress reset to base elements");

        let (_, progress) = send(&app, get_req("/api/user/progress?user_id=bob")).await;
        assert_eq!(progress["discovery_count"], 4);
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let (_, app) = test_app();
        let (status, banner) = send(&app, get_req("/api")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(banner["message"], "Infinicraft API");

        let response = app.clone().oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_all_elements_include_crafted() {
        let (_, app) = test_app();
        let (_, all) = send(&app, get_req("/api/elements/all")).await;
        assert!(all.as_array().unwrap().iter().any(|e| e["name"] == "Steam"));
    }

    #[test]
    fn test_load_game_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(&path, r#"[{"element1": "💧 Water", "element2": "🌍 Earth", "result": "🟫 Mud"}]"#).unwrap();

        let game = load_game(Some(&path)).unwrap();
        assert!(game.element_named("Mud").is_some());
        assert!(game.element_named("Steam").is_none());

        std::fs::write(&path, "not json").unwrap();
        assert!(load_game(Some(&path)).is_err());
    }
}
