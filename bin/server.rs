// MSM API - Web Server
// Thin REST front over the lazy client: monsters, costumes, breeding combos

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use msm_api::{Config, Entity, Msm, Statistics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    msm: Arc<Msm>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }
}

/// Monster response (statistics + asset URLs)
#[derive(Serialize)]
struct MonsterResponse {
    tier: String,
    file_key: String,
    statistics: Statistics,
    info: String,
    image_url: String,
    sound_url: String,
    costumes: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl From<&Entity> for MonsterResponse {
    fn from(monster: &Entity) -> Self {
        Self {
            tier: monster.tier.to_string(),
            file_key: monster.file_key.clone(),
            statistics: monster.statistics(),
            info: monster.info(),
            image_url: monster.image_url().to_string(),
            sound_url: monster.sound_url().to_string(),
            costumes: monster.costumes().to_vec(),
            loaded_at: monster.loaded_at,
        }
    }
}

#[derive(Deserialize)]
struct ComboQuery {
    pair: String,
}

#[derive(Serialize)]
struct ComboResponse {
    pair: String,
    found: bool,
    results: Vec<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/monsters/:name - One monster through the lazy cache
async fn get_monster(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let lookup = state.msm.cache().get(&name);

    match lookup.resolve().await {
        Some(monster) => {
            let response = MonsterResponse::from(monster.as_ref());
            (StatusCode::OK, Json(ApiResponse::ok(Some(response)))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Option<MonsterResponse>>::err(
                None,
                format!("Monster not found: {}", name),
            )),
        )
            .into_response(),
    }
}

/// GET /api/monsters/:name/costumes - Costume URLs (base image last)
async fn get_costumes(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let costumes = state
        .msm
        .cache()
        .get(&name)
        .await_then_get(|monster| {
            let mut urls = monster.costumes().to_vec();
            urls.push(monster.image_url().to_string());
            urls
        })
        .await;

    match costumes {
        Some(urls) => (StatusCode::OK, Json(ApiResponse::ok(urls))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(
                Vec::<String>::new(),
                format!("Monster not found: {}", name),
            )),
        )
            .into_response(),
    }
}

/// GET /api/combos?pair=Mammott+%2B+Noggin - Breeding results
async fn get_combo(State(state): State<AppState>, Query(query): Query<ComboQuery>) -> impl IntoResponse {
    let lookup = state.msm.lookup_combination(&query.pair).await;
    let found = lookup.is_found();

    Json(ApiResponse::ok(ComboResponse {
        pair: query.pair,
        found,
        results: lookup.into_names(),
    }))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::var("MSM_CONFIG") {
        Ok(path) => Config::from_file(path)?,
        Err(_) => Config::from_env()?,
    };
    info!(records = %config.record_base_url, "starting MSM API server");

    let msm = Arc::new(Msm::new(config)?);
    let (combinations, costumes) = msm.warm().await;
    if combinations == 0 {
        error!("breeding table unavailable; combos will report not found until it loads");
    }
    info!(combinations, costumes, "indices loaded");

    let state = AppState { msm };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/monsters/:name", get(get_monster))
        .route("/monsters/:name/costumes", get(get_costumes))
        .route("/combos", get(get_combo))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = std::env::var("MSM_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use msm_api::{MonsterRecord, Tier};
    use serde_json::json;

    #[test]
    fn test_monster_response_includes_load_time() {
        let record: MonsterRecord =
            serde_json::from_value(json!({ "name": "Noggin", "cost": 150 })).unwrap();
        let monster = Entity::new(
            record,
            Tier::Common,
            "Noggin".to_string(),
            "Noggin".to_string(),
            Vec::new(),
            &Config::default(),
        );

        let body = serde_json::to_value(MonsterResponse::from(&monster)).unwrap();

        assert_eq!(body["file_key"], "Noggin");
        assert_eq!(body["statistics"]["cost"], "150");
        let loaded_at: DateTime<Utc> =
            serde_json::from_value(body["loaded_at"].clone()).unwrap();
        assert_eq!(loaded_at, monster.loaded_at);
    }
}
