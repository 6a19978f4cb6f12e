use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::{chatbot_handler, lead_handler, neighborhood_handler, property_handler, report_handler};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: SqlitePool,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "farmio-api",
            "version": "0.1.0"
        })),
    )
}

/// Builds the `/api` router. Middleware layers (trace, CORS, rate limiting)
/// are applied by the caller; tests mount this router directly.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Properties
        .route(
            "/api/properties",
            get(property_handler::list_properties).post(property_handler::create_property),
        )
        .route("/api/properties/stats", get(property_handler::property_stats))
        .route(
            "/api/properties/:id",
            get(property_handler::get_property)
                .put(property_handler::update_property)
                .delete(property_handler::delete_property),
        )
        // Leads
        .route(
            "/api/leads",
            get(lead_handler::list_leads).post(lead_handler::create_lead),
        )
        .route("/api/leads/stats", get(lead_handler::lead_stats))
        .route(
            "/api/leads/:id",
            get(lead_handler::get_lead)
                .put(lead_handler::update_lead)
                .delete(lead_handler::delete_lead),
        )
        .route("/api/leads/:id/score", post(lead_handler::recalculate_score))
        // Neighborhoods
        .route(
            "/api/quartiers",
            get(neighborhood_handler::list_neighborhoods)
                .post(neighborhood_handler::create_neighborhood),
        )
        .route(
            "/api/quartiers/analyse-predictive",
            post(neighborhood_handler::predictive_analysis),
        )
        .route(
            "/api/quartiers/cartographie",
            get(neighborhood_handler::map_data),
        )
        .route(
            "/api/quartiers/:id",
            get(neighborhood_handler::get_neighborhood)
                .put(neighborhood_handler::update_neighborhood)
                .delete(neighborhood_handler::delete_neighborhood),
        )
        // Reports
        .route(
            "/api/rapports",
            get(report_handler::list_reports).post(report_handler::create_report),
        )
        .route(
            "/api/rapports/generer-marche",
            post(report_handler::generate_market_report),
        )
        .route(
            "/api/rapports/assistant-redaction",
            post(report_handler::writing_assistant),
        )
        .route(
            "/api/rapports/:id",
            get(report_handler::get_report).delete(report_handler::delete_report),
        )
        // Chatbot
        .route(
            "/api/chatbot/conversation",
            post(chatbot_handler::conversation),
        )
        .route("/api/chatbot/intentions", get(chatbot_handler::intentions))
        .route(
            "/api/chatbot/conversations",
            get(chatbot_handler::conversations),
        )
}
