use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite};
use std::sync::Arc;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{
    CreateReportRequest, MarketReportRequest, Neighborhood, Property, Report, ReportQueryParams,
    WritingAssistantRequest,
};
use crate::reports;

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

/// GET /api/rapports
///
/// Lists reports ordered by creation date descending, with optional owner
/// and type filters.
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQueryParams>,
) -> Result<Json<Vec<Report>>, AppError> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM reports WHERE 1=1");
    if let Some(user_id) = params.user_id {
        query.push(" AND user_id = ");
        query.push_bind(user_id);
    }
    if let Some(report_type) = &params.report_type {
        query.push(" AND report_type = ");
        query.push_bind(report_type.clone());
    }
    query.push(" ORDER BY created_at DESC");

    let rapports = query.build_query_as::<Report>().fetch_all(&state.db).await?;
    Ok(Json(rapports))
}

/// POST /api/rapports
///
/// Creates a report and fills it synchronously within the same request: the
/// row starts in `generating` status, content is built for the requested
/// type, then the row flips to `completed`. An unsupported report type flips
/// the row to `error` with a placeholder content object.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<Report>), AppError> {
    let title = payload.title.ok_or_else(|| missing("title"))?;
    let report_type = payload.report_type.ok_or_else(|| missing("report_type"))?;
    let user_id = payload.user_id.ok_or_else(|| missing("user_id"))?;

    let rapport = insert_generating(
        &state,
        &title,
        &report_type,
        payload.location.as_deref(),
        user_id,
    )
    .await?;

    let (contenu, status) = build_content(&state, &report_type, rapport.location.as_deref()).await?;
    let rapport = complete_report(&state, rapport.id, &contenu, status).await?;

    tracing::info!("Generated report {} ({})", rapport.id, rapport.report_type);
    Ok((StatusCode::CREATED, Json(rapport)))
}

/// GET /api/rapports/:id
///
/// Returns the report with its content blob parsed back into an object.
/// Corrupt content is replaced with an error placeholder instead of failing.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let rapport = fetch_report(&state, id).await?;

    let mut body = serde_json::to_value(&rapport)?;
    if let Some(raw) = &rapport.content {
        body["content"] = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| json!({"erreur": "Contenu invalide"}));
    }

    Ok(Json(body))
}

/// DELETE /api/rapports/:id
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Report with id {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/rapports/generer-marche
///
/// One-shot market report with defaults (location "Toulouse Sud", user 1).
/// Returns the generated content inline along with the report id.
pub async fn generate_market_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MarketReportRequest>,
) -> Result<Json<Value>, AppError> {
    let location = payload.location.unwrap_or_else(|| "Toulouse Sud".to_string());
    let user_id = payload.user_id.unwrap_or(1);
    let title = format!("Rapport de Marché - {}", location);

    let rapport = insert_generating(&state, &title, "analyse_marche", Some(&location), user_id)
        .await?;

    let (contenu, status) = build_content(&state, "analyse_marche", Some(&location)).await?;
    let rapport = complete_report(&state, rapport.id, &contenu, status).await?;

    Ok(Json(json!({
        "message": "Rapport généré avec succès",
        "rapport_id": rapport.id,
        "contenu": contenu,
    })))
}

/// POST /api/rapports/assistant-redaction
///
/// Writing assistant for social posts and listings: channel-specific
/// suggestions, SEO tips and variants of the first suggestion.
pub async fn writing_assistant(
    State(_state): State<Arc<AppState>>,
    Json(payload): Json<WritingAssistantRequest>,
) -> Result<Json<Value>, AppError> {
    let content_type = payload
        .content_type
        .unwrap_or_else(|| "post_linkedin".to_string());
    let sujet = payload.sujet.unwrap_or_default();
    let quartier = payload.quartier.unwrap_or_default();
    let mots_cles = payload.mots_cles.unwrap_or_default();

    let suggestions = reports::content_suggestions(&content_type, &sujet, &quartier);
    let variantes = reports::message_variants(suggestions.first().map(String::as_str).unwrap_or(""));

    Ok(Json(json!({
        "type": content_type,
        "suggestions": suggestions,
        "conseils_seo": reports::seo_tips(&mots_cles),
        "variantes": variantes,
    })))
}

/// Builds report content for a type. Returns the content plus the final
/// status: `completed` for supported types, `error` otherwise.
async fn build_content(
    state: &AppState,
    report_type: &str,
    location: Option<&str>,
) -> Result<(Value, &'static str), AppError> {
    let location = location.unwrap_or("");

    // The thread-local rng is a per-call temporary so it never lives across
    // an await; holding it would make the handler futures non-Send.
    let contenu = match report_type {
        "analyse_marche" => {
            let pattern = format!("%{}%", location);
            let properties =
                sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE city LIKE ?")
                    .bind(&pattern)
                    .fetch_all(&state.db)
                    .await?;
            let neighborhoods =
                sqlx::query_as::<_, Neighborhood>("SELECT * FROM neighborhoods WHERE city LIKE ?")
                    .bind(&pattern)
                    .fetch_all(&state.db)
                    .await?;
            reports::market_report(location, &properties, &neighborhoods, &mut rand::thread_rng())
        }
        "prediction_quartier" => reports::prediction_report(location, &mut rand::thread_rng()),
        "profil_acquereurs" => reports::buyer_profiles_report(location),
        _ => return Ok((json!({"erreur": "Type de rapport non supporté"}), "error")),
    };

    Ok((contenu, "completed"))
}

async fn insert_generating(
    state: &AppState,
    title: &str,
    report_type: &str,
    location: Option<&str>,
    user_id: i64,
) -> Result<Report, AppError> {
    let now = Utc::now();
    let rapport = sqlx::query_as::<_, Report>(
        "INSERT INTO reports (title, report_type, location, status, user_id, created_at, updated_at) \
         VALUES (?, ?, ?, 'generating', ?, ?, ?) RETURNING *",
    )
    .bind(title)
    .bind(report_type)
    .bind(location)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;
    Ok(rapport)
}

async fn complete_report(
    state: &AppState,
    id: i64,
    contenu: &Value,
    status: &str,
) -> Result<Report, AppError> {
    let content = serde_json::to_string(contenu)?;
    let rapport = sqlx::query_as::<_, Report>(
        "UPDATE reports SET content = ?, status = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(content)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.db)
    .await?;
    Ok(rapport)
}

async fn fetch_report(state: &AppState, id: i64) -> Result<Report, AppError> {
    sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report with id {} not found", id)))
}
