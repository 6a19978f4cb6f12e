use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{
    CreateLeadRequest, Lead, LeadQueryParams, LeadStats, ScoreResponse, UpdateLeadRequest,
};
use crate::scoring::{self, LeadScoreInput};

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

/// GET /api/leads
///
/// Lists leads ordered by score descending, with optional status, type and
/// minimum-score filters.
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeadQueryParams>,
) -> Result<Json<Vec<Lead>>, AppError> {
    tracing::info!("GET /leads - params: {:?}", params);

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM leads WHERE 1=1");
    if let Some(status) = &params.status {
        query.push(" AND status = ");
        query.push_bind(status.clone());
    }
    if let Some(lead_type) = &params.lead_type {
        query.push(" AND lead_type = ");
        query.push_bind(lead_type.clone());
    }
    if let Some(min_score) = params.min_score {
        query.push(" AND score >= ");
        query.push_bind(min_score);
    }
    query.push(" ORDER BY score DESC");

    let leads = query.build_query_as::<Lead>().fetch_all(&state.db).await?;
    Ok(Json(leads))
}

/// POST /api/leads
///
/// Creates a lead and assigns its initial heat score.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let first_name = payload.first_name.ok_or_else(|| missing("first_name"))?;
    let last_name = payload.last_name.ok_or_else(|| missing("last_name"))?;
    let email = payload.email.ok_or_else(|| missing("email"))?;
    let lead_type = payload.lead_type.ok_or_else(|| missing("lead_type"))?;

    let score = scoring::lead_score(
        &LeadScoreInput {
            budget_min: payload.budget_min,
            budget_max: payload.budget_max,
            phone: payload.phone.as_deref(),
            source: payload.source.as_deref(),
            lead_type: &lead_type,
        },
        &mut rand::thread_rng(),
    );

    let now = Utc::now();
    let lead = sqlx::query_as::<_, Lead>(
        "INSERT INTO leads \
         (first_name, last_name, email, phone, lead_type, budget_min, budget_max, \
          property_type_interest, location_interest, score, status, source, notes, \
          created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'new', ?, ?, ?, ?) RETURNING *",
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(payload.phone)
    .bind(&lead_type)
    .bind(payload.budget_min)
    .bind(payload.budget_max)
    .bind(payload.property_type_interest)
    .bind(payload.location_interest)
    .bind(score)
    .bind(payload.source)
    .bind(payload.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Created lead {} with score {}", lead.id, lead.score);
    Ok((StatusCode::CREATED, Json(lead)))
}

/// GET /api/leads/:id
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Lead>, AppError> {
    let lead = fetch_lead(&state, id).await?;
    Ok(Json(lead))
}

/// PUT /api/leads/:id
///
/// Field-wise merge. The score is recomputed when the payload touches any of
/// the scoring inputs (budget bounds, lead type, source).
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    let existing = fetch_lead(&state, id).await?;

    let rescore = payload.budget_min.is_some()
        || payload.budget_max.is_some()
        || payload.lead_type.is_some()
        || payload.source.is_some();

    let first_name = payload.first_name.unwrap_or(existing.first_name);
    let last_name = payload.last_name.unwrap_or(existing.last_name);
    let email = payload.email.unwrap_or(existing.email);
    let phone = payload.phone.or(existing.phone);
    let lead_type = payload.lead_type.unwrap_or(existing.lead_type);
    let budget_min = payload.budget_min.or(existing.budget_min);
    let budget_max = payload.budget_max.or(existing.budget_max);
    let property_type_interest = payload
        .property_type_interest
        .or(existing.property_type_interest);
    let location_interest = payload.location_interest.or(existing.location_interest);
    let status = payload.status.unwrap_or(existing.status);
    let source = payload.source.or(existing.source);
    let notes = payload.notes.or(existing.notes);

    let score = if rescore {
        scoring::lead_score(
            &LeadScoreInput {
                budget_min,
                budget_max,
                phone: phone.as_deref(),
                source: source.as_deref(),
                lead_type: &lead_type,
            },
            &mut rand::thread_rng(),
        )
    } else {
        existing.score
    };

    let lead = sqlx::query_as::<_, Lead>(
        "UPDATE leads SET first_name = ?, last_name = ?, email = ?, phone = ?, lead_type = ?, \
         budget_min = ?, budget_max = ?, property_type_interest = ?, location_interest = ?, \
         score = ?, status = ?, source = ?, notes = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(&phone)
    .bind(&lead_type)
    .bind(budget_min)
    .bind(budget_max)
    .bind(&property_type_interest)
    .bind(&location_interest)
    .bind(score)
    .bind(&status)
    .bind(&source)
    .bind(&notes)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(lead))
}

/// DELETE /api/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM leads WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Lead with id {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/leads/:id/score
///
/// Recomputes the heat score from the stored field values. The previous
/// score is replaced wholesale.
pub async fn recalculate_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ScoreResponse>, AppError> {
    let lead = fetch_lead(&state, id).await?;

    let score = scoring::lead_score(&LeadScoreInput::from(&lead), &mut rand::thread_rng());
    sqlx::query("UPDATE leads SET score = ?, updated_at = ? WHERE id = ?")
        .bind(score)
        .bind(Utc::now())
        .bind(id)
        .execute(&state.db)
        .await?;

    tracing::info!("Recomputed score for lead {}: {}", id, score);
    Ok(Json(ScoreResponse { score }))
}

/// GET /api/leads/stats
///
/// Aggregate statistics: counts by status and type, average of non-zero
/// scores (two decimals), and the number of leads scoring above 7.
pub async fn lead_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LeadStats>, AppError> {
    let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads")
        .fetch_all(&state.db)
        .await?;

    if leads.is_empty() {
        return Ok(Json(LeadStats {
            total_leads: 0,
            by_status: HashMap::new(),
            by_type: HashMap::new(),
            average_score: 0.0,
            high_score_leads: 0,
        }));
    }

    let mut by_status: HashMap<String, i64> = HashMap::new();
    let mut by_type: HashMap<String, i64> = HashMap::new();
    for lead in &leads {
        *by_status.entry(lead.status.clone()).or_insert(0) += 1;
        *by_type.entry(lead.lead_type.clone()).or_insert(0) += 1;
    }

    let scores: Vec<f64> = leads.iter().map(|l| l.score).filter(|s| *s != 0.0).collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let high_score_leads = leads.iter().filter(|l| l.score > 7.0).count();

    Ok(Json(LeadStats {
        total_leads: leads.len(),
        by_status,
        by_type,
        average_score: (average_score * 100.0).round() / 100.0,
        high_score_leads,
    }))
}

async fn fetch_lead(state: &AppState, id: i64) -> Result<Lead, AppError> {
    sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead with id {} not found", id)))
}
