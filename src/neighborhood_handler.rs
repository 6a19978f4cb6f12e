use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use sqlx::{QueryBuilder, Sqlite};
use std::sync::Arc;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{
    CreateNeighborhoodRequest, MapEntry, Neighborhood, NeighborhoodQueryParams,
    PredictiveAnalysisRequest, UpdateNeighborhoodRequest,
};
use crate::scoring::{self, NeighborhoodScoreInput};

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

/// GET /api/quartiers
///
/// Lists neighborhoods ordered by potential score descending, with optional
/// city-substring and minimum-potential filters.
pub async fn list_neighborhoods(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NeighborhoodQueryParams>,
) -> Result<Json<Vec<Neighborhood>>, AppError> {
    tracing::info!("GET /quartiers - params: {:?}", params);

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM neighborhoods WHERE 1=1");
    if let Some(ville) = &params.ville {
        query.push(" AND city LIKE ");
        query.push_bind(format!("%{}%", ville));
    }
    if let Some(score_min) = params.score_min {
        query.push(" AND potential_score >= ");
        query.push_bind(score_min);
    }
    query.push(" ORDER BY potential_score DESC");

    let quartiers = query
        .build_query_as::<Neighborhood>()
        .fetch_all(&state.db)
        .await?;
    Ok(Json(quartiers))
}

/// POST /api/quartiers
///
/// Creates a neighborhood and computes its three derived scores. Rotation is
/// computed first because the potential score reads it.
pub async fn create_neighborhood(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNeighborhoodRequest>,
) -> Result<(StatusCode, Json<Neighborhood>), AppError> {
    let name = payload.name.ok_or_else(|| missing("name"))?;
    let city = payload.city.ok_or_else(|| missing("city"))?;

    let input = NeighborhoodScoreInput {
        average_sale_time: payload.average_sale_time,
        average_price_m2: payload.average_price_m2,
        population: payload.population,
        average_income: payload.average_income,
        average_age: payload.average_age,
    };
    let (rotation, potential, demand) = compute_scores(&input);

    let now = Utc::now();
    let quartier = sqlx::query_as::<_, Neighborhood>(
        "INSERT INTO neighborhoods \
         (name, city, postal_code, latitude, longitude, rotation_rate_score, potential_score, \
          demand_indicator, average_age, average_income, population, average_price_m2, \
          average_sale_time, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&name)
    .bind(&city)
    .bind(payload.postal_code)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(rotation)
    .bind(potential)
    .bind(demand)
    .bind(payload.average_age)
    .bind(payload.average_income)
    .bind(payload.population)
    .bind(payload.average_price_m2)
    .bind(payload.average_sale_time)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "Created neighborhood {} (potential {})",
        quartier.id,
        quartier.potential_score
    );
    Ok((StatusCode::CREATED, Json(quartier)))
}

/// GET /api/quartiers/:id
pub async fn get_neighborhood(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Neighborhood>, AppError> {
    let quartier = fetch_neighborhood(&state, id).await?;
    Ok(Json(quartier))
}

/// PUT /api/quartiers/:id
///
/// Field-wise merge, then all three derived scores are recomputed wholesale
/// from the merged field values.
pub async fn update_neighborhood(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNeighborhoodRequest>,
) -> Result<Json<Neighborhood>, AppError> {
    let existing = fetch_neighborhood(&state, id).await?;

    let name = payload.name.unwrap_or(existing.name);
    let city = payload.city.unwrap_or(existing.city);
    let postal_code = payload.postal_code.or(existing.postal_code);
    let latitude = payload.latitude.or(existing.latitude);
    let longitude = payload.longitude.or(existing.longitude);
    let average_age = payload.average_age.or(existing.average_age);
    let average_income = payload.average_income.or(existing.average_income);
    let population = payload.population.or(existing.population);
    let average_price_m2 = payload.average_price_m2.or(existing.average_price_m2);
    let average_sale_time = payload.average_sale_time.or(existing.average_sale_time);

    let input = NeighborhoodScoreInput {
        average_sale_time,
        average_price_m2,
        population,
        average_income,
        average_age,
    };
    let (rotation, potential, demand) = compute_scores(&input);

    let quartier = sqlx::query_as::<_, Neighborhood>(
        "UPDATE neighborhoods SET name = ?, city = ?, postal_code = ?, latitude = ?, \
         longitude = ?, rotation_rate_score = ?, potential_score = ?, demand_indicator = ?, \
         average_age = ?, average_income = ?, population = ?, average_price_m2 = ?, \
         average_sale_time = ?, updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(&name)
    .bind(&city)
    .bind(&postal_code)
    .bind(latitude)
    .bind(longitude)
    .bind(rotation)
    .bind(potential)
    .bind(demand)
    .bind(average_age)
    .bind(average_income)
    .bind(population)
    .bind(average_price_m2)
    .bind(average_sale_time)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(quartier))
}

/// DELETE /api/quartiers/:id
pub async fn delete_neighborhood(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM neighborhoods WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Neighborhood with id {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/quartiers/analyse-predictive
///
/// Returns the "predictive" analysis block for one neighborhood: projected
/// rotation, price evolution, a target buyer profile and three farming
/// recommendations, with a confidence figure. All template material.
pub async fn predictive_analysis(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PredictiveAnalysisRequest>,
) -> Result<Json<Value>, AppError> {
    let quartier_id = payload
        .quartier_id
        .ok_or_else(|| AppError::BadRequest("ID du quartier requis".to_string()))?;

    let quartier = fetch_neighborhood(&state, quartier_id).await?;

    let mut rng = rand::thread_rng();
    let analyse = json!({
        "quartier": quartier,
        "predictions": {
            "taux_rotation_prevu": (quartier.rotation_rate_score * 1.2 * 100.0).round() / 100.0,
            "evolution_prix_6_mois": rng.gen_range(-5.0..15.0),
            "profil_acquereurs_cibles": buyer_profile(&mut rng),
            "recommandations_farming": farming_recommendations(&mut rng),
        },
        "confiance": rng.gen_range(0.75..0.95),
    });

    Ok(Json(analyse))
}

/// GET /api/quartiers/cartographie
///
/// Map feed: one entry per neighborhood that has both coordinates, with a
/// color derived from its potential score.
pub async fn map_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MapEntry>>, AppError> {
    let quartiers = sqlx::query_as::<_, Neighborhood>("SELECT * FROM neighborhoods")
        .fetch_all(&state.db)
        .await?;

    let entries = quartiers
        .into_iter()
        .filter_map(|q| match (q.latitude, q.longitude) {
            (Some(latitude), Some(longitude)) => Some(MapEntry {
                id: q.id,
                nom: q.name,
                ville: q.city,
                latitude,
                longitude,
                score_potentiel: q.potential_score,
                score_rotation: q.rotation_rate_score,
                indicateur_demande: q.demand_indicator,
                prix_m2_moyen: q.average_price_m2,
                couleur: score_color(q.potential_score).to_string(),
            }),
            _ => None,
        })
        .collect();

    Ok(Json(entries))
}

/// Computes the three derived scores from a merged field set. Rotation feeds
/// into potential, so it is computed first. The thread-local rng stays inside
/// this function; holding it across an await would make the handler futures
/// non-Send.
fn compute_scores(input: &NeighborhoodScoreInput) -> (f64, f64, f64) {
    let mut rng = rand::thread_rng();
    let rotation = scoring::rotation_rate_score(input, &mut rng);
    let potential = scoring::potential_score(input, rotation, &mut rng);
    let demand = scoring::demand_indicator(input, &mut rng);
    (rotation, potential, demand)
}

/// Hex color for a potential score band (green / orange / red / grey).
fn score_color(score: f64) -> &'static str {
    if score >= 8.0 {
        "#22c55e"
    } else if score >= 6.0 {
        "#f59e0b"
    } else if score >= 4.0 {
        "#ef4444"
    } else {
        "#6b7280"
    }
}

fn buyer_profile(rng: &mut impl Rng) -> Value {
    let profiles = [
        json!({
            "type": "Jeunes couples",
            "age_moyen": "28-35 ans",
            "revenus": "45 000 - 65 000 €",
            "preferences": "Appartements 2-3 pièces, proximité transports",
            "budget_moyen": "250 000 - 350 000 €",
        }),
        json!({
            "type": "Familles avec enfants",
            "age_moyen": "35-45 ans",
            "revenus": "55 000 - 80 000 €",
            "preferences": "Maisons avec jardin, quartiers résidentiels",
            "budget_moyen": "350 000 - 500 000 €",
        }),
        json!({
            "type": "Investisseurs locatifs",
            "age_moyen": "40-55 ans",
            "revenus": "60 000 - 100 000 €",
            "preferences": "Rendement locatif, proximité universités/centres",
            "budget_moyen": "200 000 - 400 000 €",
        }),
    ];

    profiles[rng.gen_range(0..profiles.len())].clone()
}

fn farming_recommendations(rng: &mut impl Rng) -> Vec<&'static str> {
    const RECOMMENDATIONS: &[&str] = &[
        "Organiser des portes ouvertes le weekend",
        "Distribuer des flyers sur les tendances du marché local",
        "Créer du contenu sur les écoles et services du quartier",
        "Développer un réseau avec les commerces locaux",
        "Organiser des événements de quartier",
        "Proposer des évaluations gratuites aux propriétaires",
    ];

    RECOMMENDATIONS
        .choose_multiple(rng, 3)
        .copied()
        .collect()
}

async fn fetch_neighborhood(state: &AppState, id: i64) -> Result<Neighborhood, AppError> {
    sqlx::query_as::<_, Neighborhood>("SELECT * FROM neighborhoods WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Neighborhood with id {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn score_color_bands() {
        assert_eq!(score_color(9.0), "#22c55e");
        assert_eq!(score_color(8.0), "#22c55e");
        assert_eq!(score_color(6.5), "#f59e0b");
        assert_eq!(score_color(4.0), "#ef4444");
        assert_eq!(score_color(2.0), "#6b7280");
    }

    #[test]
    fn farming_recommendations_picks_three_distinct() {
        let mut rng = StdRng::seed_from_u64(11);
        let picks = farming_recommendations(&mut rng);
        assert_eq!(picks.len(), 3);
        let mut unique = picks.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 3);
    }
}
