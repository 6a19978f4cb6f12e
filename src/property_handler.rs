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
    CreatePropertyRequest, Property, PropertyQueryParams, PropertyStats, PropertyStatsParams,
    UpdatePropertyRequest,
};

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {}", field))
}

/// GET /api/properties
///
/// Lists properties with optional filters on city (case-insensitive
/// substring), property type and price bounds.
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PropertyQueryParams>,
) -> Result<Json<Vec<Property>>, AppError> {
    tracing::info!("GET /properties - params: {:?}", params);

    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM properties WHERE 1=1");
    if let Some(city) = &params.city {
        query.push(" AND city LIKE ");
        query.push_bind(format!("%{}%", city));
    }
    if let Some(property_type) = &params.property_type {
        query.push(" AND property_type = ");
        query.push_bind(property_type.clone());
    }
    if let Some(min_price) = params.min_price {
        query.push(" AND price >= ");
        query.push_bind(min_price);
    }
    if let Some(max_price) = params.max_price {
        query.push(" AND price <= ");
        query.push_bind(max_price);
    }

    let properties = query
        .build_query_as::<Property>()
        .fetch_all(&state.db)
        .await?;
    Ok(Json(properties))
}

/// POST /api/properties
///
/// Creates a property. Address, city, postal code and property type are
/// required; everything else is optional.
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let address = payload.address.ok_or_else(|| missing("address"))?;
    let city = payload.city.ok_or_else(|| missing("city"))?;
    let postal_code = payload.postal_code.ok_or_else(|| missing("postal_code"))?;
    let property_type = payload.property_type.ok_or_else(|| missing("property_type"))?;

    let now = Utc::now();
    let property = sqlx::query_as::<_, Property>(
        "INSERT INTO properties \
         (address, city, postal_code, property_type, surface, rooms, price, sale_date, \
          latitude, longitude, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&address)
    .bind(&city)
    .bind(&postal_code)
    .bind(&property_type)
    .bind(payload.surface)
    .bind(payload.rooms)
    .bind(payload.price)
    .bind(payload.sale_date)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Created property {} ({})", property.id, property.address);
    Ok((StatusCode::CREATED, Json(property)))
}

/// GET /api/properties/:id
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Property>, AppError> {
    let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property with id {} not found", id)))?;
    Ok(Json(property))
}

/// PUT /api/properties/:id
///
/// Field-wise merge: fields present in the payload win, absent ones keep
/// their stored value. Last write wins under concurrent updates.
pub async fn update_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>, AppError> {
    let existing = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property with id {} not found", id)))?;

    let property = sqlx::query_as::<_, Property>(
        "UPDATE properties SET address = ?, city = ?, postal_code = ?, property_type = ?, \
         surface = ?, rooms = ?, price = ?, sale_date = ?, latitude = ?, longitude = ?, \
         updated_at = ? WHERE id = ? RETURNING *",
    )
    .bind(payload.address.unwrap_or(existing.address))
    .bind(payload.city.unwrap_or(existing.city))
    .bind(payload.postal_code.unwrap_or(existing.postal_code))
    .bind(payload.property_type.unwrap_or(existing.property_type))
    .bind(payload.surface.or(existing.surface))
    .bind(payload.rooms.or(existing.rooms))
    .bind(payload.price.or(existing.price))
    .bind(payload.sale_date.or(existing.sale_date))
    .bind(payload.latitude.or(existing.latitude))
    .bind(payload.longitude.or(existing.longitude))
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(property))
}

/// DELETE /api/properties/:id
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM properties WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Property with id {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/properties/stats?city=
///
/// Aggregate price and type statistics, optionally scoped to a city.
pub async fn property_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PropertyStatsParams>,
) -> Result<Json<PropertyStats>, AppError> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM properties WHERE 1=1");
    if let Some(city) = &params.city {
        query.push(" AND city LIKE ");
        query.push_bind(format!("%{}%", city));
    }
    let properties = query
        .build_query_as::<Property>()
        .fetch_all(&state.db)
        .await?;

    if properties.is_empty() {
        return Ok(Json(PropertyStats {
            total_properties: 0,
            average_price: 0.0,
            average_price_m2: 0.0,
            property_types: HashMap::new(),
        }));
    }

    let prices: Vec<f64> = properties.iter().filter_map(|p| p.price).collect();
    let average_price = if prices.is_empty() {
        0.0
    } else {
        prices.iter().sum::<f64>() / prices.len() as f64
    };

    let prices_m2: Vec<f64> = properties
        .iter()
        .filter_map(|p| match (p.price, p.surface) {
            (Some(price), Some(surface)) if surface > 0.0 => Some(price / surface),
            _ => None,
        })
        .collect();
    let average_price_m2 = if prices_m2.is_empty() {
        0.0
    } else {
        prices_m2.iter().sum::<f64>() / prices_m2.len() as f64
    };

    let mut property_types: HashMap<String, i64> = HashMap::new();
    for property in &properties {
        *property_types
            .entry(property.property_type.clone())
            .or_insert(0) += 1;
    }

    Ok(Json(PropertyStats {
        total_properties: properties.len(),
        average_price: (average_price * 100.0).round() / 100.0,
        average_price_m2: (average_price_m2 * 100.0).round() / 100.0,
        property_types,
    }))
}
