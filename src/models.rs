use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

// ============ Database Models ============

/// A property (sold or on the market) within a prospecting area.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier.
    pub id: i64,
    /// Street address.
    pub address: String,
    /// City name.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Type of property (e.g., "appartement", "maison").
    pub property_type: String,
    /// Surface in square meters.
    pub surface: Option<f64>,
    /// Number of rooms.
    pub rooms: Option<i64>,
    /// Sale or asking price in euros.
    pub price: Option<f64>,
    /// Date of the last sale, if known.
    pub sale_date: Option<NaiveDate>,
    /// Latitude coordinate.
    pub latitude: Option<f64>,
    /// Longitude coordinate.
    pub longitude: Option<f64>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A neighborhood (quartier) tracked for farming potential.
///
/// The three `*_score` fields are recomputed wholesale by the scoring engine
/// on every create and update; they are never incrementally maintained.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Neighborhood {
    /// Unique identifier.
    pub id: i64,
    /// Neighborhood name.
    pub name: String,
    /// City the neighborhood belongs to.
    pub city: String,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Latitude coordinate.
    pub latitude: Option<f64>,
    /// Longitude coordinate.
    pub longitude: Option<f64>,
    /// How frequently properties resell in the area, on a 0-10 scale.
    pub rotation_rate_score: f64,
    /// Farming potential, on a 0-10 scale.
    pub potential_score: f64,
    /// Buyer demand indicator, on a 0-10 scale.
    pub demand_indicator: f64,
    /// Average resident age.
    pub average_age: Option<f64>,
    /// Average household income in euros.
    pub average_income: Option<f64>,
    /// Resident population.
    pub population: Option<i64>,
    /// Average price per square meter in euros.
    pub average_price_m2: Option<f64>,
    /// Average time to sell, in days.
    pub average_sale_time: Option<i64>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A prospective buyer or seller with contact info and qualification score.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address. No uniqueness constraint.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// "buyer" or "seller".
    pub lead_type: String,
    /// Lower bound of the budget in euros.
    pub budget_min: Option<f64>,
    /// Upper bound of the budget in euros.
    pub budget_max: Option<f64>,
    /// Type of property the lead is interested in.
    pub property_type_interest: Option<String>,
    /// Geographic area of interest.
    pub location_interest: Option<String>,
    /// Heat score on a 0-10 scale, assigned by the scoring engine.
    pub score: f64,
    /// One of "new", "contacted", "qualified", "converted", "lost".
    pub status: String,
    /// Acquisition channel (e.g., "website", "referral", "chatbot").
    pub source: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
    /// Timestamp of the last contact with the lead.
    pub last_contact_date: Option<DateTime<Utc>>,
}

/// A generated report. Content is a JSON blob serialized to text.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier.
    pub id: i64,
    /// Report title.
    pub title: String,
    /// One of "analyse_marche", "prediction_quartier", "profil_acquereurs".
    pub report_type: String,
    /// Geographic zone covered by the report.
    pub location: Option<String>,
    /// JSON-serialized report content.
    pub content: Option<String>,
    /// Path to a generated PDF file (reserved, unused).
    pub file_path: Option<String>,
    /// One of "generating", "completed", "error".
    pub status: String,
    /// Owning user id.
    pub user_id: i64,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

// ============ Property Payloads ============

/// Request payload for creating a property.
///
/// Required fields are `Option` so that the handler can reject missing ones
/// with an explicit 400 instead of a framework-level rejection.
#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub property_type: Option<String>,
    pub surface: Option<f64>,
    pub rooms: Option<i64>,
    pub price: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Request payload for updating a property. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdatePropertyRequest {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub property_type: Option<String>,
    pub surface: Option<f64>,
    pub rooms: Option<i64>,
    pub price: Option<f64>,
    pub sale_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Query parameters for property listing.
#[derive(Debug, Deserialize)]
pub struct PropertyQueryParams {
    /// Case-insensitive substring filter on the city.
    pub city: Option<String>,
    /// Exact filter on the property type.
    pub property_type: Option<String>,
    /// Minimum price filter.
    pub min_price: Option<f64>,
    /// Maximum price filter.
    pub max_price: Option<f64>,
}

/// Query parameters for property statistics.
#[derive(Debug, Deserialize)]
pub struct PropertyStatsParams {
    pub city: Option<String>,
}

/// Aggregate statistics over the property table.
#[derive(Debug, Serialize)]
pub struct PropertyStats {
    pub total_properties: usize,
    pub average_price: f64,
    pub average_price_m2: f64,
    pub property_types: HashMap<String, i64>,
}

// ============ Lead Payloads ============

/// Request payload for creating a lead.
#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lead_type: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub property_type_interest: Option<String>,
    pub location_interest: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Request payload for updating a lead. Absent fields keep their value.
///
/// The score is recomputed when any of `budget_min`, `budget_max`,
/// `lead_type` or `source` is part of the payload.
#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub lead_type: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub property_type_interest: Option<String>,
    pub location_interest: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for lead listing.
#[derive(Debug, Deserialize)]
pub struct LeadQueryParams {
    pub status: Option<String>,
    pub lead_type: Option<String>,
    pub min_score: Option<f64>,
}

/// Aggregate statistics over the lead table.
#[derive(Debug, Serialize)]
pub struct LeadStats {
    pub total_leads: usize,
    pub by_status: HashMap<String, i64>,
    pub by_type: HashMap<String, i64>,
    pub average_score: f64,
    pub high_score_leads: usize,
}

/// Response payload for the score recomputation endpoint.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: f64,
}

// ============ Neighborhood Payloads ============

/// Request payload for creating a neighborhood.
#[derive(Debug, Deserialize)]
pub struct CreateNeighborhoodRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub average_age: Option<f64>,
    pub average_income: Option<f64>,
    pub population: Option<i64>,
    pub average_price_m2: Option<f64>,
    pub average_sale_time: Option<i64>,
}

/// Request payload for updating a neighborhood. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateNeighborhoodRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub average_age: Option<f64>,
    pub average_income: Option<f64>,
    pub population: Option<i64>,
    pub average_price_m2: Option<f64>,
    pub average_sale_time: Option<i64>,
}

/// Query parameters for neighborhood listing (French parameter names kept
/// for client compatibility).
#[derive(Debug, Deserialize)]
pub struct NeighborhoodQueryParams {
    /// Case-insensitive substring filter on the city.
    pub ville: Option<String>,
    /// Minimum potential score filter.
    pub score_min: Option<f64>,
}

/// Request payload for the predictive analysis endpoint.
#[derive(Debug, Deserialize)]
pub struct PredictiveAnalysisRequest {
    pub quartier_id: Option<i64>,
}

/// One entry of the interactive map feed.
#[derive(Debug, Serialize)]
pub struct MapEntry {
    pub id: i64,
    pub nom: String,
    pub ville: String,
    pub latitude: f64,
    pub longitude: f64,
    pub score_potentiel: f64,
    pub score_rotation: f64,
    pub indicateur_demande: f64,
    pub prix_m2_moyen: Option<f64>,
    pub couleur: String,
}

// ============ Report Payloads ============

/// Request payload for creating a report.
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    pub title: Option<String>,
    pub report_type: Option<String>,
    pub location: Option<String>,
    pub user_id: Option<i64>,
}

/// Query parameters for report listing.
#[derive(Debug, Deserialize)]
pub struct ReportQueryParams {
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

/// Request payload for the one-shot market report endpoint.
#[derive(Debug, Deserialize)]
pub struct MarketReportRequest {
    pub location: Option<String>,
    pub user_id: Option<i64>,
}

/// Request payload for the writing assistant endpoint.
#[derive(Debug, Deserialize)]
pub struct WritingAssistantRequest {
    /// One of "post_linkedin", "post_facebook", "annonce", "slogan".
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub sujet: Option<String>,
    pub quartier: Option<String>,
    pub mots_cles: Option<Vec<String>>,
}

// ============ Chatbot Payloads ============

/// Request payload for one chatbot turn.
#[derive(Debug, Deserialize)]
pub struct ConversationRequest {
    pub message: Option<String>,
    /// Client-side session identifier, echoed through unchanged today.
    pub session_id: Option<String>,
    pub contexte: Option<crate::chatbot::ConversationContext>,
}

/// Response payload for one chatbot turn (French keys kept for client
/// compatibility).
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub reponse: String,
    pub intention: crate::chatbot::Intent,
    pub contexte: crate::chatbot::ConversationContext,
    pub lead_cree: Option<Lead>,
    pub suggestions: Vec<String>,
    pub prochaine_question: String,
}
