use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::chatbot;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{ConversationRequest, ConversationResponse, Lead};

/// POST /api/chatbot/conversation
///
/// Drives one turn of the pre-qualification dialogue: classify the message,
/// pick a scripted response, fold the message into the context, and when the
/// context qualifies, materialize and score a lead.
pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConversationRequest>,
) -> Result<Json<ConversationResponse>, AppError> {
    let message = payload.message.unwrap_or_default().to_lowercase();
    let contexte = payload.contexte.unwrap_or_default();

    let intention = chatbot::classify_intent(&message);
    let reponse = chatbot::generate_response(intention, &mut rand::thread_rng());
    let nouveau_contexte = chatbot::update_context(&contexte, intention, &message);

    let lead_cree = match chatbot::lead_from_context(&nouveau_contexte) {
        Some(draft) => Some(insert_chatbot_lead(&state, draft).await?),
        None => None,
    };

    if let Some(lead) = &lead_cree {
        tracing::info!(
            "Chatbot materialized lead {} with score {}",
            lead.id,
            lead.score
        );
    }

    let prochaine_question = chatbot::next_question(&nouveau_contexte).to_string();

    Ok(Json(ConversationResponse {
        reponse: reponse.to_string(),
        intention,
        contexte: nouveau_contexte,
        lead_cree,
        suggestions: chatbot::reply_suggestions(intention),
        prochaine_question,
    }))
}

/// GET /api/chatbot/intentions
///
/// Static catalogue of the intents the classifier recognizes.
pub async fn intentions() -> Json<Value> {
    Json(json!([
        {
            "nom": "salutation",
            "description": "Saluer le chatbot",
            "exemples": ["bonjour", "salut", "hello"],
        },
        {
            "nom": "recherche_achat",
            "description": "Recherche d'un bien à acheter",
            "exemples": ["je cherche à acheter", "je veux acheter une maison"],
        },
        {
            "nom": "recherche_vente",
            "description": "Vente d'un bien",
            "exemples": ["je veux vendre", "vendre ma maison"],
        },
        {
            "nom": "information_budget",
            "description": "Information sur le budget",
            "exemples": ["mon budget est de", "je peux payer"],
        },
        {
            "nom": "information_localisation",
            "description": "Information sur la localisation souhaitée",
            "exemples": ["je cherche à toulouse", "dans le quartier"],
        },
        {
            "nom": "information_contact",
            "description": "Fourniture des coordonnées",
            "exemples": ["mon email est", "mon téléphone"],
        },
        {
            "nom": "question_marche",
            "description": "Question sur le marché immobilier",
            "exemples": ["comment va le marché", "les prix augmentent"],
        },
        {
            "nom": "demande_rdv",
            "description": "Demande de rendez-vous",
            "exemples": ["je veux un rendez-vous", "pouvons-nous nous rencontrer"],
        },
    ]))
}

/// GET /api/chatbot/conversations
///
/// Conversation history. Sessions are not persisted today, so this returns
/// simulated entries the dashboard can render.
pub async fn conversations() -> Json<Value> {
    let now = Utc::now().to_rfc3339();
    Json(json!([
        {
            "session_id": "session_123",
            "date_debut": now,
            "messages": 5,
            "lead_genere": true,
            "statut": "qualifie",
        },
        {
            "session_id": "session_124",
            "date_debut": now,
            "messages": 3,
            "lead_genere": false,
            "statut": "en_cours",
        },
    ]))
}

/// Inserts a lead drafted from a qualified conversation context and assigns
/// its heat score.
async fn insert_chatbot_lead(
    state: &AppState,
    draft: chatbot::LeadDraft,
) -> Result<Lead, AppError> {
    let score = crate::scoring::lead_score(
        &crate::scoring::LeadScoreInput {
            budget_min: draft.budget_min,
            budget_max: draft.budget_max,
            phone: draft.phone.as_deref(),
            source: Some(&draft.source),
            lead_type: &draft.lead_type,
        },
        &mut rand::thread_rng(),
    );

    let now = Utc::now();
    let lead = sqlx::query_as::<_, Lead>(
        "INSERT INTO leads \
         (first_name, last_name, email, phone, lead_type, budget_min, budget_max, \
          location_interest, score, status, source, notes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'new', ?, ?, ?, ?) RETURNING *",
    )
    .bind(&draft.first_name)
    .bind(&draft.last_name)
    .bind(&draft.email)
    .bind(&draft.phone)
    .bind(&draft.lead_type)
    .bind(draft.budget_min)
    .bind(draft.budget_max)
    .bind(&draft.location_interest)
    .bind(score)
    .bind(&draft.source)
    .bind(&draft.notes)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    Ok(lead)
}
