//! Pre-qualification chatbot engine.
//!
//! Three pure pieces drive a scripted dialogue: a keyword-based intent
//! classifier, a context fold that accumulates what the visitor disclosed,
//! and a gating predicate deciding when enough context exists to materialize
//! a lead. Response texts are hand-authored French templates picked with the
//! caller-supplied random generator.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classified intent of a visitor message. Wire names are the French labels
/// the frontend already knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Salutation,
    RechercheAchat,
    RechercheVente,
    InformationBudget,
    InformationLocalisation,
    InformationContact,
    QuestionMarche,
    DemandeRdv,
    AuRevoir,
    Autre,
}

/// Keyword sets per intent, evaluated in order. Priority is semantically
/// meaningful: the first matching entry wins (e.g. "prix" belongs to both
/// budget and market questions, budget is checked first).
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Salutation,
        &["bonjour", "salut", "hello", "bonsoir", "hey"],
    ),
    (
        Intent::RechercheAchat,
        &[
            "acheter",
            "achat",
            "acquérir",
            "cherche à acheter",
            "veux acheter",
        ],
    ),
    (
        Intent::RechercheVente,
        &["vendre", "vente", "céder", "veux vendre", "mettre en vente"],
    ),
    (
        Intent::InformationBudget,
        &[
            "budget",
            "prix",
            "coût",
            "payer",
            "financement",
            "euros",
            "€",
        ],
    ),
    (
        Intent::InformationLocalisation,
        &["toulouse", "quartier", "secteur", "zone", "ville", "région"],
    ),
    (
        Intent::InformationContact,
        &["email", "téléphone", "contact", "joindre", "@", "appeler"],
    ),
    (
        Intent::QuestionMarche,
        &["marché", "tendance", "évolution", "prix", "immobilier"],
    ),
    (
        Intent::DemandeRdv,
        &["rendez-vous", "rencontrer", "rdv", "voir", "visiter"],
    ),
    (
        Intent::AuRevoir,
        &["au revoir", "bye", "à bientôt", "merci", "stop"],
    ),
];

/// Classifies a message into exactly one intent. Total and deterministic:
/// every input maps to one of the nine labels or the `Autre` fallback.
pub fn classify_intent(message: &str) -> Intent {
    let message = message.to_lowercase();
    for (intent, keywords) in INTENT_KEYWORDS {
        if keywords.iter().any(|keyword| message.contains(keyword)) {
            return *intent;
        }
    }
    Intent::Autre
}

/// Kind of project the visitor disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Achat,
    Vente,
}

/// Accumulated conversation state.
///
/// Fixed-shape record with explicit presence: absent fields are omitted from
/// JSON because presence-of-key (not truthiness) is the signal downstream.
/// `nb_messages` is always present and increments by exactly one per turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_projet: Option<ProjectType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localisation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localisation_precise: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    pub nb_messages: u32,
}

static BUDGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\s*\d+)*)\s*(?:euros?|€)").expect("budget regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+33|0)[1-9][0-9]{8}").expect("phone regex"));

/// Folds one message into the context: sets the project type on buy/sell
/// intents, extracts budget, location flags, email and French phone numbers,
/// and increments the message counter. Pure with respect to its inputs;
/// unmatched patterns leave the corresponding field absent.
pub fn update_context(
    contexte: &ConversationContext,
    intent: Intent,
    message: &str,
) -> ConversationContext {
    let mut next = contexte.clone();
    let message = message.to_lowercase();

    match intent {
        Intent::RechercheAchat => next.type_projet = Some(ProjectType::Achat),
        Intent::RechercheVente => next.type_projet = Some(ProjectType::Vente),
        Intent::InformationBudget => {
            if let Some(captures) = BUDGET_RE.captures(&message) {
                let digits: String = captures[1].chars().filter(|c| !c.is_whitespace()).collect();
                if let Ok(amount) = digits.parse::<f64>() {
                    next.budget = Some(amount);
                }
            }
        }
        Intent::InformationLocalisation => {
            if message.contains("toulouse") {
                next.localisation = Some("Toulouse".to_string());
            }
            if message.contains("quartier") {
                next.localisation_precise = Some(true);
            }
        }
        Intent::InformationContact => {
            if let Some(found) = EMAIL_RE.find(&message) {
                next.email = Some(found.as_str().to_string());
            }
            let compact: String = message.chars().filter(|c| !c.is_whitespace()).collect();
            if let Some(found) = PHONE_RE.find(&compact) {
                next.telephone = Some(found.as_str().to_string());
            }
        }
        _ => {}
    }

    next.nb_messages += 1;
    next
}

/// Admission-control rule for auto-creating a lead from a conversation:
/// a project type plus at least one contact channel.
pub fn can_create_lead(contexte: &ConversationContext) -> bool {
    contexte.type_projet.is_some() && (contexte.email.is_some() || contexte.telephone.is_some())
}

/// Field values for a lead materialized from a qualified conversation.
#[derive(Debug, Clone)]
pub struct LeadDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub lead_type: String,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub location_interest: Option<String>,
    pub source: String,
    pub notes: String,
}

/// Builds a lead draft from a qualified context. Returns `None` when the
/// admission gate fails. Budget bounds spread the disclosed figure by ±20%.
pub fn lead_from_context(contexte: &ConversationContext) -> Option<LeadDraft> {
    if !can_create_lead(contexte) {
        return None;
    }

    let lead_type = match contexte.type_projet {
        Some(ProjectType::Achat) => "buyer",
        _ => "seller",
    };

    let serialized = serde_json::to_string(contexte).unwrap_or_default();

    Some(LeadDraft {
        first_name: "Prospect".to_string(),
        last_name: "Chatbot".to_string(),
        email: contexte
            .email
            .clone()
            .unwrap_or_else(|| "prospect@example.com".to_string()),
        phone: contexte.telephone.clone(),
        lead_type: lead_type.to_string(),
        budget_min: contexte.budget.map(|b| b * 0.8),
        budget_max: contexte.budget.map(|b| b * 1.2),
        location_interest: contexte.localisation.clone(),
        source: "chatbot".to_string(),
        notes: format!("Lead généré par chatbot. Contexte: {}", serialized),
    })
}

/// Picks a scripted response for the classified intent.
pub fn generate_response(intent: Intent, rng: &mut impl Rng) -> &'static str {
    let pool: &[&str] = match intent {
        Intent::Salutation => &[
            "Bonjour ! Je suis l'assistant virtuel de Pierre Bournet, spécialiste immobilier sur Toulouse Sud. Comment puis-je vous aider aujourd'hui ?",
            "Salut ! Ravi de vous rencontrer. Je suis là pour vous accompagner dans votre projet immobilier. Que recherchez-vous ?",
            "Bonjour et bienvenue ! Je peux vous aider à trouver le bien de vos rêves ou à vendre votre propriété. Par quoi commençons-nous ?",
        ],
        Intent::RechercheAchat => &[
            "Parfait ! Vous souhaitez acheter un bien immobilier. Quel type de bien vous intéresse ? (appartement, maison, terrain...)",
            "Excellente nouvelle ! Pour mieux vous conseiller, pouvez-vous me dire dans quel secteur vous cherchez et votre budget approximatif ?",
            "Super ! Je vais vous aider à trouver le bien idéal. Avez-vous une préférence géographique sur Toulouse Sud ?",
        ],
        Intent::RechercheVente => &[
            "Je comprends que vous souhaitez vendre votre bien. Pouvez-vous me donner quelques détails : type de bien, localisation, surface approximative ?",
            "Parfait ! La vente d'un bien nécessite une expertise précise. Dans quel quartier se trouve votre propriété ?",
            "Excellente décision ! Pour une estimation précise, j'aurais besoin de connaître les caractéristiques de votre bien.",
        ],
        Intent::InformationBudget => &[
            "Merci pour cette information sur votre budget. Cela m'aide à mieux cibler les biens qui pourraient vous convenir.",
            "Parfait ! Avec ces éléments budgétaires, je peux vous proposer des biens adaptés à vos moyens.",
            "Très bien ! Votre budget est noté. Avez-vous des critères particuliers pour votre futur bien ?",
        ],
        Intent::InformationLocalisation => &[
            "Excellent choix de secteur ! Je connais très bien cette zone. Avez-vous des préférences particulières dans ce quartier ?",
            "Parfait ! Ce secteur offre de belles opportunités. Qu'est-ce qui vous attire dans cette zone ?",
            "Très bon choix ! Cette localisation présente de nombreux avantages. Cherchez-vous quelque chose de spécifique ?",
        ],
        Intent::InformationContact => &[
            "Merci pour vos coordonnées ! Je les transmets immédiatement à Pierre Bournet qui vous contactera rapidement.",
            "Parfait ! Vos informations sont enregistrées. Un expert va vous recontacter sous 24h pour approfondir votre projet.",
            "Excellent ! Avec ces éléments, nous pouvons vous proposer un accompagnement personnalisé.",
        ],
        Intent::QuestionMarche => &[
            "Le marché immobilier sur Toulouse Sud est dynamique ! Les prix sont en légère hausse (+5% sur 12 mois) avec une demande soutenue.",
            "Excellente question ! Le marché local présente de belles opportunités, notamment pour les familles et les investisseurs.",
            "Le marché évolue positivement ! Souhaitez-vous des informations sur un secteur particulier ?",
        ],
        Intent::DemandeRdv => &[
            "Bien sûr ! Pierre Bournet sera ravi de vous rencontrer. Laissez-moi vos coordonnées et vos disponibilités.",
            "Parfait ! Un rendez-vous personnalisé est la meilleure façon d'avancer. Quand seriez-vous disponible ?",
            "Excellente idée ! Pour organiser ce rendez-vous, j'ai besoin de votre contact et de vos créneaux préférés.",
        ],
        Intent::AuRevoir => &[
            "Au revoir et merci pour votre visite ! N'hésitez pas à revenir si vous avez d'autres questions.",
            "À bientôt ! Votre projet immobilier nous tient à cœur, revenez quand vous voulez !",
            "Merci et à bientôt ! Pierre Bournet et son équipe restent à votre disposition.",
        ],
        Intent::Autre => &[
            "Je ne suis pas sûr de bien comprendre. Pouvez-vous reformuler votre question ?",
            "Intéressant ! Pouvez-vous m'en dire plus pour que je puisse mieux vous aider ?",
            "Je vois ! Pour mieux vous conseiller, pouvez-vous préciser votre demande ?",
        ],
    };

    pool[rng.gen_range(0..pool.len())]
}

/// Quick-reply suggestions offered to the visitor for the next turn.
pub fn reply_suggestions(intent: Intent) -> Vec<String> {
    let pool: &[&str] = match intent {
        Intent::Salutation => &[
            "Je cherche à acheter un bien",
            "Je veux vendre ma propriété",
            "J'ai des questions sur le marché",
        ],
        Intent::RechercheAchat => &[
            "Une maison avec jardin",
            "Un appartement 3 pièces",
            "Dans le centre de Toulouse",
        ],
        Intent::RechercheVente => &[
            "Une maison de 120m²",
            "Un appartement T3",
            "Dans le quartier des Minimes",
        ],
        _ => &[
            "Je cherche à acheter",
            "Je veux vendre",
            "Informations sur les prix",
        ],
    };

    pool.iter().map(|s| s.to_string()).collect()
}

/// Next question of the scripted dialogue tree, driven by which context
/// fields are still missing.
pub fn next_question(contexte: &ConversationContext) -> &'static str {
    match contexte.type_projet {
        None => "Souhaitez-vous acheter ou vendre un bien immobilier ?",
        Some(ProjectType::Achat) => {
            if contexte.budget.is_none() {
                "Quel est votre budget approximatif pour cet achat ?"
            } else if contexte.localisation.is_none() {
                "Dans quel secteur de Toulouse Sud recherchez-vous ?"
            } else if contexte.email.is_none() && contexte.telephone.is_none() {
                "Pouvez-vous me laisser votre email ou téléphone pour que Pierre vous recontacte ?"
            } else {
                "Avez-vous d'autres questions sur votre projet immobilier ?"
            }
        }
        Some(ProjectType::Vente) => {
            if contexte.localisation.is_none() {
                "Dans quel quartier se trouve votre bien à vendre ?"
            } else if contexte.email.is_none() && contexte.telephone.is_none() {
                "Comment Pierre peut-il vous contacter pour une estimation gratuite ?"
            } else {
                "Avez-vous d'autres questions sur votre projet immobilier ?"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_total_and_deterministic() {
        for message in ["bonjour", "je veux acheter", "xyzzy", "", "💡"] {
            let first = classify_intent(message);
            let second = classify_intent(message);
            assert_eq!(first, second);
        }
        assert_eq!(classify_intent("n'importe quoi"), Intent::Autre);
    }

    #[test]
    fn classification_priority_first_match_wins() {
        // "prix" is a keyword of both budget and market questions; budget
        // comes first in the table.
        assert_eq!(classify_intent("quel est le prix"), Intent::InformationBudget);
        // Greeting beats everything else.
        assert_eq!(
            classify_intent("bonjour je veux acheter"),
            Intent::Salutation
        );
    }

    #[test]
    fn classification_examples() {
        assert_eq!(classify_intent("Bonjour"), Intent::Salutation);
        assert_eq!(classify_intent("je veux acheter"), Intent::RechercheAchat);
        assert_eq!(classify_intent("vendre ma maison"), Intent::RechercheVente);
        assert_eq!(
            classify_intent("mon email est x@y.com"),
            Intent::InformationContact
        );
        assert_eq!(
            classify_intent("je cherche à toulouse"),
            Intent::InformationLocalisation
        );
        assert_eq!(classify_intent("je veux un rdv"), Intent::DemandeRdv);
        // "au revoir" contains "voir", a rendezvous keyword checked earlier
        // in the table, so the farewell label only fires on its other words.
        assert_eq!(classify_intent("au revoir"), Intent::DemandeRdv);
        assert_eq!(classify_intent("bye"), Intent::AuRevoir);
        assert_eq!(classify_intent("à bientôt"), Intent::AuRevoir);
    }

    #[test]
    fn context_fold_increments_counter_by_one() {
        let ctx = ConversationContext::default();
        let once = update_context(&ctx, Intent::Salutation, "bonjour");
        let twice = update_context(&once, Intent::Salutation, "bonjour");
        assert_eq!(once.nb_messages, 1);
        assert_eq!(twice.nb_messages, 2);
    }

    #[test]
    fn context_fold_is_pure() {
        let ctx = ConversationContext::default();
        let a = update_context(&ctx, Intent::RechercheAchat, "je veux acheter");
        let b = update_context(&ctx, Intent::RechercheAchat, "je veux acheter");
        assert_eq!(a, b);
        assert_eq!(a.type_projet, Some(ProjectType::Achat));
    }

    #[test]
    fn budget_extraction_joins_digit_groups() {
        let ctx = ConversationContext::default();
        let next = update_context(
            &ctx,
            Intent::InformationBudget,
            "mon budget est de 300 000 euros",
        );
        assert_eq!(next.budget, Some(300_000.0));

        let euro_sign = update_context(&ctx, Intent::InformationBudget, "je peux payer 250000€");
        assert_eq!(euro_sign.budget, Some(250_000.0));

        // No amount in the message: the key stays absent.
        let none = update_context(&ctx, Intent::InformationBudget, "mon budget est limité");
        assert_eq!(none.budget, None);
    }

    #[test]
    fn contact_extraction() {
        let ctx = ConversationContext::default();
        let next = update_context(
            &ctx,
            Intent::InformationContact,
            "mon email est jean.dupont@example.com et mon téléphone 06 12 34 56 78",
        );
        assert_eq!(next.email.as_deref(), Some("jean.dupont@example.com"));
        assert_eq!(next.telephone.as_deref(), Some("0612345678"));
    }

    #[test]
    fn location_extraction_flags() {
        let ctx = ConversationContext::default();
        let next = update_context(
            &ctx,
            Intent::InformationLocalisation,
            "je cherche à Toulouse dans le quartier des Minimes",
        );
        assert_eq!(next.localisation.as_deref(), Some("Toulouse"));
        assert_eq!(next.localisation_precise, Some(true));
    }

    #[test]
    fn lead_gate_cases() {
        let empty = ConversationContext::default();
        assert!(!can_create_lead(&empty));

        let project_only = ConversationContext {
            type_projet: Some(ProjectType::Achat),
            ..Default::default()
        };
        assert!(!can_create_lead(&project_only));

        let with_email = ConversationContext {
            type_projet: Some(ProjectType::Achat),
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };
        assert!(can_create_lead(&with_email));

        let with_phone = ConversationContext {
            type_projet: Some(ProjectType::Vente),
            telephone: Some("0612345678".to_string()),
            ..Default::default()
        };
        assert!(can_create_lead(&with_phone));
    }

    #[test]
    fn lead_draft_maps_project_and_budget() {
        let contexte = ConversationContext {
            type_projet: Some(ProjectType::Achat),
            budget: Some(300_000.0),
            localisation: Some("Toulouse".to_string()),
            email: Some("a@b.com".to_string()),
            nb_messages: 3,
            ..Default::default()
        };
        let draft = lead_from_context(&contexte).expect("gate passes");
        assert_eq!(draft.lead_type, "buyer");
        assert_eq!(draft.budget_min, Some(240_000.0));
        assert_eq!(draft.budget_max, Some(360_000.0));
        assert_eq!(draft.email, "a@b.com");
        assert_eq!(draft.source, "chatbot");
        assert!(draft.notes.contains("a@b.com"));

        let vente = ConversationContext {
            type_projet: Some(ProjectType::Vente),
            telephone: Some("0612345678".to_string()),
            ..Default::default()
        };
        let draft = lead_from_context(&vente).expect("gate passes");
        assert_eq!(draft.lead_type, "seller");
        assert_eq!(draft.budget_min, None);
        assert_eq!(draft.email, "prospect@example.com");
        assert_eq!(draft.phone.as_deref(), Some("0612345678"));
    }

    #[test]
    fn lead_draft_requires_gate() {
        assert!(lead_from_context(&ConversationContext::default()).is_none());
    }

    #[test]
    fn context_serialization_omits_absent_keys() {
        let contexte = ConversationContext {
            type_projet: Some(ProjectType::Achat),
            nb_messages: 1,
            ..Default::default()
        };
        let value = serde_json::to_value(&contexte).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.get("type_projet").unwrap(), "achat");
        assert!(!object.contains_key("email"));
        assert!(!object.contains_key("budget"));
        assert_eq!(object.get("nb_messages").unwrap(), 1);
    }

    #[test]
    fn next_question_follows_dialogue_tree() {
        let empty = ConversationContext::default();
        assert_eq!(
            next_question(&empty),
            "Souhaitez-vous acheter ou vendre un bien immobilier ?"
        );

        let achat = ConversationContext {
            type_projet: Some(ProjectType::Achat),
            ..Default::default()
        };
        assert_eq!(
            next_question(&achat),
            "Quel est votre budget approximatif pour cet achat ?"
        );

        let vente = ConversationContext {
            type_projet: Some(ProjectType::Vente),
            localisation: Some("Toulouse".to_string()),
            ..Default::default()
        };
        assert_eq!(
            next_question(&vente),
            "Comment Pierre peut-il vous contacter pour une estimation gratuite ?"
        );
    }
}
