/// Property-based tests using proptest
/// Tests invariants and properties that should hold for all inputs
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use farmio_api::chatbot::{classify_intent, update_context, ConversationContext, Intent};
use farmio_api::scoring::{
    demand_indicator, lead_base_score, lead_score, potential_score, rotation_rate_score,
    LeadScoreInput, NeighborhoodScoreInput,
};

fn has_one_decimal(value: f64) -> bool {
    (value * 10.0 - (value * 10.0).round()).abs() < 1e-9
}

// Property: intent classification should never panic and always yield a label
proptest! {
    #[test]
    fn classification_never_panics(message in "\\PC*") {
        let _ = classify_intent(&message);
    }

    #[test]
    fn classification_is_case_insensitive(message in "[a-zA-Zéàç @.]{0,40}") {
        prop_assert_eq!(
            classify_intent(&message),
            classify_intent(&message.to_uppercase())
        );
    }

    #[test]
    fn messages_without_keywords_fall_back(message in "[xqzw]{1,20}") {
        prop_assert_eq!(classify_intent(&message), Intent::Autre);
    }
}

// Property: the context fold should never panic and counts every turn
proptest! {
    #[test]
    fn context_fold_never_panics(message in "\\PC*") {
        let ctx = ConversationContext::default();
        let intent = classify_intent(&message);
        let _ = update_context(&ctx, intent, &message);
    }

    #[test]
    fn context_counter_increments_exactly_once_per_turn(
        messages in prop::collection::vec("[a-zé €@.0-9]{0,30}", 0..10)
    ) {
        let mut ctx = ConversationContext::default();
        for message in &messages {
            let intent = classify_intent(message);
            ctx = update_context(&ctx, intent, message);
        }
        prop_assert_eq!(ctx.nb_messages as usize, messages.len());
    }

    #[test]
    fn extracted_budget_is_nonnegative(amount in 0u64..100_000_000u64) {
        let ctx = ConversationContext::default();
        let message = format!("mon budget est de {} euros", amount);
        let next = update_context(&ctx, Intent::InformationBudget, &message);
        if let Some(budget) = next.budget {
            prop_assert!(budget >= 0.0);
            prop_assert_eq!(budget, amount as f64);
        }
    }
}

// Property: lead scores stay in range with one decimal for any input
proptest! {
    #[test]
    fn lead_score_always_in_range(
        budget_min in prop::option::of(0.0..10_000_000.0f64),
        budget_max in prop::option::of(0.0..10_000_000.0f64),
        has_phone in proptest::bool::ANY,
        source in prop::option::of(prop::sample::select(vec![
            "website", "referral", "chatbot", "cold_call", "unknown"
        ])),
        lead_type in prop::sample::select(vec!["buyer", "seller", "both"]),
        seed in proptest::num::u64::ANY
    ) {
        let input = LeadScoreInput {
            budget_min,
            budget_max,
            phone: has_phone.then_some("0612345678"),
            source,
            lead_type,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let score = lead_score(&input, &mut rng);
        prop_assert!((0.0..=10.0).contains(&score), "score out of range: {}", score);
        prop_assert!(has_one_decimal(score), "more than one decimal: {}", score);
    }

    #[test]
    fn lead_score_within_jitter_of_base(
        budget_min in prop::option::of(0.0..1_000_000.0f64),
        lead_type in prop::sample::select(vec!["buyer", "seller"]),
        seed in proptest::num::u64::ANY
    ) {
        let input = LeadScoreInput {
            budget_min,
            lead_type,
            ..Default::default()
        };
        let base = lead_base_score(&input);
        let mut rng = StdRng::seed_from_u64(seed);
        let score = lead_score(&input, &mut rng);
        // Jitter is U(-0.5, 1.5), rounding adds at most 0.05 either way.
        prop_assert!(score >= (base - 0.55).clamp(0.0, 10.0));
        prop_assert!(score <= (base + 1.55).clamp(0.0, 10.0));
    }

    #[test]
    fn lead_base_score_monotone_in_budget(
        low in 0.0..200_000.0f64,
        high in 200_000.1..10_000_000.0f64
    ) {
        let poor = LeadScoreInput {
            budget_min: Some(low),
            lead_type: "buyer",
            ..Default::default()
        };
        let rich = LeadScoreInput {
            budget_min: Some(high),
            lead_type: "buyer",
            ..Default::default()
        };
        prop_assert!(lead_base_score(&rich) >= lead_base_score(&poor));
    }
}

// Property: neighborhood scores stay in range with one decimal for any input
proptest! {
    #[test]
    fn neighborhood_scores_always_in_range(
        average_sale_time in prop::option::of(0i64..1000),
        average_price_m2 in prop::option::of(0.0..20_000.0f64),
        population in prop::option::of(0i64..1_000_000),
        average_income in prop::option::of(0.0..200_000.0f64),
        average_age in prop::option::of(18.0..90.0f64),
        seed in proptest::num::u64::ANY
    ) {
        let input = NeighborhoodScoreInput {
            average_sale_time,
            average_price_m2,
            population,
            average_income,
            average_age,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let rotation = rotation_rate_score(&input, &mut rng);
        let potential = potential_score(&input, rotation, &mut rng);
        let demand = demand_indicator(&input, &mut rng);
        for score in [rotation, potential, demand] {
            prop_assert!((0.0..=10.0).contains(&score), "score out of range: {}", score);
            prop_assert!(has_one_decimal(score), "more than one decimal: {}", score);
        }
    }
}
