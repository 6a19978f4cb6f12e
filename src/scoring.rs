//! Heuristic scoring engine.
//!
//! Every score follows the same shape: a fixed base of 5.0, a handful of
//! independent bonuses gated on field thresholds, a bounded uniform jitter
//! term standing in for a predictive model, then rounding to one decimal and
//! clamping to [0, 10]. The deterministic part of each score is exposed as a
//! separate `*_base_score` function so tests can pin the arithmetic down and
//! bound the jitter.
//!
//! The random generator is always an explicit parameter; callers own the
//! randomness source, tests inject a seeded one.

use rand::Rng;

use crate::models::{Lead, Neighborhood};

/// Field values the lead score depends on.
#[derive(Debug, Clone, Default)]
pub struct LeadScoreInput<'a> {
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub phone: Option<&'a str>,
    pub source: Option<&'a str>,
    pub lead_type: &'a str,
}

impl<'a> From<&'a Lead> for LeadScoreInput<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            budget_min: lead.budget_min,
            budget_max: lead.budget_max,
            phone: lead.phone.as_deref(),
            source: lead.source.as_deref(),
            lead_type: &lead.lead_type,
        }
    }
}

/// Field values the neighborhood scores depend on.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodScoreInput {
    pub average_sale_time: Option<i64>,
    pub average_price_m2: Option<f64>,
    pub population: Option<i64>,
    pub average_income: Option<f64>,
    pub average_age: Option<f64>,
}

impl From<&Neighborhood> for NeighborhoodScoreInput {
    fn from(quartier: &Neighborhood) -> Self {
        Self {
            average_sale_time: quartier.average_sale_time,
            average_price_m2: quartier.average_price_m2,
            population: quartier.population,
            average_income: quartier.average_income,
            average_age: quartier.average_age,
        }
    }
}

/// Rounds to one decimal then clamps to the [0, 10] score range.
fn finalize(score: f64) -> f64 {
    ((score * 10.0).round() / 10.0).clamp(0.0, 10.0)
}

/// Deterministic component of the lead heat score.
///
/// Missing optional fields skip their bonus; they never error.
pub fn lead_base_score(input: &LeadScoreInput<'_>) -> f64 {
    let mut score = 5.0;

    if matches!(input.budget_min, Some(min) if min > 200_000.0) {
        score += 1.5;
    }
    if matches!(input.budget_max, Some(max) if max > 400_000.0) {
        score += 1.0;
    }
    if input.phone.is_some() {
        score += 0.5;
    }
    if matches!(input.source, Some("website") | Some("referral")) {
        score += 1.0;
    }
    if input.lead_type == "buyer" {
        score += 0.5;
    }

    score
}

/// Lead heat score: deterministic base plus U(-0.5, 1.5) jitter.
pub fn lead_score(input: &LeadScoreInput<'_>, rng: &mut impl Rng) -> f64 {
    finalize(lead_base_score(input) + rng.gen_range(-0.5..1.5))
}

/// Deterministic component of the rotation rate score.
pub fn rotation_base_score(input: &NeighborhoodScoreInput) -> f64 {
    let mut score = 5.0;

    if matches!(input.average_sale_time, Some(days) if days < 60) {
        score += 2.0;
    }
    if matches!(input.average_price_m2, Some(price) if price < 3000.0) {
        score += 1.5;
    }
    if matches!(input.population, Some(pop) if pop > 10_000) {
        score += 1.0;
    }

    score
}

/// Rotation rate score: deterministic base plus U(-1, 2) jitter.
pub fn rotation_rate_score(input: &NeighborhoodScoreInput, rng: &mut impl Rng) -> f64 {
    finalize(rotation_base_score(input) + rng.gen_range(-1.0..2.0))
}

/// Deterministic component of the farming potential score.
///
/// Reads the freshly recomputed rotation score, so callers must compute
/// rotation first.
pub fn potential_base_score(input: &NeighborhoodScoreInput, rotation_rate_score: f64) -> f64 {
    let mut score = 5.0;

    if rotation_rate_score != 0.0 {
        score += rotation_rate_score * 0.3;
    }
    if matches!(input.average_income, Some(income) if income > 35_000.0) {
        score += 1.5;
    }
    if matches!(input.average_age, Some(age) if (30.0..=45.0).contains(&age)) {
        score += 1.0;
    }

    score
}

/// Farming potential score: deterministic base plus U(-0.5, 1.5) jitter.
pub fn potential_score(
    input: &NeighborhoodScoreInput,
    rotation_rate_score: f64,
    rng: &mut impl Rng,
) -> f64 {
    finalize(potential_base_score(input, rotation_rate_score) + rng.gen_range(-0.5..1.5))
}

/// Deterministic component of the demand indicator.
pub fn demand_base_score(input: &NeighborhoodScoreInput) -> f64 {
    let mut score = 5.0;

    if let Some(price) = input.average_price_m2 {
        if price < 2500.0 {
            score += 2.0;
        } else if price < 4000.0 {
            score += 1.0;
        }
    }

    score
}

/// Demand indicator: deterministic base plus U(-1, 2) jitter.
pub fn demand_indicator(input: &NeighborhoodScoreInput, rng: &mut impl Rng) -> f64 {
    finalize(demand_base_score(input) + rng.gen_range(-1.0..2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn has_one_decimal(value: f64) -> bool {
        (value * 10.0 - (value * 10.0).round()).abs() < 1e-9
    }

    #[test]
    fn lead_base_score_all_bonuses() {
        let input = LeadScoreInput {
            budget_min: Some(250_000.0),
            budget_max: Some(450_000.0),
            phone: Some("0600000000"),
            source: Some("website"),
            lead_type: "buyer",
        };
        assert_eq!(lead_base_score(&input), 9.5);
    }

    #[test]
    fn lead_base_score_all_null_optionals() {
        let input = LeadScoreInput {
            lead_type: "seller",
            ..Default::default()
        };
        assert_eq!(lead_base_score(&input), 5.0);
    }

    #[test]
    fn lead_base_score_thresholds_are_strict() {
        let input = LeadScoreInput {
            budget_min: Some(200_000.0),
            budget_max: Some(400_000.0),
            lead_type: "buyer",
            ..Default::default()
        };
        // Exactly at the thresholds: no budget bonus.
        assert_eq!(lead_base_score(&input), 5.5);
    }

    #[test]
    fn lead_score_stays_within_jitter_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let input = LeadScoreInput {
            budget_min: Some(250_000.0),
            budget_max: Some(450_000.0),
            phone: Some("0600000000"),
            source: Some("website"),
            lead_type: "buyer",
        };
        for _ in 0..1000 {
            let score = lead_score(&input, &mut rng);
            // Base 9.5, jitter in [-0.5, 1.5), clamped to 10.
            assert!((9.0..=10.0).contains(&score), "score out of window: {score}");
            assert!(has_one_decimal(score));
        }
    }

    #[test]
    fn lead_score_deterministic_under_fixed_seed() {
        let input = LeadScoreInput {
            budget_min: Some(100_000.0),
            lead_type: "buyer",
            ..Default::default()
        };
        let a = lead_score(&input, &mut StdRng::seed_from_u64(42));
        let b = lead_score(&input, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn rotation_base_score_bonuses() {
        let input = NeighborhoodScoreInput {
            average_sale_time: Some(45),
            average_price_m2: Some(2800.0),
            population: Some(15_000),
            ..Default::default()
        };
        assert_eq!(rotation_base_score(&input), 9.5);

        let empty = NeighborhoodScoreInput::default();
        assert_eq!(rotation_base_score(&empty), 5.0);
    }

    #[test]
    fn potential_base_score_reads_rotation() {
        let input = NeighborhoodScoreInput {
            average_income: Some(40_000.0),
            average_age: Some(35.0),
            ..Default::default()
        };
        // 5.0 + 8.0 * 0.3 + 1.5 + 1.0
        assert!((potential_base_score(&input, 8.0) - 9.9).abs() < 1e-9);
        // Zero rotation contributes nothing.
        assert!((potential_base_score(&input, 0.0) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn demand_base_score_price_bands() {
        let cheap = NeighborhoodScoreInput {
            average_price_m2: Some(2000.0),
            ..Default::default()
        };
        let mid = NeighborhoodScoreInput {
            average_price_m2: Some(3500.0),
            ..Default::default()
        };
        let expensive = NeighborhoodScoreInput {
            average_price_m2: Some(5000.0),
            ..Default::default()
        };
        assert_eq!(demand_base_score(&cheap), 7.0);
        assert_eq!(demand_base_score(&mid), 6.0);
        assert_eq!(demand_base_score(&expensive), 5.0);
        assert_eq!(demand_base_score(&NeighborhoodScoreInput::default()), 5.0);
    }

    #[test]
    fn all_scores_in_range_for_null_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let lead = LeadScoreInput {
            lead_type: "seller",
            ..Default::default()
        };
        let quartier = NeighborhoodScoreInput::default();
        for _ in 0..500 {
            for score in [
                lead_score(&lead, &mut rng),
                rotation_rate_score(&quartier, &mut rng),
                potential_score(&quartier, 0.0, &mut rng),
                demand_indicator(&quartier, &mut rng),
            ] {
                assert!((0.0..=10.0).contains(&score));
                assert!(has_one_decimal(score));
            }
        }
    }
}
