//! Relevance Scorer (C6): pure, deterministic, side-effect-free.
//!
//! `relevance = clamp(base + keyword_score + type_boost − age_penalty, 0, 1)`

pub const BASE_RELEVANCE: f64 = 0.3;

/// `min(0.02 * floor(age_days / 7), 0.3)` — a gentle weekly decay.
pub fn age_penalty(age_days: f64) -> f64 {
    (0.02 * (age_days / 7.0).floor()).min(0.3)
}

/// Combine the base score, keyword overlap, and a per-source type boost
/// into the final clamped relevance.
pub fn relevance(keyword_score: f64, type_boost: f64, age_days: f64) -> f64 {
    (BASE_RELEVANCE + keyword_score + type_boost - age_penalty(age_days)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_decision_scenario_matches_worked_example() {
        // base 0.3 + type boost 0.3, no keyword overlap, 2 days old.
        let r = relevance(0.0, 0.3, 2.0);
        assert!(r >= 0.6);
    }

    #[test]
    fn age_penalty_caps_at_point_three() {
        assert_eq!(age_penalty(7.0 * 200.0), 0.3);
    }

    #[test]
    fn age_penalty_is_zero_within_first_week() {
        assert_eq!(age_penalty(6.9), 0.0);
    }

    #[test]
    fn relevance_never_leaves_unit_interval() {
        assert_eq!(relevance(0.5, 0.5, 0.0), 1.0);
        assert_eq!(relevance(0.0, 0.0, 10_000.0), 0.0);
    }
}
