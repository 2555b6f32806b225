use super::*;

pub(super) const MAX_CONFIDENCE: f64 = 100.0;

const BASE_HIGH: f64 = 95.0;
const BASE_MEDIUM: f64 = 80.0;
const BASE_LOW: f64 = 65.0;
const BASE_FLOOR: f64 = 50.0;

/// Upper bound of the bonus granted for undercutting the naive container.
const MAX_COST_SAVING_BONUS: f64 = 5.0;

/// Hard filter: below the fill threshold a container is not a candidate at all
/// unless partial fill is allowed.
pub(super) fn meets_fill_rate(utilization: f64, params: &Parameters) -> bool {
    params.allow_partial_fill || utilization >= params.fill_rate_threshold
}

/// Bucketed base confidence. The high boundary is raised to the fill threshold
/// when that is stricter.
pub(super) fn base_confidence(utilization: f64, params: &Parameters) -> f64 {
    let buckets = &params.confidence_buckets;
    let high = buckets.high.max(params.fill_rate_threshold);

    if utilization > high {
        BASE_HIGH
    } else if utilization >= buckets.medium {
        BASE_MEDIUM
    } else if utilization >= buckets.low {
        BASE_LOW
    } else {
        BASE_FLOOR
    }
}

/// Bonus proportional to the relative saving versus the naive (largest
/// feasible) container.
pub(super) fn cost_saving_bonus(chosen_cost: f64, naive_cost: f64) -> f64 {
    if naive_cost <= 0.0 || chosen_cost >= naive_cost {
        return 0.0;
    }
    let saving = (naive_cost - chosen_cost) / naive_cost;
    (saving * 10.0).min(MAX_COST_SAVING_BONUS)
}

pub(super) fn score(
    utilization: f64,
    chosen_cost: f64,
    naive_cost: f64,
    params: &Parameters,
) -> f64 {
    let confidence =
        base_confidence(utilization, params) + cost_saving_bonus(chosen_cost, naive_cost);
    confidence.clamp(0.0, MAX_CONFIDENCE)
}
