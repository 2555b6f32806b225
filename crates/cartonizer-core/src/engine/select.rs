use super::normalize::{sorted_extents, totals, NormalizedItem};
use super::*;
use tracing::{debug, trace};

/// Absorbs float noise in the capacity comparisons.
pub(super) const EPSILON: f64 = 1e-9;

/// Maximum number of runner-up containers reported.
pub(super) const MAX_ALTERNATIVES: usize = 3;

/// Returns the usable catalog ordered smallest first, ties broken by cost and id.
pub(super) fn candidate_order<'a>(
    containers: &'a [Container],
    params: &Parameters,
) -> Vec<&'a Container> {
    let mut candidates: Vec<&Container> = containers
        .iter()
        .filter(|c| !params.require_in_stock || c.in_stock > 0)
        .collect();
    candidates.sort_by(|a, b| {
        a.volume()
            .total_cmp(&b.volume())
            .then_with(|| a.cost.total_cmp(&b.cost))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

/// Axis-sorted bounding comparison. Accepts the container when every item,
/// taken alone, fits inside it. Does not prove that all items fit at once.
pub(super) fn fits_axes(items: &[NormalizedItem], container: &Container) -> bool {
    let bounds = sorted_extents(container.length, container.width, container.height);
    items.iter().all(|item| {
        item.extents
            .iter()
            .zip(bounds.iter())
            .all(|(extent, bound)| *extent <= bound + EPSILON)
    })
}

/// Runs every check against one container and returns its utilization if it
/// is a valid candidate.
fn evaluate(
    items: &[NormalizedItem],
    item_volume: f64,
    item_weight: f64,
    container: &Container,
    params: &Parameters,
) -> Option<f64> {
    if item_weight > container.max_weight + EPSILON {
        trace!(container = %container.id, "rejected: over weight limit");
        return None;
    }

    let usable_volume = container.volume() * params.packing_efficiency / 100.0;
    if item_volume > usable_volume + EPSILON {
        trace!(container = %container.id, "rejected: over usable volume");
        return None;
    }

    if !fits_axes(items, container) {
        trace!(container = %container.id, "rejected: an item exceeds the container extents");
        return None;
    }

    let utilization = metrics::utilization(item_volume, container.volume());
    if !confidence::meets_fill_rate(utilization, params) {
        trace!(container = %container.id, utilization, "rejected: below fill rate threshold");
        return None;
    }

    Some(utilization)
}

/// Picks the smallest adequate container for the items.
///
/// With `allow_multi_package_fallback` set, a best candidate whose confidence
/// falls below the escalation threshold is reported as `None` so the caller
/// can try splitting instead.
pub(super) fn select(
    items: &[NormalizedItem],
    containers: &[Container],
    params: &Parameters,
    allow_multi_package_fallback: bool,
) -> Option<SingleResult> {
    let (total_volume, total_weight) = totals(items);

    let feasible: Vec<(&Container, f64)> = candidate_order(containers, params)
        .into_iter()
        .filter_map(|container| {
            evaluate(items, total_volume, total_weight, container, params)
                .map(|utilization| (container, utilization))
        })
        .collect();

    let (&(recommended, utilization), runners_up) = feasible.split_first()?;
    // Largest feasible container: what a packer would grab without thinking.
    let naive_cost = feasible.last().map_or(recommended.cost, |(c, _)| c.cost);

    let confidence = confidence::score(utilization, recommended.cost, naive_cost, params);
    if allow_multi_package_fallback && confidence < params.escalation_threshold {
        debug!(
            container = %recommended.id,
            confidence,
            "best single container below escalation threshold"
        );
        return None;
    }

    let mut alternatives: Vec<Alternative> = runners_up
        .iter()
        .map(|&(container, utilization)| Alternative {
            container: container.clone(),
            utilization,
            cost: container.cost,
            confidence: confidence::score(utilization, container.cost, naive_cost, params),
        })
        .collect();
    rank_alternatives(&mut alternatives, params);
    alternatives.truncate(MAX_ALTERNATIVES);

    let measurements = metrics::measure(recommended, total_volume, total_weight, params);

    Some(SingleResult {
        recommended_container: recommended.clone(),
        utilization: measurements.utilization,
        total_weight,
        total_volume,
        dimensional_weight: measurements.dimensional_weight,
        billable_weight: measurements.billable_weight,
        confidence,
        alternatives,
    })
}

/// Re-orders alternatives by cost and/or utilization when either optimization
/// flag is set. Otherwise the volume order is kept.
fn rank_alternatives(alternatives: &mut [Alternative], params: &Parameters) {
    let cost_weight = if params.optimize_for_cost { 1.0 } else { 0.0 };
    let space_weight = if params.optimize_for_space { 1.0 } else { 0.0 };
    if cost_weight == 0.0 && space_weight == 0.0 {
        return;
    }

    let max_cost = alternatives.iter().map(|a| a.cost).fold(0.0, f64::max);
    let score = |alt: &Alternative| {
        let cost = if max_cost > 0.0 { alt.cost / max_cost } else { 0.0 };
        let waste = (1.0 - alt.utilization / 100.0).clamp(0.0, 1.0);
        weighted_score(&[(cost, cost_weight), (waste, space_weight)])
    };

    // Stable sort keeps the volume order among equal scores.
    alternatives.sort_by(|a, b| score(a).total_cmp(&score(b)));
}

/// Weighted mean of `(value, weight)` terms. Lower is better by convention.
pub(super) fn weighted_score(terms: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = terms.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    terms.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight
}
