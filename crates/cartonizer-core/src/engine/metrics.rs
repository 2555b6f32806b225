use super::*;

/// Fill and billing figures for one container holding one item set.
///
/// Computed the same way for single recommendations and for each package of a
/// split, so package-level shipping impact stays comparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Measurements {
    pub utilization: f64,
    pub dimensional_weight: f64,
    pub billable_weight: f64,
}

pub(super) fn utilization(item_volume: f64, container_volume: f64) -> f64 {
    if container_volume <= 0.0 {
        return 0.0;
    }
    item_volume / container_volume * 100.0
}

/// Depends only on the container, never on what is inside it.
pub(super) fn dimensional_weight(container_volume: f64, factor: f64) -> f64 {
    container_volume / factor
}

pub(super) fn billable_weight(actual_weight: f64, dimensional_weight: f64) -> f64 {
    actual_weight.max(dimensional_weight)
}

pub(super) fn measure(
    container: &Container,
    item_volume: f64,
    item_weight: f64,
    params: &Parameters,
) -> Measurements {
    let container_volume = container.volume();
    let dimensional_weight = dimensional_weight(container_volume, params.dimensional_weight_factor);

    Measurements {
        utilization: utilization(item_volume, container_volume),
        dimensional_weight,
        billable_weight: billable_weight(item_weight, dimensional_weight),
    }
}
