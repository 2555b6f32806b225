use super::*;

/// Wraps a single-container result in the caller-facing shape.
pub(super) fn from_single(result: SingleResult) -> CartonizationResult {
    CartonizationResult {
        primary_container: result.recommended_container.clone(),
        utilization: result.utilization,
        confidence: result.confidence,
        total_weight: result.total_weight,
        total_volume: result.total_volume,
        dimensional_weight: result.dimensional_weight,
        billable_weight: result.billable_weight,
        package_count: 1,
        detail: Recommendation::Single(result),
    }
}

/// Wraps a multi-package plan. The first package supplies the primary
/// container; utilization and weights are aggregated over all packages.
pub(super) fn from_multi(result: MultiPackageResult) -> Option<CartonizationResult> {
    let primary_container = result.packages.first()?.container.clone();
    let container_volume: f64 = result.packages.iter().map(|p| p.container.volume()).sum();
    let dimensional_weight: f64 = result.packages.iter().map(|p| p.dimensional_weight).sum();

    Some(CartonizationResult {
        primary_container,
        utilization: metrics::utilization(result.total_volume, container_volume),
        confidence: result.confidence,
        total_weight: result.total_weight,
        total_volume: result.total_volume,
        dimensional_weight,
        billable_weight: result.total_billable_weight,
        package_count: result.total_packages,
        detail: Recommendation::Multi(result),
    })
}
