use crate::types::*;
use tracing::debug;

mod assemble;
mod confidence;
mod metrics;
mod normalize;
mod select;
mod split;
#[cfg(test)]
mod tests;

use normalize::NormalizedItem;

/// Recommends shipping containers for one item set against one catalog snapshot.
pub struct Cartonizer {
    request: CartonizationRequest,
    normalized: Vec<NormalizedItem>,
}

impl Cartonizer {
    /// Validates the request and builds a new cartonizer instance.
    ///
    /// Bad input data fails here, before any selection logic runs.
    pub fn new(request: CartonizationRequest) -> Result<Self> {
        if request.items.is_empty() {
            return Err(CartonizerError::NoItems);
        }

        let normalized = normalize::normalize(&request.items)?;

        if request.containers.is_empty() {
            return Err(CartonizerError::EmptyCatalog);
        }

        for container in &request.containers {
            validate_container(container)?;
        }

        validate_parameters(&request.parameters)?;

        Ok(Self {
            request,
            normalized,
        })
    }

    /// Runs the full flow: single container first, splitting when no single
    /// container is confident enough. `None` means manual packing is needed.
    pub fn recommend(&self) -> Option<CartonizationResult> {
        if let Some(single) = self.select_single(true) {
            debug!(
                container = %single.recommended_container.id,
                confidence = single.confidence,
                "single container recommended"
            );
            return Some(assemble::from_single(single));
        }

        let fallback = self.select_single(false);
        let multi = self.split(self.request.parameters.splitting_strategy);

        match (fallback, multi) {
            (Some(single), Some(multi)) if multi.confidence > single.confidence => {
                assemble::from_multi(multi)
            }
            (Some(single), _) => Some(assemble::from_single(single)),
            (None, Some(multi)) => assemble::from_multi(multi),
            (None, None) => {
                debug!("no container or grouping found");
                None
            }
        }
    }

    /// Picks the smallest adequate container for the whole item set.
    ///
    /// With `allow_multi_package_fallback`, a best candidate below the
    /// escalation threshold is reported as `None`.
    pub fn select_single(&self, allow_multi_package_fallback: bool) -> Option<SingleResult> {
        select::select(
            &self.normalized,
            &self.request.containers,
            &self.request.parameters,
            allow_multi_package_fallback,
        )
    }

    /// Partitions the items across several containers. `None` tries every
    /// strategy and lets the optimization objective choose.
    pub fn split(&self, strategy: Option<SplittingStrategy>) -> Option<MultiPackageResult> {
        split::split(
            &self.request.items,
            &self.normalized,
            &self.request.containers,
            &self.request.parameters,
            strategy,
        )
    }
}

fn validate_container(container: &Container) -> Result<()> {
    let invalid = |reason: String| CartonizerError::InvalidContainer {
        id: container.id.clone(),
        reason,
    };

    for (name, value) in [
        ("length", container.length),
        ("width", container.width),
        ("height", container.height),
        ("max_weight", container.max_weight),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(format!("{name} must be positive, got {value}")));
        }
    }

    if !container.cost.is_finite() || container.cost < 0.0 {
        return Err(invalid(format!(
            "cost must not be negative, got {}",
            container.cost
        )));
    }

    Ok(())
}

fn validate_parameters(params: &Parameters) -> Result<()> {
    let positive = [
        ("dimensional_weight_factor", params.dimensional_weight_factor),
        ("max_package_weight", params.max_package_weight),
        ("packing_efficiency", params.packing_efficiency),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(CartonizerError::InvalidParameters(format!(
                "{name} must be positive, got {value}"
            )));
        }
    }

    if params.packing_efficiency > 100.0 {
        return Err(CartonizerError::InvalidParameters(format!(
            "packing_efficiency must not exceed 100, got {}",
            params.packing_efficiency
        )));
    }

    let buckets = &params.confidence_buckets;
    let percentages = [
        ("fill_rate_threshold", params.fill_rate_threshold),
        ("escalation_threshold", params.escalation_threshold),
        ("confidence_buckets.high", buckets.high),
        ("confidence_buckets.medium", buckets.medium),
        ("confidence_buckets.low", buckets.low),
    ];
    for (name, value) in percentages {
        // NaN fails the range check too.
        if !(0.0..=100.0).contains(&value) {
            return Err(CartonizerError::InvalidParameters(format!(
                "{name} must be within 0..=100, got {value}"
            )));
        }
    }

    Ok(())
}
