//! Cartonization engine: picks the shipping container (or set of containers)
//! for one shipment's items out of a catalog snapshot.
//!
//! The engine is a pure, synchronous computation. Each call owns its inputs,
//! so independent shipments can be evaluated concurrently without coordination.

mod engine;
mod types;

pub use engine::Cartonizer;
pub use types::*;

/// Validates the request and runs the full recommendation flow.
///
/// `Ok(None)` means no container or grouping could be found and the shipment
/// needs manual packing.
pub fn cartonize(request: CartonizationRequest) -> Result<Option<CartonizationResult>> {
    Ok(Cartonizer::new(request)?.recommend())
}
