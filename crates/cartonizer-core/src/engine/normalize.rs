use super::*;

/// One input item reduced to canonical extents. `quantity` is kept so packages
/// can be attributed back to the original record.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct NormalizedItem {
    /// Position of the source record in the request's item list
    pub index: usize,
    /// Extents sorted descending
    pub extents: [f64; 3],
    pub unit_volume: f64,
    pub unit_weight: f64,
    pub quantity: u32,
}

impl NormalizedItem {
    pub fn volume(&self) -> f64 {
        self.unit_volume * f64::from(self.quantity)
    }

    pub fn weight(&self) -> f64 {
        self.unit_weight * f64::from(self.quantity)
    }

    /// Same record with a different unit count.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }
}

/// Sums the quantity-scaled volume and weight of a set of items.
pub(super) fn totals(items: &[NormalizedItem]) -> (f64, f64) {
    items.iter().fold((0.0, 0.0), |(volume, weight), item| {
        (volume + item.volume(), weight + item.weight())
    })
}

/// Sorts three extents descending so they can be compared axis by axis.
pub(super) fn sorted_extents(length: f64, width: f64, height: f64) -> [f64; 3] {
    let mut extents = [length, width, height];
    extents.sort_by(|a, b| b.total_cmp(a));
    extents
}

/// Validates every item and converts it into canonical form.
pub(super) fn normalize(items: &[Item]) -> Result<Vec<NormalizedItem>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            validate_item(item)?;
            Ok(NormalizedItem {
                index,
                extents: sorted_extents(item.length, item.width, item.height),
                unit_volume: item.volume(),
                unit_weight: item.weight,
                quantity: item.quantity,
            })
        })
        .collect()
}

fn validate_item(item: &Item) -> Result<()> {
    let invalid = |reason: String| CartonizerError::InvalidItem {
        id: item.id.clone(),
        reason,
    };

    for (name, value) in [
        ("length", item.length),
        ("width", item.width),
        ("height", item.height),
        ("weight", item.weight),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(format!("{name} must be positive, got {value}")));
        }
    }

    if item.quantity == 0 {
        return Err(invalid("quantity must be at least 1".to_string()));
    }

    Ok(())
}
