//! Budget allocation across policy categories
//!
//! Needs scale the default fractions up, the result is normalized, and then
//! projected into the `[min_fraction, max_fraction]` band by repeatedly
//! pinning the worst offenders to the band edge and spreading the remainder
//! over the categories that are still free.

use crate::core::config::PolicyConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{CategoryTable, PolicyCategory};

const SUM_TOLERANCE: f64 = 1e-9;
const CATEGORIES: usize = PolicyCategory::ALL.len();

fn to_array(table: &CategoryTable<f64>) -> [f64; CATEGORIES] {
    PolicyCategory::ALL.map(|c| *table.get(c))
}

fn from_array(values: [f64; CATEGORIES]) -> CategoryTable<f64> {
    CategoryTable::new(values[0], values[1], values[2], values[3], values[4])
}

/// Fractions for this cycle: default fraction * (1 + need), normalized and banded
pub fn allocate(needs: &CategoryTable<f64>, config: &PolicyConfig) -> Result<CategoryTable<f64>> {
    let mut weights = [0.0; CATEGORIES];
    for (i, category) in PolicyCategory::ALL.into_iter().enumerate() {
        let need = *needs.get(category);
        let weight = config.default_fractions.get(category) * (1.0 + need);
        if !weight.is_finite() || weight < 0.0 {
            return Err(SimError::Allocation(format!(
                "weight for {:?} is {} (need {})",
                category, weight, need
            )));
        }
        weights[i] = weight;
    }

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(SimError::Allocation("all category weights are zero".into()));
    }
    for w in &mut weights {
        *w /= total;
    }

    project_to_band(weights, config.min_fraction, config.max_fraction).map(from_array)
}

/// Renormalized default fractions, banded where possible
pub fn fallback_fractions(config: &PolicyConfig) -> CategoryTable<f64> {
    let mut defaults = to_array(&config.default_fractions);
    let total: f64 = defaults.iter().sum();
    if total > 0.0 {
        for d in &mut defaults {
            *d /= total;
        }
    } else {
        defaults = [1.0 / CATEGORIES as f64; CATEGORIES];
    }
    from_array(project_to_band(defaults, config.min_fraction, config.max_fraction).unwrap_or(defaults))
}

/// Clamp-and-redistribute projection of fractions summing to 1 onto a band.
///
/// Each round rescales the free entries to fill what the pinned ones leave,
/// then pins whichever side of the band is violated by more in total.
pub fn project_to_band(weights: [f64; CATEGORIES], min: f64, max: f64) -> Result<[f64; CATEGORIES]> {
    let mut values = weights;
    let mut pinned = [false; CATEGORIES];

    for _ in 0..=CATEGORIES {
        let pinned_sum: f64 = (0..CATEGORIES).filter(|&i| pinned[i]).map(|i| values[i]).sum();
        let free: Vec<usize> = (0..CATEGORIES).filter(|&i| !pinned[i]).collect();
        if free.is_empty() {
            break;
        }

        let remaining = 1.0 - pinned_sum;
        let free_sum: f64 = free.iter().map(|&i| values[i]).sum();
        for &i in &free {
            values[i] = if free_sum > 0.0 {
                values[i] * remaining / free_sum
            } else {
                remaining / free.len() as f64
            };
        }

        let below: f64 = free.iter().filter(|&&i| values[i] < min).map(|&i| min - values[i]).sum();
        let above: f64 = free.iter().filter(|&&i| values[i] > max).map(|&i| values[i] - max).sum();
        if below <= 0.0 && above <= 0.0 {
            break;
        }
        for &i in &free {
            if below >= above && values[i] < min {
                values[i] = min;
                pinned[i] = true;
            } else if below < above && values[i] > max {
                values[i] = max;
                pinned[i] = true;
            }
        }
    }

    let sum: f64 = values.iter().sum();
    if !sum.is_finite() || (sum - 1.0).abs() > SUM_TOLERANCE {
        return Err(SimError::Allocation(format!("fractions sum to {} after projection", sum)));
    }
    if values.iter().any(|v| *v < min - SUM_TOLERANCE || *v > max + SUM_TOLERANCE) {
        return Err(SimError::Allocation(format!(
            "fractions {:?} cannot be held in [{}, {}]",
            values, min, max
        )));
    }
    Ok(values)
}
