use rand::RngExt;

use crate::models::MultiUrl;

/// Weighted random choice among multi-url candidates.
///
/// Every call draws again; nothing about a previous scan influences the next one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiUrlSelector;

impl MultiUrlSelector {
    pub fn select<'a>(&self, candidates: &'a [MultiUrl]) -> Option<&'a str> {
        self.select_with(candidates, &mut rand::rng())
    }

    pub fn select_with<'a, R>(&self, candidates: &'a [MultiUrl], rng: &mut R) -> Option<&'a str>
    where
        R: RngExt + ?Sized,
    {
        let last = candidates.last()?;

        let mut weights: Vec<f64> = candidates.iter().map(MultiUrl::effective_weight).collect();
        let mut total: f64 = weights.iter().sum();
        if !total.is_finite() {
            // Large finite weights can overflow the sum; rescaling keeps their ratios
            let max = weights.iter().copied().fold(1.0, f64::max);
            weights.iter_mut().for_each(|w| *w /= max);
            total = weights.iter().sum();
        }

        let mut remaining = rng.random_range(0.0..total);
        for (candidate, weight) in candidates.iter().zip(&weights) {
            remaining -= weight;
            if remaining <= 0.0 {
                return Some(candidate.url.as_str());
            }
        }

        // Float rounding can leave a sliver above zero after the last subtraction
        Some(last.url.as_str())
    }
}
