//! Weighted feature sampling.

use cohort_types::InitError;
use rand::Rng;

/// One demographic category: feature names with relative weights.
///
/// Weights are normalized into a cumulative distribution at construction;
/// sampling is an inverse-CDF lookup of a uniform draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCategory {
    names: Vec<String>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
}

impl FeatureCategory {
    /// Build a category from `(name, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::InvalidSpec`] if the category is empty, a weight
    /// is negative or not finite, or no weight is positive.
    pub fn new(entries: Vec<(String, f64)>) -> Result<Self, InitError> {
        if entries.is_empty() {
            return Err(InitError::InvalidSpec("feature category is empty".into()));
        }
        if let Some((name, weight)) = entries
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(InitError::InvalidSpec(format!(
                "feature {name} has invalid weight {weight}"
            )));
        }
        let largest = entries
            .iter()
            .map(|(_, weight)| *weight)
            .fold(0.0, f64::max);
        if largest <= 0.0 {
            return Err(InitError::InvalidSpec("feature category has no positive weight".into()));
        }

        // Scale by the largest weight first so the sum stays finite.
        let total: f64 = entries.iter().map(|(_, weight)| weight / largest).sum();
        let mut running = 0.0;
        let mut cumulative = Vec::with_capacity(entries.len());
        for (_, weight) in &entries {
            running += weight / largest / total;
            cumulative.push(running);
        }
        let (names, weights) = entries.into_iter().unzip();
        Ok(Self {
            names,
            weights,
            cumulative,
        })
    }

    /// Feature names in the order given.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Normalized probability of the feature at `index`.
    pub fn probability(&self, index: usize) -> Option<f64> {
        let previous = if index == 0 {
            0.0
        } else {
            *self.cumulative.get(index - 1)?
        };
        Some(self.cumulative.get(index)? - previous)
    }

    /// Draw one feature name.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let draw: f64 = rng.gen_range(0.0..1.0);
        let index = self.cumulative.partition_point(|&c| c <= draw);
        // Rounding can leave the last cumulative value just under 1.0.
        let index = if index < self.names.len() {
            index
        } else {
            self.last_positive()
        };
        &self.names[index]
    }

    fn last_positive(&self) -> usize {
        self.weights
            .iter()
            .rposition(|&w| w > 0.0)
            .unwrap_or(self.names.len() - 1)
    }
}

/// Sample one feature from each category, in category order.
pub fn sample_features<R: Rng + ?Sized>(
    categories: &[FeatureCategory],
    rng: &mut R,
) -> Vec<String> {
    categories
        .iter()
        .map(|category| category.sample(rng).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn category(entries: &[(&str, f64)]) -> Result<FeatureCategory, InitError> {
        FeatureCategory::new(
            entries
                .iter()
                .map(|(name, weight)| (name.to_string(), *weight))
                .collect(),
        )
    }

    #[test]
    fn weights_are_normalized() {
        let parties = category(&[("A", 25.0), ("B", 45.0), ("C", 30.0)]).unwrap();
        assert!((parties.probability(0).unwrap() - 0.25).abs() < 1e-12);
        assert!((parties.probability(1).unwrap() - 0.45).abs() < 1e-12);
        assert!((parties.probability(2).unwrap() - 0.30).abs() < 1e-12);
        assert_eq!(parties.probability(3), None);
    }

    #[test]
    fn invalid_categories_are_rejected() {
        assert!(category(&[]).is_err());
        assert!(category(&[("A", 0.0), ("B", 0.0)]).is_err());
        assert!(category(&[("A", -1.0), ("B", 2.0)]).is_err());
        assert!(category(&[("A", f64::NAN)]).is_err());
        assert!(category(&[("A", f64::INFINITY)]).is_err());
    }

    #[test]
    fn huge_finite_weights_keep_their_proportions() {
        let cat = category(&[("A", 1e308), ("B", 1e308)]).unwrap();
        assert!((cat.probability(0).unwrap() - 0.5).abs() < 1e-12);
        assert!((cat.probability(1).unwrap() - 0.5).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(42);
        let drawn_a = (0..1_000).filter(|_| cat.sample(&mut rng) == "A").count();
        assert!((400..=600).contains(&drawn_a), "A drawn {drawn_a}/1000");
    }

    #[test]
    fn frequencies_converge_to_weights() {
        let parties = category(&[("A", 25.0), ("B", 45.0), ("C", 30.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..draws {
            match parties.sample(&mut rng) {
                "A" => counts[0] += 1,
                "B" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        for (count, expected) in counts.iter().zip([0.25, 0.45, 0.30]) {
            let observed = *count as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "observed {observed}, expected {expected}"
            );
        }
    }

    #[test]
    fn zero_weight_features_are_never_drawn() {
        let cat = category(&[("never", 0.0), ("always", 1.0), ("also_never", 0.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert_eq!(cat.sample(&mut rng), "always");
        }
    }

    #[test]
    fn same_seed_same_features() {
        let categories = vec![
            category(&[
                ("Republican", 25.0),
                ("Democrat", 45.0),
                ("Independent", 30.0),
            ])
            .unwrap(),
            category(&[("Urban", 1.0), ("Rural", 1.0)]).unwrap(),
        ];
        let first: Vec<Vec<String>> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| sample_features(&categories, &mut rng)).collect()
        };
        let second: Vec<Vec<String>> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| sample_features(&categories, &mut rng)).collect()
        };
        assert_eq!(first, second);
        assert!(first.iter().all(|features| features.len() == 2));
    }
}
