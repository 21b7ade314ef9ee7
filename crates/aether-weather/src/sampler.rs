//! Weighted random selection of the next weather type.
//!
//! A draw first picks a [`WeatherCategory`] from the configured weights,
//! then a concrete [`WeatherType`] uniformly among the category's members
//! that are present in the catalog.
//!
//! | Category | Default weight | Members                          |
//! |----------|----------------|----------------------------------|
//! | Clear    | 0.40           | clear                            |
//! | Cloudy   | 0.25           | partly cloudy, cloudy, overcast  |
//! | Rain     | 0.20           | light rain, rain, heavy rain     |
//! | Storm    | 0.10           | thunderstorm                     |
//! | Fog      | 0.05           | foggy                            |
//! | Snow     | 0.00           | snow, blizzard                   |
//!
//! Whatever the weights leave below one falls to clear weather. When the
//! draw repeats the current non-clear type, it is redrawn up to
//! [`MAX_REDRAWS`] times, so streaks are rare but still possible. Clear may
//! repeat freely.

use aether_types::{WeatherCategory, WeatherType};
use rand::Rng;

use crate::catalog::WeatherCatalog;
use crate::config::WeatherWeights;

/// Maximum number of redraws when a draw repeats the current type.
pub const MAX_REDRAWS: u32 = 5;

/// Weighted weather sampler.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSampler {
    weights: WeatherWeights,
}

impl WeatherSampler {
    /// Create a sampler over validated weights.
    pub const fn new(weights: WeatherWeights) -> Self {
        Self { weights }
    }

    /// The weights this sampler draws from.
    pub const fn weights(&self) -> &WeatherWeights {
        &self.weights
    }

    /// Map a roll in `[0, 1)` onto a category by cumulative weight.
    ///
    /// Rolls past the sum of all weights select [`WeatherCategory::Clear`].
    pub fn select_category(&self, roll: f32) -> WeatherCategory {
        let mut cumulative: f32 = 0.0;
        for (category, weight) in self.weights.entries() {
            cumulative += weight;
            if roll < cumulative {
                return category;
            }
        }
        WeatherCategory::Clear
    }

    /// Draw a category.
    pub fn sample_category(&self, rng: &mut impl Rng) -> WeatherCategory {
        let roll: f32 = rng.random();
        self.select_category(roll)
    }

    /// Draw a concrete weather type present in `catalog`.
    ///
    /// Falls back to [`WeatherType::Clear`] when the drawn category has no
    /// member in the catalog.
    pub fn sample_type(&self, catalog: &WeatherCatalog, rng: &mut impl Rng) -> WeatherType {
        let category = self.sample_category(rng);
        let available: Vec<WeatherType> = category
            .members()
            .iter()
            .copied()
            .filter(|kind| catalog.contains(*kind))
            .collect();
        if available.is_empty() {
            return WeatherType::Clear;
        }
        let idx = rng.random_range(0..available.len());
        available.get(idx).copied().unwrap_or(WeatherType::Clear)
    }

    /// Draw the next weather type given the current one.
    ///
    /// A draw equal to a non-clear `current` is redrawn up to
    /// [`MAX_REDRAWS`] times.
    pub fn next_type(
        &self,
        current: WeatherType,
        catalog: &WeatherCatalog,
        rng: &mut impl Rng,
    ) -> WeatherType {
        let mut next = self.sample_type(catalog, rng);
        let mut redraws: u32 = 0;
        while next == current && next != WeatherType::Clear && redraws < MAX_REDRAWS {
            next = self.sample_type(catalog, rng);
            redraws = redraws.saturating_add(1);
        }
        next
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::WeatherConfig;

    #[test]
    fn select_category_walks_cumulative_weights() {
        let sampler = WeatherSampler::new(WeatherWeights::default());
        assert_eq!(sampler.select_category(0.0), WeatherCategory::Clear);
        assert_eq!(sampler.select_category(0.39), WeatherCategory::Clear);
        assert_eq!(sampler.select_category(0.41), WeatherCategory::Cloudy);
        assert_eq!(sampler.select_category(0.70), WeatherCategory::Rain);
        assert_eq!(sampler.select_category(0.90), WeatherCategory::Storm);
        assert_eq!(sampler.select_category(0.97), WeatherCategory::Fog);
    }

    #[test]
    fn remainder_falls_to_clear() {
        let weights = WeatherWeights {
            clear: 0.0,
            cloudy: 0.2,
            rain: 0.2,
            storm: 0.0,
            fog: 0.0,
            snow: 0.0,
        };
        let sampler = WeatherSampler::new(weights);
        assert_eq!(sampler.select_category(0.1), WeatherCategory::Cloudy);
        assert_eq!(sampler.select_category(0.3), WeatherCategory::Rain);
        assert_eq!(sampler.select_category(0.5), WeatherCategory::Clear);
        assert_eq!(sampler.select_category(0.999), WeatherCategory::Clear);
    }

    #[test]
    fn empirical_frequencies_match_weights() {
        let sampler = WeatherSampler::new(WeatherWeights::default());
        let mut rng = SmallRng::seed_from_u64(42);
        let draws: u32 = 10_000;
        let mut counts: BTreeMap<WeatherCategory, u32> = BTreeMap::new();
        for _ in 0..draws {
            *counts.entry(sampler.sample_category(&mut rng)).or_insert(0) += 1;
        }

        let expected = [
            (WeatherCategory::Clear, 0.4_f32),
            (WeatherCategory::Cloudy, 0.25),
            (WeatherCategory::Rain, 0.2),
            (WeatherCategory::Storm, 0.1),
            (WeatherCategory::Fog, 0.05),
        ];
        for (category, weight) in expected {
            let observed = counts.get(&category).copied().unwrap_or(0) as f32 / draws as f32;
            assert!(
                (observed - weight).abs() < 0.02,
                "{category:?}: observed {observed}, expected {weight}"
            );
        }
        assert_eq!(counts.get(&WeatherCategory::Snow), None);
    }

    #[test]
    fn sampled_types_stay_in_catalog() {
        let mut config = WeatherConfig::default();
        config.disabled = vec![WeatherType::Overcast, WeatherType::HeavyRain];
        let catalog = WeatherCatalog::from_config(&config);
        let sampler = WeatherSampler::new(config.weights);
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..2_000 {
            let kind = sampler.sample_type(&catalog, &mut rng);
            assert!(catalog.contains(kind), "{kind} not in catalog");
        }
    }

    #[test]
    fn empty_category_falls_back_to_clear() {
        let mut config = WeatherConfig::default();
        config.weights = WeatherWeights {
            clear: 0.0,
            cloudy: 0.0,
            rain: 0.0,
            storm: 1.0,
            fog: 0.0,
            snow: 0.0,
        };
        config.disabled = vec![WeatherType::Thunderstorm];
        let catalog = WeatherCatalog::from_config(&config);
        let sampler = WeatherSampler::new(config.weights);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(sampler.sample_type(&catalog, &mut rng), WeatherType::Clear);
    }

    #[test]
    fn repeats_of_non_clear_weather_are_rare() {
        let sampler = WeatherSampler::new(WeatherWeights::default());
        let catalog = WeatherCatalog::builtin();
        let mut rng = SmallRng::seed_from_u64(99);

        let mut repeats: u32 = 0;
        for _ in 0..1_000 {
            if sampler.next_type(WeatherType::Foggy, &catalog, &mut rng) == WeatherType::Foggy {
                repeats += 1;
            }
        }
        // Fog is 5% per draw; six consecutive fog draws are vanishingly rare.
        assert_eq!(repeats, 0);
    }

    #[test]
    fn clear_is_allowed_to_repeat() {
        let weights = WeatherWeights {
            clear: 1.0,
            cloudy: 0.0,
            rain: 0.0,
            storm: 0.0,
            fog: 0.0,
            snow: 0.0,
        };
        let sampler = WeatherSampler::new(weights);
        let catalog = WeatherCatalog::builtin();
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            sampler.next_type(WeatherType::Clear, &catalog, &mut rng),
            WeatherType::Clear
        );
    }

    #[test]
    fn forced_repeat_survives_redraw_limit() {
        let weights = WeatherWeights {
            clear: 0.0,
            cloudy: 0.0,
            rain: 0.0,
            storm: 1.0,
            fog: 0.0,
            snow: 0.0,
        };
        let sampler = WeatherSampler::new(weights);
        let catalog = WeatherCatalog::builtin();
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(
            sampler.next_type(WeatherType::Thunderstorm, &catalog, &mut rng),
            WeatherType::Thunderstorm
        );
    }
}
