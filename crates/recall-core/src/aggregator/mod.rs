//! Confidence-weighted result aggregation
//!
//! Merges candidate result sets from up to three sources (cache, parallel
//! execution, distributed fallback) into one coherent layer map. Cache
//! results form the base; parallel results fill gaps, replace nulls, and win
//! genuine conflicts when materially more complete; distributed results only
//! fill remaining gaps. No source's data is silently dropped, and a failed
//! conflict resolution falls back to the fresh value instead of aborting the
//! merge.

mod types;


pub use types::{AggregatedResult, LayerMap, ResultSource};

use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};

/// Fresh results must be this much larger than cached ones to win a size
/// conflict, avoiding churn from trivial count noise
const FRESHNESS_SIZE_RATIO: f64 = 1.2;

/// Floor for age-discounted cache confidence
const MIN_CACHE_CONFIDENCE: f64 = 0.7;

/// Merges candidate result sets with confidence-weighted precedence
#[derive(Debug, Default)]
pub struct ResultAggregator {
    /// Age of the cached results, used to discount cache confidence in
    /// conflicts; `None` means no discount
    cache_age: Option<Duration>,
}

impl ResultAggregator {
    /// Create an aggregator with no cache-age discount
    pub fn new() -> Self {
        Self::default()
    }

    /// Discount cache confidence by the given result age
    pub fn with_cache_age(mut self, age: Duration) -> Self {
        self.cache_age = Some(age);
        self
    }

    /// Merge up to three candidate result sets into one layer map
    ///
    /// `confidence_scores` are caller-supplied per-layer scores that override
    /// the source-derived ones; the overall confidence is the mean over the
    /// layers actually present in the merged map.
    pub fn aggregate_results(
        &self,
        cache_results: Option<&LayerMap>,
        parallel_results: Option<&LayerMap>,
        distributed_results: Option<&LayerMap>,
        confidence_scores: Option<&HashMap<String, f64>>,
    ) -> AggregatedResult {
        let mut merged: LayerMap = cache_results.cloned().unwrap_or_default();
        let mut layer_confidence: HashMap<String, f64> = merged
            .keys()
            .map(|layer| (layer.clone(), ResultSource::Cache.base_confidence()))
            .collect();

        if let Some(parallel) = parallel_results {
            for (layer, fresh) in parallel {
                match merged.get(layer) {
                    None => {
                        merged.insert(layer.clone(), fresh.clone());
                        layer_confidence
                            .insert(layer.clone(), ResultSource::Parallel.base_confidence());
                    }
                    Some(cached) if cached.is_null() => {
                        merged.insert(layer.clone(), fresh.clone());
                        layer_confidence
                            .insert(layer.clone(), ResultSource::Parallel.base_confidence());
                    }
                    Some(cached) if !fresh.is_null() => {
                        let (winner, confidence) = self.resolve_conflict(layer, cached, fresh);
                        merged.insert(layer.clone(), winner);
                        layer_confidence.insert(layer.clone(), confidence);
                    }
                    // Fresh value is null: the cached value stands
                    Some(_) => {}
                }
            }
        }

        if let Some(distributed) = distributed_results {
            for (layer, value) in distributed {
                let fills_gap = match merged.get(layer) {
                    None => true,
                    Some(existing) => existing.is_null(),
                };
                if fills_gap {
                    merged.insert(layer.clone(), value.clone());
                    layer_confidence
                        .insert(layer.clone(), ResultSource::Distributed.base_confidence());
                }
            }
        }

        if let Some(scores) = confidence_scores {
            for (layer, score) in scores {
                if merged.contains_key(layer) {
                    layer_confidence.insert(layer.clone(), *score);
                }
            }
        }

        let confidence = if merged.is_empty() {
            0.0
        } else {
            merged
                .keys()
                .filter_map(|layer| layer_confidence.get(layer))
                .sum::<f64>()
                / merged.len() as f64
        };

        debug!(
            "aggregated {} layers with overall confidence {:.3}",
            merged.len(),
            confidence
        );

        AggregatedResult {
            layers: merged,
            confidence,
        }
    }

    /// Resolve a genuine conflict between a cached and a fresh value
    ///
    /// Null-aside first; for two collections the fresh value wins only when
    /// more than 20% larger, otherwise the cached value stands with its
    /// confidence discounted by age. Non-collection conflicts prefer the
    /// fresh value rather than aborting the merge.
    fn resolve_conflict(
        &self,
        layer: &str,
        cached: &serde_json::Value,
        fresh: &serde_json::Value,
    ) -> (serde_json::Value, f64) {
        if cached.is_null() {
            return (fresh.clone(), ResultSource::Parallel.base_confidence());
        }
        if fresh.is_null() {
            return (cached.clone(), self.discounted_cache_confidence());
        }

        match (cached.as_array(), fresh.as_array()) {
            (Some(cached_items), Some(fresh_items)) => {
                if fresh_items.len() as f64 > cached_items.len() as f64 * FRESHNESS_SIZE_RATIO {
                    (fresh.clone(), ResultSource::Parallel.base_confidence())
                } else {
                    (cached.clone(), self.discounted_cache_confidence())
                }
            }
            _ => {
                warn!(
                    "layer '{}': conflicting non-collection values, preferring fresh result",
                    layer
                );
                (fresh.clone(), ResultSource::Parallel.base_confidence())
            }
        }
    }

    /// Cache confidence discounted by result age, floored at 0.7
    fn discounted_cache_confidence(&self) -> f64 {
        let base = ResultSource::Cache.base_confidence();
        match self.cache_age {
            Some(age) => (base - age.as_secs_f64() / 1000.0).max(MIN_CACHE_CONFIDENCE),
            None => base,
        }
    }

    /// Stable dedup by `id_field`, preserving first-seen order
    ///
    /// Items without the id field cannot be deduplicated safely and are
    /// always kept.
    pub fn deduplicate_results(
        &self,
        results: &[serde_json::Value],
        id_field: &str,
    ) -> Vec<serde_json::Value> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut deduped = Vec::with_capacity(results.len());

        for item in results {
            match item_id(item, id_field) {
                Some(id) => {
                    if seen.insert(id) {
                        deduped.push(item.clone());
                    }
                }
                None => deduped.push(item.clone()),
            }
        }

        deduped
    }

    /// Union two result sets for a layer, full results winning id collisions
    ///
    /// The confidence bonus scales with the Jaccard overlap between the two
    /// id sets: higher agreement between sources increases trust in the
    /// merge.
    pub fn merge_layer_results(
        &self,
        layer: &str,
        partial: &[serde_json::Value],
        full: &[serde_json::Value],
        id_field: &str,
    ) -> (Vec<serde_json::Value>, f64) {
        let full_ids: HashSet<String> =
            full.iter().filter_map(|item| item_id(item, id_field)).collect();
        let partial_ids: HashSet<String> = partial
            .iter()
            .filter_map(|item| item_id(item, id_field))
            .collect();

        let mut merged: Vec<serde_json::Value> = full.to_vec();
        for item in partial {
            match item_id(item, id_field) {
                Some(id) if full_ids.contains(&id) => {}
                _ => merged.push(item.clone()),
            }
        }

        let intersection = full_ids.intersection(&partial_ids).count();
        let union = full_ids.union(&partial_ids).count();
        let agreement = if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        };
        let confidence = (0.90 + 0.05 * agreement).min(1.0);

        debug!(
            "merged layer '{}': {} items, agreement {:.2}",
            layer,
            merged.len(),
            agreement
        );

        (merged, confidence)
    }
}

/// Extract an item's id as a string; a missing or null field is no id
fn item_id(item: &serde_json::Value, id_field: &str) -> Option<String> {
    match item.get(id_field) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
