use crate::algorithms::{CandidateScore, PopularityModel, SimilarityModel};
use crate::catalog::{find_column, required_cell, Catalog};
use crate::config::{SimilarityMetric, TransactionsConfig};
use crate::error::{RecResult, RecommenderError};
use crate::models::{Contribution, ExplanationBasis, Product};
use crate::session::RatingSession;
use crate::utils::{clamp_to_rating_scale, cosine_similarity, jaccard_similarity, sorted_intersection_len, weighted_average};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Which baskets each product appeared in, built from a transaction log.
#[derive(Debug, Clone, Default)]
pub struct CoOccurrenceIndex {
    baskets_by_item: HashMap<String, Vec<u32>>,
    basket_total: usize,
    min_support: usize,
}

impl CoOccurrenceIndex {
    pub fn from_baskets<I, B, S>(baskets: I, min_support: usize) -> Self
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut baskets_by_item: HashMap<String, Vec<u32>> = HashMap::new();
        let mut basket_total = 0u32;

        for basket in baskets {
            let mut seen_any = false;
            for item in basket {
                baskets_by_item.entry(item.into()).or_default().push(basket_total);
                seen_any = true;
            }
            if seen_any {
                basket_total += 1;
            }
        }

        Self::finish(baskets_by_item, basket_total as usize, min_support)
    }

    pub fn from_path(path: impl AsRef<Path>, config: &TransactionsConfig, catalog: &Catalog) -> RecResult<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = std::fs::File::open(path)
            .map_err(|e| RecommenderError::data_load(&source_name, e.to_string()))?;

        let index = Self::read_csv(file, &source_name, config, catalog)?;
        info!(
            "Loaded transactions from {} ({} baskets, {} products)",
            source_name,
            index.basket_total,
            index.baskets_by_item.len()
        );
        Ok(index)
    }

    pub fn from_reader<R: Read>(reader: R, config: &TransactionsConfig, catalog: &Catalog) -> RecResult<Self> {
        Self::read_csv(reader, "transactions", config, catalog)
    }

    fn read_csv<R: Read>(
        reader: R,
        source_name: &str,
        config: &TransactionsConfig,
        catalog: &Catalog,
    ) -> RecResult<Self> {
        let load_err = |reason: String| RecommenderError::data_load(source_name, reason);

        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().map_err(|e| load_err(e.to_string()))?.clone();
        let basket_index = find_column(&headers, &config.basket_column).map_err(load_err)?;
        let item_index = find_column(&headers, &config.item_column).map_err(load_err)?;

        let mut basket_ids: HashMap<String, u32> = HashMap::new();
        let mut baskets_by_item: HashMap<String, Vec<u32>> = HashMap::new();
        let mut skipped = 0usize;

        for result in reader.records() {
            let record = result.map_err(|e| load_err(e.to_string()))?;

            let (Some(basket), Some(item)) = (
                required_cell(&record, basket_index),
                required_cell(&record, item_index),
            ) else {
                skipped += 1;
                continue;
            };

            if !catalog.contains(&item) {
                skipped += 1;
                continue;
            }

            let next = basket_ids.len() as u32;
            let ordinal = *basket_ids.entry(basket).or_insert(next);
            baskets_by_item.entry(item).or_default().push(ordinal);
        }

        if skipped > 0 {
            debug!("Skipped {} transaction rows with blank cells or unknown products", skipped);
        }

        Ok(Self::finish(baskets_by_item, basket_ids.len(), config.min_support))
    }

    fn finish(mut baskets_by_item: HashMap<String, Vec<u32>>, basket_total: usize, min_support: usize) -> Self {
        for baskets in baskets_by_item.values_mut() {
            baskets.sort_unstable();
            baskets.dedup();
        }

        Self {
            baskets_by_item,
            basket_total,
            min_support,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.basket_total == 0
    }

    pub fn basket_total(&self) -> usize {
        self.basket_total
    }

    pub fn basket_count(&self, id: &str) -> usize {
        self.baskets_by_item.get(id).map_or(0, Vec::len)
    }

    pub fn basket_counts(&self) -> HashMap<String, usize> {
        self.baskets_by_item
            .iter()
            .map(|(id, baskets)| (id.clone(), baskets.len()))
            .collect()
    }

    /// Number of baskets containing both products.
    pub fn co_occurrence(&self, a: &str, b: &str) -> usize {
        match (self.baskets_by_item.get(a), self.baskets_by_item.get(b)) {
            (Some(a), Some(b)) => sorted_intersection_len(a, b),
            _ => 0,
        }
    }

    pub fn similarity(&self, a: &str, b: &str, metric: SimilarityMetric) -> f64 {
        let (Some(baskets_a), Some(baskets_b)) = (self.baskets_by_item.get(a), self.baskets_by_item.get(b)) else {
            return 0.0;
        };

        let shared = sorted_intersection_len(baskets_a, baskets_b);
        if shared < self.min_support {
            return 0.0;
        }

        match metric {
            SimilarityMetric::Jaccard => jaccard_similarity(shared, baskets_a.len(), baskets_b.len()),
            SimilarityMetric::Cosine => cosine_similarity(shared, baskets_a.len(), baskets_b.len()),
        }
    }
}

/// Item-item collaborative scoring over basket co-occurrence.
///
/// A candidate's predicted rating is the similarity-weighted mean of the
/// ratings given to related products. Candidates unrelated to every rated
/// product are handed to the popularity model.
#[derive(Debug, Clone)]
pub struct CoOccurrenceModel {
    index: CoOccurrenceIndex,
    metric: SimilarityMetric,
    min_similarity: f64,
    fallback: PopularityModel,
}

impl CoOccurrenceModel {
    pub fn new(index: CoOccurrenceIndex, metric: SimilarityMetric, min_similarity: f64) -> Self {
        Self {
            index,
            metric,
            min_similarity,
            fallback: PopularityModel,
        }
    }

    fn contributions(&self, candidate: &Product, session: &RatingSession) -> Vec<Contribution> {
        session
            .iter()
            .filter_map(|(rated_id, rating)| {
                let weight = self.index.similarity(&candidate.id, rated_id, self.metric);
                (weight > self.min_similarity).then(|| Contribution {
                    product_id: rated_id.to_string(),
                    rating,
                    weight,
                })
            })
            .collect()
    }
}

impl SimilarityModel for CoOccurrenceModel {
    fn name(&self) -> &'static str {
        "co-occurrence"
    }

    fn score(&self, candidate: &Product, session: &RatingSession, catalog: &Catalog) -> Option<CandidateScore> {
        let mut contributions = self.contributions(candidate, session);
        if contributions.is_empty() {
            return self.fallback.score(candidate, session, catalog);
        }

        let weighted: Vec<(f64, f64)> = contributions
            .iter()
            .map(|c| (c.rating as f64, c.weight))
            .collect();
        let predicted = weighted_average(&weighted)?;

        let popularity = |id: &str| catalog.get(id).and_then(|p| p.popularity).unwrap_or(0.0);
        contributions.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| popularity(&b.product_id).total_cmp(&popularity(&a.product_id)))
                .then_with(|| a.product_id.cmp(&b.product_id))
        });

        Some(CandidateScore {
            predicted_score: clamp_to_rating_scale(predicted),
            basis: ExplanationBasis::from_contributors(contributions),
        })
    }
}
