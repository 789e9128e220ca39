pub mod cooccurrence;
pub mod popularity;

pub use cooccurrence::{CoOccurrenceIndex, CoOccurrenceModel};
pub use popularity::PopularityModel;

use crate::catalog::Catalog;
use crate::config::RecommendationConfig;
use crate::models::{ExplanationBasis, Product};
use crate::session::RatingSession;
use std::sync::Arc;
use tracing::info;

/// Predicted rating for one candidate together with the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub predicted_score: f64,
    pub basis: ExplanationBasis,
}

/// Deterministic scoring of a candidate product against a rating session.
///
/// Implementations must be pure: the same candidate, session and catalog
/// always yield the same result. `None` excludes the candidate.
pub trait SimilarityModel: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn score(&self, candidate: &Product, session: &RatingSession, catalog: &Catalog) -> Option<CandidateScore>;
}

/// Picks co-occurrence scoring when transaction history is available and
/// plain popularity otherwise.
pub fn build_model(config: &RecommendationConfig, index: Option<CoOccurrenceIndex>) -> Arc<dyn SimilarityModel> {
    let model: Arc<dyn SimilarityModel> = match index {
        Some(index) if !index.is_empty() => Arc::new(CoOccurrenceModel::new(
            index,
            config.similarity_metric,
            config.min_similarity,
        )),
        _ => Arc::new(PopularityModel),
    };

    info!("Using {} similarity model", model.name());
    model
}
