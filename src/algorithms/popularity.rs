use crate::algorithms::{CandidateScore, SimilarityModel};
use crate::catalog::Catalog;
use crate::models::{ExplanationBasis, Product};
use crate::session::RatingSession;
use crate::utils::rescale_to_rating;

/// Scores a candidate by its global popularity relative to the most popular
/// product, rescaled onto the rating scale. Products without a popularity
/// signal are excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PopularityModel;

impl SimilarityModel for PopularityModel {
    fn name(&self) -> &'static str {
        "popularity"
    }

    fn score(&self, candidate: &Product, _session: &RatingSession, catalog: &Catalog) -> Option<CandidateScore> {
        let popularity = candidate.popularity?;
        let max_popularity = catalog.max_popularity()?;

        Some(CandidateScore {
            predicted_score: rescale_to_rating(popularity, max_popularity),
            basis: ExplanationBasis::from_popularity(popularity, max_popularity),
        })
    }
}
