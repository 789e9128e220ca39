use crate::algorithms::SimilarityModel;
use crate::catalog::Catalog;
use crate::error::{RecResult, RecommenderError};
use crate::models::Recommendation;
use crate::session::RatingSession;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Ranks unrated catalog products for a rating session.
#[derive(Debug, Clone)]
pub struct Recommender {
    model: Arc<dyn SimilarityModel>,
}

impl Recommender {
    pub fn new(model: Arc<dyn SimilarityModel>) -> Self {
        Self { model }
    }

    /// Returns at most `n` recommendations ordered by descending predicted
    /// score, ties broken by ascending product id. Rated products are never
    /// returned.
    pub fn recommend(&self, session: &RatingSession, catalog: &Catalog, n: usize) -> RecResult<Vec<Recommendation>> {
        if session.is_empty() {
            return Err(RecommenderError::EmptySession);
        }

        let mut recommendations: Vec<Recommendation> = catalog
            .products()
            .par_iter()
            .filter(|product| !session.contains(&product.id))
            .filter_map(|product| {
                self.model
                    .score(product, session, catalog)
                    .map(|scored| Recommendation {
                        product_id: product.id.clone(),
                        predicted_score: scored.predicted_score,
                        explanation_basis: scored.basis,
                    })
            })
            .collect();

        let candidates = recommendations.len();
        recommendations.sort_by(rank_order);
        recommendations.truncate(n);

        debug!(
            "Scored {} candidates with {} model, returning {}",
            candidates,
            self.model.name(),
            recommendations.len()
        );

        Ok(recommendations)
    }
}

fn rank_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.predicted_score
        .total_cmp(&a.predicted_score)
        .then_with(|| a.product_id.cmp(&b.product_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{CoOccurrenceIndex, CoOccurrenceModel, PopularityModel};
    use crate::config::SimilarityMetric;
    use crate::models::Product;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new("A", "Widget"),
            Product::new("B", "Gadget"),
            Product::new("C", "Gizmo"),
            Product::new("D", "Thingamajig"),
        ])
        .unwrap()
        .with_rank_popularity()
    }

    fn rated(catalog: &Catalog, ratings: &[(&str, i64)]) -> RatingSession {
        let mut session = RatingSession::new(5);
        for (id, value) in ratings {
            session.add_or_update(catalog, id, *value).unwrap();
        }
        session
    }

    #[test]
    fn test_empty_session_is_rejected() {
        let recommender = Recommender::new(Arc::new(PopularityModel));
        let err = recommender.recommend(&RatingSession::new(5), &catalog(), 3).unwrap_err();
        assert!(matches!(err, RecommenderError::EmptySession));
    }

    #[test]
    fn test_popularity_ranking_skips_rated() {
        let catalog = catalog();
        let recommender = Recommender::new(Arc::new(PopularityModel));
        let session = rated(&catalog, &[("A", 5)]);

        let recs = recommender.recommend(&session, &catalog, 2).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);
        // Popularity 3 of 4 and 2 of 4.
        assert_eq!(recs[0].predicted_score, 4.0);
        assert_eq!(recs[1].predicted_score, 3.0);
    }

    #[test]
    fn test_n_larger_than_candidates() {
        let catalog = catalog();
        let recommender = Recommender::new(Arc::new(PopularityModel));
        let session = rated(&catalog, &[("A", 5), ("C", 2)]);

        let recs = recommender.recommend(&session, &catalog, 10).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "D"]);
    }

    #[test]
    fn test_ties_broken_by_product_id() {
        let catalog = Catalog::new(vec![
            Product::new("Z", "Zither").with_popularity(5.0),
            Product::new("M", "Mandolin").with_popularity(5.0),
            Product::new("A", "Accordion").with_popularity(5.0),
            Product::new("R", "Recorder").with_popularity(1.0),
        ])
        .unwrap();
        let recommender = Recommender::new(Arc::new(PopularityModel));
        let session = rated(&catalog, &[("R", 3)]);

        let recs = recommender.recommend(&session, &catalog, 3).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "M", "Z"]);
    }

    #[test]
    fn test_candidates_without_signal_are_excluded() {
        let catalog = Catalog::new(vec![
            Product::new("A", "Widget").with_popularity(3.0),
            Product::new("B", "Gadget"),
            Product::new("C", "Gizmo").with_popularity(1.0),
        ])
        .unwrap();
        let recommender = Recommender::new(Arc::new(PopularityModel));
        let session = rated(&catalog, &[("A", 4)]);

        let recs = recommender.recommend(&session, &catalog, 5).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["C"]);
    }

    #[test]
    fn test_co_occurrence_skips_candidates_without_signal() {
        let catalog = Catalog::new(vec![
            Product::new("A", "Widget").with_popularity(2.0),
            Product::new("B", "Gadget"),
            Product::new("C", "Gizmo").with_popularity(1.0),
        ])
        .unwrap();
        let index = CoOccurrenceIndex::from_baskets(vec![vec!["A", "C"]], 1);
        let recommender = Recommender::new(Arc::new(CoOccurrenceModel::new(index, SimilarityMetric::Jaccard, 0.0)));
        let session = rated(&catalog, &[("A", 4)]);

        let recs = recommender.recommend(&session, &catalog, 5).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["C"]);
    }

    #[test]
    fn test_co_occurrence_outranks_popularity() {
        let catalog = catalog();
        let index = CoOccurrenceIndex::from_baskets(vec![vec!["A", "D"], vec!["A", "D"], vec!["B"]], 1);
        let recommender = Recommender::new(Arc::new(CoOccurrenceModel::new(index, SimilarityMetric::Jaccard, 0.0)));
        let session = rated(&catalog, &[("A", 5)]);

        let recs = recommender.recommend(&session, &catalog, 3).unwrap();
        assert_eq!(recs[0].product_id, "D");
        assert_eq!(recs[0].predicted_score, 5.0);
        assert_eq!(recs[0].explanation_basis.contributors[0].product_id, "A");
        assert!(recs[1..].iter().all(|r| r.explanation_basis.is_popularity_fallback()));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let catalog = catalog();
        let index = CoOccurrenceIndex::from_baskets(vec![vec!["A", "B", "C"], vec!["B", "C"], vec!["C", "D"]], 1);
        let recommender = Recommender::new(Arc::new(CoOccurrenceModel::new(index, SimilarityMetric::Cosine, 0.0)));
        let session = rated(&catalog, &[("A", 4), ("D", 2)]);

        let first = recommender.recommend(&session, &catalog, 4).unwrap();
        for _ in 0..10 {
            assert_eq!(recommender.recommend(&session, &catalog, 4).unwrap(), first);
        }
    }
}
