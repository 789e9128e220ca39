use crate::algorithms::SimilarityModel;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{RecResult, RecommenderError};
use crate::models::*;
use crate::services::{explanation::ExplanationGenerator, recommendation::Recommender};
use crate::session::RatingSession;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Front-end facing entry points: one rating session per user, a shared
/// read-only catalog, and recommendation scoring offloaded from the caller's
/// runtime.
pub struct ServingService {
    catalog: Arc<Catalog>,
    recommender: Recommender,
    explainer: ExplanationGenerator,
    config: Arc<Config>,
    sessions: DashMap<Uuid, RatingSession>,
    serving_stats: DashMap<String, u64>,
}

impl ServingService {
    pub fn new(catalog: Arc<Catalog>, model: Arc<dyn SimilarityModel>, config: Arc<Config>) -> Self {
        Self {
            catalog,
            recommender: Recommender::new(model),
            explainer: ExplanationGenerator::new(config.recommendation.max_explained_contributors),
            config,
            sessions: DashMap::new(),
            serving_stats: DashMap::new(),
        }
    }

    pub fn list_products(&self) -> Arc<Catalog> {
        self.catalog.clone()
    }

    pub fn create_session(&self) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions.insert(
            session_id,
            RatingSession::new(self.config.recommendation.max_ratings),
        );
        self.increment_stat("sessions_created");

        debug!("Created rating session {}", session_id);
        session_id
    }

    /// Discards a session and its ratings. Returns false if it was unknown.
    pub fn end_session(&self, session_id: Uuid) -> bool {
        self.sessions.remove(&session_id).is_some()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn submit_rating(&self, session_id: Uuid, product_id: &str, value: i64) -> RecResult<()> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(RecommenderError::UnknownSession(session_id))?;

        session.add_or_update(&self.catalog, product_id, value)?;
        drop(session);

        self.increment_stat("ratings_submitted");
        Ok(())
    }

    pub fn remove_rating(&self, session_id: Uuid, product_id: &str) -> RecResult<Option<u8>> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(RecommenderError::UnknownSession(session_id))?;

        Ok(session.remove(product_id))
    }

    pub fn ratings(&self, session_id: Uuid) -> RecResult<Vec<Rating>> {
        Ok(self.snapshot(session_id)?.to_ratings())
    }

    /// Scores the session on a blocking worker. `n` defaults to the
    /// configured recommendation count.
    pub async fn request_recommendations(&self, session_id: Uuid, n: Option<usize>) -> RecResult<RecommendationResponse> {
        self.increment_stat("total_requests");

        let session = self.snapshot(session_id)?;
        let n = n.unwrap_or(self.config.recommendation.num_recommendations);
        let catalog = self.catalog.clone();
        let recommender = self.recommender.clone();

        let start_time = std::time::Instant::now();
        let result = tokio::task::spawn_blocking(move || recommender.recommend(&session, &catalog, n))
            .await
            .map_err(RecommenderError::from)
            .and_then(|inner| inner);

        match result {
            Ok(recommendations) => {
                self.increment_stat("successful_requests");
                info!(
                    "Served {} recommendations for session {} in {}ms",
                    recommendations.len(),
                    session_id,
                    start_time.elapsed().as_millis()
                );
                Ok(RecommendationResponse {
                    session_id,
                    recommendations,
                    generated_at: Utc::now(),
                })
            }
            Err(e) => {
                self.increment_stat("failed_requests");
                match &e {
                    RecommenderError::Worker(_) => error!("Recommendation worker failed for session {}: {}", session_id, e),
                    _ => debug!("Rejected recommendation request for session {}: {}", session_id, e),
                }
                Err(e)
            }
        }
    }

    pub fn get_explanation(&self, session_id: Uuid, recommendation: &Recommendation) -> RecResult<String> {
        let session = self.snapshot(session_id)?;
        self.explainer.explain(recommendation, &session, &self.catalog)
    }

    pub fn summarize(&self, session_id: Uuid, recommendations: &[Recommendation]) -> RecResult<String> {
        let session = self.snapshot(session_id)?;
        self.explainer.summarize(&session, recommendations, &self.catalog)
    }

    pub fn serving_stats(&self) -> HashMap<String, u64> {
        self.serving_stats.iter().map(|entry| (entry.key().clone(), *entry.value())).collect()
    }

    fn snapshot(&self, session_id: Uuid) -> RecResult<RatingSession> {
        self.sessions
            .get(&session_id)
            .map(|session| session.clone())
            .ok_or(RecommenderError::UnknownSession(session_id))
    }

    fn increment_stat(&self, key: &str) {
        let mut counter = self.serving_stats.entry(key.to_string()).or_insert(0);
        *counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::PopularityModel;

    fn service() -> ServingService {
        let catalog = Catalog::new(vec![
            Product::new("A", "Widget"),
            Product::new("B", "Gadget"),
            Product::new("C", "Gizmo"),
        ])
        .unwrap()
        .with_rank_popularity();

        ServingService::new(Arc::new(catalog), Arc::new(PopularityModel), Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn test_session_flow() {
        let service = service();
        let session_id = service.create_session();

        service.submit_rating(session_id, "A", 4).unwrap();
        let response = service.request_recommendations(session_id, Some(1)).await.unwrap();

        assert_eq!(response.session_id, session_id);
        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].product_id, "B");

        let text = service.get_explanation(session_id, &response.recommendations[0]).unwrap();
        assert!(text.contains("\"Gadget\""));

        let stats = service.serving_stats();
        assert_eq!(stats.get("ratings_submitted"), Some(&1));
        assert_eq!(stats.get("successful_requests"), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_session_request_fails() {
        let service = service();
        let session_id = service.create_session();

        let err = service.request_recommendations(session_id, None).await.unwrap_err();
        assert!(matches!(err, RecommenderError::EmptySession));
        assert_eq!(service.serving_stats().get("failed_requests"), Some(&1));
    }

    #[test]
    fn test_unknown_session() {
        let service = service();
        let missing = Uuid::new_v4();

        assert!(matches!(
            service.submit_rating(missing, "A", 3),
            Err(RecommenderError::UnknownSession(id)) if id == missing
        ));

        let session_id = service.create_session();
        assert!(service.end_session(session_id));
        assert!(!service.end_session(session_id));
        assert!(service.ratings(session_id).is_err());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let service = service();
        let first = service.create_session();
        let second = service.create_session();

        service.submit_rating(first, "A", 5).unwrap();
        service.submit_rating(second, "C", 1).unwrap();
        assert_eq!(service.remove_rating(first, "A").unwrap(), Some(5));

        assert!(service.ratings(first).unwrap().is_empty());
        let second_ratings = service.ratings(second).unwrap();
        assert_eq!(second_ratings.len(), 1);
        assert_eq!(second_ratings[0].product_id, "C");
        assert_eq!(service.active_sessions(), 2);
    }
}
