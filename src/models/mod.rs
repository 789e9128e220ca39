use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub description: String,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingValue(u8);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub product_id: String,
    pub value: RatingValue,
}

/// One rated product that pulled a candidate's score towards its rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub product_id: String,
    pub rating: u8,
    pub weight: f64,
}

/// Popularity evidence used when no rated product is related to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityFallback {
    pub popularity: f64,
    pub max_popularity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationBasis {
    pub contributors: Vec<Contribution>,
    pub popularity_fallback: Option<PopularityFallback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: String,
    pub predicted_score: f64,
    pub explanation_basis: ExplanationBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub session_id: Uuid,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            popularity: None,
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }
}

impl RatingValue {
    /// Returns `None` unless `value` is on the 1-5 scale.
    pub fn new(value: i64) -> Option<Self> {
        if (MIN_RATING as i64..=MAX_RATING as i64).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ExplanationBasis {
    pub fn from_contributors(contributors: Vec<Contribution>) -> Self {
        Self {
            contributors,
            popularity_fallback: None,
        }
    }

    pub fn from_popularity(popularity: f64, max_popularity: f64) -> Self {
        Self {
            contributors: Vec::new(),
            popularity_fallback: Some(PopularityFallback {
                popularity,
                max_popularity,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty() && self.popularity_fallback.is_none()
    }

    pub fn is_popularity_fallback(&self) -> bool {
        self.contributors.is_empty() && self.popularity_fallback.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_value_bounds() {
        assert!(RatingValue::new(0).is_none());
        assert!(RatingValue::new(6).is_none());
        assert!(RatingValue::new(-3).is_none());
        assert_eq!(RatingValue::new(1).map(RatingValue::get), Some(1));
        assert_eq!(RatingValue::new(5).map(RatingValue::get), Some(5));
    }

    #[test]
    fn test_explanation_basis_emptiness() {
        assert!(ExplanationBasis::default().is_empty());

        let popular = ExplanationBasis::from_popularity(10.0, 20.0);
        assert!(!popular.is_empty());
        assert!(popular.is_popularity_fallback());

        let similar = ExplanationBasis::from_contributors(vec![Contribution {
            product_id: "A".to_string(),
            rating: 4,
            weight: 0.5,
        }]);
        assert!(!similar.is_empty());
        assert!(!similar.is_popularity_fallback());
    }
}
