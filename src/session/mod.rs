use crate::catalog::Catalog;
use crate::error::{RecResult, RecommenderError};
use crate::models::{Rating, RatingValue};
use std::collections::BTreeMap;

/// The sparse set of ratings one user supplied in a single interaction.
///
/// Keyed by product id; re-rating a product overwrites its value. Nothing is
/// persisted once the session is dropped.
#[derive(Debug, Clone)]
pub struct RatingSession {
    ratings: BTreeMap<String, RatingValue>,
    max_ratings: usize,
}

impl RatingSession {
    pub fn new(max_ratings: usize) -> Self {
        Self {
            ratings: BTreeMap::new(),
            max_ratings,
        }
    }

    /// Records a rating. All checks run before the session is touched, so a
    /// failed call leaves it unchanged.
    pub fn add_or_update(&mut self, catalog: &Catalog, product_id: &str, value: i64) -> RecResult<()> {
        let value = RatingValue::new(value).ok_or_else(|| RecommenderError::InvalidRating {
            product_id: product_id.to_string(),
            value,
        })?;

        if !catalog.contains(product_id) {
            return Err(RecommenderError::NotFound(product_id.to_string()));
        }

        if !self.ratings.contains_key(product_id) && self.ratings.len() >= self.max_ratings {
            return Err(RecommenderError::CapacityExceeded {
                max: self.max_ratings,
            });
        }

        self.ratings.insert(product_id.to_string(), value);
        Ok(())
    }

    /// Drops a rating, returning the previous value if there was one.
    pub fn remove(&mut self, product_id: &str) -> Option<u8> {
        self.ratings.remove(product_id).map(RatingValue::get)
    }

    pub fn clear(&mut self) {
        self.ratings.clear();
    }

    pub fn get(&self, product_id: &str) -> Option<u8> {
        self.ratings.get(product_id).copied().map(RatingValue::get)
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.ratings.contains_key(product_id)
    }

    /// Snapshot of the ratings, ordered by product id.
    pub fn ratings(&self) -> BTreeMap<String, u8> {
        self.ratings
            .iter()
            .map(|(id, value)| (id.clone(), value.get()))
            .collect()
    }

    pub fn to_ratings(&self) -> Vec<Rating> {
        self.ratings
            .iter()
            .map(|(id, value)| Rating {
                product_id: id.clone(),
                value: *value,
            })
            .collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, u8)> + '_ {
        self.ratings.iter().map(|(id, value)| (id.as_str(), value.get()))
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn max_ratings(&self) -> usize {
        self.max_ratings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn catalog() -> Catalog {
        Catalog::new(
            ["A", "B", "C", "D", "E", "F"]
                .iter()
                .map(|id| Product::new(*id, format!("Product {}", id)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_add_and_overwrite() {
        let catalog = catalog();
        let mut session = RatingSession::new(5);
        assert!(session.is_empty());

        session.add_or_update(&catalog, "A", 3).unwrap();
        session.add_or_update(&catalog, "A", 5).unwrap();

        assert_eq!(session.len(), 1);
        assert_eq!(session.get("A"), Some(5));
    }

    #[test]
    fn test_invalid_rating_leaves_session_unchanged() {
        let catalog = catalog();
        let mut session = RatingSession::new(5);
        session.add_or_update(&catalog, "A", 4).unwrap();

        for value in [0, 6, -1] {
            let err = session.add_or_update(&catalog, "A", value).unwrap_err();
            assert!(matches!(err, RecommenderError::InvalidRating { .. }));
        }
        assert_eq!(session.get("A"), Some(4));
    }

    #[test]
    fn test_unknown_product_is_not_found() {
        let catalog = catalog();
        let mut session = RatingSession::new(5);

        let err = session.add_or_update(&catalog, "Z", 3).unwrap_err();
        assert!(matches!(err, RecommenderError::NotFound(ref id) if id == "Z"));
        assert!(session.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let catalog = catalog();
        let mut session = RatingSession::new(5);
        for id in ["A", "B", "C", "D", "E"] {
            session.add_or_update(&catalog, id, 3).unwrap();
        }

        let err = session.add_or_update(&catalog, "F", 3).unwrap_err();
        assert!(matches!(err, RecommenderError::CapacityExceeded { max: 5 }));
        assert!(!session.contains("F"));

        // Updating an existing key never hits the bound.
        session.add_or_update(&catalog, "E", 1).unwrap();
        assert_eq!(session.get("E"), Some(1));

        session.remove("E");
        session.add_or_update(&catalog, "F", 2).unwrap();
        assert_eq!(session.len(), 5);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let catalog = catalog();
        let mut session = RatingSession::new(2);
        session.add_or_update(&catalog, "B", 2).unwrap();

        let mut snapshot = session.ratings();
        snapshot.insert("C".to_string(), 5);

        assert_eq!(session.len(), 1);
        assert!(!session.contains("C"));
    }
}
