use uuid::Uuid;

/// Errors surfaced by the catalog, rating session, recommender and
/// explanation layers. None of them is fatal to the process.
#[derive(thiserror::Error, Debug)]
pub enum RecommenderError {
    #[error("failed to load {source_name}: {reason}")]
    DataLoad { source_name: String, reason: String },

    #[error("product not found: {0}")]
    NotFound(String),

    #[error("invalid rating {value} for product {product_id} (expected 1-5)")]
    InvalidRating { product_id: String, value: i64 },

    #[error("rating session is full ({max} products already rated)")]
    CapacityExceeded { max: usize },

    #[error("rating session is empty")]
    EmptySession,

    #[error("recommendation for {0} has no explanation basis")]
    MissingBasis(String),

    #[error("unknown rating session: {0}")]
    UnknownSession(Uuid),

    #[error("recommendation worker failed: {0}")]
    Worker(String),
}

pub type RecResult<T> = Result<T, RecommenderError>;

impl RecommenderError {
    pub fn data_load(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        RecommenderError::DataLoad {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RecommenderError::DataLoad { .. } => "data_load",
            RecommenderError::NotFound(_) => "not_found",
            RecommenderError::InvalidRating { .. } => "invalid_rating",
            RecommenderError::CapacityExceeded { .. } => "capacity_exceeded",
            RecommenderError::EmptySession => "empty_session",
            RecommenderError::MissingBasis(_) => "missing_basis",
            RecommenderError::UnknownSession(_) => "unknown_session",
            RecommenderError::Worker(_) => "worker",
        }
    }

    /// Message suitable for showing to the person using the front end.
    pub fn user_message(&self) -> String {
        match self {
            RecommenderError::DataLoad { source_name, reason } => format!(
                "The product data in {} could not be read ({}). Fix the file and restart.",
                source_name, reason
            ),
            RecommenderError::NotFound(id) => format!(
                "Product '{}' is not in the catalog. Pick a product from the list.",
                id
            ),
            RecommenderError::InvalidRating { value, .. } => format!(
                "A rating of {} is not allowed. Please rate products from 1 to 5.",
                value
            ),
            RecommenderError::CapacityExceeded { max } => format!(
                "You can rate at most {} products. Remove a rating before adding another.",
                max
            ),
            RecommenderError::EmptySession => {
                "Please rate at least one product before requesting recommendations.".to_string()
            }
            RecommenderError::MissingBasis(id) => format!(
                "No explanation is available for product '{}'. Request recommendations again.",
                id
            ),
            RecommenderError::UnknownSession(_) => {
                "Your rating session has expired. Start a new session to continue.".to_string()
            }
            RecommenderError::Worker(_) => {
                "Recommendations could not be computed right now. Please try again.".to_string()
            }
        }
    }
}

impl From<tokio::task::JoinError> for RecommenderError {
    fn from(err: tokio::task::JoinError) -> Self {
        RecommenderError::Worker(err.to_string())
    }
}
