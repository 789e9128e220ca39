use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub transactions: TransactionsConfig,
    pub recommendation: RecommendationConfig,
    pub serving: ServingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
    pub id_column: String,
    pub description_column: String,
    /// Optional explicit popularity column; ignored when the file lacks it.
    pub popularity_column: Option<String>,
    /// Treat row order as popularity rank for products with no other signal.
    pub rank_as_popularity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionsConfig {
    pub path: Option<String>,
    pub basket_column: String,
    pub item_column: String,
    /// Minimum number of shared baskets before two products count as similar.
    pub min_support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    Jaccard,
    Cosine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub max_ratings: usize,
    pub num_recommendations: usize,
    pub similarity_metric: SimilarityMetric,
    pub min_similarity: f64,
    pub max_explained_contributors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Threads in the scoring pool.
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            transactions: TransactionsConfig::default(),
            recommendation: RecommendationConfig::default(),
            serving: ServingConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "popular_products.csv".to_string(),
            id_column: "StockCode".to_string(),
            description_column: "Description".to_string(),
            popularity_column: Some("Popularity".to_string()),
            rank_as_popularity: true,
        }
    }
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            path: None,
            basket_column: "InvoiceNo".to_string(),
            item_column: "StockCode".to_string(),
            min_support: 1,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            max_ratings: 5,
            num_recommendations: 5,
            similarity_metric: SimilarityMetric::Jaccard,
            min_similarity: 0.0,
            max_explained_contributors: 3,
        }
    }
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("RATEWISE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        crate::utils::validation::validate_config(self)
    }
}
