use crate::config::Config;
use anyhow::{Result, anyhow};

pub fn validate_config(config: &Config) -> Result<()> {
    let rec = &config.recommendation;

    if rec.max_ratings == 0 {
        return Err(anyhow!("recommendation.max_ratings must be greater than 0"));
    }

    if rec.num_recommendations == 0 {
        return Err(anyhow!("recommendation.num_recommendations must be greater than 0"));
    }

    if !rec.min_similarity.is_finite() || rec.min_similarity < 0.0 || rec.min_similarity >= 1.0 {
        return Err(anyhow!(
            "recommendation.min_similarity must be in [0, 1), got {}",
            rec.min_similarity
        ));
    }

    if config.catalog.id_column.trim().is_empty() || config.catalog.description_column.trim().is_empty() {
        return Err(anyhow!("catalog id and description column names cannot be empty"));
    }

    if config.transactions.path.is_some()
        && (config.transactions.basket_column.trim().is_empty()
            || config.transactions.item_column.trim().is_empty())
    {
        return Err(anyhow!("transaction basket and item column names cannot be empty"));
    }

    if config.transactions.min_support == 0 {
        return Err(anyhow!("transactions.min_support must be greater than 0"));
    }

    if config.serving.workers == 0 {
        return Err(anyhow!("serving.workers must be greater than 0"));
    }

    Ok(())
}

pub fn validate_popularity(product_id: &str, popularity: f64) -> std::result::Result<(), String> {
    if !popularity.is_finite() {
        return Err(format!("product '{}' has a non-finite popularity", product_id));
    }

    if popularity < 0.0 {
        return Err(format!(
            "product '{}' has a negative popularity ({})",
            product_id, popularity
        ));
    }

    Ok(())
}

/// Parses an `ID=VALUE` rating assignment as typed on the command line.
pub fn parse_rating_assignment(input: &str) -> Result<(String, i64)> {
    let (id, value) = input
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected PRODUCT_ID=RATING, got '{}'", input))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("missing product id in '{}'", input));
    }

    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| anyhow!("rating in '{}' is not a whole number", input))?;

    Ok((id.to_string(), value))
}
