//! Catalog Store: the immutable product table.
//!
//! A catalog is built once (from CSV or from products in memory), has its
//! popularity signals resolved, and is then shared read-only behind an `Arc`.

use crate::config::CatalogConfig;
use crate::error::{RecResult, RecommenderError};
use crate::models::Product;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
    max_popularity: Option<f64>,
}

impl Catalog {
    /// Builds a catalog from products in row order, rejecting duplicate or
    /// blank ids and invalid popularity values.
    pub fn new(products: Vec<Product>) -> RecResult<Self> {
        let mut index = HashMap::with_capacity(products.len());

        for (position, product) in products.iter().enumerate() {
            if product.id.trim().is_empty() {
                return Err(RecommenderError::data_load(
                    "catalog",
                    format!("product at position {} has an empty id", position),
                ));
            }
            if product.description.trim().is_empty() {
                return Err(RecommenderError::data_load(
                    "catalog",
                    format!("product '{}' has an empty description", product.id),
                ));
            }
            if let Some(popularity) = product.popularity {
                crate::utils::validation::validate_popularity(&product.id, popularity)
                    .map_err(|reason| RecommenderError::data_load("catalog", reason))?;
            }
            if index.insert(product.id.clone(), position).is_some() {
                return Err(RecommenderError::data_load(
                    "catalog",
                    format!("duplicate product id '{}'", product.id),
                ));
            }
        }

        let max_popularity = max_popularity(&products);

        Ok(Self {
            products,
            index,
            max_popularity,
        })
    }

    /// Reads a CSV catalog. Only explicit popularity values are taken from the
    /// file; see [`Catalog::resolve_popularity`] for the rest.
    pub fn from_path(path: impl AsRef<Path>, config: &CatalogConfig) -> RecResult<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let file = std::fs::File::open(path)
            .map_err(|e| RecommenderError::data_load(&source_name, e.to_string()))?;

        let catalog = Self::read_csv(file, &source_name, config)?;
        info!(
            "Loaded catalog from {} ({} products, max popularity {:?})",
            source_name,
            catalog.len(),
            catalog.max_popularity
        );
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R, config: &CatalogConfig) -> RecResult<Self> {
        Self::read_csv(reader, "catalog", config)
    }

    fn read_csv<R: Read>(reader: R, source_name: &str, config: &CatalogConfig) -> RecResult<Self> {
        let load_err = |reason: String| RecommenderError::data_load(source_name, reason);

        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().map_err(|e| load_err(e.to_string()))?.clone();

        let id_index = find_column(&headers, &config.id_column).map_err(load_err)?;
        let description_index =
            find_column(&headers, &config.description_column).map_err(load_err)?;
        let popularity_index = config
            .popularity_column
            .as_deref()
            .and_then(|name| find_column(&headers, name).ok());

        let mut products = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| load_err(e.to_string()))?;
            // Row 1 is the header.
            let line = row + 2;

            let id = required_cell(&record, id_index)
                .ok_or_else(|| load_err(format!("row {}: missing {}", line, config.id_column)))?;
            let description = required_cell(&record, description_index).ok_or_else(|| {
                load_err(format!("row {}: missing {}", line, config.description_column))
            })?;

            let mut product = Product::new(id, description);
            if let Some(raw) = popularity_index.and_then(|i| required_cell(&record, i)) {
                let popularity = raw.parse::<f64>().map_err(|_| {
                    load_err(format!("row {}: popularity '{}' is not a number", line, raw))
                })?;
                product = product.with_popularity(popularity);
            }
            products.push(product);
        }

        Self::new(products).map_err(|e| match e {
            RecommenderError::DataLoad { reason, .. } => load_err(reason),
            other => other,
        })
    }

    /// Settles popularity for products the source gave none: historical
    /// basket counts first, then list rank when configured.
    pub fn resolve_popularity(self, config: &CatalogConfig, basket_counts: Option<&HashMap<String, usize>>) -> Self {
        let catalog = match basket_counts {
            Some(counts) => self.with_basket_counts(counts),
            None => self,
        };

        if config.rank_as_popularity {
            catalog.with_rank_popularity()
        } else {
            catalog
        }
    }

    /// Fills missing popularity from historical basket counts.
    pub fn with_basket_counts(mut self, counts: &HashMap<String, usize>) -> Self {
        let mut filled = 0usize;
        for product in self.products.iter_mut().filter(|p| p.popularity.is_none()) {
            if let Some(&count) = counts.get(&product.id) {
                product.popularity = Some(count as f64);
                filled += 1;
            }
        }
        debug!("Filled popularity for {} products from basket counts", filled);
        self.max_popularity = max_popularity(&self.products);
        self
    }

    /// Fills missing popularity from list rank: row `i` of `len` gets `len - i`.
    pub fn with_rank_popularity(mut self) -> Self {
        let len = self.products.len();
        for (position, product) in self.products.iter_mut().enumerate() {
            if product.popularity.is_none() {
                product.popularity = Some((len - position) as f64);
            }
        }
        self.max_popularity = max_popularity(&self.products);
        self
    }

    pub fn lookup(&self, id: &str) -> RecResult<&Product> {
        self.get(id)
            .ok_or_else(|| RecommenderError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.index.get(id).map(|&position| &self.products[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn max_popularity(&self) -> Option<f64> {
        self.max_popularity
    }

    /// Products whose description contains `query`, case-insensitively, in
    /// catalog order.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|p| p.description.to_lowercase().contains(&needle))
            .collect()
    }
}

fn max_popularity(products: &[Product]) -> Option<f64> {
    products
        .iter()
        .filter_map(|p| p.popularity)
        .fold(None, |max, p| match max {
            Some(m) if m >= p => Some(m),
            _ => Some(p),
        })
}

pub(crate) fn find_column(headers: &StringRecord, name: &str) -> Result<usize, String> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| format!("missing required column '{}'", wanted))
}

pub(crate) fn required_cell(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
