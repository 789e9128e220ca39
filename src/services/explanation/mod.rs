//! Explanation Generator.
//!
//! Explanations are assembled in two steps: [`ExplanationGenerator::build`]
//! resolves a recommendation's basis against the session and catalog into a
//! structured [`Explanation`], and [`Explanation::render`] turns that into
//! text without looking anything else up.

use crate::catalog::Catalog;
use crate::error::{RecResult, RecommenderError};
use crate::models::Recommendation;
use crate::session::RatingSession;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub product_id: String,
    pub description: String,
    pub predicted_score: f64,
    pub reason: Reason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    SimilarTo {
        shown: Vec<ContributorView>,
        omitted: usize,
    },
    Popular {
        popularity: f64,
        max_popularity: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorView {
    pub product_id: String,
    pub description: String,
    pub rating: u8,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct ExplanationGenerator {
    max_contributors: usize,
}

impl Default for ExplanationGenerator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ExplanationGenerator {
    pub fn new(max_contributors: usize) -> Self {
        Self {
            max_contributors: max_contributors.max(1),
        }
    }

    pub fn explain(&self, recommendation: &Recommendation, session: &RatingSession, catalog: &Catalog) -> RecResult<String> {
        Ok(self.build(recommendation, session, catalog)?.render())
    }

    pub fn build(&self, recommendation: &Recommendation, session: &RatingSession, catalog: &Catalog) -> RecResult<Explanation> {
        let basis = &recommendation.explanation_basis;
        if basis.is_empty() {
            return Err(RecommenderError::MissingBasis(recommendation.product_id.clone()));
        }

        let product = catalog.lookup(&recommendation.product_id)?;

        let reason = if basis.contributors.is_empty() {
            let fallback = basis
                .popularity_fallback
                .ok_or_else(|| RecommenderError::MissingBasis(recommendation.product_id.clone()))?;
            Reason::Popular {
                popularity: fallback.popularity,
                max_popularity: fallback.max_popularity,
            }
        } else {
            let mut shown = Vec::new();
            for contribution in &basis.contributors {
                // The basis must still describe this session's ratings.
                match session.get(&contribution.product_id) {
                    None => return Err(RecommenderError::NotFound(contribution.product_id.clone())),
                    Some(current) if current != contribution.rating => {
                        return Err(RecommenderError::MissingBasis(recommendation.product_id.clone()))
                    }
                    Some(_) => {}
                }
                if shown.len() < self.max_contributors {
                    shown.push(ContributorView {
                        product_id: contribution.product_id.clone(),
                        description: catalog.lookup(&contribution.product_id)?.description.clone(),
                        rating: contribution.rating,
                        weight: contribution.weight,
                    });
                }
            }
            Reason::SimilarTo {
                omitted: basis.contributors.len() - shown.len(),
                shown,
            }
        };

        Ok(Explanation {
            product_id: product.id.clone(),
            description: product.description.clone(),
            predicted_score: recommendation.predicted_score,
            reason,
        })
    }

    /// Session-level paragraph shown after the recommendation list.
    pub fn summarize(&self, session: &RatingSession, recommendations: &[Recommendation], catalog: &Catalog) -> RecResult<String> {
        if session.is_empty() {
            return Err(RecommenderError::EmptySession);
        }

        let mut rated: Vec<(String, u8)> = session.ratings().into_iter().collect();
        rated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut names = Vec::with_capacity(rated.len());
        for (id, _) in &rated {
            names.push(quoted(&catalog.lookup(id)?.description));
        }

        if recommendations.is_empty() {
            return Ok(format!(
                "Based on your interest in {}, there are no further products to recommend.",
                join_names(&names)
            ));
        }

        let popular = recommendations
            .iter()
            .filter(|r| r.explanation_basis.is_popularity_fallback())
            .count();
        let together = recommendations.len() - popular;

        Ok(format!(
            "Based on your interest in {}, we found {}: {} bought together with products you rated and {} chosen for overall popularity.",
            join_names(&names),
            plural(recommendations.len(), "recommendation"),
            together,
            popular
        ))
    }
}

impl Explanation {
    pub fn render(&self) -> String {
        let head = format!(
            "{} (predicted rating {:.2})",
            quoted(&self.description),
            self.predicted_score
        );

        match &self.reason {
            Reason::SimilarTo { shown, omitted } => {
                let mut names: Vec<String> = shown
                    .iter()
                    .map(|c| {
                        format!(
                            "{} (you rated it {}/5, similarity {:.2})",
                            quoted(&c.description),
                            c.rating,
                            c.weight
                        )
                    })
                    .collect();
                if *omitted > 0 {
                    names.push(plural(*omitted, "other rated product"));
                }

                format!(
                    "{} is recommended because customers who bought {} also bought it.",
                    head,
                    join_names(&names)
                )
            }
            Reason::Popular { popularity, max_popularity } => format!(
                "{} is recommended for its overall popularity ({} against a catalog best of {}); none of the products you rated were bought together with it.",
                head, popularity, max_popularity
            ),
        }
    }
}

fn quoted(description: &str) -> String {
    format!("\"{}\"", description)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
