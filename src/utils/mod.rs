use crate::models::{MAX_RATING, MIN_RATING};

pub mod validation;

/// Size of the intersection of two ascending, deduplicated slices.
pub fn sorted_intersection_len(a: &[u32], b: &[u32]) -> usize {
    let (mut i, mut j, mut count) = (0, 0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }

    count
}

pub fn jaccard_similarity(shared: usize, len_a: usize, len_b: usize) -> f64 {
    let union = len_a + len_b - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

pub fn cosine_similarity(shared: usize, len_a: usize, len_b: usize) -> f64 {
    if len_a == 0 || len_b == 0 {
        0.0
    } else {
        shared as f64 / ((len_a as f64) * (len_b as f64)).sqrt()
    }
}

pub fn weighted_average(values: &[(f64, f64)]) -> Option<f64> {
    let total_weight: f64 = values.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let sum: f64 = values.iter().map(|(v, w)| v * w).sum();
    Some(sum / total_weight)
}

pub fn clamp_to_rating_scale(score: f64) -> f64 {
    score.clamp(MIN_RATING as f64, MAX_RATING as f64)
}

/// Maps `value` in `[0, max]` onto the rating scale. A zero `max` maps to the
/// bottom of the scale.
pub fn rescale_to_rating(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return MIN_RATING as f64;
    }

    let span = (MAX_RATING - MIN_RATING) as f64;
    clamp_to_rating_scale(MIN_RATING as f64 + span * value / max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_intersection_len() {
        assert_eq!(sorted_intersection_len(&[1, 3, 5, 7], &[3, 4, 5, 8]), 2);
        assert_eq!(sorted_intersection_len(&[], &[1, 2]), 0);
        assert_eq!(sorted_intersection_len(&[2], &[2]), 1);
    }

    #[test]
    fn test_set_similarities() {
        assert!((jaccard_similarity(2, 4, 4) - 1.0 / 3.0).abs() < 1e-9);
        assert!((cosine_similarity(2, 4, 4) - 0.5).abs() < 1e-9);
        assert_eq!(jaccard_similarity(0, 0, 0), 0.0);
        assert_eq!(cosine_similarity(0, 0, 3), 0.0);
    }

    #[test]
    fn test_weighted_average() {
        assert_eq!(weighted_average(&[(5.0, 1.0), (1.0, 1.0)]), Some(3.0));
        assert_eq!(weighted_average(&[(5.0, 3.0), (1.0, 1.0)]), Some(4.0));
        assert_eq!(weighted_average(&[]), None);
        assert_eq!(weighted_average(&[(4.0, 0.0)]), None);
    }

    #[test]
    fn test_rescale_to_rating() {
        assert_eq!(rescale_to_rating(10.0, 10.0), 5.0);
        assert_eq!(rescale_to_rating(0.0, 10.0), 1.0);
        assert_eq!(rescale_to_rating(5.0, 10.0), 3.0);
        assert_eq!(rescale_to_rating(3.0, 0.0), 1.0);
    }
}
