use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Platform user identifier, kept as the string the platform hands us.
pub type UserId = String;

/// Lowest and highest score a rating may carry, both inclusive.
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

pub const AUTOCOMPLETE_LIMIT: usize = 25;
pub const RATINGS_DISPLAY_LIMIT: usize = 10;
pub const TOP_TITLES_LIMIT: usize = 10;

/// Titles in insertion order.
pub type TitleSet = IndexSet<String>;

/// Title -> (user -> score), both levels in insertion order.
pub type RatingsMap = IndexMap<String, IndexMap<UserId, f64>>;

/// On-disk shape of the titles document: `{ "<title>": true }`.
pub type TitlesDocument = IndexMap<String, bool>;

/// On-disk shape of the ratings document: `{ "<title>": { "<user>": <score> } }`.
pub type RatingsDocument = RatingsMap;

pub fn is_valid_score(score: f64) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

pub fn mean(scores: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = scores
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRatings {
    pub title: String,
    /// Every user's score, in the order the users first rated.
    pub ratings: Vec<(UserId, f64)>,
    /// `None` when nobody has rated the title yet.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleAverage {
    pub title: String,
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds_are_inclusive() {
        assert!(is_valid_score(0.0));
        assert!(is_valid_score(10.0));
        assert!(is_valid_score(7.5));
        assert!(!is_valid_score(-1.0));
        assert!(!is_valid_score(10.01));
        assert!(!is_valid_score(f64::NAN));
        assert!(!is_valid_score(f64::INFINITY));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean([10.0, 0.0]), Some(5.0));
        assert_eq!(mean(Vec::<f64>::new()), None);
    }
}
