use std::cmp::Ordering;

use serde::Serialize;

use crate::schema::{CocktailSummary, SortKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCocktail {
    #[serde(flatten)]
    pub cocktail: CocktailSummary,
    pub score: u32,
    pub favorites: i64,
}

impl ScoredCocktail {
    pub fn new(cocktail: CocktailSummary, score: u32, favorites: i64) -> Self {
        Self {
            cocktail,
            score,
            favorites,
        }
    }
}

// Present values first, ascending; missing values keep resolver order at the end.
fn ascending_present<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &ScoredCocktail, b: &ScoredCocktail, sort: Option<SortKey>) -> Ordering {
    match sort {
        Some(SortKey::Recent) => b.cocktail.created_at.cmp(&a.cocktail.created_at),
        Some(SortKey::PrepTime) => ascending_present(
            &a.cocktail.prep_time_minutes,
            &b.cocktail.prep_time_minutes,
        ),
        Some(SortKey::Difficulty) => {
            ascending_present(&a.cocktail.difficulty, &b.cocktail.difficulty)
        }
        Some(SortKey::Popular) => b.favorites.cmp(&a.favorites),
        Some(SortKey::Recommended) | None => b.score.cmp(&a.score),
    }
}

/// Orders candidates by `sort`, or by score when no explicit key is given.
///
/// The sort is stable, ties keep the order the resolver produced.
pub fn rank(mut candidates: Vec<ScoredCocktail>, sort: Option<SortKey>) -> Vec<ScoredCocktail> {
    candidates.sort_by(|a, b| compare(a, b, sort));
    candidates
}
