use serde::Serialize;

use crate::schema::{CocktailSummary, Uuid};

/// User curated cocktails waiting to be prepared, in the order they were added.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparationQueue {
    cocktails: Vec<CocktailSummary>,
}

impl PreparationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the cocktail is already queued.
    pub fn add(&mut self, cocktail: CocktailSummary) -> bool {
        if self.contains(cocktail.id) {
            return false;
        }
        self.cocktails.push(cocktail);
        true
    }

    pub fn remove(&mut self, cocktail_id: Uuid) -> bool {
        let before = self.cocktails.len();
        self.cocktails.retain(|c| c.id != cocktail_id);
        before != self.cocktails.len()
    }

    pub fn contains(&self, cocktail_id: Uuid) -> bool {
        self.cocktails.iter().any(|c| c.id == cocktail_id)
    }

    pub fn len(&self) -> usize {
        self.cocktails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cocktails.is_empty()
    }

    pub fn cocktails(&self) -> &[CocktailSummary] {
        &self.cocktails
    }

    pub fn into_sequence(self) -> Vec<CocktailSummary> {
        self.cocktails
    }
}
