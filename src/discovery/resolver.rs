use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::{
    error::QueryError,
    filter::FilterSpec,
    schema::{CocktailSummary, UserPreference, Uuid},
};

/// Read capability the discovery engine needs from a cocktail store.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Every cocktail satisfying `spec`, with its attribute sets resolved.
    async fn find_cocktails(&self, spec: &FilterSpec) -> Result<Vec<CocktailSummary>, QueryError>;

    async fn find_user_preference(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserPreference>, QueryError>;

    /// Ingredient names containing `prefix`, case-insensitively.
    async fn search_ingredients(&self, prefix: &str, limit: i64) -> Result<Vec<String>, QueryError>;

    async fn favorite_counts(&self) -> Result<HashMap<Uuid, i64>, QueryError>;
}

/// Runs `spec` against the catalog. Failures propagate without retry.
pub async fn resolve_candidates<C>(
    catalog: &C,
    spec: &FilterSpec,
) -> Result<Vec<CocktailSummary>, QueryError>
where
    C: Catalog + ?Sized,
{
    let rows = catalog.find_cocktails(spec).await.map_err(|e| {
        log::error!("> Failed to resolve candidates: {e}");
        e
    })?;

    let mut seen: HashSet<Uuid> = HashSet::new();
    let candidates: Vec<CocktailSummary> = rows
        .into_iter()
        .filter(|cocktail| seen.insert(cocktail.id))
        .collect();

    log::debug!("> Resolved {} candidates", candidates.len());
    Ok(candidates)
}
