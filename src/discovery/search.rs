use std::{collections::HashMap, sync::Arc};

use serde::Serialize;

use super::{
    filter::{build_filter_spec, wants_recommendation, FilterSpec},
    ranker::{rank, ScoredCocktail},
    resolver::{resolve_candidates, Catalog},
    scorer::{score, Selection},
    token::RequestTokens,
};
use crate::{
    error::QueryError,
    form::Form,
    schema::{SortKey, UserPreference, Uuid},
};

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub cocktails: Vec<ScoredCocktail>,
    pub applied: FilterSpec,
    pub token: u64,
}

/// Discovery context shared by every search of one client.
pub struct Discovery<C: Catalog> {
    catalog: Arc<C>,
    tokens: RequestTokens,
}

impl<C: Catalog> Clone for Discovery<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<C: Catalog> Discovery<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            tokens: RequestTokens::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn tokens(&self) -> &RequestTokens {
        &self.tokens
    }

    async fn preference_of(&self, user_id: Option<Uuid>) -> Option<UserPreference> {
        let user_id = user_id?;

        match self.catalog.find_user_preference(user_id).await {
            Ok(preference) => preference,
            Err(e) => {
                log::warn!("> Preference lookup for user {user_id} failed, ignoring it: {e}");
                None
            }
        }
    }

    async fn favorite_counts(&self, sort: Option<SortKey>) -> HashMap<Uuid, i64> {
        if sort != Some(SortKey::Popular) {
            return HashMap::new();
        }

        self.catalog.favorite_counts().await.unwrap_or_else(|e| {
            log::warn!("> Favorite counts unavailable, ranking without them: {e}");
            HashMap::new()
        })
    }

    /// Builds the filter, resolves, scores and ranks candidates for one request.
    ///
    /// Only a resolver failure is returned as an error; preference and
    /// favorite lookups degrade to absent.
    pub async fn search(
        &self,
        form: &Form,
        user_id: Option<Uuid>,
        selection: &Selection,
    ) -> Result<SearchResult, QueryError> {
        let token = self.tokens.issue();

        let preference = match wants_recommendation(form) {
            true => self.preference_of(user_id).await,
            false => None,
        };
        let spec = build_filter_spec(form, preference.as_ref());

        let candidates = resolve_candidates(self.catalog.as_ref(), &spec).await?;
        let favorites = self.favorite_counts(spec.sort()).await;

        let derived;
        let selection = match (&preference, selection.is_empty()) {
            (Some(preference), true) => {
                derived = Selection::from_preference(preference);
                &derived
            }
            _ => selection,
        };

        let scored: Vec<ScoredCocktail> = candidates
            .into_iter()
            .map(|cocktail| {
                let points = score(&cocktail, selection);
                let count = favorites.get(&cocktail.id).copied().unwrap_or(0);
                ScoredCocktail::new(cocktail, points, count)
            })
            .collect();

        let cocktails = rank(scored, spec.sort());
        log::debug!("> Search {token} ranked {} cocktails", cocktails.len());

        Ok(SearchResult {
            cocktails,
            applied: spec,
            token,
        })
    }

    /// Like [`Discovery::search`], but yields `None` when a newer search was issued meanwhile.
    pub async fn search_latest(
        &self,
        form: &Form,
        user_id: Option<Uuid>,
        selection: &Selection,
    ) -> Result<Option<SearchResult>, QueryError> {
        let result = self.search(form, user_id, selection).await?;

        if !self.tokens.is_latest(result.token) {
            log::trace!("> Discarding stale search {}", result.token);
            return Ok(None);
        }
        Ok(Some(result))
    }
}
