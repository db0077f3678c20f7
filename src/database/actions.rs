use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder};

use super::{
    error::{CacheError, QueryError},
    schema::{Attribute, CocktailSummary, UserPreference, Uuid},
};
use crate::{
    cache::cache::{open_cache, CacheKeyType, CacheLifetime, RedisValue},
    config::Config,
    filter::{Clause, FilterSpec, Predicate},
    resolver::Catalog,
};

const COCKTAIL_SUMMARY_SELECT: &str = "
    SELECT c.id, c.name, c.slug, c.short_description, c.method, c.difficulty, c.prep_time_minutes, c.created_at,
        COALESCE((SELECT array_agg(i.name ORDER BY ci.order_index) FROM cocktail_ingredients ci INNER JOIN ingredients i ON i.id = ci.ingredient_id WHERE ci.cocktail_id = c.id), '{}')::TEXT[] AS ingredients,
        COALESCE((SELECT array_agg(t.tag) FROM cocktail_tags t WHERE t.cocktail_id = c.id), '{}')::TEXT[] AS tags,
        COALESCE((SELECT array_agg(cc.category) FROM cocktail_categories cc WHERE cc.cocktail_id = c.id), '{}')::TEXT[] AS categories,
        COALESCE((SELECT array_agg(b.base) FROM cocktail_bases b WHERE b.cocktail_id = c.id), '{}')::TEXT[] AS bases
    FROM cocktails c
    WHERE TRUE";

/// Table expression and value column holding an attribute set.
fn attribute_source(attribute: Attribute) -> (&'static str, &'static str) {
    match attribute {
        Attribute::Category => ("cocktail_categories a", "a.category"),
        Attribute::Base => ("cocktail_bases a", "a.base"),
        Attribute::Aromatic => ("cocktail_aromatics a", "a.aromatic"),
        Attribute::Garnish => ("cocktail_garnish a", "a.garnish"),
        Attribute::Effect => ("cocktail_effects a", "a.effect"),
        Attribute::Tag => ("cocktail_tags a", "a.tag"),
        Attribute::Ingredient => (
            "cocktail_ingredients a INNER JOIN ingredients i ON i.id = a.ingredient_id",
            "i.name",
        ),
    }
}

fn push_clause(query: &mut QueryBuilder<'static, Postgres>, clause: &Clause) {
    let (source, column) = attribute_source(clause.attribute);
    let values = clause.predicate.normalized();

    match clause.predicate {
        Predicate::Exact(_) | Predicate::AnyOf(_) => {
            query.push(format!(
                " AND EXISTS (SELECT 1 FROM {source} WHERE a.cocktail_id = c.id AND LOWER(TRIM({column})) = ANY("
            ));
            query.push_bind(values);
            query.push("))");
        }
        Predicate::AllOf(_) => {
            let count = values.len() as i64;
            query.push(format!(
                " AND (SELECT COUNT(DISTINCT LOWER(TRIM({column}))) FROM {source} WHERE a.cocktail_id = c.id AND LOWER(TRIM({column})) = ANY("
            ));
            query.push_bind(values);
            query.push(")) = ");
            query.push_bind(count);
        }
    }
}

/// Translates a filter specification into one query; `EXISTS` keeps every cocktail to a single row.
pub fn build_cocktail_query(spec: &FilterSpec) -> QueryBuilder<'static, Postgres> {
    let mut query: QueryBuilder<'static, Postgres> = QueryBuilder::new(COCKTAIL_SUMMARY_SELECT);

    spec.clauses()
        .iter()
        .for_each(|clause| push_clause(&mut query, clause));

    query.push(" ORDER BY c.id");
    query
}

pub async fn find_cocktails(
    spec: &FilterSpec,
    pool: &Pool<Postgres>,
) -> Result<Vec<CocktailSummary>, QueryError> {
    let rows: Vec<CocktailSummary> = build_cocktail_query(spec)
        .build_query_as()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn find_user_preference(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<UserPreference>, QueryError> {
    let row: Option<UserPreference> = sqlx::query_as(
        "
        SELECT user_id,
            COALESCE(prefers_sweet, FALSE) AS prefers_sweet,
            COALESCE(prefers_bitter, FALSE) AS prefers_bitter,
            COALESCE(prefers_citrus, FALSE) AS prefers_citrus,
            COALESCE(prefers_strong, FALSE) AS prefers_strong,
            COALESCE(prefers_low_abv, FALSE) AS prefers_low_abv,
            COALESCE(preferred_categories, '{}')::TEXT[] AS preferred_categories,
            COALESCE(preferred_ingredients, '{}')::TEXT[] AS preferred_ingredients
        FROM user_preferences
        WHERE user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// `%` and `_` in user input are matched literally.
fn like_pattern(prefix: &str) -> String {
    let escaped = prefix
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}

pub async fn search_ingredients(
    prefix: &str,
    limit: i64,
    pool: &Pool<Postgres>,
) -> Result<Vec<String>, QueryError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT name FROM ingredients WHERE name ILIKE $1 ORDER BY name LIMIT $2")
            .bind(like_pattern(prefix))
            .bind(limit)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn favorite_counts(pool: &Pool<Postgres>) -> Result<HashMap<Uuid, i64>, QueryError> {
    let rows: Vec<(Uuid, i64)> = sqlx::query_as(
        "SELECT cocktail_id, COUNT(DISTINCT user_id) FROM user_favorites GROUP BY cocktail_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// PostgreSQL backed catalog. Favorite counts and ingredient suggestions go through redis when configured.
#[derive(Clone)]
pub struct PgCatalog {
    pool: Pool<Postgres>,
    cache: Option<MultiplexedConnection>,
}

impl PgCatalog {
    pub fn new(pool: Pool<Postgres>, cache: Option<MultiplexedConnection>) -> Self {
        Self { pool, cache }
    }

    pub async fn connect(config: &Config) -> Result<Self, QueryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        let cache = match &config.redis_url {
            Some(url) => match open_cache(url).await {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log::error!("> Cache unavailable, continuing without it: {e}");
                    None
                }
            },
            None => None,
        };

        Ok(Self::new(pool, cache))
    }

    /// Drops cached favorite counts and suggestions after the underlying tables changed.
    pub async fn invalidate_cache(&self) -> Result<(), CacheError> {
        let Some(mut cache) = self.cache.clone() else {
            return Ok(());
        };

        CacheLifetime::BindFavoriteCache.rebind(&mut cache).await?;
        CacheLifetime::BindIngredientCache.rebind(&mut cache).await
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn find_cocktails(&self, spec: &FilterSpec) -> Result<Vec<CocktailSummary>, QueryError> {
        find_cocktails(spec, &self.pool).await
    }

    async fn find_user_preference(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserPreference>, QueryError> {
        find_user_preference(user_id, &self.pool).await
    }

    async fn search_ingredients(&self, prefix: &str, limit: i64) -> Result<Vec<String>, QueryError> {
        let Some(mut cache) = self.cache.clone() else {
            return search_ingredients(prefix, limit, &self.pool).await;
        };

        let pool = self.pool.clone();
        let prefix = prefix.trim().to_lowercase();
        let key = CacheKeyType::Ingredient.new(format!("{prefix}-{limit}"));

        RedisValue::get_or(key, &mut cache, move || async move {
            search_ingredients(&prefix, limit, &pool).await
        })
        .await
    }

    async fn favorite_counts(&self) -> Result<HashMap<Uuid, i64>, QueryError> {
        let Some(mut cache) = self.cache.clone() else {
            return favorite_counts(&self.pool).await;
        };

        let pool = self.pool.clone();
        let key = CacheKeyType::Favorites.new("counts");

        RedisValue::get_or(key, &mut cache, move || async move {
            favorite_counts(&pool).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::build_filter_spec, form::Form};

    #[test]
    fn empty_spec_selects_every_cocktail() {
        let query = build_cocktail_query(&FilterSpec::default());

        assert!(query.sql().ends_with("WHERE TRUE ORDER BY c.id"));
        assert!(!query.sql().contains("$1"));
    }

    #[test]
    fn clauses_become_bound_sub_selects() {
        let form = Form::from_pairs(vec![
            ("category", "Tropical"),
            ("tags[]", "Citrus"),
            ("tags[]", "Sweet"),
            ("ingredients[]", "rum"),
            ("ingredients[]", "lime"),
        ]);
        let query = build_cocktail_query(&build_filter_spec(&form, None));
        let sql = query.sql();

        assert!(sql.contains(
            "EXISTS (SELECT 1 FROM cocktail_categories a WHERE a.cocktail_id = c.id AND LOWER(TRIM(a.category)) = ANY($1))"
        ));
        assert!(sql.contains(
            "EXISTS (SELECT 1 FROM cocktail_tags a WHERE a.cocktail_id = c.id AND LOWER(TRIM(a.tag)) = ANY($2))"
        ));
        assert!(sql.contains("COUNT(DISTINCT LOWER(TRIM(i.name)))"));
        assert!(sql.contains("= ANY($3)) = $4"));
        assert!(!sql.contains("Tropical"));
    }

    #[test]
    fn exact_dimensions_read_their_own_tables() {
        let form = Form::from_pairs(vec![
            ("aromatic", "Menta"),
            ("garnish", "Rodaja de lima"),
            ("effect", "Energizante"),
        ]);
        let query = build_cocktail_query(&build_filter_spec(&form, None));
        let sql = query.sql();

        assert!(sql.contains("FROM cocktail_aromatics a WHERE"));
        assert!(sql.contains("FROM cocktail_garnish a WHERE"));
        assert!(sql.contains("FROM cocktail_effects a WHERE"));
        assert!(sql.contains("= ANY($3))"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern(" ron "), "%ron%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
