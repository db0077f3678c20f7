use serde::Deserialize;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::{
    config::Config,
    constants::SUGGESTION_LIMIT_MAX,
    form::Form,
    jwt::SessionData,
    middleware::with_possible_session,
    resolver::Catalog,
    scorer::Selection,
    search::Discovery,
};

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    search: Option<String>,
    limit: Option<i64>,
}

fn with_discovery<C: Catalog + 'static>(
    discovery: Discovery<C>,
) -> impl Filter<Extract = (Discovery<C>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || discovery.clone())
}

async fn search_cocktails<C: Catalog + 'static>(
    pairs: Vec<(String, String)>,
    session: Option<SessionData>,
    discovery: Discovery<C>,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_pairs(pairs);
    let selection = Selection::from_form(&form);

    let result = discovery
        .search(&form, session.map(|s| s.user_id), &selection)
        .await
        .map_err(|e| -> Rejection { e.into() })?;

    Ok(warp::reply::json(&result))
}

async fn suggest_ingredients<C: Catalog + 'static>(
    query: IngredientQuery,
    default_limit: i64,
    discovery: Discovery<C>,
) -> Result<impl Reply, Rejection> {
    let search = query.search.unwrap_or_default();
    let limit = query.limit.unwrap_or(default_limit).clamp(1, SUGGESTION_LIMIT_MAX);

    if search.trim().is_empty() {
        return Ok(warp::reply::json(&Vec::<String>::new()));
    }

    let items = discovery
        .catalog()
        .search_ingredients(search.trim(), limit)
        .await
        .unwrap_or_else(|e| {
            log::warn!("> Ingredient suggestions unavailable: {e}");
            vec![]
        });

    Ok(warp::reply::json(&items))
}

/// `GET /cocktails` and `GET /ingredients`.
pub fn discovery_routes<C: Catalog + 'static>(
    discovery: Discovery<C>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let default_limit = config.suggestion_limit;

    let cocktails = warp::path!("cocktails")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(with_possible_session(config.session_secret.to_owned()))
        .and(with_discovery(discovery.clone()))
        .and_then(search_cocktails::<C>);

    let ingredients = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(warp::any().map(move || default_limit))
        .and(with_discovery(discovery))
        .and_then(suggest_ingredients::<C>);

    cocktails.or(ingredients)
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::Value;

    use super::*;
    use crate::{
        error::QueryError,
        filter::FilterSpec,
        jwt::tests::sign,
        memory::tests::sample_catalog,
        schema::{CocktailSummary, UserPreference, Uuid},
    };

    fn filter() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        discovery_routes(
            Discovery::new(Arc::new(sample_catalog())),
            &Config::default(),
        )
    }

    fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn cocktails_are_filtered_from_query_pairs() {
        let response = warp::test::request()
            .path("/cocktails?category=Tropical&base=Rum")
            .reply(&filter())
            .await;

        assert_eq!(response.status(), 200);
        let body = body(&response);
        assert_eq!(body["cocktails"].as_array().unwrap().len(), 1);
        assert_eq!(body["cocktails"][0]["name"], "Piña Colada");
        assert_eq!(body["applied"]["clauses"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn session_cookie_enables_recommendations() {
        let token = sign(7, Duration::hours(1), "secret");
        let response = warp::test::request()
            .path("/cocktails?recommended=true")
            .header("cookie", format!("session={token}"))
            .reply(&filter())
            .await;

        let body = body(&response);
        assert_eq!(body["cocktails"].as_array().unwrap().len(), 1);
        assert_eq!(body["cocktails"][0]["score"], 3);
    }

    #[tokio::test]
    async fn ingredient_suggestions_respect_limit() {
        let response = warp::test::request()
            .path("/ingredients?search=E&limit=2")
            .reply(&filter())
            .await;
        assert_eq!(body(&response).as_array().unwrap().len(), 2);

        let response = warp::test::request()
            .path("/ingredients?search=%20")
            .reply(&filter())
            .await;
        assert_eq!(body(&response), serde_json::json!([]));
    }

    struct Broken;

    #[async_trait]
    impl Catalog for Broken {
        async fn find_cocktails(
            &self,
            _spec: &FilterSpec,
        ) -> Result<Vec<CocktailSummary>, QueryError> {
            Err(QueryError::new(String::from("connection refused")))
        }

        async fn find_user_preference(
            &self,
            _user_id: Uuid,
        ) -> Result<Option<UserPreference>, QueryError> {
            Ok(None)
        }

        async fn search_ingredients(
            &self,
            _prefix: &str,
            _limit: i64,
        ) -> Result<Vec<String>, QueryError> {
            Err(QueryError::new(String::from("connection refused")))
        }

        async fn favorite_counts(&self) -> Result<HashMap<Uuid, i64>, QueryError> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn resolver_failure_is_rejected_but_suggestions_degrade() {
        let filter = discovery_routes(Discovery::new(Arc::new(Broken)), &Config::default());

        let response = warp::test::request()
            .path("/cocktails")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 500);

        let response = warp::test::request()
            .path("/ingredients?search=rum")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(body(&response), serde_json::json!([]));
    }
}
