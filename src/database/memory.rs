//! In-memory catalog over raw entity rows.
//!
//! Mirrors the tables the PostgreSQL adapter reads, so the same
//! [`FilterSpec`] semantics can be served without a database.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::QueryError,
    filter::{normalize, FilterSpec},
    resolver::Catalog,
    schema::{
        Attribute, AttributeRow, Cocktail, CocktailIngredient, CocktailSummary, Ingredient,
        UserFavorite, UserPreference, Uuid,
    },
};

#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    cocktails: Vec<Cocktail>,
    attributes: Vec<AttributeRow>,
    ingredients: Vec<Ingredient>,
    cocktail_ingredients: Vec<CocktailIngredient>,
    preferences: Vec<UserPreference>,
    favorites: Vec<UserFavorite>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cocktail(&mut self, cocktail: Cocktail) {
        self.cocktails.retain(|c| c.id != cocktail.id);
        self.cocktails.push(cocktail);
    }

    pub fn add_attribute(&mut self, cocktail_id: Uuid, attribute: Attribute, value: &str) {
        self.attributes.push(AttributeRow {
            cocktail_id,
            attribute,
            value: value.to_string(),
        });
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.retain(|i| i.id != ingredient.id);
        self.ingredients.push(ingredient);
    }

    /// Rejects rows that reference an unknown cocktail or ingredient, or a negative amount.
    pub fn add_to_cocktail(&mut self, part: CocktailIngredient) -> Result<(), QueryError> {
        if !self.cocktails.iter().any(|c| c.id == part.cocktail_id) {
            return Err(QueryError::new(format!("No cocktail {}", part.cocktail_id)));
        }
        if !self.ingredients.iter().any(|i| i.id == part.ingredient_id) {
            return Err(QueryError::new(format!(
                "No ingredient {}",
                part.ingredient_id
            )));
        }
        if part.amount < 0. {
            return Err(QueryError::new(format!("Negative amount {}", part.amount)));
        }

        self.cocktail_ingredients.push(part);
        Ok(())
    }

    pub fn set_preference(&mut self, preference: UserPreference) {
        self.preferences.retain(|p| p.user_id != preference.user_id);
        self.preferences.push(preference);
    }

    pub fn add_favorite(&mut self, user_id: Uuid, cocktail_id: Uuid) {
        if self
            .favorites
            .iter()
            .any(|f| f.user_id == user_id && f.cocktail_id == cocktail_id)
        {
            return;
        }
        self.favorites.push(UserFavorite {
            user_id,
            cocktail_id,
        });
    }

    fn attribute_values(&self, cocktail_id: Uuid, attribute: Attribute) -> Vec<String> {
        match attribute {
            Attribute::Ingredient => self.ingredient_names(cocktail_id),
            attribute => self
                .attributes
                .iter()
                .filter(|row| row.cocktail_id == cocktail_id && row.attribute == attribute)
                .map(|row| row.value.to_owned())
                .collect(),
        }
    }

    fn ingredient_names(&self, cocktail_id: Uuid) -> Vec<String> {
        let mut parts: Vec<&CocktailIngredient> = self
            .cocktail_ingredients
            .iter()
            .filter(|part| part.cocktail_id == cocktail_id)
            .collect();
        parts.sort_by_key(|part| part.order_index);

        parts
            .into_iter()
            .filter_map(|part| {
                self.ingredients
                    .iter()
                    .find(|i| i.id == part.ingredient_id)
                    .map(|i| i.name.to_owned())
            })
            .collect()
    }

    fn summarize(&self, cocktail: &Cocktail) -> CocktailSummary {
        CocktailSummary {
            id: cocktail.id,
            name: cocktail.name.to_owned(),
            slug: cocktail.slug.to_owned(),
            short_description: cocktail.short_description.to_owned(),
            method: cocktail.method.to_owned(),
            difficulty: cocktail.difficulty,
            prep_time_minutes: cocktail.prep_time_minutes,
            created_at: cocktail.created_at,
            ingredients: self.ingredient_names(cocktail.id),
            tags: self.attribute_values(cocktail.id, Attribute::Tag),
            categories: self.attribute_values(cocktail.id, Attribute::Category),
            bases: self.attribute_values(cocktail.id, Attribute::Base),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_cocktails(&self, spec: &FilterSpec) -> Result<Vec<CocktailSummary>, QueryError> {
        let mut cocktails: Vec<&Cocktail> = self.cocktails.iter().collect();
        cocktails.sort_by_key(|c| c.id);

        Ok(cocktails
            .into_iter()
            .filter(|cocktail| {
                let values: HashMap<Attribute, Vec<String>> = spec
                    .clauses()
                    .iter()
                    .map(|clause| {
                        (
                            clause.attribute,
                            self.attribute_values(cocktail.id, clause.attribute),
                        )
                    })
                    .collect();

                spec.matches(|attribute| {
                    values
                        .get(&attribute)
                        .map(|v| v.iter().map(|s| s.as_str()).collect::<Vec<&str>>())
                        .unwrap_or_default()
                })
            })
            .map(|cocktail| self.summarize(cocktail))
            .collect())
    }

    async fn find_user_preference(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserPreference>, QueryError> {
        Ok(self
            .preferences
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn search_ingredients(&self, prefix: &str, limit: i64) -> Result<Vec<String>, QueryError> {
        let needle = normalize(prefix);

        Ok(self
            .ingredients
            .iter()
            .filter(|i| normalize(&i.name).contains(&needle))
            .take(limit.max(0) as usize)
            .map(|i| i.name.to_owned())
            .collect())
    }

    async fn favorite_counts(&self) -> Result<HashMap<Uuid, i64>, QueryError> {
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        self.favorites
            .iter()
            .for_each(|f| *counts.entry(f.cocktail_id).or_insert(0) += 1);

        Ok(counts)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::schema::{Difficulty, Method};

    pub(crate) fn summary(id: Uuid, name: &str, ingredients: &[&str], tags: &[&str]) -> CocktailSummary {
        CocktailSummary {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            short_description: None,
            method: None,
            difficulty: None,
            prep_time_minutes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            categories: vec![],
            bases: vec![],
        }
    }

    fn cocktail(
        id: Uuid,
        name: &str,
        month: u32,
        prep_time_minutes: i32,
        difficulty: Option<Difficulty>,
    ) -> Cocktail {
        Cocktail {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            short_description: None,
            long_description: None,
            glass_type: None,
            method: Some(Method::Shaken),
            prep_time_minutes: Some(prep_time_minutes),
            servings: 1,
            difficulty,
            calories: None,
            is_published: true,
            created_by: None,
            created_at: Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap(),
        }
    }

    fn ingredient(id: Uuid, name: &str) -> Ingredient {
        Ingredient {
            id,
            name: name.to_string(),
            category: String::from("Otro"),
            unit_default: String::from("ml"),
            calories_per_unit: None,
            abv: 0.,
            effects: vec![],
            stock: None,
            reorder_threshold: None,
        }
    }

    fn part(cocktail_id: Uuid, ingredient_id: Uuid, order_index: i32) -> CocktailIngredient {
        CocktailIngredient {
            cocktail_id,
            ingredient_id,
            amount: 30.,
            unit: String::from("ml"),
            note: None,
            order_index,
        }
    }

    /// Mojito (1), Piña Colada (2) and Margarita (3); user 7 has a stored preference.
    pub(crate) fn sample_catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();

        catalog.add_cocktail(cocktail(1, "Mojito", 1, 5, Some(Difficulty::Moderado)));
        catalog.add_cocktail(cocktail(2, "Piña Colada", 3, 4, Some(Difficulty::Facil)));
        catalog.add_cocktail(cocktail(3, "Margarita", 2, 3, None));

        [
            (1, "rum"),
            (2, "lime"),
            (3, "mint"),
            (4, "pineapple"),
            (5, "coconut cream"),
            (6, "tequila"),
            (7, "triple sec"),
        ]
        .into_iter()
        .for_each(|(id, name)| catalog.add_ingredient(ingredient(id, name)));

        [
            (1, 1, 1),
            (1, 2, 2),
            (1, 3, 3),
            (2, 1, 1),
            (2, 4, 2),
            (2, 5, 3),
            (3, 6, 1),
            (3, 7, 2),
            (3, 2, 3),
        ]
        .into_iter()
        .for_each(|(c, i, o)| catalog.add_to_cocktail(part(c, i, o)).unwrap());

        catalog.add_attribute(1, Attribute::Category, "Refrescante");
        catalog.add_attribute(1, Attribute::Base, "Rum");
        catalog.add_attribute(1, Attribute::Tag, "Fresh");
        catalog.add_attribute(1, Attribute::Tag, "Citrus");
        catalog.add_attribute(2, Attribute::Category, "Tropical");
        catalog.add_attribute(2, Attribute::Base, "Rum");
        catalog.add_attribute(2, Attribute::Tag, "Sweet");
        catalog.add_attribute(3, Attribute::Category, "Tropical");
        catalog.add_attribute(3, Attribute::Category, "Clásico");
        catalog.add_attribute(3, Attribute::Base, "Tequila");
        catalog.add_attribute(3, Attribute::Tag, "Citrus");

        catalog.set_preference(UserPreference {
            user_id: 7,
            prefers_sweet: true,
            preferred_categories: vec![String::from("Tropical")],
            preferred_ingredients: vec![String::from("rum")],
            ..Default::default()
        });

        catalog.add_favorite(1, 3);
        catalog.add_favorite(2, 3);
        catalog.add_favorite(2, 1);

        catalog
    }

    #[tokio::test]
    async fn summaries_list_ingredients_in_display_order() {
        let catalog = sample_catalog();
        let all = catalog.find_cocktails(&FilterSpec::default()).await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].ingredients, vec!["rum", "lime", "mint"]);
        assert_eq!(all[2].categories, vec!["Tropical", "Clásico"]);
    }

    #[tokio::test]
    async fn rows_must_reference_existing_entities() {
        let mut catalog = sample_catalog();

        assert!(catalog.add_to_cocktail(part(99, 1, 1)).is_err());
        assert!(catalog.add_to_cocktail(part(1, 99, 1)).is_err());

        let mut negative = part(1, 4, 4);
        negative.amount = -1.;
        assert!(catalog.add_to_cocktail(negative).is_err());
    }

    #[tokio::test]
    async fn ingredient_search_is_case_insensitive_substring() {
        let catalog = sample_catalog();

        let found = catalog.search_ingredients("RU", 10).await.unwrap();
        assert_eq!(found, vec!["rum"]);

        let limited = catalog.search_ingredients("e", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn favorites_are_counted_once_per_user() {
        let mut catalog = sample_catalog();
        catalog.add_favorite(1, 3);

        let counts = catalog.favorite_counts().await.unwrap();
        assert_eq!(counts.get(&3), Some(&2));
        assert_eq!(counts.get(&1), Some(&1));
        assert_eq!(counts.get(&2), None);
    }
}
