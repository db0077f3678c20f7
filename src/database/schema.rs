use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Uuid = i32;

#[derive(Clone, Debug, PartialEq, sqlx::Type, Serialize, Deserialize, Eq, Hash)]
#[sqlx(type_name = "cocktail_method")]
pub enum Method {
    Shaken,
    Stirred,
    Muddled,
    Blended,
    Built,
    Layered,
}

impl TryFrom<Value> for Method {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "shaken" => Ok(Self::Shaken),
                "stirred" => Ok(Self::Stirred),
                "muddled" => Ok(Self::Muddled),
                "blended" => Ok(Self::Blended),
                "built" => Ok(Self::Built),
                "layered" => Ok(Self::Layered),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

/// Ordinal order is the preparation order: `Facil < Moderado < Avanzado`.
#[derive(
    Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash,
)]
#[sqlx(type_name = "cocktail_difficulty")]
pub enum Difficulty {
    #[sqlx(rename = "Fácil")]
    #[serde(rename = "Fácil")]
    Facil,
    Moderado,
    Avanzado,
}

impl TryFrom<Value> for Difficulty {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "fácil" | "facil" => Ok(Self::Facil),
                "moderado" => Ok(Self::Moderado),
                "avanzado" => Ok(Self::Avanzado),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Recent,
    PrepTime,
    Difficulty,
    Popular,
    Recommended,
}

impl TryFrom<Value> for SortKey {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value.trim() {
                "recent" => Ok(Self::Recent),
                "prep_time" => Ok(Self::PrepTime),
                "difficulty" => Ok(Self::Difficulty),
                "popular" => Ok(Self::Popular),
                "recommended" => Ok(Self::Recommended),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

/// Categorical facets a cocktail can be filtered on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Category,
    Base,
    Aromatic,
    Garnish,
    Effect,
    Tag,
    Ingredient,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Cocktail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub glass_type: Option<String>,
    pub method: Option<Method>,
    pub prep_time_minutes: Option<i32>,
    pub servings: i32,
    pub difficulty: Option<Difficulty>,
    pub calories: Option<i32>,
    pub is_published: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One row of an attribute set (`cocktail_categories`, `cocktail_tags`, ...).
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRow {
    pub cocktail_id: Uuid,
    pub attribute: Attribute,
    pub value: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub unit_default: String,
    pub calories_per_unit: Option<f64>,
    pub abv: f64,
    pub effects: Vec<String>,
    pub stock: Option<f64>,
    pub reorder_threshold: Option<f64>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CocktailIngredient {
    pub cocktail_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: f64,
    pub unit: String,
    pub note: Option<String>,
    pub order_index: i32,
}

#[derive(sqlx::FromRow, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserPreference {
    pub user_id: Uuid,
    pub prefers_sweet: bool,
    pub prefers_bitter: bool,
    pub prefers_citrus: bool,
    pub prefers_strong: bool,
    pub prefers_low_abv: bool,
    pub preferred_categories: Vec<String>,
    pub preferred_ingredients: Vec<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserFavorite {
    pub user_id: Uuid,
    pub cocktail_id: Uuid,
}

/// A cocktail together with the attribute sets the discovery engine works on.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocktailSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub method: Option<Method>,
    pub difficulty: Option<Difficulty>,
    pub prep_time_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,

    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub bases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn difficulty_orders_by_preparation_effort() {
        assert!(Difficulty::Facil < Difficulty::Moderado);
        assert!(Difficulty::Moderado < Difficulty::Avanzado);
    }

    #[test]
    fn difficulty_accepts_accented_and_plain_spelling() {
        assert_eq!(Difficulty::try_from(json!("Fácil")).ok(), Some(Difficulty::Facil));
        assert_eq!(Difficulty::try_from(json!("facil")).ok(), Some(Difficulty::Facil));
        assert!(Difficulty::try_from(json!("imposible")).is_err());
    }

    #[test]
    fn sort_key_rejects_unknown_and_non_string_values() {
        assert_eq!(SortKey::try_from(json!("prep_time")).ok(), Some(SortKey::PrepTime));
        assert!(SortKey::try_from(json!("price_asc")).is_err());
        assert!(SortKey::try_from(json!(3)).is_err());
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!(Method::try_from(json!("SHAKEN")).ok(), Some(Method::Shaken));
    }
}
