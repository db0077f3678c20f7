use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    constants::FLAVOR_FLAGS,
    filter::normalize,
    form::Form,
    schema::{CocktailSummary, UserPreference},
};

/// Ingredients and flavors the caller picked in the current search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    ingredients: BTreeSet<String>,
    flavors: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, F>(ingredients: I, flavors: F) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let collect = |values: Vec<String>| -> BTreeSet<String> {
            values
                .into_iter()
                .map(|v| normalize(&v))
                .filter(|v| !v.is_empty())
                .collect()
        };

        Self {
            ingredients: collect(ingredients.into_iter().map(|v| v.as_ref().to_string()).collect()),
            flavors: collect(flavors.into_iter().map(|v| v.as_ref().to_string()).collect()),
        }
    }

    /// Preferred ingredients plus the flavor tag of every raised preference flag.
    pub fn from_preference(preference: &UserPreference) -> Self {
        let flags = [
            preference.prefers_sweet,
            preference.prefers_bitter,
            preference.prefers_citrus,
            preference.prefers_strong,
            preference.prefers_low_abv,
        ];

        let flavors: Vec<&str> = FLAVOR_FLAGS
            .iter()
            .zip(flags)
            .filter(|(_, raised)| *raised)
            .map(|((_, tag), _)| *tag)
            .collect();

        Self::new(&preference.preferred_ingredients, flavors)
    }

    /// Reads the ad hoc selection from `selected_ingredients` and `flavors`.
    pub fn from_form(form: &Form) -> Self {
        Self::new(
            form.get_list("selected_ingredients"),
            form.get_list("flavors"),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.flavors.is_empty()
    }

    pub fn ingredients(&self) -> &BTreeSet<String> {
        &self.ingredients
    }

    pub fn flavors(&self) -> &BTreeSet<String> {
        &self.flavors
    }
}

fn overlap(selected: &BTreeSet<String>, values: &[String]) -> u32 {
    let values: BTreeSet<String> = values.iter().map(|v| normalize(v)).collect();
    selected.intersection(&values).count() as u32
}

/// `2 × shared ingredients + shared flavor tags`.
pub fn score(cocktail: &CocktailSummary, selection: &Selection) -> u32 {
    2 * overlap(&selection.ingredients, &cocktail.ingredients)
        + overlap(&selection.flavors, &cocktail.tags)
}
