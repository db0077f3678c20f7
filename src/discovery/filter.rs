//! Attribute predicate builder.
//!
//! Raw request parameters are folded once into an immutable [`FilterSpec`].
//! Storage adapters translate the specification into their own query language;
//! [`FilterSpec::matches`] is the reference semantics they must agree with.
//!
//! Rules per dimension:
//! - `category`, `base`, `aromatic`, `garnish`, `effect`: exact match
//! - `tags`: OR, the cocktail carries at least one requested tag
//! - `ingredients`: AND, the cocktail uses every requested ingredient
//!
//! Clauses are ANDed together. Malformed or blank values never fail a request,
//! they are dropped.

use serde::Serialize;

use crate::{
    form::Form,
    schema::{Attribute, SortKey, UserPreference},
};

const EXACT_DIMENSIONS: &[(&str, Attribute)] = &[
    ("category", Attribute::Category),
    ("base", Attribute::Base),
    ("aromatic", Attribute::Aromatic),
    ("garnish", Attribute::Garnish),
    ("effect", Attribute::Effect),
];

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Keeps the first spelling of every value, comparing case-insensitively.
fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = vec![];

    values
        .into_iter()
        .filter(|value| {
            let key = normalize(value);
            if key.is_empty() || seen.contains(&key) {
                return false;
            }
            seen.push(key);
            true
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", content = "values", rename_all = "snake_case")]
pub enum Predicate {
    Exact(String),
    AnyOf(Vec<String>),
    AllOf(Vec<String>),
}

impl Predicate {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Predicate::Exact(value) => vec![value.as_str()],
            Predicate::AnyOf(values) | Predicate::AllOf(values) => {
                values.iter().map(|v| v.as_str()).collect()
            }
        }
    }

    pub fn normalized(&self) -> Vec<String> {
        self.values().into_iter().map(normalize).collect()
    }

    pub fn matches<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<String> = values.into_iter().map(normalize).collect();
        let requested = self.normalized();

        match self {
            Predicate::Exact(_) | Predicate::AnyOf(_) => {
                requested.iter().any(|r| values.contains(r))
            }
            Predicate::AllOf(_) => requested.iter().all(|r| values.contains(r)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseSource {
    Explicit,
    Preference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub attribute: Attribute,
    pub predicate: Predicate,
    pub source: ClauseSource,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterSpec {
    clauses: Vec<Clause>,
    sort: Option<SortKey>,
    recommended: bool,
}

impl FilterSpec {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }

    pub fn recommended(&self) -> bool {
        self.recommended
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// `values_of` yields a cocktail's stored values for an attribute.
    pub fn matches<'a, F, I>(&self, values_of: F) -> bool
    where
        F: Fn(Attribute) -> I,
        I: IntoIterator<Item = &'a str>,
    {
        self.clauses
            .iter()
            .all(|clause| clause.predicate.matches(values_of(clause.attribute)))
    }
}

/// Reads only the `recommended` flag, so the caller knows whether a preference lookup is needed.
pub fn wants_recommendation(form: &Form) -> bool {
    form.get_bool("recommended").unwrap_or(false)
}

pub fn build_filter_spec(form: &Form, preference: Option<&UserPreference>) -> FilterSpec {
    let mut clauses: Vec<Clause> = vec![];

    EXACT_DIMENSIONS.iter().for_each(|(key, attribute)| {
        match form.get_str(key) {
            Ok(value) => clauses.push(Clause {
                attribute: *attribute,
                predicate: Predicate::Exact(value),
                source: ClauseSource::Explicit,
            }),
            Err(e) => log::trace!("> Dropping {key} {e}"),
        }
    });

    let tags = distinct(form.get_list("tags"));
    if !tags.is_empty() {
        clauses.push(Clause {
            attribute: Attribute::Tag,
            predicate: Predicate::AnyOf(tags),
            source: ClauseSource::Explicit,
        });
    }

    let ingredients = distinct(form.get_list("ingredients"));
    if !ingredients.is_empty() {
        clauses.push(Clause {
            attribute: Attribute::Ingredient,
            predicate: Predicate::AllOf(ingredients),
            source: ClauseSource::Explicit,
        });
    }

    let recommended = wants_recommendation(form);
    if let (true, Some(preference)) = (recommended, preference) {
        let categories = distinct(preference.preferred_categories.to_owned());
        if !categories.is_empty() {
            clauses.push(Clause {
                attribute: Attribute::Category,
                predicate: Predicate::AnyOf(categories),
                source: ClauseSource::Preference,
            });
        }

        let ingredients = distinct(preference.preferred_ingredients.to_owned());
        if !ingredients.is_empty() {
            clauses.push(Clause {
                attribute: Attribute::Ingredient,
                predicate: Predicate::AllOf(ingredients),
                source: ClauseSource::Preference,
            });
        }
    }

    // Last valid directive wins
    let sort = form.get_all::<SortKey>("sort").into_iter().last();

    FilterSpec {
        clauses,
        sort,
        recommended,
    }
}
