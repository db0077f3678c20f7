use std::collections::HashMap;

use serde_json::Value;

use super::error::TypeError;

/// Raw request parameters. Repeated keys and `key[]` keys collect into arrays.
#[derive(Debug, Clone, Default)]
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut inner: HashMap<String, Value> = HashMap::new();

        pairs.into_iter().for_each(|(key, value)| {
            let key = key.as_ref().trim_end_matches("[]").to_string();
            let value = Value::String(value.into());

            match inner.get_mut(&key) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    inner.insert(key, value);
                }
            }
        });

        Self { inner }
    }

    /// Every convertible value under `key`, in the order given. Invalid entries are skipped.
    pub fn get_all<T>(&self, key: &str) -> Vec<T>
    where
        T: TryFrom<Value>,
    {
        self.values(key)
            .into_iter()
            .filter_map(|value| T::try_from(value.to_owned()).ok())
            .collect()
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.last(key) {
            Some(value) => match value.as_str() {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                Some(_) => Err(TypeError::new("Empty value")),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, TypeError> {
        match self.last(key) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(v)) => match v.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(TypeError::new("Invalid boolean")),
            },
            Some(_) => Err(TypeError::new("Invalid boolean")),
            None => Err(TypeError::new("Invalid key")),
        }
    }

    /// String values under `key`; comma separated entries are split, blanks dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.values(key)
            .into_iter()
            .filter_map(|value| value.as_str())
            .flat_map(|value| value.split(','))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .collect()
    }

    fn values(&self, key: &str) -> Vec<&Value> {
        match self.inner.get(key) {
            Some(Value::Array(values)) => values.iter().collect(),
            Some(value) => vec![value],
            None => vec![],
        }
    }

    fn last(&self, key: &str) -> Option<&Value> {
        self.values(key).into_iter().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_and_bracketed_keys_collect_in_order() {
        let form = Form::from_pairs(vec![
            ("tags[]", "Citrus"),
            ("tags[]", "Sweet"),
            ("tags", "Fresh, Dry"),
        ]);

        assert_eq!(form.get_list("tags"), vec!["Citrus", "Sweet", "Fresh", "Dry"]);
    }

    #[test]
    fn single_valued_keys_take_the_last_value() {
        let form = Form::from_pairs(vec![("category", "Tropical"), ("category", "Clásico")]);
        assert_eq!(form.get_str("category").ok(), Some(String::from("Clásico")));
    }

    #[test]
    fn blank_values_are_rejected() {
        let form = Form::from_pairs(vec![("base", "   "), ("ingredients", " , ,")]);
        assert!(form.get_str("base").is_err());
        assert!(form.get_list("ingredients").is_empty());
    }

    #[test]
    fn booleans_parse_from_strings() {
        let form = Form::from_pairs(vec![("recommended", "TRUE"), ("draft", " off ")]);
        assert_eq!(form.get_bool("recommended").ok(), Some(true));
        assert_eq!(form.get_bool("draft").ok(), Some(false));
        assert!(form.get_bool("missing").is_err());
    }
}
