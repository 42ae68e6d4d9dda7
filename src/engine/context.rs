// SPDX-License-Identifier: MIT

//! Answer context for condition evaluation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::Value;

/// Evolving key-value store of answers.
///
/// Additive only: values are inserted or overwritten, never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any previous answer for the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Merge every entry of `other` into this context
    pub fn extend(&mut self, other: &Context) {
        for (k, v) in &other.fields {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a value, treating an absent key as `Null`
    pub fn get_or_null(&self, key: &str) -> Value {
        self.fields.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get all field names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Convert context to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or_default()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (k, v) in iter {
            context.insert(k, v);
        }
        context
    }
}

impl IntoIterator for Context {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_context() {
        let context = Context::new();
        assert!(context.get("anything").is_none());
        assert_eq!(context.get_or_null("anything"), Value::Null);
        assert!(context.is_empty());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut context = Context::new();

        context.insert("tipo_opinion", "favorable");
        assert_eq!(context.get("tipo_opinion"), Some(&Value::from("favorable")));

        context.insert("tipo_opinion", "adversa");
        assert_eq!(context.get("tipo_opinion"), Some(&Value::from("adversa")));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_extend_keeps_existing_keys() {
        let mut context: Context = [("a", 1), ("b", 2)].into_iter().collect();
        let other: Context = [("b", 20), ("c", 30)].into_iter().collect();

        context.extend(&other);

        assert_eq!(context.get("a"), Some(&Value::from(1)));
        assert_eq!(context.get("b"), Some(&Value::from(20)));
        assert_eq!(context.get("c"), Some(&Value::from(30)));
    }

    #[test]
    fn test_to_json() {
        let mut context = Context::new();
        context.insert("importe", 1500);
        context.insert("entidad", "ACME S.A.");

        let json = context.to_json();
        assert_eq!(json, json!({"importe": 1500, "entidad": "ACME S.A."}));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
            tipo_opinion: favorable
            ejercicio: 2024
            fecha_cierre: 2024-12-31
            con_salvedades: false
        "#;
        let context: Context = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(context.len(), 4);
        assert_eq!(context.get("ejercicio"), Some(&Value::from(2024)));
        assert!(matches!(context.get("fecha_cierre"), Some(Value::Date(_))));
        assert_eq!(context.get("con_salvedades"), Some(&Value::Bool(false)));
    }
}
