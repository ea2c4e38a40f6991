use serde::{Deserialize, Deserializer, Serialize};
use std::ops::Deref;

/// A content value that may be written as a single item or as a list.
///
/// `"met_rook"` and `["met_rook"]` both load as a one-element list, so
/// predicate and effect handlers only ever see a slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OneOrMany<T>(pub Vec<T>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawOneOrMany::deserialize(deserializer)? {
            RawOneOrMany::One(item) => OneOrMany(vec![item]),
            RawOneOrMany::Many(items) => OneOrMany(items),
        })
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Deref for OneOrMany<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_becomes_one_element() {
        let v: OneOrMany<String> = ron::from_str(r#""met_rook""#).unwrap();
        assert_eq!(v.0, vec!["met_rook".to_string()]);
    }

    #[test]
    fn list_is_kept_in_order() {
        let v: OneOrMany<String> = ron::from_str(r#"["b", "a"]"#).unwrap();
        assert_eq!(v.into_vec(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn default_is_empty() {
        let v: OneOrMany<String> = OneOrMany::default();
        assert!(v.is_empty());
    }
}
