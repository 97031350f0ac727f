use crate::{RowLabeled, RowNames, Value};
use std::fmt;

/// Column name to value map preserving insertion order.
///
/// `Value::Null` (or any typed null) marks a null column. Inserting an existing
/// column replaces its value in place.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set `column`, returning the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == column) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    /// Builder form of [`Fields::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let i = self.entries.iter().position(|(k, _)| k == column)?;
        Some(self.entries.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &str> + Clone {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// The same data as a labeled row, as if read back from the store.
    pub fn to_row(&self) -> RowLabeled {
        let labels: RowNames = self.columns().map(ToOwned::to_owned).collect();
        RowLabeled::new(labels, self.values().cloned().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut result = Fields::new();
        result.extend(iter);
        result
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Row;

    #[test]
    fn insertion_order_and_replace() {
        let mut fields = Fields::new().with("b", 1).with("a", "x");
        assert_eq!(fields.columns().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(fields.insert("b", 2), Some(Value::Int(Some(1))));
        assert_eq!(fields.columns().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(fields.get("b"), Some(&Value::Int(Some(2))));
        assert_eq!(fields.remove("a"), Some(Value::Text(Some("x".into()))));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.to_string(), "{b: 2}");
    }

    #[test]
    fn as_row() {
        let fields: Fields = [("id", Value::Int(Some(1))), ("bio", Value::Null)]
            .into_iter()
            .collect();
        let row = fields.to_row();
        assert!(row.contains("id"));
        assert!(row.is_null("bio"));
    }
}
