//! Bucket tags and the tag filter.
//!
//! User-supplied tags arrive as loosely-typed JSON. [`TagSet::filter`] keeps
//! the well-formed `{ "Key": string, "Value": string }` entries, in order, and
//! collapses an empty result to `None`: S3 cannot represent an empty tag set,
//! so "nothing configured" and "empty list configured" mean the same thing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single bucket tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a tag from a key and value.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A non-empty, ordered list of bucket tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    /// Build a tag set, returning `None` when `tags` is empty.
    #[must_use]
    pub fn new(tags: Vec<Tag>) -> Option<Self> {
        if tags.is_empty() { None } else { Some(Self(tags)) }
    }

    /// Keep the well-formed tags of an arbitrary JSON value.
    ///
    /// Non-array input yields `None`. Array elements survive only if they are
    /// objects whose `Key` and `Value` fields are both strings; anything else
    /// is dropped silently. Extra fields on a kept element are discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use deploybucket_model::TagSet;
    /// use serde_json::json;
    ///
    /// let tags = TagSet::filter(&json!([
    ///     { "Key": "team", "Value": "platform" },
    ///     { "Key": "broken" },
    /// ]))
    /// .unwrap();
    /// assert_eq!(tags.len(), 1);
    /// assert!(TagSet::filter(&json!("not-a-list")).is_none());
    /// ```
    #[must_use]
    pub fn filter(input: &Value) -> Option<Self> {
        let Value::Array(items) = input else {
            return None;
        };

        let tags = items
            .iter()
            .filter_map(|item| {
                let key = item.get("Key")?.as_str()?;
                let value = item.get("Value")?.as_str()?;
                Some(Tag::new(key, value))
            })
            .collect();

        Self::new(tags)
    }

    /// The tags in their configured order.
    #[must_use]
    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tags in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    /// Whether `observed` holds the same tags, ignoring order.
    ///
    /// S3 does not guarantee it returns tags in the order they were written.
    #[must_use]
    pub fn matches(&self, observed: &[Tag]) -> bool {
        if observed.len() != self.0.len() {
            return false;
        }
        let mut desired = self.0.clone();
        let mut observed = observed.to_vec();
        desired.sort();
        observed.sort();
        desired == observed
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_return_none_for_non_array_input() {
        for input in [
            json!(null),
            json!(42),
            json!("tags"),
            json!(true),
            json!({ "Key": "a", "Value": "b" }),
        ] {
            assert!(TagSet::filter(&input).is_none(), "{input} should be absent");
        }
    }

    #[test]
    fn test_should_return_none_when_every_element_is_invalid() {
        let input = json!([
            null,
            "Key=Value",
            { "Key": "only-key" },
            { "Value": "only-value" },
            { "Key": 1, "Value": "numeric key" },
            { "Key": "numeric value", "Value": 2 },
            { "key": "lowercase", "value": "fields" },
        ]);
        assert!(TagSet::filter(&input).is_none());
    }

    #[test]
    fn test_should_return_none_for_empty_array() {
        assert!(TagSet::filter(&json!([])).is_none());
    }

    #[test]
    fn test_should_keep_valid_tags_in_order() {
        let input = json!([
            { "Key": "b", "Value": "2" },
            { "Key": "broken" },
            { "Key": "a", "Value": "1", "Extra": true },
            { "Key": "", "Value": "" },
        ]);
        let tags = TagSet::filter(&input).expect("valid tags present");
        assert_eq!(
            tags.as_slice(),
            &[Tag::new("b", "2"), Tag::new("a", "1"), Tag::new("", "")]
        );
    }

    #[test]
    fn test_should_serialize_with_pascal_case_fields() {
        let tags = TagSet::new(vec![Tag::new("env", "prod")]).expect("non-empty");
        let json = serde_json::to_value(&tags).expect("test serialization");
        assert_eq!(json, json!([{ "Key": "env", "Value": "prod" }]));
    }

    #[test]
    fn test_should_match_tags_regardless_of_order() {
        let tags = TagSet::new(vec![Tag::new("a", "1"), Tag::new("b", "2")]).expect("non-empty");
        assert!(tags.matches(&[Tag::new("b", "2"), Tag::new("a", "1")]));
        assert!(!tags.matches(&[Tag::new("a", "1")]));
        assert!(!tags.matches(&[Tag::new("a", "1"), Tag::new("b", "3")]));
        assert!(!tags.matches(&[]));
    }

    #[test]
    fn test_should_refuse_empty_tag_set() {
        assert!(TagSet::new(Vec::new()).is_none());
    }
}
