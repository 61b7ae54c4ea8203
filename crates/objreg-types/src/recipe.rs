use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// Structured input from which a factory reconstructs an object.
///
/// A recipe is an ordered mapping of block names to JSON bodies. Block order
/// is preserved through serialization so a written recipe reads back
/// exactly as it was produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    blocks: IndexMap<String, Value>,
}

impl Recipe {
    /// Create an empty recipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Recipe::insert`].
    pub fn with_block(mut self, name: impl Into<String>, body: impl Into<Value>) -> Self {
        self.insert(name, body);
        self
    }

    /// Set a block. An existing block of the same name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<Value>) {
        self.blocks.insert(name.into(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.blocks.get(name)
    }

    /// Decode a block into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<T, TypeError> {
        let body = self
            .blocks
            .get(name)
            .ok_or_else(|| TypeError::MissingBlock(name.to_string()))?;
        T::deserialize(body).map_err(|e| TypeError::InvalidBlock {
            block: name.to_string(),
            reason: e.to_string(),
        })
    }

    /// Blocks in insertion order.
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.blocks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn blocks_keep_insertion_order() {
        let recipe = Recipe::new()
            .with_block("zeta", 1)
            .with_block("alpha", 2)
            .with_block("mid", 3);
        let names: Vec<&str> = recipe.blocks().map(|(k, _)| k).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn reinserting_a_block_keeps_position() {
        let mut recipe = Recipe::new().with_block("a", 1).with_block("b", 2);
        recipe.insert("a", 10);
        let blocks: Vec<(&str, &Value)> = recipe.blocks().collect();
        assert_eq!(blocks[0], ("a", &json!(10)));
        assert_eq!(recipe.len(), 2);
    }

    #[test]
    fn decode_typed_block() {
        let recipe = Recipe::new().with_block("values", json!([1.0, 2.5]));
        let values: Vec<f64> = recipe.decode("values").unwrap();
        assert_eq!(values, [1.0, 2.5]);
    }

    #[test]
    fn decode_missing_block() {
        let err = Recipe::new().decode::<f64>("value").unwrap_err();
        assert_eq!(err, TypeError::MissingBlock("value".into()));
    }

    #[test]
    fn decode_wrong_shape() {
        let recipe = Recipe::new().with_block("value", "not a number");
        assert!(matches!(
            recipe.decode::<f64>("value"),
            Err(TypeError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let recipe = Recipe::new().with_block("b", 1).with_block("a", 2);
        let text = serde_json::to_string(&recipe).unwrap();
        assert_eq!(text, r#"{"b":1,"a":2}"#);
        let back: Recipe = serde_json::from_str(&text).unwrap();
        assert_eq!(back, recipe);
    }
}
