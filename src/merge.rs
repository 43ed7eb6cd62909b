//! Ordered deep merge used to combine option layers into worker configurations.
//!
//! Later layers win key by key. Nested objects merge recursively, while arrays and scalars
//! replace the earlier value wholesale. Strategies place derived fields in the last layer so
//! they always take precedence.

use serde_json::{Map, Value};

/// Merge `layer` into `target`.
pub fn merge_into(target: &mut Value, layer: &Value) {
  match (target, layer) {
    (Value::Object(target), Value::Object(layer)) => merge_objects(target, layer),
    (target, layer) => *target = layer.clone(),
  }
}

/// Merge every layer in order, starting from an empty object.
pub fn merge_layers<'a, I>(layers: I) -> Value
where
  I: IntoIterator<Item = &'a Value>,
{
  let mut merged = Value::Object(Map::new());
  for layer in layers {
    merge_into(&mut merged, layer);
  }
  merged
}

fn merge_objects(target: &mut Map<String, Value>, layer: &Map<String, Value>) {
  for (key, value) in layer {
    let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
    match target.get_mut(key) {
      Some(existing) if nested => merge_into(existing, value),
      _ => {
        target.insert(key.clone(), value.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn later_layers_override_scalars() {
    let merged = merge_layers([&json!({ "a": 1, "b": 2 }), &json!({ "b": 3 }), &json!({ "c": 4 })]);
    assert_eq!(merged, json!({ "a": 1, "b": 3, "c": 4 }));
  }

  #[test]
  fn nested_objects_merge_recursively() {
    let merged = merge_layers([
      &json!({ "stripPrefixMulti": { "/a/": "/" }, "opts": { "x": { "y": 1 } } }),
      &json!({ "stripPrefixMulti": { "/b/": "/b/" }, "opts": { "x": { "z": 2 } } }),
    ]);

    assert_eq!(
      merged,
      json!({
        "stripPrefixMulti": { "/a/": "/", "/b/": "/b/" },
        "opts": { "x": { "y": 1, "z": 2 } }
      })
    );
  }

  #[test]
  fn arrays_replace_wholesale() {
    let merged = merge_layers([
      &json!({ "staticFileGlobs": ["/a", "/b"] }),
      &json!({ "staticFileGlobs": ["/c"] }),
    ]);
    assert_eq!(merged, json!({ "staticFileGlobs": ["/c"] }));
  }

  #[test]
  fn object_replaces_scalar_and_back() {
    let mut target = json!({ "k": 1 });
    merge_into(&mut target, &json!({ "k": { "nested": true } }));
    assert_eq!(target, json!({ "k": { "nested": true } }));

    merge_into(&mut target, &json!({ "k": "flat" }));
    assert_eq!(target, json!({ "k": "flat" }));
  }

  #[test]
  fn non_object_layer_replaces_accumulator() {
    let merged = merge_layers([&json!({ "a": 1 }), &Value::Null]);
    assert_eq!(merged, Value::Null);
  }
}
